use super::number_argument;
use crate::interpreter::SystemContext;
use crate::value::{error::RuntimeErrorKind, NativeFunction, Value};
use std::time::Duration;

/// `aguarde(segundos)`: blocks the running program.
#[derive(Debug, Clone, Copy)]
pub struct NativeSleep;

impl NativeFunction for NativeSleep {
    fn get_name(&self) -> &str {
        "aguarde"
    }

    fn call(
        &self,
        arguments: &[Value],
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeErrorKind> {
        let seconds = number_argument(arguments, 0, "segundos")?;
        let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
            RuntimeErrorKind::InvalidArgument {
                name: "segundos",
                expected: "a non-negative Number of representable seconds",
            }
        })?;
        context.sleep(duration);
        Ok(Value::Null)
    }
}
