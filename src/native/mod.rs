mod console;
mod math;
mod sleep;

pub use console::ConsoleFunction;
pub use math::MathFunction;
pub use sleep::NativeSleep;

use crate::environment::Environment;
use crate::value::{error::RuntimeErrorKind, Value};
use compact_str::CompactString;

fn number_argument(
    arguments: &[Value],
    position: usize,
    name: &'static str,
) -> Result<f64, RuntimeErrorKind> {
    arguments
        .get(position)
        .and_then(Value::as_number)
        .ok_or(RuntimeErrorKind::InvalidArgument {
            name,
            expected: "a Number",
        })
}

/// Installs the `math`, `console` and `sleep` namespaces into `environment`.
pub fn load(environment: &mut Environment) -> Result<(), RuntimeErrorKind> {
    let math = Value::dictionary(
        [
            (CompactString::from("PI"), Value::Number(std::f64::consts::PI)),
            (CompactString::from("TAU"), Value::Number(std::f64::consts::TAU)),
        ]
        .into_iter()
        .chain(
            MathFunction::ALL
                .iter()
                .map(|function| (CompactString::from(function.name()), Value::native(*function))),
        ),
    );
    let console = Value::dictionary(
        ConsoleFunction::ALL
            .iter()
            .map(|function| (CompactString::from(function.name()), Value::native(*function))),
    );
    let sleep = Value::dictionary([(CompactString::from("aguarde"), Value::native(NativeSleep))]);

    environment.define("math", math)?;
    environment.define("console", console)?;
    environment.define("sleep", sleep)?;
    tracing::debug!("loaded built-in library");
    Ok(())
}
