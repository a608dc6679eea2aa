use crate::interpreter::SystemContext;
use crate::value::{error::RuntimeErrorKind, NativeFunction, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFunction {
    Write,
    Read,
    Clear,
}

impl ConsoleFunction {
    pub const ALL: [ConsoleFunction; 3] = [
        ConsoleFunction::Write,
        ConsoleFunction::Read,
        ConsoleFunction::Clear,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConsoleFunction::Write => "escreva",
            ConsoleFunction::Read => "leia",
            ConsoleFunction::Clear => "limpa",
        }
    }
}

impl NativeFunction for ConsoleFunction {
    fn get_name(&self) -> &str {
        self.name()
    }

    fn call(
        &self,
        arguments: &[Value],
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeErrorKind> {
        match self {
            ConsoleFunction::Write => {
                let line = arguments
                    .iter()
                    .map(|argument| argument.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                context.writeln(&line);
                Ok(Value::Null)
            }
            ConsoleFunction::Read => {
                let prompt = arguments
                    .first()
                    .map(|prompt| prompt.to_string())
                    .unwrap_or_default();
                // End of input reads as `nulo`.
                Ok(context
                    .read_line(&prompt)
                    .map(Value::string)
                    .unwrap_or_default())
            }
            ConsoleFunction::Clear => {
                context.clear();
                Ok(Value::Null)
            }
        }
    }
}
