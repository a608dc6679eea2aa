use super::{DebugError, DebugSession, StepTrace};
use crate::interpreter::SystemContext;
use crate::value::Value;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    StepForward,
    StepBackward,
    Locals,
    Quit,
}

impl DebugCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "s" | "step" | "f1" => Some(DebugCommand::StepForward),
            "b" | "back" | "f2" => Some(DebugCommand::StepBackward),
            "l" | "locals" | "f3" => Some(DebugCommand::Locals),
            "q" | "quit" => Some(DebugCommand::Quit),
            _ => None,
        }
    }
}

/// Where the driver reads its commands from, one line per call.
pub trait CommandSource {
    fn read_command(&mut self, line: &mut String) -> std::io::Result<usize>;
}

impl<R: BufRead> CommandSource for R {
    fn read_command(&mut self, line: &mut String) -> std::io::Result<usize> {
        self.read_line(line)
    }
}

/// Process stdin, locked only for the duration of each read so `console.leia` sees whatever
/// the driver has not consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedStdin;

impl CommandSource for SharedStdin {
    fn read_command(&mut self, line: &mut String) -> std::io::Result<usize> {
        std::io::stdin().lock().read_line(line)
    }
}

const PROMPT: &str = "(pardal) ";
const HELP: &str = "commands: s/step, b/back, l/locals, q/quit";

/// Line-oriented console for a `DebugSession`.
pub struct DebugDriver<R: CommandSource, W: Write> {
    input: R,
    output: W,
}

impl<R: CommandSource, W: Write> DebugDriver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Serves commands until the program finishes, fails or is quit.
    /// End of input counts as `quit`.
    pub fn run<C: SystemContext + Send + 'static>(
        &mut self,
        session: &mut DebugSession<C>,
    ) -> Result<Value, DebugError> {
        writeln!(self.output, "{HELP}")?;
        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_command(&mut line)? == 0 {
                session.quit()?;
            }
            let Some(command) = DebugCommand::parse(&line) else {
                writeln!(self.output, "{HELP}")?;
                continue;
            };
            tracing::trace!(?command, "debug command");

            match command {
                DebugCommand::StepForward => match session.step_forward()? {
                    StepTrace::Finished(value) => {
                        writeln!(self.output, "{}", StepTrace::Finished(value.clone()))?;
                        return Ok(value);
                    }
                    trace => writeln!(self.output, "{trace}")?,
                },
                DebugCommand::StepBackward => {
                    if let Err(error) = session.step_backward() {
                        writeln!(self.output, "[{}] {error}", error.code())?;
                    }
                }
                DebugCommand::Locals => {
                    let locals = session.locals();
                    if locals.is_empty() {
                        writeln!(self.output, "No locals defined.")?;
                    }
                    for (name, value) in locals {
                        writeln!(self.output, "{name} = {value}")?;
                    }
                }
                DebugCommand::Quit => session.quit()?,
            }
        }
    }
}
