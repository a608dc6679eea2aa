pub mod context;
pub mod observer;
mod tree;

use crate::value::{error::RuntimeError, Value};
pub use context::{BufferedContext, StdioContext};
pub use observer::{NodeKey, Observed, StepObserver, Unobserved};
use std::time::Duration;
pub use tree::{TreeWalkInterpreter, TreeWalkStatementInterpreter};

#[derive(Debug, Clone)]
pub enum ProgramState {
    Run(Value),
    Terminate,
}

/// The host side of a running program: everything a built-in may touch besides its arguments.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
    /// Shows `prompt` and reads one line without its terminator. `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
    fn clear(&mut self);
    fn sleep(&mut self, duration: Duration);
}

pub trait Interpreter<C> {
    fn step(&mut self, context: &mut C) -> Result<ProgramState, RuntimeError>;
}
