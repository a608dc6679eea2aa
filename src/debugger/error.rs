use crate::value::error::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DebugError {
    #[error("Program has already finished")]
    ProgramFinished,
    #[error("Program was stopped by the user")]
    ProgramExit,
    #[error("Stepping backwards is not supported")]
    StepBackwardUnsupported,
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("Debugger console failed: {0}")]
    Console(String),
}

impl From<std::io::Error> for DebugError {
    fn from(error: std::io::Error) -> Self {
        DebugError::Console(error.to_string())
    }
}

impl DebugError {
    pub fn code(&self) -> &'static str {
        match self {
            DebugError::ProgramFinished => "DB001",
            DebugError::ProgramExit => "DB002",
            DebugError::StepBackwardUnsupported => "DB003",
            DebugError::Runtime(error) => error.code(),
            DebugError::Console(_) => "DB004",
        }
    }
}
