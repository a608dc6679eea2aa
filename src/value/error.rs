use crate::lexer::Span;
use crate::string::IdentName;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("Unknown name: {0}")]
    UnknownName(IdentName),
    #[error("Name already defined in this scope: {0}")]
    AlreadyDefined(IdentName),
    #[error("Assignment to undefined variable: {0}")]
    NotDefined(IdentName),
    #[error("Unsupported operator {operator} between {lhs} and {rhs}")]
    UnsupportedOperator {
        operator: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Unsupported operator {operator} for {operand}")]
    UnsupportedUnaryOperator {
        operator: &'static str,
        operand: &'static str,
    },
    #[error("Expected a Boolean but got {0}")]
    NonBoolean(&'static str),
    #[error("No enclosing loop")]
    NoLoopContext,
    #[error("No enclosing function")]
    NoFunctionContext,
    #[error("Value of type {0} is not callable")]
    NotCallable(&'static str),
    #[error("Value of type {0} can not be indexed")]
    NotIndexable(&'static str),
    #[error("Value of type {0} can not be iterated")]
    NotIterable(&'static str),
    #[error("Node can not be evaluated here: {0}")]
    UnreachableNode(CompactString),
    #[error("Invalid argument `{name}`: expected {expected}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
    },
    #[error("Execution halted")]
    Halted,
    #[error("Index {index} is too far past the end of an array of length {length}")]
    IndexOutOfRange { index: usize, length: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
    #[source]
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::UnknownName(_) => "RT001",
            RuntimeErrorKind::AlreadyDefined(_) => "RT002",
            RuntimeErrorKind::NotDefined(_) => "RT003",
            RuntimeErrorKind::UnsupportedOperator { .. } => "RT004",
            RuntimeErrorKind::NonBoolean(_) => "RT005",
            RuntimeErrorKind::NoLoopContext => "RT006",
            RuntimeErrorKind::NoFunctionContext => "RT007",
            RuntimeErrorKind::NotCallable(_) => "RT008",
            RuntimeErrorKind::NotIndexable(_) => "RT009",
            RuntimeErrorKind::NotIterable(_) => "RT010",
            RuntimeErrorKind::UnreachableNode(_) => "RT011",
            RuntimeErrorKind::InvalidArgument { .. } => "RT012",
            RuntimeErrorKind::Halted => "RT013",
            RuntimeErrorKind::UnsupportedUnaryOperator { .. } => "RT014",
            RuntimeErrorKind::IndexOutOfRange { .. } => "RT015",
        }
    }
}
