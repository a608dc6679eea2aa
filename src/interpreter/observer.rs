use crate::environment::Environment;
use crate::lexer::Span;
use crate::parser::{expression::Expression, statement::Statement, Program};
use crate::value::{error::RuntimeErrorKind, Value};
use std::fmt::Display;

/// Identity of a tree node. Nodes of different kinds may share an address, so the kind is kept too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    address: usize,
    tag: u8,
}

impl NodeKey {
    fn of<T>(node: &T, tag: u8) -> Self {
        Self {
            address: node as *const T as usize,
            tag,
        }
    }
}

/// A tree node the evaluator can report while it works on it.
pub trait Observed: Display {
    fn node_key(&self) -> NodeKey;
    fn span(&self) -> Span;
}

impl Observed for Program {
    fn node_key(&self) -> NodeKey {
        NodeKey::of(self, 0)
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl Observed for Statement {
    fn node_key(&self) -> NodeKey {
        NodeKey::of(self, 1)
    }

    fn span(&self) -> Span {
        Statement::span(self)
    }
}

impl Observed for Expression {
    fn node_key(&self) -> NodeKey {
        NodeKey::of(self, 2)
    }

    fn span(&self) -> Span {
        self.span
    }
}

/// Hooks run around every node evaluation.
///
/// `enter` returns whether the node was taken; `leave` is only called for taken nodes.
/// An error from either hook aborts the run.
pub trait StepObserver {
    fn enter(
        &mut self,
        node: &dyn Observed,
        environment: &Environment,
    ) -> Result<bool, RuntimeErrorKind>;

    fn leave(&mut self, value: &Value, environment: &Environment)
        -> Result<(), RuntimeErrorKind>;
}

/// Plain execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unobserved;

impl StepObserver for Unobserved {
    #[inline(always)]
    fn enter(
        &mut self,
        _node: &dyn Observed,
        _environment: &Environment,
    ) -> Result<bool, RuntimeErrorKind> {
        Ok(false)
    }

    #[inline(always)]
    fn leave(
        &mut self,
        _value: &Value,
        _environment: &Environment,
    ) -> Result<(), RuntimeErrorKind> {
        Ok(())
    }
}
