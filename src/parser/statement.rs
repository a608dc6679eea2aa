use super::expression::Expression;
use crate::lexer::Span;
use crate::string::Ident;
use std::fmt::Display;
use std::sync::Arc;

/// A function literal or declaration. Shared between the tree and every closure built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<Ident>,
    pub parameters: Vec<Ident>,
    pub body: Arc<[Statement]>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentTarget {
    Identifier(Ident),
    Property { object: Expression, key: Expression },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: AssignmentTarget,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBranch {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration {
        name: Ident,
        value: Expression,
        span: Span,
    },
    Assignment(Assignment),
    Expression(Expression),
    Block {
        body: Vec<Statement>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
        span: Span,
    },
    NumericFor {
        variable: Ident,
        from: Option<Expression>,
        until: Option<Expression>,
        step: Option<Assignment>,
        body: Vec<Statement>,
        span: Span,
    },
    IterativeFor {
        key: Ident,
        value: Ident,
        iterable: Expression,
        body: Vec<Statement>,
        span: Span,
    },
    Function(Arc<FunctionDecl>),
    If {
        /// The `se` branch followed by every `caso` branch, in source order.
        branches: Vec<ConditionalBranch>,
        otherwise: Option<Vec<Statement>>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Return {
        values: Vec<Expression>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Declaration { span, .. }
            | Statement::Block { span, .. }
            | Statement::While { span, .. }
            | Statement::NumericFor { span, .. }
            | Statement::IterativeFor { span, .. }
            | Statement::If { span, .. }
            | Statement::Return { span, .. }
            | Statement::Break(span)
            | Statement::Continue(span) => *span,
            Statement::Assignment(assignment) => assignment.span,
            Statement::Expression(expression) => expression.span,
            Statement::Function(declaration) => declaration.span,
        }
    }
}

impl Display for FunctionDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "funcao {name}(")?,
            None => write!(f, "funcao(")?,
        }
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{parameter}")?;
        }
        write!(f, ")")
    }
}

impl Display for AssignmentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentTarget::Identifier(name) => write!(f, "{name}"),
            AssignmentTarget::Property { object, key } => write!(f, "{object}[{key}]"),
        }
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.target, self.value)
    }
}

// Statements render as their header line only.
impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Declaration { name, value, .. } => write!(f, "declarar {name} = {value}"),
            Statement::Assignment(assignment) => write!(f, "{assignment}"),
            Statement::Expression(expression) => write!(f, "{expression}"),
            Statement::Block { .. } => write!(f, "bloco"),
            Statement::While { condition, .. } => write!(f, "enquanto {condition}"),
            Statement::NumericFor {
                variable,
                from,
                until,
                step,
                ..
            } => {
                write!(f, "para {variable}")?;
                if let Some(from) = from {
                    write!(f, " de {from}")?;
                }
                if let Some(until) = until {
                    write!(f, " ate {until}")?;
                }
                if let Some(step) = step {
                    write!(f, " opere {step}")?;
                }
                Ok(())
            }
            Statement::IterativeFor {
                key,
                value,
                iterable,
                ..
            } => write!(f, "para cada {key}, {value} em {iterable}"),
            Statement::Function(declaration) => write!(f, "{declaration}"),
            Statement::If { branches, .. } => match branches.first() {
                Some(branch) => write!(f, "se {}", branch.condition),
                None => write!(f, "se"),
            },
            Statement::Break(_) => write!(f, "parar"),
            Statement::Continue(_) => write!(f, "continuar"),
            Statement::Return { values, .. } => {
                write!(f, "retorna")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {value}")?;
                }
                Ok(())
            }
        }
    }
}
