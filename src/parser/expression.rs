use super::statement::FunctionDecl;
use crate::lexer::Span;
use crate::string::{format_number, Ident};
use compact_str::CompactString;
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Null,
    Number(f64),
    String(CompactString),
    Bool(bool),
    Identifier(Ident),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditiveOperator {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicativeOperator {
    Multiply,
    Divide,
    Modulo,
}

/// A dictionary literal key. Bare names (`nome = v` or `[nome] = v`) are used verbatim,
/// anything else is evaluated and stringified.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryKey {
    Name(Ident),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    pub key: DictionaryKey,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Atom(Atom),
    Array(Vec<Expression>),
    Dictionary(Vec<DictionaryEntry>),
    Function(Arc<FunctionDecl>),
    Not(Box<Expression>),
    Logical {
        operator: LogicalOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Comparison {
        operator: ComparisonOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Additive {
        operator: AdditiveOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Multiplicative {
        operator: MultiplicativeOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Property {
        object: Box<Expression>,
        key: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "e"),
            LogicalOperator::Or => write!(f, "ou"),
        }
    }
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanEqual => "<=",
        };
        write!(f, "{symbol}")
    }
}

impl Display for AdditiveOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdditiveOperator::Add => write!(f, "+"),
            AdditiveOperator::Subtract => write!(f, "-"),
        }
    }
}

impl Display for MultiplicativeOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultiplicativeOperator::Multiply => write!(f, "*"),
            MultiplicativeOperator::Divide => write!(f, "/"),
            MultiplicativeOperator::Modulo => write!(f, "%"),
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Null => write!(f, "nulo"),
            Atom::Number(v) => write!(f, "{}", format_number(*v)),
            Atom::String(v) => write!(f, "\"{v}\""),
            Atom::Bool(true) => write!(f, "verdadeiro"),
            Atom::Bool(false) => write!(f, "falso"),
            Atom::Identifier(ident) => write!(f, "{ident}"),
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[Expression]) -> std::fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExpressionKind::Atom(atom) => write!(f, "{atom}"),
            ExpressionKind::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            ExpressionKind::Dictionary(entries) => {
                write!(f, "{{")?;
                for (index, entry) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    match &entry.key {
                        DictionaryKey::Name(name) => write!(f, "{name} = {}", entry.value)?,
                        DictionaryKey::Expression(key) => write!(f, "[{key}] = {}", entry.value)?,
                    }
                }
                write!(f, "}}")
            }
            ExpressionKind::Function(declaration) => write!(f, "{declaration}"),
            ExpressionKind::Not(rhs) => write!(f, "negar {rhs}"),
            ExpressionKind::Logical { operator, lhs, rhs } => write!(f, "({lhs} {operator} {rhs})"),
            ExpressionKind::Comparison { operator, lhs, rhs } => {
                write!(f, "({lhs} {operator} {rhs})")
            }
            ExpressionKind::Additive { operator, lhs, rhs } => write!(f, "({lhs} {operator} {rhs})"),
            ExpressionKind::Multiplicative { operator, lhs, rhs } => {
                write!(f, "({lhs} {operator} {rhs})")
            }
            ExpressionKind::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            ExpressionKind::Property { object, key } => match &key.kind {
                ExpressionKind::Atom(Atom::String(name)) => write!(f, "{object}.{name}"),
                _ => write!(f, "{object}[{key}]"),
            },
        }
    }
}
