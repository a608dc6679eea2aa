use super::error::{RuntimeError, RuntimeErrorKind};
use super::{Object, Value};
use crate::lexer::LineBreaks;
use ariadne::{Color, ColorGenerator, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
    fn format_error(&self, error: &RuntimeError) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format(&self, value: &Value) -> String {
        BasicFormatter::format_verbose(value)
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error:?}")
    }
}

pub struct BasicFormatter {
    line_breaks: LineBreaks,
}

impl BasicFormatter {
    pub fn new(text: &str) -> Self {
        let line_breaks = LineBreaks::new(text);
        Self { line_breaks }
    }

    /// Renders a value together with its type, e.g. `String("abc")`.
    pub fn format_verbose(value: &Value) -> String {
        match value {
            Value::Null => "Null".into(),
            Value::Number(_) | Value::Boolean(_) => format!("{}({value})", value.type_name()),
            Value::Object(Object::String(v)) => format!("String(\"{v}\")"),
            Value::Object(Object::Function(function)) => {
                format!("Function({})", function.get_name())
            }
            Value::Object(Object::NativeFunction(function)) => {
                format!("NativeFunction({})", function.get_name())
            }
            Value::Object(_) => format!("{}({value})", value.type_name()),
        }
    }
}

impl ValueFormatter for BasicFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("({line}) {}", error.kind)
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }

    fn describe(kind: &RuntimeErrorKind) -> (&'static str, String) {
        match kind {
            RuntimeErrorKind::UnknownName(name) => (
                "Attempted to access a name that has not been defined",
                format!("{} has not been defined.", name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::AlreadyDefined(name) => (
                "Attempted to declare a name twice in the same scope",
                format!("{} is already defined here.", name.fg(Color::BrightYellow)),
            ),
            RuntimeErrorKind::NotDefined(name) => (
                "Attempted to assign to a variable that has not been declared",
                format!("{} has not been declared.", name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::UnsupportedOperator { operator, lhs, rhs } => {
                let mut colors = ColorGenerator::new();
                (
                    "Operator is not defined for these operand types",
                    format!(
                        "{} can not be applied to {} and {}.",
                        operator.fg(Color::BrightCyan),
                        lhs.fg(colors.next()),
                        rhs.fg(colors.next()),
                    ),
                )
            }
            RuntimeErrorKind::UnsupportedUnaryOperator { operator, operand } => (
                "Operator is not defined for this operand type",
                format!(
                    "{} can not be applied to {}.",
                    operator.fg(Color::BrightCyan),
                    operand.fg(Color::BrightRed),
                ),
            ),
            RuntimeErrorKind::NonBoolean(actual) => (
                "Expected a Boolean condition",
                format!("Type is {} instead of Boolean", actual.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NoLoopContext => (
                "Loop control used outside of a loop",
                "There is no enclosing loop.".to_string(),
            ),
            RuntimeErrorKind::NoFunctionContext => (
                "Return used outside of a function",
                "There is no enclosing function.".to_string(),
            ),
            RuntimeErrorKind::NotCallable(actual) => (
                "Attempted to call a value that is not callable",
                format!("{} is not callable.", actual.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NotIndexable(actual) => (
                "Attempted to index a value that has no properties",
                format!("{} can not be indexed.", actual.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NotIterable(actual) => (
                "Attempted to iterate over a value that is not a collection",
                format!("{} can not be iterated.", actual.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::UnreachableNode(node) => (
                "Encountered a node that can not be evaluated here",
                format!("{} reached the wrong evaluator.", node.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::InvalidArgument { name, expected } => (
                "Built-in received an invalid argument",
                format!(
                    "`{}` should be {}.",
                    name.fg(Color::BrightYellow),
                    expected.fg(Color::BrightCyan)
                ),
            ),
            RuntimeErrorKind::Halted => (
                "Execution was halted",
                "Stopped while evaluating this.".to_string(),
            ),
            RuntimeErrorKind::IndexOutOfRange { index, length } => (
                "Array write is too far past the end",
                format!(
                    "Index {} is beyond length {}.",
                    index.fg(Color::BrightRed),
                    length.fg(Color::BrightCyan)
                ),
            ),
        }
    }
}

impl<'src> ValueFormatter for PrettyFormatter<'src> {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let path = &self.path.to_string_lossy();
        let mut output = std::io::Cursor::new(Vec::new());
        let span = error.span;
        let (message, label) = Self::describe(&error.kind);
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message(message)
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
