use super::{
    statement::{ConditionalBranch, Statement},
    ParserError, ParserErrorKind, Program,
};
use crate::lexer::{
    formatter::{BasicFormatter as BasicTokenFormatter, PrettyFormatter as PrettyTokenFormatter, TokenFormatter},
    LineBreaks,
};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::{fmt::Write, path::Path};

const WRITE_FMT_MSG: &str = "Encountered an error while attempting to write format string to buffer.";
const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ParserFormatter {
    fn format(&self, program: &Program) -> String;
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugParserFormatter;

impl ParserFormatter for DebugParserFormatter {
    fn format(&self, program: &Program) -> String {
        format!("{program:?}")
    }

    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

/// Renders the statement tree as indented source-like outline.
fn format_body(buffer: &mut String, body: &[Statement], depth: usize) {
    for statement in body {
        format_statement(buffer, statement, depth);
    }
}

fn format_statement(buffer: &mut String, statement: &Statement, depth: usize) {
    let indent = "  ".repeat(depth);
    match statement {
        Statement::Block { body, .. }
        | Statement::While { body, .. }
        | Statement::NumericFor { body, .. }
        | Statement::IterativeFor { body, .. } => {
            writeln!(buffer, "{indent}{statement}").expect(WRITE_FMT_MSG);
            format_body(buffer, body, depth + 1);
            writeln!(buffer, "{indent}fim").expect(WRITE_FMT_MSG);
        }
        Statement::Function(declaration) => {
            writeln!(buffer, "{indent}{declaration}").expect(WRITE_FMT_MSG);
            format_body(buffer, &declaration.body, depth + 1);
            writeln!(buffer, "{indent}fim").expect(WRITE_FMT_MSG);
        }
        Statement::If {
            branches,
            otherwise,
            ..
        } => {
            for (index, ConditionalBranch { condition, body }) in branches.iter().enumerate() {
                let keyword = if index == 0 { "se" } else { "caso" };
                writeln!(buffer, "{indent}{keyword} {condition} faca").expect(WRITE_FMT_MSG);
                format_body(buffer, body, depth + 1);
                writeln!(buffer, "{indent}fim").expect(WRITE_FMT_MSG);
            }
            if let Some(body) = otherwise {
                writeln!(buffer, "{indent}senao faca").expect(WRITE_FMT_MSG);
                format_body(buffer, body, depth + 1);
                writeln!(buffer, "{indent}fim").expect(WRITE_FMT_MSG);
            }
        }
        _ => writeln!(buffer, "{indent}{statement}").expect(WRITE_FMT_MSG),
    }
}

pub struct BasicParserFormatter<'src> {
    token_formatter: BasicTokenFormatter<'src>,
}

impl<'src> BasicParserFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            token_formatter: BasicTokenFormatter::new(text),
        }
    }

    fn get_line_breaks(&self) -> &LineBreaks {
        self.token_formatter.get_line_breaks()
    }
}

impl<'src> ParserFormatter for BasicParserFormatter<'src> {
    fn format(&self, program: &Program) -> String {
        let mut buffer = String::new();
        format_body(&mut buffer, &program.statements, 0);
        buffer
    }

    fn format_error(&self, error: &ParserError) -> String {
        let line = self.get_line_breaks().get_line_from_span(error.span);
        match &error.kind {
            ParserErrorKind::UnexpectedToken { actual, expected } => {
                format!("({line}) Unexpected: A = {actual} E = {expected}")
            }
            ParserErrorKind::NonExpression(kind) => format!("({line}) Non-Expression: {kind}"),
            ParserErrorKind::InvalidAssignmentTarget => {
                format!("({line}) Invalid assignment target")
            }
            ParserErrorKind::UnexpectedEof => format!("({line}) Unexpected EOF"),
            ParserErrorKind::LexicalError(err) => self.token_formatter.format_error(err),
        }
    }
}

pub struct PrettyParserFormatter<'src> {
    token_formatter: PrettyTokenFormatter<'src>,
}

impl<'src> PrettyParserFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self {
            token_formatter: PrettyTokenFormatter::new(text, path),
        }
    }
}

impl<'src> ParserFormatter for PrettyParserFormatter<'src> {
    fn format(&self, program: &Program) -> String {
        let mut buffer = String::new();
        format_body(&mut buffer, &program.statements, 0);
        buffer
    }

    fn format_error(&self, error: &ParserError) -> String {
        let (message, label) = match &error.kind {
            ParserErrorKind::UnexpectedToken { actual, expected } => (
                "Expected a different token",
                format!("Expected {expected} but got {actual}"),
            ),
            ParserErrorKind::NonExpression(kind) => (
                "Expected a valid expression operator or atom token",
                format!("Not an expression token {kind}"),
            ),
            ParserErrorKind::InvalidAssignmentTarget => (
                "Expected a name or a property to assign to",
                "Cannot assign to this expression".to_string(),
            ),
            ParserErrorKind::UnexpectedEof => ("Unexpected EOF", "File ends here...".to_string()),
            ParserErrorKind::LexicalError(err) => return self.token_formatter.format_error(err),
        };

        let text = self.token_formatter.get_text();
        let path = &self.token_formatter.get_path().to_string_lossy();
        let span = error.span;
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message(message)
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
