use super::{
    token::{Token, TokenKind},
    LineBreaks,
};
use crate::lexer::{LexicalError, LexicalErrorKind};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
    /// Formats a lexer error into a string.
    fn format_error(&self, error: &LexicalError) -> String;
}

pub struct DebugFormatter;

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }

    fn format_error(&self, error: &LexicalError) -> String {
        format!("{error:?}")
    }
}

pub struct BasicFormatter<'src> {
    text: &'src str,
    line_breaks: LineBreaks,
}

impl<'src> BasicFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            text,
            line_breaks: LineBreaks::new(text),
        }
    }

    pub fn get_line_breaks(&self) -> &LineBreaks {
        &self.line_breaks
    }

    /// Renders `KIND lexeme literal`, where the literal is the decoded value or `null`.
    pub fn describe(text: &str, token: &Token) -> String {
        let lexeme = &text[token.span.range()];
        match token.kind {
            TokenKind::Eof => "EOF  null".into(),
            TokenKind::NumericLiteral => {
                let value: f64 = lexeme.parse().unwrap_or(f64::NAN);
                format!("NUMBER {lexeme} {value:?}")
            }
            TokenKind::StringLiteral => {
                let value = &lexeme[1..lexeme.len() - 1];
                format!("STRING {lexeme} {value}")
            }
            kind => format!("{kind} {lexeme} null"),
        }
    }
}

impl<'src> TokenFormatter for BasicFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        format!("({}) {}", token.line, Self::describe(self.text, token))
    }

    fn format_error(&self, error: &LexicalError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        match error.kind {
            LexicalErrorKind::Unrecognized(c) => {
                format!("({line}) ERROR UNEXPECTED_CHAR {c}")
            }
            LexicalErrorKind::UnclosedString => {
                format!("({line}) ERROR UNTERMINATED_STRING null")
            }
        }
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

    pub fn get_text(&self) -> &'src str {
        self.text
    }

    pub fn get_path(&self) -> &'src Path {
        self.path
    }
}

impl<'src> TokenFormatter for PrettyFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        format!(
            "{:>4} | {}",
            token.line,
            BasicFormatter::describe(self.text, token)
        )
    }

    fn format_error(&self, error: &LexicalError) -> String {
        let path = &self.path.to_string_lossy();
        let span = error.span;
        let mut output = std::io::Cursor::new(Vec::new());
        let (message, label) = match error.kind {
            LexicalErrorKind::Unrecognized(c) => (
                "Encountered an unrecognized character",
                format!("The character {c:?} does not start any token"),
            ),
            LexicalErrorKind::UnclosedString => (
                "Encountered an unterminated string",
                "The string starting here never ends".to_string(),
            ),
        };
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
