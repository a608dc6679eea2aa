mod error;
pub mod formatter;
mod state;
mod token;

pub use error::{LexicalError, LexicalErrorKind};
use state::{LexerState, LexerStateTransition};
use std::{str::CharIndices, sync::Arc};
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

/// A character together with its byte offset in the source.
#[derive(Debug, Clone, Copy)]
pub struct SourceChar {
    pub value: char,
    pub offset: usize,
}

impl SourceChar {
    pub fn next_offset(&self) -> usize {
        self.offset + self.value.len_utf8()
    }
}

/// Maps byte offsets to one-based line numbers.
#[derive(Debug, Clone)]
pub struct LineBreaks {
    /// Byte offset at which each line starts. Never empty.
    line_starts: Arc<[usize]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|(_, byte)| *byte == b'\n')
                    .map(|(offset, _)| offset + 1),
            )
            .collect();
        Self {
            line_starts: line_starts.into(),
        }
    }

    pub fn get_line(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|start| *start <= offset) as u32
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start)
    }
}

#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: CharIndices<'src>,
    state: LexerState,
    /// Characters handed back by the state machine, next one last.
    pending: Vec<SourceChar>,
    line_breaks: LineBreaks,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            state: LexerState::default(),
            pending: Vec::with_capacity(2),
            line_breaks: LineBreaks::new(source),
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }

    fn next_char(&mut self) -> Option<SourceChar> {
        self.pending.pop().or_else(|| {
            self.chars
                .next()
                .map(|(offset, value)| SourceChar { value, offset })
        })
    }

    fn emit(
        &mut self,
        new_state: LexerState,
        lexeme: state::Lexeme,
        put_back: &[SourceChar],
    ) -> Result<Token, LexicalError> {
        self.state = new_state;
        self.pending.extend(put_back.iter().rev());
        let (kind, span) = lexeme?;
        Ok(Token {
            kind,
            span,
            line: self.line_breaks.get_line_from_span(span),
        })
    }

    /// Scans the next token. Once the source is exhausted every call yields `Eof`.
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            let next_char = self.next_char();
            match self.state.execute(self.source, &next_char) {
                LexerStateTransition::Stay => {}
                LexerStateTransition::ChangeState(new_state) => self.state = new_state,
                LexerStateTransition::ChangeStateAndEmit { new_state, lexeme } => {
                    return self.emit(new_state, lexeme, &[]);
                }
                LexerStateTransition::ChangeStateAndEmitAndPutBack {
                    new_state,
                    lexeme,
                    put_back,
                } => return self.emit(new_state, lexeme, &[put_back]),
                LexerStateTransition::ChangeStateAndEmitAndPutBackTwo {
                    new_state,
                    lexeme,
                    put_back: (first, second),
                } => return self.emit(new_state, lexeme, &[first, second]),
            }
        }
    }
}
