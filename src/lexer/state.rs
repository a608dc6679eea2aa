use super::SourceChar;
use super::token::{Span, TokenKind, KEYWORD_HASHMAP};
use super::{LexicalError, LexicalErrorKind};

pub type Lexeme = Result<(TokenKind, Span), LexicalError>;

pub enum LexerStateTransition {
    Stay,
    ChangeState(LexerState),
    ChangeStateAndEmit {
        new_state: LexerState,
        lexeme: Lexeme,
    },
    ChangeStateAndEmitAndPutBack {
        new_state: LexerState,
        lexeme: Lexeme,
        put_back: SourceChar,
    },
    ChangeStateAndEmitAndPutBackTwo {
        new_state: LexerState,
        lexeme: Lexeme,
        put_back: (SourceChar, SourceChar),
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub enum LexerState {
    #[default]
    Normal,
    Ident {
        start: usize,
    },
    Number {
        start: usize,
    },
    NumberDot {
        start: usize,
        dot: SourceChar,
    },
    Fraction {
        start: usize,
    },
    String {
        start: usize,
    },
    Comment,
    Operator {
        first: SourceChar,
    },
}

fn emit(kind: TokenKind, start: usize, end: usize) -> Lexeme {
    Ok((kind, Span::new(start, end - start)))
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl LexerState {
    pub fn execute(&self, source: &str, next_char: &Option<SourceChar>) -> LexerStateTransition {
        match *self {
            LexerState::Normal => Self::execute_normal(source, next_char),
            LexerState::Ident { start } => Self::execute_ident(source, start, next_char),
            LexerState::Number { start } => Self::execute_number(source, start, next_char),
            LexerState::NumberDot { start, dot } => Self::execute_number_dot(start, dot, next_char),
            LexerState::Fraction { start } => Self::execute_fraction(source, start, next_char),
            LexerState::String { start } => Self::execute_string(source, start, next_char),
            LexerState::Comment => Self::execute_comment(next_char),
            LexerState::Operator { first } => Self::execute_operator(first, next_char),
        }
    }

    fn execute_normal(source: &str, next_char: &Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = *next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::Eof, source.len(), source.len()),
            };
        };

        let just = |kind: TokenKind| LexerStateTransition::ChangeStateAndEmit {
            new_state: LexerState::Normal,
            lexeme: emit(kind, c.offset, c.next_offset()),
        };

        match c.value {
            // Single character tokens
            '(' => just(TokenKind::LeftParenthesis),
            ')' => just(TokenKind::RightParenthesis),
            '[' => just(TokenKind::LeftBracket),
            ']' => just(TokenKind::RightBracket),
            '{' => just(TokenKind::LeftBrace),
            '}' => just(TokenKind::RightBrace),
            ',' => just(TokenKind::Comma),
            '.' => just(TokenKind::Dot),
            '-' => just(TokenKind::Minus),
            '+' => just(TokenKind::Plus),
            '*' => just(TokenKind::Star),
            '/' => just(TokenKind::Slash),
            '%' => just(TokenKind::Percent),
            // Possibly two character tokens
            '=' | '!' | '<' | '>' => LexerStateTransition::ChangeState(LexerState::Operator { first: c }),
            '"' => LexerStateTransition::ChangeState(LexerState::String { start: c.offset }),
            '#' => LexerStateTransition::ChangeState(LexerState::Comment),
            '0'..='9' => LexerStateTransition::ChangeState(LexerState::Number { start: c.offset }),
            v if is_ident_start(v) => {
                LexerStateTransition::ChangeState(LexerState::Ident { start: c.offset })
            }
            v if v.is_whitespace() => LexerStateTransition::Stay,
            v => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: Err(LexicalError {
                    kind: LexicalErrorKind::Unrecognized(v),
                    span: Span::new(c.offset, v.len_utf8()),
                }),
            },
        }
    }

    fn execute_ident(source: &str, start: usize, next_char: &Option<SourceChar>) -> LexerStateTransition {
        let lex = |end: usize| {
            let lexeme = &source[start..end];
            let kind = KEYWORD_HASHMAP
                .get(lexeme)
                .copied()
                .unwrap_or(TokenKind::Ident);
            emit(kind, start, end)
        };

        match *next_char {
            Some(c) if is_ident_continue(c.value) => LexerStateTransition::Stay,
            Some(c) => LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal,
                lexeme: lex(c.offset),
                put_back: c,
            },
            None => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: lex(source.len()),
            },
        }
    }

    fn execute_number(source: &str, start: usize, next_char: &Option<SourceChar>) -> LexerStateTransition {
        match *next_char {
            Some(c) if c.value.is_ascii_digit() => LexerStateTransition::Stay,
            Some(c) if c.value == '.' => {
                LexerStateTransition::ChangeState(LexerState::NumberDot { start, dot: c })
            }
            Some(c) => LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::NumericLiteral, start, c.offset),
                put_back: c,
            },
            None => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::NumericLiteral, start, source.len()),
            },
        }
    }

    // A dot only belongs to the number when a digit follows it.
    fn execute_number_dot(start: usize, dot: SourceChar, next_char: &Option<SourceChar>) -> LexerStateTransition {
        match *next_char {
            Some(c) if c.value.is_ascii_digit() => {
                LexerStateTransition::ChangeState(LexerState::Fraction { start })
            }
            Some(c) => LexerStateTransition::ChangeStateAndEmitAndPutBackTwo {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::NumericLiteral, start, dot.offset),
                put_back: (dot, c),
            },
            None => LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::NumericLiteral, start, dot.offset),
                put_back: dot,
            },
        }
    }

    fn execute_fraction(source: &str, start: usize, next_char: &Option<SourceChar>) -> LexerStateTransition {
        match *next_char {
            Some(c) if c.value.is_ascii_digit() => LexerStateTransition::Stay,
            Some(c) => LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::NumericLiteral, start, c.offset),
                put_back: c,
            },
            None => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::NumericLiteral, start, source.len()),
            },
        }
    }

    fn execute_string(source: &str, start: usize, next_char: &Option<SourceChar>) -> LexerStateTransition {
        match *next_char {
            Some(c) if c.value == '"' => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: emit(TokenKind::StringLiteral, start, c.next_offset()),
            },
            Some(_) => LexerStateTransition::Stay,
            None => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: Err(LexicalError {
                    kind: LexicalErrorKind::UnclosedString,
                    span: Span::new(start, source.len() - start),
                }),
            },
        }
    }

    fn execute_comment(next_char: &Option<SourceChar>) -> LexerStateTransition {
        match *next_char {
            Some(c) if c.value == '\n' => LexerStateTransition::ChangeState(LexerState::Normal),
            Some(_) => LexerStateTransition::Stay,
            // Let the normal state emit the end of file.
            None => LexerStateTransition::ChangeState(LexerState::Normal),
        }
    }

    fn execute_operator(first: SourceChar, next_char: &Option<SourceChar>) -> LexerStateTransition {
        let double = match first.value {
            '=' => TokenKind::EqualEqual,
            '<' => TokenKind::LessThanEqual,
            '>' => TokenKind::GreaterThanEqual,
            _ => TokenKind::BangEqual,
        };
        let single = match first.value {
            '=' => Ok(TokenKind::Equal),
            '<' => Ok(TokenKind::LessThan),
            '>' => Ok(TokenKind::GreaterThan),
            v => Err(LexicalError {
                kind: LexicalErrorKind::Unrecognized(v),
                span: Span::new(first.offset, v.len_utf8()),
            }),
        };
        let single = single.map(|kind| (kind, Span::new(first.offset, 1)));

        match *next_char {
            Some(c) if c.value == '=' => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: emit(double, first.offset, c.next_offset()),
            },
            Some(c) => LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal,
                lexeme: single,
                put_back: c,
            },
            None => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal,
                lexeme: single,
            },
        }
    }
}
