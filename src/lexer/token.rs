use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// Reserved words. Accented spellings are aliases of the plain ones.
const KEYWORDS: [(&str, TokenKind); 28] = [
    ("faca", TokenKind::KeywordDo),
    ("faça", TokenKind::KeywordDo),
    ("fim", TokenKind::KeywordEnd),
    ("parar", TokenKind::KeywordBreak),
    ("continuar", TokenKind::KeywordContinue),
    ("retorna", TokenKind::KeywordReturn),
    ("declarar", TokenKind::KeywordDeclare),
    ("bloco", TokenKind::KeywordBlock),
    ("enquanto", TokenKind::KeywordWhile),
    ("para", TokenKind::KeywordFor),
    ("funcao", TokenKind::KeywordFunction),
    ("função", TokenKind::KeywordFunction),
    ("se", TokenKind::KeywordIf),
    ("caso", TokenKind::KeywordElseIf),
    ("senao", TokenKind::KeywordElse),
    ("senão", TokenKind::KeywordElse),
    ("e", TokenKind::KeywordAnd),
    ("ou", TokenKind::KeywordOr),
    ("de", TokenKind::KeywordFrom),
    ("ate", TokenKind::KeywordUntil),
    ("até", TokenKind::KeywordUntil),
    ("opere", TokenKind::KeywordOperate),
    ("cada", TokenKind::KeywordEach),
    ("em", TokenKind::KeywordIn),
    ("negar", TokenKind::KeywordNot),
    ("verdadeiro", TokenKind::KeywordTrue),
    ("falso", TokenKind::KeywordFalse),
    ("nulo", TokenKind::KeywordNull),
];

pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> =
    LazyLock::new(|| KEYWORDS.into_iter().collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: usize,
    /// The length of the token in bytes.
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            length: end - start,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Parentheses
    LeftParenthesis,
    RightParenthesis,
    // Brackets
    LeftBracket,
    RightBracket,
    // Braces
    LeftBrace,
    RightBrace,
    // Miscellaneous
    Comma,
    Dot,
    Minus,
    Plus,
    Star,
    Slash,
    Percent,
    // Operators
    Equal,
    EqualEqual,
    BangEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,

    // Literals
    NumericLiteral,
    StringLiteral,
    Ident,

    // Keywords
    KeywordDo,
    KeywordEnd,
    KeywordBreak,
    KeywordContinue,
    KeywordReturn,
    KeywordDeclare,
    KeywordBlock,
    KeywordWhile,
    KeywordFor,
    KeywordFunction,
    KeywordIf,
    KeywordElseIf,
    KeywordElse,
    KeywordAnd,
    KeywordOr,
    KeywordFrom,
    KeywordUntil,
    KeywordOperate,
    KeywordEach,
    KeywordIn,
    KeywordNot,
    KeywordTrue,
    KeywordFalse,
    KeywordNull,

    // End of file.
    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| kind == self)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "LEFT_PAREN"),
            TokenKind::RightParenthesis => write!(f, "RIGHT_PAREN"),
            TokenKind::LeftBracket => write!(f, "LEFT_BRACKET"),
            TokenKind::RightBracket => write!(f, "RIGHT_BRACKET"),
            TokenKind::LeftBrace => write!(f, "LEFT_BRACE"),
            TokenKind::RightBrace => write!(f, "RIGHT_BRACE"),
            TokenKind::Comma => write!(f, "COMMA"),
            TokenKind::Dot => write!(f, "DOT"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Star => write!(f, "STAR"),
            TokenKind::Slash => write!(f, "SLASH"),
            TokenKind::Percent => write!(f, "PERCENT"),
            TokenKind::Equal => write!(f, "EQUAL"),
            TokenKind::EqualEqual => write!(f, "EQUAL_EQUAL"),
            TokenKind::BangEqual => write!(f, "BANG_EQUAL"),
            TokenKind::LessThan => write!(f, "LESS"),
            TokenKind::LessThanEqual => write!(f, "LESS_EQUAL"),
            TokenKind::GreaterThan => write!(f, "GREATER"),
            TokenKind::GreaterThanEqual => write!(f, "GREATER_EQUAL"),
            TokenKind::NumericLiteral => write!(f, "NUMBER"),
            TokenKind::StringLiteral => write!(f, "STRING"),
            TokenKind::Ident => write!(f, "IDENTIFIER"),
            TokenKind::KeywordDo => write!(f, "DO"),
            TokenKind::KeywordEnd => write!(f, "END"),
            TokenKind::KeywordBreak => write!(f, "BREAK"),
            TokenKind::KeywordContinue => write!(f, "CONTINUE"),
            TokenKind::KeywordReturn => write!(f, "RETURN"),
            TokenKind::KeywordDeclare => write!(f, "DECLARE"),
            TokenKind::KeywordBlock => write!(f, "BLOCK"),
            TokenKind::KeywordWhile => write!(f, "WHILE"),
            TokenKind::KeywordFor => write!(f, "FOR"),
            TokenKind::KeywordFunction => write!(f, "FUNCTION"),
            TokenKind::KeywordIf => write!(f, "IF"),
            TokenKind::KeywordElseIf => write!(f, "ELSE_IF"),
            TokenKind::KeywordElse => write!(f, "ELSE"),
            TokenKind::KeywordAnd => write!(f, "AND"),
            TokenKind::KeywordOr => write!(f, "OR"),
            TokenKind::KeywordFrom => write!(f, "FROM"),
            TokenKind::KeywordUntil => write!(f, "UNTIL"),
            TokenKind::KeywordOperate => write!(f, "OPERATE"),
            TokenKind::KeywordEach => write!(f, "EACH"),
            TokenKind::KeywordIn => write!(f, "IN"),
            TokenKind::KeywordNot => write!(f, "NOT"),
            TokenKind::KeywordTrue => write!(f, "TRUE"),
            TokenKind::KeywordFalse => write!(f, "FALSE"),
            TokenKind::KeywordNull => write!(f, "NULL"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: u32,
}
