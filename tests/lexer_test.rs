use pardal::lexer::{
    formatter::{BasicFormatter, TokenFormatter},
    Lexer, LexicalErrorKind, Token, TokenKind,
};
use proptest::prelude::*;

fn check(input: &str, expected: &str) {
    let mut lexer = Lexer::new(input);
    let formatter = BasicFormatter::new(input);
    let mut buffer = String::new();
    loop {
        match lexer.next_token() {
            Ok(token) => {
                buffer.push_str(&formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
            Err(error) => {
                buffer.push_str(&formatter.format_error(&error));
            }
        }
        buffer.push('\n');
    }

    assert_eq!(buffer, expected, "Failed on input {input:?}");
}

fn kinds(input: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(input);
    let mut kinds = Vec::new();
    loop {
        let token = lexer.next_token().expect("Input is valid");
        kinds.push(token.kind);
        if matches!(token.kind, TokenKind::Eof) {
            return kinds;
        }
    }
}

#[test]
fn smoke_test() {
    check("", "(1) EOF  null");
}

#[test]
fn test_declaration() {
    check(
        "declarar x = 12",
        "(1) DECLARE declarar null\n(1) IDENTIFIER x null\n(1) EQUAL = null\n(1) NUMBER 12 12.0\n(1) EOF  null",
    );
}

#[test]
fn test_literals() {
    check(
        "3.5 \"ola mundo\" verdadeiro falso nulo",
        "(1) NUMBER 3.5 3.5\n(1) STRING \"ola mundo\" ola mundo\n(1) TRUE verdadeiro null\n(1) FALSE falso null\n(1) NULL nulo null\n(1) EOF  null",
    );
}

#[test]
fn test_number_followed_by_dot() {
    assert_eq!(
        kinds("3.x"),
        vec![
            TokenKind::NumericLiteral,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_operators() {
    assert_eq!(
        kinds("== != > >= < <= = + - * / % . , ( ) [ ] { }"),
        vec![
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::GreaterThan,
            TokenKind::GreaterThanEqual,
            TokenKind::LessThan,
            TokenKind::LessThanEqual,
            TokenKind::Equal,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::LeftParenthesis,
            TokenKind::RightParenthesis,
            TokenKind::LeftBracket,
            TokenKind::RightBracket,
            TokenKind::LeftBrace,
            TokenKind::RightBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_accented_keywords() {
    assert_eq!(kinds("faça"), kinds("faca"));
    assert_eq!(kinds("função"), kinds("funcao"));
    assert_eq!(kinds("senão"), kinds("senao"));
    assert_eq!(kinds("até"), kinds("ate"));
    assert!(kinds("opere")[0].is_keyword());
    assert!(!kinds("operar")[0].is_keyword());
}

#[test]
fn test_comments_and_lines() {
    check(
        "# comentario\nx # outro\n\ny",
        "(2) IDENTIFIER x null\n(4) IDENTIFIER y null\n(4) EOF  null",
    );
}

#[test]
fn test_unrecognized_character() {
    check(
        "x @ y",
        "(1) IDENTIFIER x null\n(1) ERROR UNEXPECTED_CHAR @\n(1) IDENTIFIER y null\n(1) EOF  null",
    );
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("\"aberta");
    let error = lexer.next_token().expect_err("String is never closed");
    assert_eq!(error.kind, LexicalErrorKind::UnclosedString);
    assert_eq!(error.code(), "LX002");
}

#[test]
fn test_eof_repeats() {
    let mut lexer = Lexer::new("x");
    assert!(matches!(
        lexer.next_token(),
        Ok(Token {
            kind: TokenKind::Ident,
            ..
        })
    ));
    for _ in 0..3 {
        assert!(matches!(
            lexer.next_token(),
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            })
        ));
    }
}

// Property-based tests

fn symbol_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just("-".to_string()),
        Just("+".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        Just("%".to_string()),
        Just("!=".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("<".to_string()),
        Just("<=".to_string()),
        Just(">".to_string()),
        Just(">=".to_string()),
    ]
}

fn numeric_literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]+".prop_map(|s| s),          // Integer literals
        "[0-9]+\\.[0-9]+".prop_map(|s| s)  // Decimal literals
    ]
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    "[^\"]*".prop_map(|s: String| format!("\"{}\"", s))
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]*".prop_filter("Keywords are not identifiers", |s| {
        !pardal::lexer::KEYWORD_HASHMAP.contains_key(s.as_str())
    })
}

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(
        pardal::lexer::KEYWORD_HASHMAP
            .keys()
            .map(|keyword| keyword.to_string())
            .collect::<Vec<_>>(),
    )
}

fn comment_strategy() -> impl Strategy<Value = String> {
    "[^\n]*".prop_map(|s: String| format!("#{}\n", s))
}

fn token_sequence_with_comments_strategy() -> impl Strategy<Value = String> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            numeric_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
            comment_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
    .prop_map(|tokens| tokens.join(" "))
}

fn token_sequence_without_comments_strategy() -> impl Strategy<Value = Vec<String>> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            numeric_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
}

proptest! {
    #[test]
    fn lexer_handles_valid_tokens_without_comments(input in token_sequence_without_comments_strategy()) {
        // Add 1 to include EOF token
        let expected_num_tokens = input.len() + 1;
        let input = input.join(" ");
        let mut lexer = Lexer::new(&input);
        let mut num_tokens = 0;
        loop {
            num_tokens += 1;
            match lexer.next_token() {
                Ok(Token { kind: TokenKind::Eof, .. }) => break,
                token => prop_assert!(token.is_ok()),
            }
        }
        prop_assert_eq!(num_tokens, expected_num_tokens);
    }

    #[test]
    fn lexer_handles_valid_tokens_with_comments(input in token_sequence_with_comments_strategy()) {
        let mut lexer = Lexer::new(&input);
        loop {
            match lexer.next_token() {
                Ok(Token { kind: TokenKind::Eof, .. }) => break,
                token => prop_assert!(token.is_ok()),
            }
        }
    }

    #[test]
    fn spans_cover_their_lexemes(input in token_sequence_without_comments_strategy()) {
        let joined = input.join(" ");
        let mut lexer = Lexer::new(&joined);
        for expected in input.iter() {
            let token = lexer.next_token().expect("Input is valid");
            prop_assert_eq!(lexer.get_lexeme(&token.span), Some(expected.as_str()));
        }
    }
}
