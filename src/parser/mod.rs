mod error;
pub mod expression;
pub mod formatter;
pub mod statement;

pub use error::{ParserError, ParserErrorKind};
use expression::{
    AdditiveOperator, Atom, ComparisonOperator, DictionaryEntry, DictionaryKey, Expression,
    ExpressionKind, LogicalOperator, MultiplicativeOperator,
};
use statement::{Assignment, AssignmentTarget, ConditionalBranch, FunctionDecl, Statement};

use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::string::Ident;
use std::fmt::Display;
use std::sync::Arc;

/// A parsed source file: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn get_statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "programa")
    }
}

/// Recursive descent parser over a fully lexed token buffer.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    tokens: Vec<Token>,
    cursor: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            tokens: Vec::new(),
            cursor: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParserError> {
        self.tokenize()?;
        let mut statements = Vec::new();
        while !matches!(self.peek().kind, TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Program {
            statements,
            span: Span::new(0, self.lexer.get_source().len()),
        })
    }

    /// Parses a single expression spanning the whole source.
    pub fn parse_expression_only(&mut self) -> Result<Expression, ParserError> {
        self.tokenize()?;
        let expression = self.parse_expression()?;
        self.expect(TokenKind::Eof)?;
        Ok(expression)
    }

    fn tokenize(&mut self) -> Result<(), ParserError> {
        self.tokens.clear();
        self.cursor = 0;
        loop {
            let token = self.lexer.next_token()?;
            let done = matches!(token.kind, TokenKind::Eof);
            self.tokens.push(token);
            if done {
                return Ok(());
            }
        }
    }
}

// Token cursor
impl<'src> Parser<'src> {
    fn peek_nth(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.cursor + offset).min(last)]
    }

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.cursor += 1;
        }
        token
    }

    fn snapshot(&self) -> usize {
        self.cursor
    }

    fn rewind(&mut self, snapshot: usize) {
        self.cursor = snapshot;
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let token = self.peek().clone();
        if token.kind == expected {
            self.advance();
            Ok(token)
        } else if matches!(token.kind, TokenKind::Eof) {
            Err(ParserError {
                kind: ParserErrorKind::UnexpectedEof,
                span: token.span,
            })
        } else {
            Err(ParserError {
                kind: ParserErrorKind::UnexpectedToken {
                    actual: token.kind,
                    expected,
                },
                span: token.span,
            })
        }
    }

    fn eat_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    fn lexeme(&self, token: &Token) -> &'src str {
        self.lexer.get_lexeme(&token.span).unwrap_or_default()
    }

    fn expect_ident(&mut self) -> Result<Ident, ParserError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident::new(self.lexeme(&token), token.span))
    }

    fn non_expression(token: &Token) -> ParserError {
        let kind = match token.kind {
            TokenKind::Eof => ParserErrorKind::UnexpectedEof,
            kind => ParserErrorKind::NonExpression(kind),
        };
        ParserError {
            kind,
            span: token.span,
        }
    }
}

// Statement parser
impl<'src> Parser<'src> {
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::KeywordDeclare => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(TokenKind::Equal)?;
                let value = self.parse_expression()?;
                let span = token.span.merge(&value.span);
                Ok(Statement::Declaration { name, value, span })
            }
            TokenKind::KeywordBlock => {
                self.advance();
                let body = self.parse_body()?;
                let end = self.expect(TokenKind::KeywordEnd)?;
                Ok(Statement::Block {
                    body,
                    span: token.span.merge(&end.span),
                })
            }
            TokenKind::KeywordWhile => {
                self.advance();
                let condition = self.parse_expression()?;
                self.expect(TokenKind::KeywordDo)?;
                let body = self.parse_body()?;
                let end = self.expect(TokenKind::KeywordEnd)?;
                Ok(Statement::While {
                    condition,
                    body,
                    span: token.span.merge(&end.span),
                })
            }
            TokenKind::KeywordFor => self.parse_for(),
            TokenKind::KeywordFunction if self.peek_nth(1).kind == TokenKind::Ident => {
                let declaration = self.parse_function(true)?;
                Ok(Statement::Function(Arc::new(declaration)))
            }
            TokenKind::KeywordIf => self.parse_if(),
            TokenKind::KeywordBreak => {
                self.advance();
                Ok(Statement::Break(token.span))
            }
            TokenKind::KeywordContinue => {
                self.advance();
                Ok(Statement::Continue(token.span))
            }
            TokenKind::KeywordReturn => self.parse_return(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_body(&mut self) -> Result<Vec<Statement>, ParserError> {
        let mut body = Vec::new();
        while !matches!(self.peek().kind, TokenKind::KeywordEnd) {
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParserError> {
        let expression = self.parse_expression()?;
        if self.eat_if(TokenKind::Equal).is_some() {
            let value = self.parse_expression()?;
            let span = expression.span.merge(&value.span);
            let target = Self::into_target(expression)?;
            Ok(Statement::Assignment(Assignment {
                target,
                value,
                span,
            }))
        } else {
            Ok(Statement::Expression(expression))
        }
    }

    fn parse_assignment(&mut self) -> Result<Assignment, ParserError> {
        let target = self.parse_expression()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expression()?;
        let span = target.span.merge(&value.span);
        Ok(Assignment {
            target: Self::into_target(target)?,
            value,
            span,
        })
    }

    fn into_target(expression: Expression) -> Result<AssignmentTarget, ParserError> {
        match expression.kind {
            ExpressionKind::Atom(Atom::Identifier(name)) => Ok(AssignmentTarget::Identifier(name)),
            ExpressionKind::Property { object, key } => Ok(AssignmentTarget::Property {
                object: *object,
                key: *key,
            }),
            _ => Err(ParserError {
                kind: ParserErrorKind::InvalidAssignmentTarget,
                span: expression.span,
            }),
        }
    }

    fn parse_for(&mut self) -> Result<Statement, ParserError> {
        let start = self.expect(TokenKind::KeywordFor)?;

        if self.eat_if(TokenKind::KeywordEach).is_some() {
            let key = self.expect_ident()?;
            self.expect(TokenKind::Comma)?;
            let value = self.expect_ident()?;
            self.expect(TokenKind::KeywordIn)?;
            let iterable = self.parse_expression()?;
            self.expect(TokenKind::KeywordDo)?;
            let body = self.parse_body()?;
            let end = self.expect(TokenKind::KeywordEnd)?;
            return Ok(Statement::IterativeFor {
                key,
                value,
                iterable,
                body,
                span: start.span.merge(&end.span),
            });
        }

        let variable = self.expect_ident()?;
        let from = match self.eat_if(TokenKind::KeywordFrom) {
            Some(_) => Some(self.parse_expression()?),
            None => None,
        };
        let until = match self.eat_if(TokenKind::KeywordUntil) {
            Some(_) => Some(self.parse_expression()?),
            None => None,
        };
        let step = match self.eat_if(TokenKind::KeywordOperate) {
            Some(_) => Some(self.parse_assignment()?),
            None => None,
        };
        self.expect(TokenKind::KeywordDo)?;
        let body = self.parse_body()?;
        let end = self.expect(TokenKind::KeywordEnd)?;
        Ok(Statement::NumericFor {
            variable,
            from,
            until,
            step,
            body,
            span: start.span.merge(&end.span),
        })
    }

    fn parse_if(&mut self) -> Result<Statement, ParserError> {
        let start = self.expect(TokenKind::KeywordIf)?;
        let mut branches = Vec::new();
        let mut end;

        loop {
            let condition = self.parse_expression()?;
            self.expect(TokenKind::KeywordDo)?;
            let body = self.parse_body()?;
            end = self.expect(TokenKind::KeywordEnd)?;
            branches.push(ConditionalBranch { condition, body });

            if self.eat_if(TokenKind::KeywordElseIf).is_none() {
                break;
            }
        }

        let otherwise = match self.eat_if(TokenKind::KeywordElse) {
            Some(_) => {
                self.expect(TokenKind::KeywordDo)?;
                let body = self.parse_body()?;
                end = self.expect(TokenKind::KeywordEnd)?;
                Some(body)
            }
            None => None,
        };

        Ok(Statement::If {
            branches,
            otherwise,
            span: start.span.merge(&end.span),
        })
    }

    // `retorna` takes an optional comma separated list, so the first expression is speculative.
    fn parse_return(&mut self) -> Result<Statement, ParserError> {
        let start = self.expect(TokenKind::KeywordReturn)?;
        let mut span = start.span;
        let mut values = Vec::new();

        let snapshot = self.snapshot();
        match self.parse_expression() {
            Ok(first) => {
                span = span.merge(&first.span);
                values.push(first);
                while self.eat_if(TokenKind::Comma).is_some() {
                    let value = self.parse_expression()?;
                    span = span.merge(&value.span);
                    values.push(value);
                }
            }
            Err(error) if self.snapshot() != snapshot => return Err(error),
            Err(_) => self.rewind(snapshot),
        }

        Ok(Statement::Return { values, span })
    }

    fn parse_function(&mut self, named: bool) -> Result<FunctionDecl, ParserError> {
        let start = self.expect(TokenKind::KeywordFunction)?;
        let name = if named {
            Some(self.expect_ident()?)
        } else {
            None
        };

        self.expect(TokenKind::LeftParenthesis)?;
        let mut parameters = Vec::new();
        while self.peek().kind == TokenKind::Ident {
            parameters.push(self.expect_ident()?);
            self.eat_if(TokenKind::Comma);
        }
        self.expect(TokenKind::RightParenthesis)?;

        let body = self.parse_body()?;
        let end = self.expect(TokenKind::KeywordEnd)?;
        Ok(FunctionDecl {
            name,
            parameters,
            body: body.into(),
            span: start.span.merge(&end.span),
        })
    }
}

// Expression parser
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        self.parse_logical()
    }

    fn parse_logical(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::KeywordAnd => LogicalOperator::And,
                TokenKind::KeywordOr => LogicalOperator::Or,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            let span = lhs.span.merge(&rhs.span);
            lhs = Expression::new(
                ExpressionKind::Logical {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::EqualEqual => ComparisonOperator::Equal,
                TokenKind::BangEqual => ComparisonOperator::NotEqual,
                TokenKind::GreaterThan => ComparisonOperator::GreaterThan,
                TokenKind::GreaterThanEqual => ComparisonOperator::GreaterThanEqual,
                TokenKind::LessThan => ComparisonOperator::LessThan,
                TokenKind::LessThanEqual => ComparisonOperator::LessThanEqual,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            let span = lhs.span.merge(&rhs.span);
            lhs = Expression::new(
                ExpressionKind::Comparison {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => AdditiveOperator::Add,
                TokenKind::Minus => AdditiveOperator::Subtract,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            let span = lhs.span.merge(&rhs.span);
            lhs = Expression::new(
                ExpressionKind::Additive {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => MultiplicativeOperator::Multiply,
                TokenKind::Slash => MultiplicativeOperator::Divide,
                TokenKind::Percent => MultiplicativeOperator::Modulo,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_factor()?;
            let span = lhs.span.merge(&rhs.span);
            lhs = Expression::new(
                ExpressionKind::Multiplicative {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    // Both `negar` and unary minus lower to the same negation node.
    fn parse_factor(&mut self) -> Result<Expression, ParserError> {
        match self.peek().kind {
            TokenKind::KeywordNot | TokenKind::Minus => {
                let token = self.advance();
                let operand = self.parse_factor()?;
                let span = token.span.merge(&operand.span);
                Ok(Expression::new(ExpressionKind::Not(Box::new(operand)), span))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParserError> {
        let mut expression = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LeftParenthesis => {
                    self.advance();
                    let arguments = self.parse_sequence(TokenKind::RightParenthesis)?;
                    let close = self.expect(TokenKind::RightParenthesis)?;
                    let span = expression.span.merge(&close.span);
                    expression = Expression::new(
                        ExpressionKind::Call {
                            callee: Box::new(expression),
                            arguments,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_ident()?;
                    let span = expression.span.merge(&name.span);
                    let key = Expression::new(ExpressionKind::Atom(Atom::String(name.name)), name.span);
                    expression = Expression::new(
                        ExpressionKind::Property {
                            object: Box::new(expression),
                            key: Box::new(key),
                        },
                        span,
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expression()?;
                    let close = self.expect(TokenKind::RightBracket)?;
                    let span = expression.span.merge(&close.span);
                    expression = Expression::new(
                        ExpressionKind::Property {
                            object: Box::new(expression),
                            key: Box::new(key),
                        },
                        span,
                    );
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParserError> {
        let token = self.peek().clone();
        let lexeme = self.lexeme(&token);

        let atom = match token.kind {
            TokenKind::NumericLiteral => Atom::Number(
                lexeme
                    .parse()
                    .expect("Numeric literal tokens are valid `f64`"),
            ),
            TokenKind::StringLiteral => Atom::String(
                lexeme
                    .get(1..lexeme.len() - 1)
                    .expect("String literal tokens are at least length 2.")
                    .into(),
            ),
            TokenKind::KeywordTrue => Atom::Bool(true),
            TokenKind::KeywordFalse => Atom::Bool(false),
            TokenKind::KeywordNull => Atom::Null,
            TokenKind::Ident => Atom::Identifier(Ident::new(lexeme, token.span)),
            TokenKind::LeftParenthesis => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParenthesis)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let items = self.parse_sequence(TokenKind::RightBracket)?;
                let close = self.expect(TokenKind::RightBracket)?;
                return Ok(Expression::new(
                    ExpressionKind::Array(items),
                    token.span.merge(&close.span),
                ));
            }
            TokenKind::LeftBrace => return self.parse_dictionary(),
            TokenKind::KeywordFunction => {
                let declaration = self.parse_function(false)?;
                let span = declaration.span;
                return Ok(Expression::new(
                    ExpressionKind::Function(Arc::new(declaration)),
                    span,
                ));
            }
            _ => return Err(Self::non_expression(&token)),
        };

        self.advance();
        Ok(Expression::new(ExpressionKind::Atom(atom), token.span))
    }

    // Separating commas are optional.
    fn parse_sequence(&mut self, close: TokenKind) -> Result<Vec<Expression>, ParserError> {
        let mut items = Vec::new();
        while self.peek().kind != close && !matches!(self.peek().kind, TokenKind::Eof) {
            items.push(self.parse_expression()?);
            self.eat_if(TokenKind::Comma);
        }
        Ok(items)
    }

    fn parse_dictionary(&mut self) -> Result<Expression, ParserError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut entries = Vec::new();

        while self.peek().kind != TokenKind::RightBrace {
            let key = if self.eat_if(TokenKind::LeftBracket).is_some() {
                let key = if self.peek().kind == TokenKind::Ident
                    && self.peek_nth(1).kind == TokenKind::RightBracket
                {
                    DictionaryKey::Name(self.expect_ident()?)
                } else {
                    DictionaryKey::Expression(self.parse_expression()?)
                };
                self.expect(TokenKind::RightBracket)?;
                key
            } else if self.peek().kind == TokenKind::Ident {
                DictionaryKey::Name(self.expect_ident()?)
            } else {
                return Err(Self::non_expression(&self.peek().clone()));
            };

            self.expect(TokenKind::Equal)?;
            let value = self.parse_expression()?;
            entries.push(DictionaryEntry { key, value });
            self.eat_if(TokenKind::Comma);
        }

        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Expression::new(
            ExpressionKind::Dictionary(entries),
            open.span.merge(&close.span),
        ))
    }
}
