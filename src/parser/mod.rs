//! Recursive-descent parser with precedence climbing for binary operators.
//!
//! ```text
//! item      → "fn" prototype block | "extern" prototype ";" | statement
//! prototype → IDENT "(" ( IDENT ":" TYPE ( "," IDENT ":" TYPE )* )? ")" ( ":" TYPE )?
//! statement → "return" expr? ";"
//!           | "if" expr block ( "else" block )?
//!           | "for" IDENT "=" expr ";" expr ( ";" expr )? block
//!           | "var" binding ( "," binding )* ";" block
//!           | ";"
//!           | expr ";"
//! binding   → IDENT ( ":" TYPE )? ( "=" expr )?
//! expr      → primary ( binop primary )*
//! primary   → IDENT ( "(" args ")" )? | NUMBER | STRING | "(" expr ")"
//!           | "if" expr "{" expr "}" "else" "{" expr "}"
//! ```
//!
//! Most grammar violations are fatal for the whole program. The one
//! exception is a missing primary expression, which the driver recovers from
//! by skipping a token.

mod expressions;
mod statements;

use crate::ast::Item;
use crate::lexer::{LexError, Token, TokenKind};
use crate::source::TokenSource;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: TokenKind,
    },
    #[error("line {line}: expected expression, found {found}")]
    ExpectedExpression { line: usize, found: TokenKind },
    #[error("line {line}: invalid number literal '{text}'")]
    InvalidNumber { line: usize, text: String },
}

impl ParseError {
    /// Fatal errors end the program; the rest only abort the current top-level item.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParseError::ExpectedExpression { .. })
    }
}

pub struct Parser<S> {
    source: S,
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Parser { source }
    }

    /// Parse one top-level construct. Returns `None` at end of input.
    pub fn parse_top_level_item(&mut self) -> Result<Option<Item>, ParseError> {
        match self.peek_kind()? {
            TokenKind::Eof => Ok(None),
            TokenKind::Fn => Ok(Some(Item::Function(self.parse_function_definition()?))),
            TokenKind::Extern => Ok(Some(Item::Extern(self.parse_extern()?))),
            _ => Ok(Some(Item::Stmt(self.parse_statement()?))),
        }
    }

    /// Parse every item up to end of input, stopping at the first error.
    pub fn parse_program(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        while let Some(item) = self.parse_top_level_item()? {
            items.push(item);
        }
        Ok(items)
    }

    /// Error recovery: drop the current token.
    pub fn skip_token(&mut self) -> Result<(), ParseError> {
        self.advance()
    }

    // Token utility methods

    pub(crate) fn peek(&mut self) -> Result<&Token, ParseError> {
        Ok(self.source.peek()?)
    }

    pub(crate) fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.source.peek()?.kind)
    }

    pub(crate) fn advance(&mut self) -> Result<(), ParseError> {
        Ok(self.source.advance()?)
    }

    /// Take the current token and move past it.
    pub(crate) fn bump(&mut self) -> Result<Token, ParseError> {
        let token = self.peek()?.clone();
        self.advance()?;
        Ok(token)
    }

    pub(crate) fn check(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        Ok(self.peek_kind()? == kind)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.check(kind)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn consume(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.check(kind)? {
            self.bump()
        } else {
            Err(self.unexpected(expected)?)
        }
    }

    pub(crate) fn consume_identifier(&mut self) -> Result<String, ParseError> {
        Ok(self.consume(TokenKind::Identifier, "identifier")?.text)
    }

    /// A type keyword usable for a value (parameters, variables).
    pub(crate) fn consume_value_type(&mut self) -> Result<Type, ParseError> {
        match self.peek_kind()? {
            TokenKind::Type(ty) if ty.is_value() => {
                self.advance()?;
                Ok(ty)
            }
            _ => Err(self.unexpected("value type")?),
        }
    }

    pub(crate) fn consume_return_type(&mut self) -> Result<Type, ParseError> {
        match self.peek_kind()? {
            TokenKind::Type(ty) => {
                self.advance()?;
                Ok(ty)
            }
            _ => Err(self.unexpected("type")?),
        }
    }

    pub(crate) fn unexpected(&mut self, expected: &'static str) -> Result<ParseError, ParseError> {
        let token = self.peek()?;
        Ok(ParseError::Unexpected { line: token.line, expected, found: token.kind })
    }
}
