use crate::ast::{BinaryOp, Expr};
use crate::lexer::TokenKind;
use crate::source::TokenSource;

use super::{ParseError, Parser};

/// Binary operator spelled by `kind`, if any.
pub(crate) fn binop_of(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Plus,
        TokenKind::Minus => BinaryOp::Minus,
        TokenKind::Mul => BinaryOp::Mul,
        TokenKind::Div => BinaryOp::Div,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Equal => BinaryOp::Equality,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Assign => BinaryOp::Assign,
        _ => return None,
    };
    Some(op)
}

impl<S: TokenSource> Parser<S> {
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_primary()?;
        self.parse_binop_rhs(0, lhs)
    }

    /// Precedence of the current token, -1 when it is not a binary operator.
    fn token_precedence(&mut self) -> Result<i32, ParseError> {
        Ok(binop_of(self.peek_kind()?).map_or(-1, |op| op.precedence()))
    }

    /// Fold `(op primary)*` onto `lhs` while operators bind at least as
    /// tightly as `min_prec`. Equal precedence associates to the left.
    pub(crate) fn parse_binop_rhs(&mut self, min_prec: i32, mut lhs: Expr) -> Result<Expr, ParseError> {
        loop {
            let Some(op) = binop_of(self.peek_kind()?) else {
                return Ok(lhs);
            };
            let prec = op.precedence();
            if prec < min_prec {
                return Ok(lhs);
            }
            self.advance()?;

            let mut rhs = self.parse_primary()?;
            if prec < self.token_precedence()? {
                rhs = self.parse_binop_rhs(prec + 1, rhs)?;
            }
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Identifier => {
                self.advance()?;
                if self.check(TokenKind::LParen)? {
                    let args = self.parse_call_arguments()?;
                    Ok(Expr::Call { callee: token.text, args })
                } else {
                    Ok(Expr::Variable(token.text))
                }
            }
            TokenKind::Number => {
                self.advance()?;
                token
                    .text
                    .parse::<f64>()
                    .map(Expr::Number)
                    .map_err(|_| ParseError::InvalidNumber { line: token.line, text: token.text })
            }
            TokenKind::Str => {
                self.advance()?;
                Ok(Expr::XString(token.text))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::If => self.parse_if_expression(),
            found => Err(ParseError::ExpectedExpression { line: token.line, found }),
        }
    }

    fn parse_call_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.consume(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.match_token(TokenKind::RParen)? {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.match_token(TokenKind::RParen)? {
                return Ok(args);
            }
            self.consume(TokenKind::Comma, "',' or ')' in argument list")?;
        }
    }

    /// `if c { a } else { b }` in expression position. Each branch holds a
    /// single expression and the else branch is required.
    fn parse_if_expression(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenKind::If, "'if'")?;
        let condition = self.parse_expression()?;

        self.consume(TokenKind::LBrace, "'{'")?;
        let then_branch = self.parse_expression()?;
        self.consume(TokenKind::RBrace, "'}'")?;

        self.consume(TokenKind::Else, "'else'")?;
        self.consume(TokenKind::LBrace, "'{'")?;
        let else_branch = self.parse_expression()?;
        self.consume(TokenKind::RBrace, "'}'")?;

        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }
}
