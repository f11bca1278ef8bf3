use crate::ast::{Function, Prototype, Stmt, VarBinding};
use crate::lexer::TokenKind;
use crate::source::TokenSource;
use crate::types::{Param, Type};
use tracing::debug;

use super::{ParseError, Parser};

impl<S: TokenSource> Parser<S> {
    pub fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind()? {
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Var => self.parse_var_statement(),
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::Empty)
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::ExprStmt(expr))
            }
        }
    }

    /// `{ stmt* }`
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.consume(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::RBrace => break,
                TokenKind::Eof => return Err(self.unexpected("'}'")?),
                _ => stmts.push(self.parse_statement()?),
            }
        }
        self.consume(TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::Return, "'return'")?;
        if self.match_token(TokenKind::Semicolon)? {
            return Ok(Stmt::Return(None));
        }
        let value = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "';' after return value")?;
        Ok(Stmt::Return(Some(value)))
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::If, "'if'")?;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.match_token(TokenKind::Else)? {
            // `else if` chains nest as a single-statement else block
            if self.check(TokenKind::If)? {
                vec![self.parse_if_statement()?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };
        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::For, "'for'")?;
        let var = self.consume_identifier()?;
        self.consume(TokenKind::Assign, "'=' after loop variable")?;
        let init = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "';' after loop initializer")?;
        let condition = self.parse_expression()?;

        let step = if self.match_token(TokenKind::Semicolon)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Stmt::For { var, init, condition, step, body })
    }

    fn parse_var_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::Var, "'var'")?;
        let mut bindings = Vec::new();
        loop {
            let name = self.consume_identifier()?;
            let ty = if self.match_token(TokenKind::Colon)? {
                Some(self.consume_value_type()?)
            } else {
                None
            };
            // Parse the initializer above `=` so the binding's own `=` is not
            // folded into an assignment expression.
            let init = if self.match_token(TokenKind::Assign)? {
                let lhs = self.parse_primary()?;
                Some(self.parse_binop_rhs(3, lhs)?)
            } else {
                None
            };
            bindings.push(VarBinding { name, ty, init });

            if !self.match_token(TokenKind::Comma)? {
                break;
            }
        }
        self.consume(TokenKind::Semicolon, "';' after var bindings")?;
        let body = self.parse_block()?;
        Ok(Stmt::Var { bindings, body })
    }

    /// `IDENT ( params ) (: TYPE)?`. The return type defaults to `num`.
    pub(crate) fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let name = self.consume_identifier()?;
        self.consume(TokenKind::LParen, "'(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen)? {
            loop {
                let param_name = self.consume_identifier()?;
                self.consume(TokenKind::Colon, "':' after parameter name")?;
                let ty = self.consume_value_type()?;
                params.push(Param::new(param_name, ty));
                if !self.match_token(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "')' after parameters")?;

        let return_type = if self.match_token(TokenKind::Colon)? {
            self.consume_return_type()?
        } else {
            Type::Num
        };
        Ok(Prototype::new(name, params, return_type))
    }

    pub fn parse_function_definition(&mut self) -> Result<Function, ParseError> {
        self.consume(TokenKind::Fn, "'fn'")?;
        let proto = self.parse_prototype()?;
        let body = self.parse_block()?;
        debug!(name = %proto.name, stmts = body.len(), "parsed function definition");
        Ok(Function { proto, body })
    }

    pub fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        self.consume(TokenKind::Extern, "'extern'")?;
        let proto = self.parse_prototype()?;
        self.consume(TokenKind::Semicolon, "';' after extern declaration")?;
        debug!(name = %proto.name, "parsed extern");
        Ok(proto)
    }
}
