//! Character stream to token stream.
//!
//! Lexing failures (an unknown character, an unterminated string) are fatal
//! for the whole program, so the lexer stops at the first one.

use std::fmt;

use crate::types::{map_builtin_type, Type};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("line {line}: can not lex character '{ch}'")]
    UnexpectedChar { line: usize, ch: char },
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
    #[error("line {line}: malformed number literal '{text}'")]
    MalformedNumber { line: usize, text: String },
    #[error("failed to read input: {0}")]
    Io(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Not,

    // Operators
    Plus,
    Minus,
    Mul,
    Div,
    Assign,
    PlusAssign,
    MinusAssign,
    MulAssign,
    DivAssign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Keywords
    Fn,
    Extern,
    If,
    Else,
    For,
    Return,
    Var,
    Type(Type),

    // Literals and identifiers
    Identifier,
    Number,
    Str,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Not => "'!'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Mul => "'*'",
            TokenKind::Div => "'/'",
            TokenKind::Assign => "'='",
            TokenKind::PlusAssign => "'+='",
            TokenKind::MinusAssign => "'-='",
            TokenKind::MulAssign => "'*='",
            TokenKind::DivAssign => "'/='",
            TokenKind::Equal => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Fn => "'fn'",
            TokenKind::Extern => "'extern'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::Return => "'return'",
            TokenKind::Var => "'var'",
            TokenKind::Type(ty) => return write!(f, "type '{ty}'"),
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Str => "string literal",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A token produced by the lexer. `text` carries the payload of identifiers,
/// numbers and string literals (without quotes) and is empty otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self { kind, text: text.into(), line }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "", line)
    }
}

#[derive(Debug, Default)]
pub struct Lexer {}

impl Lexer {
    pub fn new() -> Lexer {
        Lexer {}
    }

    /// Lex a whole source text, terminated by an `Eof` token.
    pub fn lex(&self, source: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = self.lex_fragment(source, 1)?;
        let line = tokens.last().map_or(1, |t| t.line);
        tokens.push(Token::eof(line));
        Ok(tokens)
    }

    /// Lex one fragment (for instance a single REPL line) without appending `Eof`.
    pub fn lex_fragment(&self, source: &str, first_line: usize) -> Result<Vec<Token>, LexError> {
        let chars: Vec<char> = source.chars().collect();
        let mut tokens = Vec::new();
        let mut current = 0;
        let mut line = first_line;

        while let Some(c) = self.peek(&chars, current) {
            if c == '\n' {
                line += 1;
                current += 1;
                continue;
            }
            if c.is_whitespace() {
                current += 1;
                continue;
            }
            // Line comments
            if c == '/' && self.peek_n(&chars, current, 1) == Some('/') {
                while let Some(ch) = self.peek(&chars, current) {
                    if ch == '\n' {
                        break;
                    }
                    current += 1;
                }
                continue;
            }

            match c {
                '(' | ')' | '{' | '}' | '[' | ']' | ',' | ':' | ';' | '.' => {
                    let kind = match c {
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        ';' => TokenKind::Semicolon,
                        _ => TokenKind::Dot,
                    };
                    tokens.push(Token::new(kind, "", line));
                    current += 1;
                }
                '+' | '-' | '*' | '/' | '=' | '<' | '>' | '!' => {
                    let with_eq = self.peek_n(&chars, current, 1) == Some('=');
                    let kind = match (c, with_eq) {
                        ('+', false) => TokenKind::Plus,
                        ('+', true) => TokenKind::PlusAssign,
                        ('-', false) => TokenKind::Minus,
                        ('-', true) => TokenKind::MinusAssign,
                        ('*', false) => TokenKind::Mul,
                        ('*', true) => TokenKind::MulAssign,
                        ('/', false) => TokenKind::Div,
                        ('/', true) => TokenKind::DivAssign,
                        ('=', false) => TokenKind::Assign,
                        ('=', true) => TokenKind::Equal,
                        ('<', false) => TokenKind::Less,
                        ('<', true) => TokenKind::LessEqual,
                        ('>', false) => TokenKind::Greater,
                        ('>', true) => TokenKind::GreaterEqual,
                        ('!', false) => TokenKind::Not,
                        _ => TokenKind::NotEqual,
                    };
                    tokens.push(Token::new(kind, "", line));
                    current += if with_eq { 2 } else { 1 };
                }
                '"' => {
                    let (literal, new_current) = self.parse_string(&chars, current, line)?;
                    tokens.push(Token::new(TokenKind::Str, literal, line));
                    current = new_current;
                }
                '0'..='9' => {
                    let (num, new_current) = self.parse_number(&chars, current, line)?;
                    tokens.push(Token::new(TokenKind::Number, num, line));
                    current = new_current;
                }
                c if c.is_alphabetic() || c == '_' => {
                    let (identifier_name, new_current) = self.parse_identifier(&chars, current);
                    tokens.push(self.keyword_or_identifier(identifier_name, line));
                    current = new_current;
                }
                other => return Err(LexError::UnexpectedChar { line, ch: other }),
            }
        }
        Ok(tokens)
    }

    fn keyword_or_identifier(&self, name: String, line: usize) -> Token {
        let kind = match name.as_str() {
            "fn" => TokenKind::Fn,
            "extern" => TokenKind::Extern,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "var" => TokenKind::Var,
            other => match map_builtin_type(other) {
                Some(ty) => TokenKind::Type(ty),
                None => return Token::new(TokenKind::Identifier, name, line),
            },
        };
        Token::new(kind, "", line)
    }

    // Look at the current character without consuming it
    fn peek(&self, chars: &[char], current: usize) -> Option<char> {
        chars.get(current).copied()
    }

    // Look ahead n characters without consuming
    fn peek_n(&self, chars: &[char], current: usize, n: usize) -> Option<char> {
        chars.get(current + n).copied()
    }

    fn parse_number(&self, chars: &[char], start: usize, line: usize) -> Result<(String, usize), LexError> {
        let mut num_str = String::new();
        let mut current = start;
        let mut has_dot = false;

        while let Some(ch) = self.peek(chars, current) {
            if ch.is_ascii_digit() {
                num_str.push(ch);
            } else if ch == '.' && !has_dot {
                has_dot = true;
                num_str.push(ch);
            } else {
                break;
            }
            current += 1;
        }

        // `1.2.3` or `12abc` are not numbers
        match self.peek(chars, current) {
            Some(ch) if ch == '.' || ch.is_alphabetic() || ch == '_' => {
                num_str.push(ch);
                Err(LexError::MalformedNumber { line, text: num_str })
            }
            _ => Ok((num_str, current)),
        }
    }

    fn parse_identifier(&self, chars: &[char], start: usize) -> (String, usize) {
        let mut ident_str = String::new();
        let mut current = start;
        while let Some(ch) = self.peek(chars, current) {
            if ch.is_alphanumeric() || ch == '_' {
                ident_str.push(ch);
                current += 1;
            } else {
                break;
            }
        }
        (ident_str, current)
    }

    fn parse_string(&self, chars: &[char], start: usize, line: usize) -> Result<(String, usize), LexError> {
        let mut literal = String::new();
        // skip opening quote
        let mut current = start + 1;
        loop {
            match self.peek(chars, current) {
                Some('"') => return Ok((literal, current + 1)),
                Some(ch) => {
                    literal.push(ch);
                    current += 1;
                }
                None => return Err(LexError::UnterminatedString { line }),
            }
        }
    }
}
