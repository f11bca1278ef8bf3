//! Token sources consumed by the parser.
//!
//! Two modes exist: [`TokenBuffer`] holds a whole, already lexed input and
//! [`LineSource`] lexes one line of an interactive stream whenever its buffer
//! runs dry. Both report end of input with a sticky `Eof` token.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::lexer::{LexError, Lexer, Token, TokenKind};

pub trait TokenSource {
    /// Current token. Blocks on input in interactive mode.
    fn peek(&mut self) -> Result<&Token, LexError>;

    /// Move past the current token. Advancing at `Eof` is a no-op.
    fn advance(&mut self) -> Result<(), LexError>;
}

/// Bounded token stream for whole-file compilation.
#[derive(Debug)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenBuffer {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }
        Self { tokens, pos: 0 }
    }

    pub fn from_source(source: &str) -> Result<Self, LexError> {
        Ok(Self::new(Lexer::new().lex(source)?))
    }
}

impl TokenSource for TokenBuffer {
    fn peek(&mut self) -> Result<&Token, LexError> {
        // `new` guarantees a trailing Eof and `advance` never moves past it
        Ok(&self.tokens[self.pos])
    }

    fn advance(&mut self) -> Result<(), LexError> {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        Ok(())
    }
}

pub const PROMPT: &str = "ready> ";

/// Line-oriented input for [`LineSource`].
pub trait LineRead {
    /// Append one line to `buf`. Returns 0 at end of input.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl<R: BufRead> LineRead for R {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Process stdin, locked only while a line is being read. Running code
/// (`scand`) reads the same stream between lines.
#[derive(Debug)]
pub struct StdinLines(io::Stdin);

impl StdinLines {
    pub fn new() -> Self {
        StdinLines(io::stdin())
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LineRead for StdinLines {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.0.read_line(buf)
    }
}

/// Interactive token stream: one line of input is read and lexed on demand.
pub struct LineSource<R, W> {
    input: R,
    prompt_out: W,
    lexer: Lexer,
    buffer: VecDeque<Token>,
    line: usize,
    finished: bool,
}

impl<R: LineRead, W: Write> LineSource<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self {
            input,
            prompt_out,
            lexer: Lexer::new(),
            buffer: VecDeque::new(),
            line: 0,
            finished: false,
        }
    }

    /// Read lines until at least one token is buffered or input ends.
    fn fill(&mut self) -> Result<(), LexError> {
        while self.buffer.is_empty() {
            if self.finished {
                self.buffer.push_back(Token::eof(self.line));
                return Ok(());
            }
            // Prompt output is cosmetic, a broken pipe must not stop the session
            let _ = write!(self.prompt_out, "{PROMPT}");
            let _ = self.prompt_out.flush();

            let mut text = String::new();
            let read = self.input.read_line(&mut text).map_err(|e| LexError::Io(e.to_string()))?;
            if read == 0 {
                self.finished = true;
                continue;
            }
            self.line += 1;
            let tokens = self.lexer.lex_fragment(&text, self.line)?;
            self.buffer.extend(tokens);
        }
        Ok(())
    }
}

impl<R: LineRead, W: Write> TokenSource for LineSource<R, W> {
    fn peek(&mut self) -> Result<&Token, LexError> {
        self.fill()?;
        self.buffer.front().ok_or_else(|| LexError::Io("token buffer unexpectedly empty".to_string()))
    }

    fn advance(&mut self) -> Result<(), LexError> {
        self.fill()?;
        if let Some(front) = self.buffer.front() {
            if front.kind != TokenKind::Eof {
                self.buffer.pop_front();
            }
        }
        Ok(())
    }
}
