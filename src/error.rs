//! Top-level error joining every stage of the pipeline.

use crate::backend::EmitError;
use crate::ir::LowerError;
use crate::jit::ExecError;
use crate::lexer::LexError;
use crate::parser::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum DustError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Lower(#[from] LowerError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("failed to convert wasm to wat: {0}")]
    Wat(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DustError {
    /// Whether the error must end the program rather than just the current item.
    pub fn is_fatal(&self) -> bool {
        match self {
            DustError::Lex(_) | DustError::Io(_) => true,
            DustError::Parse(err) => err.is_fatal(),
            _ => false,
        }
    }
}
