//! dust: front end for a small typed expression language
//!
//! # Architecture
//! - `types`: Cross-cutting type set (`num`, `str`, `void`) and intrinsic signatures
//! - `lexer`: Tokenization
//! - `source`: Token sources for whole files and interactive input
//! - `ast`: Abstract syntax tree
//! - `parser`: Token stream → syntax tree, one top-level item at a time
//! - `ir`: CFG intermediate representation, lowering from the AST, passes
//! - `jit`: In-process execution of lowered units
//! - `backend`: Object emission (WebAssembly)
//! - `driver`: Interactive session, file compilation, I/O and format conversions

// Core compiler modules
pub mod types;
pub mod lexer;
pub mod source;
pub mod ast;
pub mod parser;
pub mod ir;
pub mod jit;
pub mod backend;
pub mod driver;
pub mod error;

pub use error::DustError;
