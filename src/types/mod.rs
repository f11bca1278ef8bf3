//! Cross-cutting type system for the dust compiler
//!
//! Types are used by every phase (lexer keywords, AST annotations, IR values,
//! JIT runtime values and wasm value types), so they live outside the AST.

mod ast_types;
mod builtins;

pub use ast_types::{Param, Type};
pub use builtins::{find_intrinsic, map_builtin_type, Intrinsic, INTRINSICS};
