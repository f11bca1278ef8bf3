//! Pure code generation functions
//!
//! These transform a compilation unit into wasm bytes without any I/O or
//! orchestration concerns.

use crate::ir::{verify_module, Module};

use super::{EmitError, Target, WasmGenerator};

/// Compile a whole unit to the bytes of a wasm module for `target`.
///
/// The unit is verified first; emission assumes well-formed IR.
pub fn emit_object(unit: &Module, target: &Target) -> Result<Vec<u8>, EmitError> {
    verify_module(unit)?;
    WasmGenerator::new().compile_module(unit, target)
}
