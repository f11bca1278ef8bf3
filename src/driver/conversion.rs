//! Format conversion utilities

use crate::error::DustError;

/// Convert WASM binary bytes to WAT (WebAssembly Text) format
pub fn wasm_to_wat(wasm_bytes: &[u8]) -> Result<String, DustError> {
    wasmprinter::print_bytes(wasm_bytes).map_err(|e| DustError::Wat(e.to_string()))
}
