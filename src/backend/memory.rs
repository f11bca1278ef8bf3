use wasm_encoder::{ConstExpr, ExportKind, MemoryType};

use crate::ir::Module;

use super::{Target, WasmGenerator, MEMORY_EXPORT};

/// Address of the first string. Keeps 0 free so no string is a null pointer.
pub(crate) const STRING_BASE: u32 = 8;

const PAGE_SIZE: u64 = 64 * 1024;

impl WasmGenerator {
    /// Lay the unit's string pool out in linear memory and declare the
    /// exported memory large enough to hold it.
    pub(crate) fn setup_memory(&mut self, unit: &Module, target: &Target) {
        let mut bytes = Vec::new();
        self.string_offsets.clear();
        for s in &unit.strings {
            self.string_offsets.push(STRING_BASE + bytes.len() as u32);
            bytes.extend_from_slice(s.as_bytes());
            bytes.push(0);
        }

        let needed = (STRING_BASE as u64 + bytes.len() as u64).div_ceil(PAGE_SIZE);
        self.memory.memory(MemoryType {
            minimum: target.memory_pages.max(needed).max(1),
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        self.exports.export(MEMORY_EXPORT, ExportKind::Memory, 0);

        if !bytes.is_empty() {
            self.data.active(0, &ConstExpr::i32_const(STRING_BASE as i32), bytes);
        }
    }
}
