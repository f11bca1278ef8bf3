//! WebAssembly object emission
//!
//! A whole compilation unit is turned into one wasm module:
//! - declarations (intrinsics and `extern`s without a body) become imports
//!   from the `env` module
//! - string literals live in an exported linear memory as NUL-terminated bytes
//! - every defined function is exported under its own name
//!
//! Function bodies are arbitrary CFGs, which wasm cannot express directly.
//! Each body is emitted as a `loop` + `br_table` block dispatcher.

// Linear memory and string data
mod memory;

// Code emission
mod emit;

// Core backend components
mod context;
pub mod io;

pub use io::emit_object;

use std::collections::HashMap;

use tracing::{debug, debug_span};
use wasm_encoder::{
    CodeSection, DataSection, EntityType, ExportKind, ExportSection, FunctionSection, ImportSection,
    MemorySection, Module as WasmModule, TypeSection, ValType,
};

use crate::ir::{Module, VerifyError};
use crate::types::Type;

/// Module that declarations are imported from.
pub const IMPORT_MODULE: &str = "env";

/// Name the linear memory is exported under.
pub const MEMORY_EXPORT: &str = "memory";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("unsupported target '{0}', expected a wasm32 triple")]
    UnsupportedTarget(String),
    #[error("call to unknown function '{0}'")]
    UnknownFunction(String),
    #[error("'{function}' refers to missing {what}")]
    Malformed { function: String, what: String },
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// What the object is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub triple: String,
    /// Minimum size of the linear memory in 64 KiB pages. Grown as needed to
    /// fit the string data.
    pub memory_pages: u64,
}

impl Default for Target {
    fn default() -> Self {
        Target { triple: "wasm32-unknown-unknown".to_string(), memory_pages: 1 }
    }
}

impl Target {
    pub fn is_supported(&self) -> bool {
        self.triple.starts_with("wasm32")
    }
}

// Function signature for tracking unique function types
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct FunctionSignature {
    param_types: Vec<Type>,
    return_type: Type,
}

pub struct WasmGenerator {
    module: WasmModule,
    types: TypeSection,
    imports: ImportSection,
    functions: FunctionSection,
    memory: MemorySection,
    exports: ExportSection,
    data: DataSection,
    code: CodeSection,
    pub(crate) func_indices: HashMap<String, u32>,
    pub(crate) func_count: u32,
    func_type_indices: HashMap<FunctionSignature, u32>,
    /// Address of every string in the unit's pool, indexed by `StrId`.
    pub(crate) string_offsets: Vec<u32>,
}

impl Default for WasmGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WasmGenerator {
    pub fn new() -> Self {
        Self {
            module: WasmModule::new(),
            types: TypeSection::new(),
            imports: ImportSection::new(),
            functions: FunctionSection::new(),
            memory: MemorySection::new(),
            exports: ExportSection::new(),
            data: DataSection::new(),
            code: CodeSection::new(),
            func_indices: HashMap::new(),
            func_count: 0,
            func_type_indices: HashMap::new(),
            string_offsets: Vec::new(),
        }
    }

    /// Compile `unit` into the bytes of a wasm module.
    pub fn compile_module(mut self, unit: &Module, target: &Target) -> Result<Vec<u8>, EmitError> {
        let _span = debug_span!("emit_object", module = %unit.name).entered();
        if !target.is_supported() {
            return Err(EmitError::UnsupportedTarget(target.triple.clone()));
        }

        // Imports take the first function indices, so they go first.
        for decl in unit.functions.iter().filter(|f| f.is_declaration()) {
            let type_idx = self.get_or_create_func_type(&decl.param_types(), decl.ret);
            self.imports.import(IMPORT_MODULE, &decl.name, EntityType::Function(type_idx));
            self.func_indices.insert(decl.name.clone(), self.func_count);
            self.func_count += 1;
        }

        // Assign indices to every defined function before emitting any body so
        // forward and recursive calls resolve.
        let defined: Vec<_> = unit.defined_functions().collect();
        for func in &defined {
            let type_idx = self.get_or_create_func_type(&func.param_types(), func.ret);
            self.functions.function(type_idx);
            self.func_indices.insert(func.name.clone(), self.func_count);
            self.exports.export(&func.name, ExportKind::Func, self.func_count);
            self.func_count += 1;
        }

        self.setup_memory(unit, target);

        for func in &defined {
            let body = self.gen_function(func)?;
            self.code.function(&body);
        }

        self.module.section(&self.types);
        self.module.section(&self.imports);
        self.module.section(&self.functions);
        self.module.section(&self.memory);
        self.module.section(&self.exports);
        self.module.section(&self.code);
        self.module.section(&self.data);

        let bytes = self.module.finish();
        debug!(functions = defined.len(), bytes = bytes.len(), "object emitted");
        Ok(bytes)
    }

    /// Get or create a type index for a function signature
    fn get_or_create_func_type(&mut self, param_types: &[Type], return_type: Type) -> u32 {
        let sig = FunctionSignature { param_types: param_types.to_vec(), return_type };
        if let Some(&idx) = self.func_type_indices.get(&sig) {
            return idx;
        }

        let param_vals: Vec<ValType> = param_types.iter().filter_map(|t| wasm_valtype(*t)).collect();
        let result_vals: Vec<ValType> = wasm_valtype(return_type).into_iter().collect();

        let type_idx = self.types.len();
        self.types.ty().function(param_vals, result_vals);
        self.func_type_indices.insert(sig, type_idx);
        type_idx
    }
}

/// Map a language type to its wasm value type. `None` for `void`.
pub(crate) fn wasm_valtype(ty: Type) -> Option<ValType> {
    match ty {
        Type::Num => Some(ValType::F64),
        // Pointer into linear memory.
        Type::Str => Some(ValType::I32),
        Type::Void => None,
    }
}
