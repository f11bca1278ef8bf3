use crate::ir::{Builder, Module, PassManager, Value};
use crate::types::Type;

use super::{DefinitionRegistry, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Run the optimization pipeline on every completed function.
    pub optimize: bool,
    /// Re-verify after each pass that changed the function.
    pub verify_passes: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        LoweringOptions { optimize: true, verify_passes: cfg!(debug_assertions) }
    }
}

/// Explicit state for lowering AST into one compilation unit.
///
/// The context borrows the target module and the registry mutably, so at
/// most one function is ever being lowered at a time.
pub struct LoweringContext<'a> {
    pub(crate) module: &'a mut Module,
    pub(crate) registry: &'a mut DefinitionRegistry,
    pub(crate) builder: Builder,
    pub(crate) scope: Scope,
    pub(crate) passes: Option<PassManager>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(module: &'a mut Module, registry: &'a mut DefinitionRegistry, options: LoweringOptions) -> Self {
        let passes = options
            .optimize
            .then(|| PassManager::default_pipeline().with_verify_each(options.verify_passes));
        Self { module, registry, builder: Builder::default(), scope: Scope::new(), passes }
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        self.registry
    }

    /// The value a variable or function result starts out as.
    pub(crate) fn zero_value(&mut self, ty: Type) -> Option<Value> {
        match ty {
            Type::Num => Some(Value::Num(0.0)),
            Type::Str => Some(Value::Str(self.module.intern_string(""))),
            Type::Void => None,
        }
    }

    /// Type of a value produced in the function being built.
    pub(crate) fn type_of(&self, value: Value) -> Type {
        self.builder.value_type(value).unwrap_or(Type::Void)
    }
}
