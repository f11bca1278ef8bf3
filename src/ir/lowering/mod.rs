/// The lowering context: target module, registry, builder and scope
mod context;
/// Expression lowering (lower_expr, lower_value)
mod expr;
/// Function-level entry points (lower_prototype, lower_function, lower_anonymous)
mod function;
/// Prototype registry shared across compilation units
mod registry;
/// Name to stack slot bindings with exact shadow restoration
mod scope;
/// Statement lowering (lower_stmt, lower_block)
mod stmt;

use crate::ir::verify::VerifyError;
use crate::ir::PassError;
use crate::types::Type;

pub use context::{LoweringContext, LoweringOptions};
pub use registry::DefinitionRegistry;
pub use scope::{Binding, Scope};

/// Name of the function a top-level statement is wrapped in.
pub const ANON_EXPR_NAME: &str = "__anon_expr";

/// Lowering failures. They only abort the current top-level construct.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LowerError {
    #[error("unknown variable name '{0}'")]
    UnknownVariable(String),
    #[error("unknown function referenced: '{0}'")]
    UnknownFunction(String),
    #[error("incorrect number of arguments passed to '{callee}': expected {expected}, found {found}")]
    ArityMismatch { callee: String, expected: usize, found: usize },
    #[error("function '{0}' cannot be redefined")]
    DuplicateDefinition(String),
    #[error("function '{0}' redeclared with a different signature")]
    SignatureMismatch(String),
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: Type,
        found: Type,
    },
    #[error("{0} produces no value")]
    VoidValue(String),
    #[error("destination of '=' must be a variable")]
    InvalidAssignTarget,
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Pass(#[from] PassError),
}

impl LowerError {
    pub(crate) fn mismatch(context: impl Into<String>, expected: Type, found: Type) -> Self {
        LowerError::TypeMismatch { context: context.into(), expected, found }
    }
}
