mod builder;
mod display;
mod types;
mod verify;

pub mod lowering;

// Pass infrastructure
pub mod passes;

pub use builder::Builder;
pub use types::{
    ArithOp, Block, BlockId, ComparePred, Function, Inst, InstId, InstKind, Module, Slot, SlotId, StrId,
    Terminator, Value,
};
pub use verify::{verify_function, verify_module, VerifyError};

pub use lowering::{
    Binding, DefinitionRegistry, LowerError, LoweringContext, LoweringOptions, Scope, ANON_EXPR_NAME,
};

// Re-export pass infrastructure
pub use passes::{Pass, PassError, PassManager};
