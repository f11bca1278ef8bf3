/// IR pass infrastructure.
///
/// Passes run on one completed function at a time, after lowering and
/// verification, in the order the [`PassManager`] was given them.
use super::types::Function;
use super::verify::VerifyError;

pub mod cfg_simplify;
pub mod const_fold;
pub mod dce;
pub mod manager;

pub use cfg_simplify::SimplifyCfg;
pub use const_fold::ConstantFold;
pub use dce::DeadCodeElim;
pub use manager::PassManager;

/// A pass that transforms a function in place.
pub trait Pass {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Returns whether the function changed.
    fn run(&mut self, function: &mut Function) -> Result<bool, PassError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PassError {
    /// The function no longer verifies after the named pass ran.
    #[error("pass '{pass}' produced invalid IR: {source}")]
    Broken {
        pass: &'static str,
        #[source]
        source: VerifyError,
    },
    #[error("internal error in pass '{pass}': {message}")]
    Internal { pass: &'static str, message: String },
}
