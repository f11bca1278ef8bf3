/// Pass manager for the per-function optimization pipeline
use tracing::{debug, trace};

use super::{ConstantFold, DeadCodeElim, Pass, PassError, SimplifyCfg};
use crate::ir::types::{Function, Module};
use crate::ir::verify::verify_function;

/// Manages and executes function passes in sequence
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    verify_each: bool,
    max_rounds: usize,
}

impl PassManager {
    /// Create an empty pass manager
    pub fn new() -> Self {
        Self { passes: Vec::new(), verify_each: false, max_rounds: 4 }
    }

    /// Add a pass to the pipeline
    ///
    /// Passes are executed in the order they are added
    pub fn add_pass<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    /// Re-verify the function after every pass that changed it.
    pub fn with_verify_each(mut self, verify_each: bool) -> Self {
        self.verify_each = verify_each;
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run the pipeline over `function` until it stops changing, bounded by
    /// a fixed number of rounds. `module` supplies callee signatures and
    /// strings for verification.
    pub fn run(&mut self, function: &mut Function, module: &Module) -> Result<bool, PassError> {
        let mut changed_any = false;
        for round in 0..self.max_rounds {
            let mut changed = false;
            for pass in &mut self.passes {
                let pass_changed = pass.run(function)?;
                trace!(pass = pass.name(), function = %function.name, round, changed = pass_changed);
                if pass_changed && self.verify_each {
                    verify_function(function, module)
                        .map_err(|source| PassError::Broken { pass: pass.name(), source })?;
                }
                changed |= pass_changed;
            }
            changed_any |= changed;
            if !changed {
                break;
            }
        }
        debug!(function = %function.name, changed = changed_any, "optimized");
        Ok(changed_any)
    }

    /// The default pipeline:
    /// 1. Constant folding of arithmetic, comparisons and constant branches
    /// 2. Dead code elimination of unused pure instructions and dead stores
    /// 3. CFG simplification: unreachable block removal and block merging
    pub fn default_pipeline() -> Self {
        let mut manager = Self::new();
        manager.add_pass(ConstantFold::new());
        manager.add_pass(DeadCodeElim::new());
        manager.add_pass(SimplifyCfg::new());
        manager
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
