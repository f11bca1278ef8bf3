//! Structural and type checks run on every completed function.

use std::collections::HashSet;

use crate::types::Type;

use super::types::{Function, InstId, InstKind, Module, Terminator, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerifyError {
    #[error("function '{function}' has no body")]
    EmptyBody { function: String },
    #[error("block '{block}' in '{function}' has no terminator")]
    Unterminated { function: String, block: String },
    #[error("branch in '{function}' targets missing block {target}")]
    BadBranchTarget { function: String, target: u32 },
    #[error("invalid operand in '{function}': {detail}")]
    BadOperand { function: String, detail: String },
    #[error("type error in '{function}': {detail}")]
    TypeMismatch { function: String, detail: String },
    #[error("'{function}' calls unknown function '{callee}'")]
    UnknownCallee { function: String, callee: String },
    #[error("'{function}' calls '{callee}' with {found} arguments, expected {expected}")]
    ArityMismatch {
        function: String,
        callee: String,
        expected: usize,
        found: usize,
    },
}

/// Verify every defined function of `module`.
pub fn verify_module(module: &Module) -> Result<(), VerifyError> {
    for function in module.defined_functions() {
        verify_function(function, module)?;
    }
    Ok(())
}

/// Check `function` against the callees and strings of `module`. The function
/// itself does not have to be part of the module yet.
pub fn verify_function(function: &Function, module: &Module) -> Result<(), VerifyError> {
    Verifier { function, module, placed: HashSet::new() }.run()
}

struct Verifier<'a> {
    function: &'a Function,
    module: &'a Module,
    placed: HashSet<InstId>,
}

impl Verifier<'_> {
    fn run(mut self) -> Result<(), VerifyError> {
        let f = self.function;
        if f.is_declaration() {
            return Err(VerifyError::EmptyBody { function: f.name.clone() });
        }
        for block in &f.blocks {
            self.placed.extend(block.insts.iter().copied());
        }

        for block in &f.blocks {
            for &id in &block.insts {
                self.check_inst(id)?;
            }
            let Some(terminator) = &block.terminator else {
                return Err(VerifyError::Unterminated { function: f.name.clone(), block: block.name.clone() });
            };
            self.check_terminator(terminator)?;
        }
        Ok(())
    }

    fn bad_operand(&self, detail: String) -> VerifyError {
        VerifyError::BadOperand { function: self.function.name.clone(), detail }
    }

    fn mismatch(&self, detail: String) -> VerifyError {
        VerifyError::TypeMismatch { function: self.function.name.clone(), detail }
    }

    /// Resolve the type of an operand, rejecting dangling references.
    fn operand_type(&self, value: Value) -> Result<Type, VerifyError> {
        match value {
            Value::Str(id) if self.module.string(id).is_none() => {
                Err(self.bad_operand(format!("string #{} is not in the pool", id.0)))
            }
            Value::Inst(id) if !self.placed.contains(&id) => {
                Err(self.bad_operand(format!("%{} is not placed in any block", id.0)))
            }
            _ => {
                let ty = self
                    .function
                    .value_type(value)
                    .ok_or_else(|| self.bad_operand(format!("dangling value {value:?}")))?;
                if ty.is_value() {
                    Ok(ty)
                } else {
                    Err(self.bad_operand(format!("{value:?} has no value")))
                }
            }
        }
    }

    fn expect_num(&self, value: Value, what: &str) -> Result<(), VerifyError> {
        match self.operand_type(value)? {
            Type::Num => Ok(()),
            other => Err(self.mismatch(format!("{what} must be num, found {other}"))),
        }
    }

    fn check_inst(&self, id: InstId) -> Result<(), VerifyError> {
        let f = self.function;
        let inst = f.insts.get(id.0 as usize).ok_or_else(|| self.bad_operand(format!("missing %{}", id.0)))?;
        match &inst.kind {
            InstKind::Load(slot) => {
                let slot_ty = f
                    .slots
                    .get(slot.0 as usize)
                    .map(|s| s.ty)
                    .ok_or_else(|| self.bad_operand(format!("missing slot ${}", slot.0)))?;
                if slot_ty != inst.ty {
                    return Err(self.mismatch(format!("load of {slot_ty} slot typed {}", inst.ty)));
                }
            }
            InstKind::Store { slot, value } => {
                let slot_ty = f
                    .slots
                    .get(slot.0 as usize)
                    .map(|s| s.ty)
                    .ok_or_else(|| self.bad_operand(format!("missing slot ${}", slot.0)))?;
                let value_ty = self.operand_type(*value)?;
                if slot_ty != value_ty {
                    return Err(self.mismatch(format!("store of {value_ty} into {slot_ty} slot")));
                }
            }
            InstKind::Arith { op, lhs, rhs } => {
                self.expect_num(*lhs, op.mnemonic())?;
                self.expect_num(*rhs, op.mnemonic())?;
            }
            InstKind::Compare { lhs, rhs, .. } => {
                self.expect_num(*lhs, "comparison operand")?;
                self.expect_num(*rhs, "comparison operand")?;
            }
            InstKind::Call { callee, args } => {
                let target = if *callee == f.name {
                    f
                } else {
                    self.module.get_function(callee).ok_or_else(|| VerifyError::UnknownCallee {
                        function: f.name.clone(),
                        callee: callee.clone(),
                    })?
                };
                if target.params.len() != args.len() {
                    return Err(VerifyError::ArityMismatch {
                        function: f.name.clone(),
                        callee: callee.clone(),
                        expected: target.params.len(),
                        found: args.len(),
                    });
                }
                for (param, arg) in target.params.iter().zip(args) {
                    let arg_ty = self.operand_type(*arg)?;
                    if arg_ty != param.ty {
                        return Err(self.mismatch(format!(
                            "argument '{}' of '{callee}' expects {}, found {arg_ty}",
                            param.name, param.ty
                        )));
                    }
                }
                if target.ret != inst.ty {
                    return Err(self.mismatch(format!("call of '{callee}' typed {}, returns {}", inst.ty, target.ret)));
                }
            }
        }
        Ok(())
    }

    fn check_terminator(&self, terminator: &Terminator) -> Result<(), VerifyError> {
        let f = self.function;
        for target in terminator.successors() {
            if target.0 as usize >= f.blocks.len() {
                return Err(VerifyError::BadBranchTarget { function: f.name.clone(), target: target.0 });
            }
        }
        match terminator {
            Terminator::Br(_) => Ok(()),
            Terminator::CondBr { cond, .. } => self.expect_num(*cond, "branch condition"),
            Terminator::Ret(None) if f.ret == Type::Void => Ok(()),
            Terminator::Ret(None) => Err(self.mismatch(format!("missing return value of type {}", f.ret))),
            Terminator::Ret(Some(value)) => {
                let ty = self.operand_type(*value)?;
                if ty == f.ret {
                    Ok(())
                } else {
                    Err(self.mismatch(format!("returns {ty} from a function returning {}", f.ret)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Builder;
    use crate::types::Param;

    #[test]
    fn rejects_unterminated_block() {
        let mut b = Builder::new(Function::declaration("f", vec![], Type::Num));
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        let f = b.finish();
        let err = verify_function(&f, &Module::new("m")).unwrap_err();
        assert!(matches!(err, VerifyError::Unterminated { .. }));
    }

    #[test]
    fn rejects_wrong_return_type() {
        let mut module = Module::new("m");
        let s = module.intern_string("hi");
        let mut b = Builder::new(Function::declaration("f", vec![Param::new("x", Type::Num)], Type::Num));
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        b.build_ret(Some(Value::Str(s)));
        let err = verify_function(&b.finish(), &module).unwrap_err();
        assert!(matches!(err, VerifyError::TypeMismatch { .. }));
    }
}
