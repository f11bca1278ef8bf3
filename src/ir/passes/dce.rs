// Dead code elimination: drop pure instructions whose result is never used,
// and stores into slots that are never loaded.

use std::collections::HashSet;

use super::{Pass, PassError};
use crate::ir::types::{Function, InstKind, SlotId, Value};

#[derive(Debug, Default)]
pub struct DeadCodeElim;

impl DeadCodeElim {
    pub fn new() -> Self {
        DeadCodeElim
    }
}

fn use_counts(function: &Function) -> Vec<u32> {
    let mut uses = vec![0u32; function.insts.len()];
    let mut count = |value: Value| {
        if let Value::Inst(id) = value {
            if let Some(n) = uses.get_mut(id.0 as usize) {
                *n = n.saturating_add(1);
            }
        }
    };
    for block in &function.blocks {
        for &id in &block.insts {
            for operand in function.inst(id).kind.operands() {
                count(operand);
            }
        }
        if let Some(operand) = block.terminator.as_ref().and_then(|t| t.operand()) {
            count(operand);
        }
    }
    uses
}

fn loaded_slots(function: &Function) -> HashSet<SlotId> {
    function
        .blocks
        .iter()
        .flat_map(|b| b.insts.iter())
        .filter_map(|&id| match function.inst(id).kind {
            InstKind::Load(slot) => Some(slot),
            _ => None,
        })
        .collect()
}

impl Pass for DeadCodeElim {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn run(&mut self, function: &mut Function) -> Result<bool, PassError> {
        let mut changed = false;
        loop {
            let uses = use_counts(function);
            let loaded = loaded_slots(function);
            let insts = &function.insts;

            let mut removed = false;
            for block in &mut function.blocks {
                let before = block.insts.len();
                block.insts.retain(|&id| {
                    let inst = &insts[id.0 as usize];
                    match &inst.kind {
                        InstKind::Store { slot, .. } => loaded.contains(slot),
                        kind if kind.has_side_effects() => true,
                        _ => uses[id.0 as usize] > 0,
                    }
                });
                removed |= block.insts.len() != before;
            }
            if !removed {
                break;
            }
            changed = true;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArithOp, Builder};
    use crate::types::Type;

    #[test]
    fn removes_unused_arith_and_dead_store() {
        let mut b = Builder::new(Function::declaration("f", vec![], Type::Num));
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        let slot = b.create_entry_slot("x", Type::Num);
        b.build_store(slot, Value::Num(1.0));
        b.build_arith(ArithOp::Add, Value::Num(1.0), Value::Num(2.0));
        b.build_call("printd", vec![Value::Num(3.0)], Type::Num);
        b.build_ret(Some(Value::Num(0.0)));
        let mut f = b.finish();

        assert!(DeadCodeElim::new().run(&mut f).unwrap());
        let kinds: Vec<_> = f.block(entry).insts.iter().map(|&id| f.inst(id).kind.clone()).collect();
        assert_eq!(kinds.len(), 1);
        assert!(matches!(kinds[0], InstKind::Call { .. }));
    }
}
