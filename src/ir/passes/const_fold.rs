// Constant folding: evaluate arithmetic and comparisons whose operands are
// both literals, substitute the result into every use, and turn conditional
// branches on a literal into plain branches.

use std::collections::HashMap;

use super::{Pass, PassError};
use crate::ir::types::{Function, InstId, InstKind, Terminator, Value};

#[derive(Debug, Default)]
pub struct ConstantFold;

impl ConstantFold {
    pub fn new() -> Self {
        ConstantFold
    }
}

fn fold(kind: &InstKind) -> Option<f64> {
    match kind {
        InstKind::Arith { op, lhs, rhs } => Some(op.apply(lhs.as_num()?, rhs.as_num()?)),
        InstKind::Compare { pred, lhs, rhs } => Some(pred.eval(lhs.as_num()?, rhs.as_num()?)),
        _ => None,
    }
}

fn substitute(value: &mut Value, folded: &HashMap<InstId, Value>) -> bool {
    if let Value::Inst(id) = value {
        if let Some(replacement) = folded.get(id) {
            *value = *replacement;
            return true;
        }
    }
    false
}

impl Pass for ConstantFold {
    fn name(&self) -> &'static str {
        "const-fold"
    }

    fn run(&mut self, function: &mut Function) -> Result<bool, PassError> {
        let mut folded: HashMap<InstId, Value> = HashMap::new();
        let mut changed = false;

        // Uses normally follow their definition in block order; repeat until
        // stable to also catch the rare use that does not.
        loop {
            let mut round_changed = false;
            for block in &mut function.blocks {
                let mut kept = Vec::with_capacity(block.insts.len());
                for &id in &block.insts {
                    let inst = &mut function.insts[id.0 as usize];
                    for operand in inst.kind.operands_mut() {
                        round_changed |= substitute(operand, &folded);
                    }
                    match fold(&inst.kind) {
                        Some(n) => {
                            folded.insert(id, Value::Num(n));
                            round_changed = true;
                        }
                        None => kept.push(id),
                    }
                }
                block.insts = kept;

                if let Some(terminator) = &mut block.terminator {
                    if let Some(operand) = terminator.operand_mut() {
                        round_changed |= substitute(operand, &folded);
                    }
                    if let Terminator::CondBr { cond: Value::Num(c), then_block, else_block } = *terminator {
                        let target = if c != 0.0 { then_block } else { else_block };
                        *terminator = Terminator::Br(target);
                        round_changed = true;
                    }
                }
            }
            changed |= round_changed;
            if !round_changed {
                break;
            }
        }
        Ok(changed)
    }
}
