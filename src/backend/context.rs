use wasm_encoder::ValType;

use crate::ir::{Function, InstId, SlotId};

use super::wasm_valtype;

/// Wasm locals of one function being emitted.
///
/// Layout: parameters, then one local per slot, then one per value-producing
/// instruction, then the dispatcher's program counter.
pub(crate) struct LocalContext {
    slot_locals: Vec<u32>,
    /// Indexed by `InstId`; `None` for instructions without a result.
    inst_locals: Vec<Option<u32>>,
    pc_local: u32,
    /// Declarations for `wasm_encoder::Function::new`, excluding parameters.
    declared: Vec<(u32, ValType)>,
}

impl LocalContext {
    pub(crate) fn new(func: &Function) -> Self {
        let mut next = func.params.len() as u32;
        let mut declared = Vec::new();
        let mut alloc = |ty: ValType| {
            declared.push((1, ty));
            next += 1;
            next - 1
        };

        let slot_locals = func
            .slots
            .iter()
            .map(|slot| alloc(wasm_valtype(slot.ty).unwrap_or(ValType::I32)))
            .collect();
        let inst_locals = func.insts.iter().map(|inst| wasm_valtype(inst.ty).map(&mut alloc)).collect();
        let pc_local = alloc(ValType::I32);

        LocalContext { slot_locals, inst_locals, pc_local, declared }
    }

    pub(crate) fn slot(&self, slot: SlotId) -> Option<u32> {
        self.slot_locals.get(slot.0 as usize).copied()
    }

    pub(crate) fn inst(&self, id: InstId) -> Option<u32> {
        self.inst_locals.get(id.0 as usize).copied().flatten()
    }

    pub(crate) fn pc(&self) -> u32 {
        self.pc_local
    }

    pub(crate) fn declarations(&self) -> Vec<(u32, ValType)> {
        self.declared.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArithOp, Builder, Value};
    use crate::types::{Param, Type};

    #[test]
    fn locals_follow_parameters() {
        let mut builder = Builder::new(Function::declaration("f", vec![Param::new("s", Type::Str)], Type::Num));
        let entry = builder.append_block("entry");
        builder.position_at_end(entry);
        let slot = builder.create_entry_slot("s", Type::Str);
        builder.build_store(slot, Value::Param(0));
        let sum = builder.build_arith(ArithOp::Add, Value::Num(1.0), Value::Num(2.0));
        builder.build_ret(Some(sum));
        let func = builder.finish();

        let ctx = LocalContext::new(&func);
        assert_eq!(ctx.slot(slot), Some(1));
        // The store produces nothing, the addition gets the next local.
        assert_eq!(ctx.inst(InstId(0)), None);
        assert_eq!(ctx.inst(InstId(1)), Some(2));
        assert_eq!(ctx.pc(), 3);
        assert_eq!(ctx.declarations(), vec![(1, ValType::I32), (1, ValType::F64), (1, ValType::I32)]);
    }
}
