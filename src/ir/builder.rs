//! Instruction builder with an insertion point, in the style of LLVM's
//! `IRBuilder`. The builder owns the function under construction until
//! [`Builder::finish`] hands it back.

use crate::types::Type;

use super::types::{
    ArithOp, Block, BlockId, ComparePred, Function, Inst, InstId, InstKind, Slot, SlotId, Terminator, Value,
};

#[derive(Debug, Default)]
pub struct Builder {
    func: Function,
    current: Option<BlockId>,
}

impl Builder {
    /// Start building a body for `decl`. Any existing body is discarded.
    pub fn new(mut decl: Function) -> Self {
        decl.clear_body();
        Builder { func: decl, current: None }
    }

    pub fn function(&self) -> &Function {
        &self.func
    }

    pub fn finish(self) -> Function {
        self.func
    }

    pub fn set_return_type(&mut self, ty: Type) {
        self.func.ret = ty;
    }

    pub fn return_type(&self) -> Type {
        self.func.ret
    }

    /// Append a new block. Names are made unique within the function.
    pub fn append_block(&mut self, name: &str) -> BlockId {
        let mut unique = name.to_string();
        let mut suffix = 1;
        while self.func.blocks.iter().any(|b| b.name == unique) {
            unique = format!("{name}{suffix}");
            suffix += 1;
        }
        self.func.blocks.push(Block { name: unique, insts: Vec::new(), terminator: None });
        BlockId(self.func.blocks.len() as u32 - 1)
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Whether the current block already ends in a terminator. Without an
    /// insertion point there is nowhere to emit, which counts as terminated.
    pub fn is_terminated(&self) -> bool {
        match self.current {
            Some(block) => self.func.block(block).terminator.is_some(),
            None => true,
        }
    }

    /// Allocate a slot in the entry frame, independent of the insertion point.
    pub fn create_entry_slot(&mut self, name: &str, ty: Type) -> SlotId {
        self.func.slots.push(Slot { name: name.to_string(), ty });
        SlotId(self.func.slots.len() as u32 - 1)
    }

    pub fn slot_type(&self, slot: SlotId) -> Option<Type> {
        self.func.slots.get(slot.0 as usize).map(|s| s.ty)
    }

    pub fn value_type(&self, value: Value) -> Option<Type> {
        self.func.value_type(value)
    }

    fn push(&mut self, kind: InstKind, ty: Type) -> InstId {
        let id = InstId(self.func.insts.len() as u32);
        self.func.insts.push(Inst { kind, ty });
        if let Some(block) = self.current {
            self.func.blocks[block.0 as usize].insts.push(id);
        }
        id
    }

    fn terminate(&mut self, terminator: Terminator) {
        if let Some(block) = self.current {
            let block = &mut self.func.blocks[block.0 as usize];
            if block.terminator.is_none() {
                block.terminator = Some(terminator);
            }
        }
    }

    pub fn build_load(&mut self, slot: SlotId) -> Value {
        let ty = self.slot_type(slot).unwrap_or(Type::Num);
        Value::Inst(self.push(InstKind::Load(slot), ty))
    }

    pub fn build_store(&mut self, slot: SlotId, value: Value) {
        self.push(InstKind::Store { slot, value }, Type::Void);
    }

    pub fn build_arith(&mut self, op: ArithOp, lhs: Value, rhs: Value) -> Value {
        Value::Inst(self.push(InstKind::Arith { op, lhs, rhs }, Type::Num))
    }

    pub fn build_compare(&mut self, pred: ComparePred, lhs: Value, rhs: Value) -> Value {
        Value::Inst(self.push(InstKind::Compare { pred, lhs, rhs }, Type::Num))
    }

    /// Emit a call. Returns `None` for calls to void functions.
    pub fn build_call(&mut self, callee: &str, args: Vec<Value>, ret: Type) -> Option<Value> {
        let id = self.push(InstKind::Call { callee: callee.to_string(), args }, ret);
        ret.is_value().then_some(Value::Inst(id))
    }

    pub fn build_br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn build_cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr { cond, then_block, else_block });
    }

    pub fn build_ret(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Ret(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Param;

    #[test]
    fn block_names_are_unique() {
        let mut b = Builder::new(Function::declaration("f", vec![], Type::Num));
        let first = b.append_block("then");
        let second = b.append_block("then");
        assert_eq!(b.function().block(first).name, "then");
        assert_eq!(b.function().block(second).name, "then1");
    }

    #[test]
    fn taking_the_builder_leaves_an_empty_declaration() {
        let mut b = Builder::new(Function::declaration("f", vec![], Type::Num));
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        b.build_ret(Some(Value::Num(1.0)));

        let f = std::mem::take(&mut b).finish();
        assert_eq!(f.name, "f");
        assert!(!f.is_declaration());
        assert!(b.is_terminated());
        let left = b.finish();
        assert!(left.is_declaration());
        assert_eq!(left.ret, Type::Void);
    }

    #[test]
    fn terminator_is_set_once() {
        let mut b = Builder::new(Function::declaration("f", vec![Param::new("x", Type::Num)], Type::Num));
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        assert!(!b.is_terminated());
        b.build_ret(Some(Value::Param(0)));
        b.build_ret(Some(Value::Num(1.0)));
        assert!(b.is_terminated());
        let f = b.finish();
        assert_eq!(f.block(entry).terminator, Some(Terminator::Ret(Some(Value::Param(0)))));
    }
}
