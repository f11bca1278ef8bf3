use wasm_encoder::{Function as WasmFunction, Ieee64, Instruction};

use crate::backend::context::LocalContext;
use crate::backend::{EmitError, WasmGenerator};
use crate::ir::{ArithOp, ComparePred, Function, InstId, InstKind, SlotId, Terminator, Value};

impl WasmGenerator {
    /// Push `value` onto the operand stack.
    fn gen_value(&self, func: &Function, value: Value, ctx: &LocalContext, body: &mut WasmFunction) -> Result<(), EmitError> {
        match value {
            Value::Num(n) => {
                body.instruction(&Instruction::F64Const(Ieee64::from(n)));
            }
            Value::Str(id) => {
                let offset = self
                    .string_offsets
                    .get(id.0 as usize)
                    .ok_or_else(|| missing(func, format!("string #{}", id.0)))?;
                body.instruction(&Instruction::I32Const(*offset as i32));
            }
            Value::Param(index) => {
                body.instruction(&Instruction::LocalGet(index));
            }
            Value::Inst(id) => {
                let local = ctx.inst(id).ok_or_else(|| missing(func, format!("result of %{}", id.0)))?;
                body.instruction(&Instruction::LocalGet(local));
            }
        }
        Ok(())
    }

    pub(crate) fn gen_inst(
        &self,
        func: &Function,
        id: InstId,
        ctx: &LocalContext,
        body: &mut WasmFunction,
    ) -> Result<(), EmitError> {
        match &func.inst(id).kind {
            InstKind::Load(slot) => {
                body.instruction(&Instruction::LocalGet(slot_local(func, *slot, ctx)?));
            }
            InstKind::Store { slot, value } => {
                self.gen_value(func, *value, ctx, body)?;
                body.instruction(&Instruction::LocalSet(slot_local(func, *slot, ctx)?));
                return Ok(());
            }
            InstKind::Arith { op, lhs, rhs } => {
                self.gen_value(func, *lhs, ctx, body)?;
                self.gen_value(func, *rhs, ctx, body)?;
                body.instruction(&match op {
                    ArithOp::Add => Instruction::F64Add,
                    ArithOp::Sub => Instruction::F64Sub,
                    ArithOp::Mul => Instruction::F64Mul,
                    ArithOp::Div => Instruction::F64Div,
                });
            }
            InstKind::Compare { pred, lhs, rhs } => {
                self.gen_value(func, *lhs, ctx, body)?;
                self.gen_value(func, *rhs, ctx, body)?;
                body.instruction(&match pred {
                    ComparePred::Lt => Instruction::F64Lt,
                    ComparePred::Le => Instruction::F64Le,
                    ComparePred::Gt => Instruction::F64Gt,
                    ComparePred::Ge => Instruction::F64Ge,
                    ComparePred::Eq => Instruction::F64Eq,
                    ComparePred::Ne => Instruction::F64Ne,
                });
                // Comparisons yield 1.0 or 0.0.
                body.instruction(&Instruction::F64ConvertI32U);
            }
            InstKind::Call { callee, args } => {
                for arg in args {
                    self.gen_value(func, *arg, ctx, body)?;
                }
                let index = self
                    .func_indices
                    .get(callee)
                    .ok_or_else(|| EmitError::UnknownFunction(callee.clone()))?;
                body.instruction(&Instruction::Call(*index));
            }
        }

        // Every remaining instruction left exactly one value, unless it is a void call.
        if let Some(local) = ctx.inst(id) {
            body.instruction(&Instruction::LocalSet(local));
        }
        Ok(())
    }

    /// `loop_depth` is the branch depth of the dispatcher loop as seen from
    /// the end of the block.
    pub(crate) fn gen_terminator(
        &self,
        func: &Function,
        terminator: &Terminator,
        loop_depth: u32,
        ctx: &LocalContext,
        body: &mut WasmFunction,
    ) -> Result<(), EmitError> {
        match terminator {
            Terminator::Br(target) => {
                body.instruction(&Instruction::I32Const(target.0 as i32));
                body.instruction(&Instruction::LocalSet(ctx.pc()));
                body.instruction(&Instruction::Br(loop_depth));
            }
            Terminator::CondBr { cond, then_block, else_block } => {
                body.instruction(&Instruction::I32Const(then_block.0 as i32));
                body.instruction(&Instruction::I32Const(else_block.0 as i32));
                self.gen_value(func, *cond, ctx, body)?;
                body.instruction(&Instruction::F64Const(Ieee64::from(0.0)));
                body.instruction(&Instruction::F64Ne);
                body.instruction(&Instruction::Select);
                body.instruction(&Instruction::LocalSet(ctx.pc()));
                body.instruction(&Instruction::Br(loop_depth));
            }
            Terminator::Ret(value) => {
                if let Some(value) = value {
                    self.gen_value(func, *value, ctx, body)?;
                }
                body.instruction(&Instruction::Return);
            }
        }
        Ok(())
    }
}

fn slot_local(func: &Function, slot: SlotId, ctx: &LocalContext) -> Result<u32, EmitError> {
    ctx.slot(slot).ok_or_else(|| missing(func, format!("slot ${}", slot.0)))
}

fn missing(func: &Function, what: String) -> EmitError {
    EmitError::Malformed { function: func.name.clone(), what }
}
