//! Textual form of the IR, loosely modelled on LLVM assembly. This is what the
//! interactive session echoes after each definition.

use std::fmt;

use super::types::{BlockId, Function, InstKind, Module, Terminator, Value};

struct ValueRef<'a>(&'a Function, Value);

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Value::Num(n) => write!(f, "{n:?}"),
            Value::Str(id) => write!(f, "@str.{}", id.0),
            Value::Param(index) => match self.0.params.get(index as usize) {
                Some(param) => write!(f, "%{}", param.name),
                None => write!(f, "%arg{index}"),
            },
            Value::Inst(id) => write!(f, "%{}", id.0),
        }
    }
}

fn block_name(function: &Function, id: BlockId) -> &str {
    function.blocks.get(id.0 as usize).map_or("<missing>", |b| b.name.as_str())
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_declaration() {
            write!(f, "declare {} @{}(", self.ret, self.name)?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param.ty)?;
            }
            return writeln!(f, ")");
        }

        write!(f, "define {} @{}(", self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %{}", param.ty, param.name)?;
        }
        writeln!(f, ") {{")?;
        for (i, slot) in self.slots.iter().enumerate() {
            writeln!(f, "  ${i} = alloca {} ; {}", slot.ty, slot.name)?;
        }

        for block in &self.blocks {
            writeln!(f, "{}:", block.name)?;
            for &id in &block.insts {
                let inst = self.inst(id);
                let v = |value: &Value| ValueRef(self, *value);
                match &inst.kind {
                    InstKind::Load(slot) => writeln!(f, "  %{} = load {} ${}", id.0, inst.ty, slot.0)?,
                    InstKind::Store { slot, value } => writeln!(f, "  store {}, ${}", v(value), slot.0)?,
                    InstKind::Arith { op, lhs, rhs } => {
                        writeln!(f, "  %{} = {} {}, {}", id.0, op.mnemonic(), v(lhs), v(rhs))?
                    }
                    InstKind::Compare { pred, lhs, rhs } => {
                        writeln!(f, "  %{} = fcmp {} {}, {}", id.0, pred.mnemonic(), v(lhs), v(rhs))?
                    }
                    InstKind::Call { callee, args } => {
                        if inst.ty.is_value() {
                            write!(f, "  %{} = call {} @{callee}(", id.0, inst.ty)?;
                        } else {
                            write!(f, "  call void @{callee}(")?;
                        }
                        for (i, arg) in args.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", v(arg))?;
                        }
                        writeln!(f, ")")?;
                    }
                }
            }
            match &block.terminator {
                Some(Terminator::Br(target)) => writeln!(f, "  br label %{}", block_name(self, *target))?,
                Some(Terminator::CondBr { cond, then_block, else_block }) => writeln!(
                    f,
                    "  br {}, label %{}, label %{}",
                    ValueRef(self, *cond),
                    block_name(self, *then_block),
                    block_name(self, *else_block)
                )?,
                Some(Terminator::Ret(Some(value))) => writeln!(f, "  ret {} {}", self.ret, ValueRef(self, *value))?,
                Some(Terminator::Ret(None)) => writeln!(f, "  ret void")?,
                None => writeln!(f, "  <unterminated>")?,
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for (i, text) in self.strings.iter().enumerate() {
            writeln!(f, "@str.{i} = {text:?}")?;
        }
        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
