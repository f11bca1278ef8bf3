//! Control-flow-graph IR.
//!
//! A [`Module`] is one compilation unit. Each [`Function`] owns an arena of
//! instructions, a list of stack slots allocated in its entry frame, and a
//! list of basic blocks that reference instructions by id. A function without
//! blocks is a declaration. Values never flow through phi nodes: anything that
//! crosses a join point goes through a slot.

use crate::ast::Prototype;
use crate::types::{Param, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

/// Index into [`Module::strings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Str(StrId),
    Param(u32),
    Inst(InstId),
}

impl Value {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// IEEE semantics: division by zero yields an infinity or NaN.
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            ArithOp::Add => "fadd",
            ArithOp::Sub => "fsub",
            ArithOp::Mul => "fmul",
            ArithOp::Div => "fdiv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparePred {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl ComparePred {
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparePred::Lt => lhs < rhs,
            ComparePred::Le => lhs <= rhs,
            ComparePred::Gt => lhs > rhs,
            ComparePred::Ge => lhs >= rhs,
            ComparePred::Eq => lhs == rhs,
            ComparePred::Ne => lhs != rhs,
        }
    }

    /// Comparisons produce a number: 1 when true, 0 otherwise.
    pub fn eval(&self, lhs: f64, rhs: f64) -> f64 {
        if self.holds(lhs, rhs) {
            1.0
        } else {
            0.0
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            ComparePred::Lt => "lt",
            ComparePred::Le => "le",
            ComparePred::Gt => "gt",
            ComparePred::Ge => "ge",
            ComparePred::Eq => "eq",
            ComparePred::Ne => "ne",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    Load(SlotId),
    Store { slot: SlotId, value: Value },
    Arith { op: ArithOp, lhs: Value, rhs: Value },
    Compare { pred: ComparePred, lhs: Value, rhs: Value },
    Call { callee: String, args: Vec<Value> },
}

impl InstKind {
    /// Operand values read by this instruction.
    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Load(_) => Vec::new(),
            InstKind::Store { value, .. } => vec![*value],
            InstKind::Arith { lhs, rhs, .. } | InstKind::Compare { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstKind::Call { args, .. } => args.clone(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            InstKind::Load(_) => Vec::new(),
            InstKind::Store { value, .. } => vec![value],
            InstKind::Arith { lhs, rhs, .. } | InstKind::Compare { lhs, rhs, .. } => vec![lhs, rhs],
            InstKind::Call { args, .. } => args.iter_mut().collect(),
        }
    }

    /// Stores and calls must survive even when their result is unused.
    pub fn has_side_effects(&self) -> bool {
        matches!(self, InstKind::Store { .. } | InstKind::Call { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inst {
    pub kind: InstKind,
    /// Result type; `Void` for stores and calls to void functions.
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Br(BlockId),
    /// Jumps to `then_block` when `cond != 0`.
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Option<Value>),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr { then_block, else_block, .. } => vec![*then_block, *else_block],
            Terminator::Ret(_) => Vec::new(),
        }
    }

    pub fn operand(&self) -> Option<Value> {
        match self {
            Terminator::CondBr { cond, .. } => Some(*cond),
            Terminator::Ret(value) => *value,
            Terminator::Br(_) => None,
        }
    }

    pub fn operand_mut(&mut self) -> Option<&mut Value> {
        match self {
            Terminator::CondBr { cond, .. } => Some(cond),
            Terminator::Ret(value) => value.as_mut(),
            Terminator::Br(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub insts: Vec<InstId>,
    pub terminator: Option<Terminator>,
}

/// A stack slot in the function's entry frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub slots: Vec<Slot>,
    pub insts: Vec<Inst>,
    /// Empty for declarations. The first block is the entry block.
    pub blocks: Vec<Block>,
}

/// An unnamed `void` declaration with no parameters.
impl Default for Function {
    fn default() -> Self {
        Function::declaration("", Vec::new(), Type::Void)
    }
}

impl Function {
    pub fn declaration(name: impl Into<String>, params: Vec<Param>, ret: Type) -> Self {
        Function {
            name: name.into(),
            params,
            ret,
            slots: Vec::new(),
            insts: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn from_prototype(proto: &Prototype) -> Self {
        Self::declaration(proto.name.clone(), proto.params.clone(), proto.return_type)
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty).collect()
    }

    pub fn same_signature(&self, params: &[Type], ret: Type) -> bool {
        self.ret == ret && self.param_types() == params
    }

    pub fn inst(&self, id: InstId) -> &Inst {
        &self.insts[id.0 as usize]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    /// Type of a value as seen from inside this function. `None` for
    /// dangling parameter or instruction references.
    pub fn value_type(&self, value: Value) -> Option<Type> {
        match value {
            Value::Num(_) => Some(Type::Num),
            Value::Str(_) => Some(Type::Str),
            Value::Param(index) => self.params.get(index as usize).map(|p| p.ty),
            Value::Inst(id) => self.insts.get(id.0 as usize).map(|i| i.ty),
        }
    }

    /// Drop the body, turning the function back into a declaration.
    pub fn clear_body(&mut self) {
        self.slots.clear();
        self.insts.clear();
        self.blocks.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    /// String literal pool, shared by all functions of the module.
    pub strings: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module { name: name.into(), functions: Vec::new(), strings: Vec::new() }
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name == name)
    }

    /// Return the function called `name`, adding a declaration for it first
    /// if the module does not have one yet.
    pub fn declare_function(&mut self, proto: &Prototype) -> &mut Function {
        let index = match self.function_index(&proto.name) {
            Some(index) => index,
            None => {
                self.functions.push(Function::from_prototype(proto));
                self.functions.len() - 1
            }
        };
        &mut self.functions[index]
    }

    pub fn remove_function(&mut self, name: &str) -> Option<Function> {
        let index = self.function_index(name)?;
        Some(self.functions.remove(index))
    }

    /// Insert or replace a function by name.
    pub fn install_function(&mut self, function: Function) {
        match self.function_index(&function.name) {
            Some(index) => self.functions[index] = function,
            None => self.functions.push(function),
        }
    }

    pub fn defined_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| !f.is_declaration())
    }

    pub fn intern_string(&mut self, text: &str) -> StrId {
        if let Some(index) = self.strings.iter().position(|s| s == text) {
            return StrId(index as u32);
        }
        self.strings.push(text.to_string());
        StrId(self.strings.len() as u32 - 1)
    }

    pub fn string(&self, id: StrId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(String::as_str)
    }
}
