//! Execution engine.
//!
//! Modules are loaded under a [`ResourceTracker`] and run by interpreting
//! their IR. Calls are resolved by name at call time: first against the
//! functions of every loaded module, then against the host intrinsics. Removing
//! a tracker unloads its module and makes its symbols unresolvable again.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ir::{BlockId, Function, InstId, InstKind, Module, Terminator, Value};
use crate::types::Type;

use super::host::{call_intrinsic, Host, StdHost};
use super::value::RtValue;

/// Recursion depth at which a call fails with [`ExecError::StackOverflow`].
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecError {
    #[error("symbol '{0}' is already defined by a loaded module")]
    DuplicateSymbol(String),
    #[error("unresolved symbol '{0}'")]
    UnresolvedSymbol(String),
    #[error("unknown resource tracker #{0}")]
    UnknownTracker(u64),
    #[error("bad arguments in call to '{function}'")]
    BadArguments { function: String },
    #[error("stack overflow after {0} nested calls")]
    StackOverflow(usize),
    #[error("malformed code in '{function}': {detail}")]
    Malformed { function: String, detail: String },
}

/// Handle to one loaded module. Removing it unloads every symbol it defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTracker(u64);

impl ResourceTracker {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A resolvable function and the module that defines it.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub tracker: ResourceTracker,
    pub params: Vec<Type>,
    pub ret: Type,
}

pub struct ExecutionEngine<H = StdHost> {
    modules: BTreeMap<ResourceTracker, Rc<Module>>,
    symbols: HashMap<String, ResourceTracker>,
    next_tracker: u64,
    host: H,
    max_depth: usize,
}

impl ExecutionEngine<StdHost> {
    pub fn new() -> Self {
        Self::with_host(StdHost::new())
    }
}

impl Default for ExecutionEngine<StdHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> ExecutionEngine<H> {
    pub fn with_host(host: H) -> Self {
        ExecutionEngine {
            modules: BTreeMap::new(),
            symbols: HashMap::new(),
            next_tracker: 0,
            host,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Load `module` under a fresh tracker. Fails without loading anything if
    /// it defines a symbol another loaded module already defines.
    pub fn add_module(&mut self, module: Module) -> Result<ResourceTracker, ExecError> {
        if let Some(clash) = module.defined_functions().find(|f| self.symbols.contains_key(&f.name)) {
            return Err(ExecError::DuplicateSymbol(clash.name.clone()));
        }

        let tracker = ResourceTracker(self.next_tracker);
        self.next_tracker += 1;
        for function in module.defined_functions() {
            self.symbols.insert(function.name.clone(), tracker);
        }
        debug!(tracker = tracker.0, module = %module.name, symbols = module.defined_functions().count(), "module loaded");
        self.modules.insert(tracker, Rc::new(module));
        Ok(tracker)
    }

    /// Unload the module behind `tracker`.
    pub fn remove(&mut self, tracker: ResourceTracker) -> Result<(), ExecError> {
        let module = self.modules.remove(&tracker).ok_or(ExecError::UnknownTracker(tracker.0))?;
        self.symbols.retain(|_, owner| *owner != tracker);
        debug!(tracker = tracker.0, module = %module.name, "module removed");
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let tracker = *self.symbols.get(name)?;
        let function = self.modules.get(&tracker)?.get_function(name)?;
        Some(Symbol { name: name.to_string(), tracker, params: function.param_types(), ret: function.ret })
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Call `name` with `args`.
    ///
    /// Frames live on a heap stack, so deep recursion in user code ends in
    /// [`ExecError::StackOverflow`] rather than exhausting the native stack.
    pub fn call(&mut self, name: &str, args: &[RtValue]) -> Result<RtValue, ExecError> {
        let mut stack = match self.enter(name, args.to_vec(), 0)? {
            Callee::Frame(frame) => vec![frame],
            Callee::Done(value) => return Ok(value),
        };

        loop {
            let depth = stack.len();
            let Some(frame) = stack.last_mut() else {
                return Err(ExecError::UnresolvedSymbol(name.to_string()));
            };
            let returned = match frame.step()? {
                Step::Continue => continue,
                Step::Call { callee, args } => match self.enter(&callee, args, depth)? {
                    Callee::Frame(next) => {
                        stack.push(next);
                        continue;
                    }
                    Callee::Done(value) => value,
                },
                Step::Return(value) => {
                    stack.pop();
                    value
                }
            };
            match stack.last_mut() {
                Some(caller) => caller.resume(returned)?,
                None => return Ok(returned),
            }
        }
    }

    /// Resolve `name` and either open a frame for it or run the intrinsic.
    fn enter(&mut self, name: &str, args: Vec<RtValue>, depth: usize) -> Result<Callee, ExecError> {
        if depth >= self.max_depth {
            return Err(ExecError::StackOverflow(depth));
        }
        let module = self.symbols.get(name).and_then(|tracker| self.modules.get(tracker)).cloned();
        if let Some(module) = module {
            let index = module.function_index(name).ok_or_else(|| ExecError::UnresolvedSymbol(name.to_string()))?;
            trace!(function = name, depth, "call");
            return Frame::new(module, index, args).map(Callee::Frame);
        }
        call_intrinsic(&mut self.host, name, &args)?
            .map(Callee::Done)
            .ok_or_else(|| ExecError::UnresolvedSymbol(name.to_string()))
    }
}

enum Callee {
    Frame(Frame),
    Done(RtValue),
}

enum Step {
    Continue,
    Call { callee: String, args: Vec<RtValue> },
    Return(RtValue),
}

/// One activation of an interpreted function.
struct Frame {
    module: Rc<Module>,
    function: usize,
    args: Vec<RtValue>,
    slots: Vec<RtValue>,
    results: Vec<RtValue>,
    block: BlockId,
    /// Index of the next instruction in `block`.
    next: usize,
    /// Call instruction waiting for a result.
    waiting: Option<InstId>,
}

impl Frame {
    fn new(module: Rc<Module>, function: usize, args: Vec<RtValue>) -> Result<Self, ExecError> {
        let f = &module.functions[function];
        if args.len() != f.params.len() || args.iter().zip(&f.params).any(|(arg, param)| arg.ty() != param.ty) {
            return Err(ExecError::BadArguments { function: f.name.clone() });
        }
        if f.is_declaration() {
            return Err(ExecError::Malformed { function: f.name.clone(), detail: "no body".to_string() });
        }
        let slots = f.slots.iter().map(|s| RtValue::zero(s.ty)).collect();
        let results = vec![RtValue::Void; f.insts.len()];
        Ok(Frame { module, function, args, slots, results, block: BlockId(0), next: 0, waiting: None })
    }

    fn func(&self) -> &Function {
        &self.module.functions[self.function]
    }

    fn malformed(&self, detail: String) -> ExecError {
        ExecError::Malformed { function: self.func().name.clone(), detail }
    }

    fn eval(&self, value: Value) -> Result<RtValue, ExecError> {
        match value {
            Value::Num(n) => Ok(RtValue::Num(n)),
            Value::Str(id) => {
                self.module.string(id).map(RtValue::from).ok_or_else(|| self.malformed(format!("missing string #{}", id.0)))
            }
            Value::Param(index) => {
                self.args.get(index as usize).cloned().ok_or_else(|| self.malformed(format!("missing parameter {index}")))
            }
            Value::Inst(id) => {
                self.results.get(id.0 as usize).cloned().ok_or_else(|| self.malformed(format!("missing %{}", id.0)))
            }
        }
    }

    fn num(&self, value: Value) -> Result<f64, ExecError> {
        self.eval(value)?.as_num().ok_or_else(|| self.malformed("expected a number".to_string()))
    }

    /// Store the result of the call this frame is waiting on.
    fn resume(&mut self, value: RtValue) -> Result<(), ExecError> {
        let id = self.waiting.take().ok_or_else(|| self.malformed("unexpected call result".to_string()))?;
        self.results[id.0 as usize] = value;
        Ok(())
    }

    /// Execute one instruction or the block terminator.
    fn step(&mut self) -> Result<Step, ExecError> {
        let module = Rc::clone(&self.module);
        let function = &module.functions[self.function];
        let block = function
            .blocks
            .get(self.block.0 as usize)
            .ok_or_else(|| self.malformed(format!("branch to missing block {}", self.block.0)))?;

        let Some(&id) = block.insts.get(self.next) else {
            let target = match &block.terminator {
                Some(Terminator::Br(target)) => *target,
                Some(Terminator::CondBr { cond, then_block, else_block }) => {
                    if self.num(*cond)? != 0.0 {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Some(Terminator::Ret(Some(value))) => return self.eval(*value).map(Step::Return),
                Some(Terminator::Ret(None)) => return Ok(Step::Return(RtValue::Void)),
                None => return Err(self.malformed(format!("block '{}' has no terminator", block.name))),
            };
            self.block = target;
            self.next = 0;
            return Ok(Step::Continue);
        };
        self.next += 1;

        let result = match &function.inst(id).kind {
            InstKind::Load(slot) => self
                .slots
                .get(slot.0 as usize)
                .cloned()
                .ok_or_else(|| self.malformed(format!("missing slot ${}", slot.0)))?,
            InstKind::Store { slot, value } => {
                let value = self.eval(*value)?;
                match self.slots.get_mut(slot.0 as usize) {
                    Some(target) => *target = value,
                    None => return Err(self.malformed(format!("missing slot ${}", slot.0))),
                }
                RtValue::Void
            }
            InstKind::Arith { op, lhs, rhs } => RtValue::Num(op.apply(self.num(*lhs)?, self.num(*rhs)?)),
            InstKind::Compare { pred, lhs, rhs } => RtValue::Num(pred.eval(self.num(*lhs)?, self.num(*rhs)?)),
            InstKind::Call { callee, args } => {
                let args = args.iter().map(|a| self.eval(*a)).collect::<Result<Vec<_>, _>>()?;
                self.waiting = Some(id);
                return Ok(Step::Call { callee: callee.clone(), args });
            }
        };
        self.results[id.0 as usize] = result;
        Ok(Step::Continue)
    }
}
