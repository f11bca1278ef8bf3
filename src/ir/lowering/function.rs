use tracing::{debug, debug_span};

use crate::ast::{Function as AstFunction, Prototype, Stmt};
use crate::ir::verify::verify_function;
use crate::ir::{Builder, Function, Value};
use crate::types::Type;

use super::{Binding, LowerError, LoweringContext};

impl LoweringContext<'_> {
    /// Lower an `extern` declaration: register its prototype and declare it
    /// in the current unit.
    pub fn lower_prototype(&mut self, proto: &Prototype) -> Result<&Function, LowerError> {
        self.check_signature(proto)?;
        self.registry.register(proto.clone());
        let declared = self.module.declare_function(proto);
        debug!(function = %proto.name, "declared");
        Ok(&*declared)
    }

    /// A declaration already in this unit must agree with `proto`.
    fn check_signature(&self, proto: &Prototype) -> Result<(), LowerError> {
        match self.module.get_function(&proto.name) {
            Some(existing) if !existing.same_signature(&proto.param_types(), proto.return_type) => {
                Err(LowerError::SignatureMismatch(proto.name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Lower a function definition into the current unit.
    ///
    /// On failure the unit is left as it was: a function that did not exist
    /// before is removed again and an earlier declaration stays a declaration.
    pub fn lower_function(&mut self, function: &AstFunction) -> Result<&Function, LowerError> {
        let proto = &function.proto;
        let _span = debug_span!("lower_function", function = %proto.name).entered();

        if self.registry.is_defined(&proto.name)
            || self.module.get_function(&proto.name).is_some_and(|f| !f.is_declaration())
        {
            return Err(LowerError::DuplicateDefinition(proto.name.clone()));
        }
        self.check_signature(proto)?;

        let existed = self.module.get_function(&proto.name).is_some();
        // Declared up front so recursive calls resolve.
        self.module.declare_function(proto);

        match self.build_body(proto, &function.body) {
            Ok(body) => {
                self.module.install_function(body);
                self.registry.register(proto.clone());
                self.registry.mark_defined(&proto.name);
                debug!("defined");
                self.defined(&proto.name)
            }
            Err(err) => {
                if !existed {
                    self.module.remove_function(&proto.name);
                }
                debug!(error = %err, "lowering failed");
                Err(err)
            }
        }
    }

    fn build_body(&mut self, proto: &Prototype, body: &[Stmt]) -> Result<Function, LowerError> {
        self.builder = Builder::new(Function::from_prototype(proto));
        self.scope.clear();

        let entry = self.builder.append_block("entry");
        self.builder.position_at_end(entry);

        let mut shadowed = Vec::with_capacity(proto.params.len());
        for (index, param) in proto.params.iter().enumerate() {
            let slot = self.builder.create_entry_slot(&param.name, param.ty);
            self.builder.build_store(slot, Value::Param(index as u32));
            shadowed.push((param.name.as_str(), self.scope.bind(&param.name, Binding { slot, ty: param.ty })));
        }

        let lowered = self.lower_block(body);
        for (name, previous) in shadowed.into_iter().rev() {
            self.scope.restore(name, previous);
        }
        lowered?;

        self.finish_function()
    }

    /// Close the last block with the zero value of the return type, then
    /// verify and optimize the finished function.
    fn finish_function(&mut self) -> Result<Function, LowerError> {
        if !self.builder.is_terminated() {
            let ret = self.builder.return_type();
            let value = self.zero_value(ret);
            self.builder.build_ret(value);
        }
        let mut function = std::mem::take(&mut self.builder).finish();
        self.scope.clear();

        verify_function(&function, self.module)?;
        if let Some(passes) = &mut self.passes {
            passes.run(&mut function, self.module)?;
        }
        Ok(function)
    }

    /// Wrap a top-level statement in a parameterless function called `name`.
    ///
    /// An expression statement returns the value of its expression (nothing
    /// for a void call); `return e;` returns `e`; every other statement
    /// produces a void function.
    pub fn lower_anonymous(&mut self, stmt: &Stmt, name: &str) -> Result<&Function, LowerError> {
        let _span = debug_span!("lower_anonymous", function = name).entered();
        if self.module.get_function(name).is_some() {
            return Err(LowerError::DuplicateDefinition(name.to_string()));
        }

        self.builder = Builder::new(Function::declaration(name, Vec::new(), Type::Void));
        self.scope.clear();
        let entry = self.builder.append_block("entry");
        self.builder.position_at_end(entry);

        let result = match stmt {
            Stmt::ExprStmt(expr) | Stmt::Return(Some(expr)) => self.lower_expr(expr).map(|value| {
                let ty = value.map_or(Type::Void, |v| self.type_of(v));
                self.builder.set_return_type(ty);
                self.builder.build_ret(value);
            }),
            other => self.lower_stmt(other),
        };
        let function = result.and_then(|()| self.finish_function());
        let function = function.inspect_err(|err| debug!(error = %err, "lowering failed"))?;

        self.module.install_function(function);
        self.defined(name)
    }

    fn defined(&self, name: &str) -> Result<&Function, LowerError> {
        self.module.get_function(name).ok_or_else(|| LowerError::UnknownFunction(name.to_string()))
    }
}
