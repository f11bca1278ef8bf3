use crate::ast::{Expr, Stmt, VarBinding};
use crate::ir::{ArithOp, Value};
use crate::types::Type;

use super::{Binding, LowerError, LoweringContext};

impl LoweringContext<'_> {
    /// Lower statements in order. Anything after a terminator (for example a
    /// `return` in the middle of a block) is unreachable and skipped.
    pub(crate) fn lower_block(&mut self, stmts: &[Stmt]) -> Result<(), LowerError> {
        for stmt in stmts {
            if self.builder.is_terminated() {
                break;
            }
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), LowerError> {
        match stmt {
            Stmt::ExprStmt(expr) => {
                self.lower_expr(expr)?;
                Ok(())
            }
            Stmt::Return(value) => self.lower_return(value.as_ref()),
            Stmt::If { condition, then_branch, else_branch } => self.lower_if(condition, then_branch, else_branch),
            Stmt::For { var, init, condition, step, body } => {
                self.lower_for(var, init, condition, step.as_ref(), body)
            }
            Stmt::Var { bindings, body } => self.lower_var(bindings, body),
            Stmt::Empty => Ok(()),
        }
    }

    fn lower_return(&mut self, value: Option<&Expr>) -> Result<(), LowerError> {
        let expected = self.builder.return_type();
        let value = match value {
            Some(expr) => Some(self.lower_value(expr, "return")?),
            None => None,
        };
        let found = value.map_or(Type::Void, |v| self.type_of(v));
        if found != expected {
            return Err(LowerError::mismatch("return", expected, found));
        }
        self.builder.build_ret(value);
        Ok(())
    }

    fn lower_if(&mut self, condition: &Expr, then_branch: &[Stmt], else_branch: &[Stmt]) -> Result<(), LowerError> {
        let cond = self.lower_num(condition, "if")?;

        let then_bb = self.builder.append_block("then");
        let else_bb = self.builder.append_block("else");
        let merge_bb = self.builder.append_block("ifcont");
        self.builder.build_cond_br(cond, then_bb, else_bb);

        self.builder.position_at_end(then_bb);
        self.lower_block(then_branch)?;
        if !self.builder.is_terminated() {
            self.builder.build_br(merge_bb);
        }

        self.builder.position_at_end(else_bb);
        self.lower_block(else_branch)?;
        if !self.builder.is_terminated() {
            self.builder.build_br(merge_bb);
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    /// ```text
    ///   store init -> i
    ///   br cond
    /// cond:
    ///   br (test != 0), body, after
    /// body:
    ///   <body>
    ///   i = i + step
    ///   br cond
    /// after:
    /// ```
    fn lower_for(
        &mut self,
        var: &str,
        init: &Expr,
        condition: &Expr,
        step: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<(), LowerError> {
        // The initializer cannot see the loop variable it initializes.
        let start = self.lower_num(init, "for initializer")?;
        let slot = self.builder.create_entry_slot(var, Type::Num);
        self.builder.build_store(slot, start);

        let cond_bb = self.builder.append_block("loopcond");
        let body_bb = self.builder.append_block("loop");
        let after_bb = self.builder.append_block("afterloop");
        self.builder.build_br(cond_bb);

        let shadowed = self.scope.bind(var, Binding { slot, ty: Type::Num });

        self.builder.position_at_end(cond_bb);
        let test = self.lower_num(condition, "for condition")?;
        self.builder.build_cond_br(test, body_bb, after_bb);

        self.builder.position_at_end(body_bb);
        self.lower_block(body)?;
        if !self.builder.is_terminated() {
            let step = match step {
                Some(expr) => self.lower_num(expr, "for step")?,
                None => Value::Num(1.0),
            };
            let current = self.builder.build_load(slot);
            let next = self.builder.build_arith(ArithOp::Add, current, step);
            self.builder.build_store(slot, next);
            self.builder.build_br(cond_bb);
        }

        self.builder.position_at_end(after_bb);
        self.scope.restore(var, shadowed);
        Ok(())
    }

    fn lower_var(&mut self, bindings: &[VarBinding], body: &[Stmt]) -> Result<(), LowerError> {
        let mut shadowed = Vec::with_capacity(bindings.len());
        for binding in bindings {
            // Evaluate before binding so `var a = a` reads the outer `a`.
            let init = match &binding.init {
                Some(expr) => Some(self.lower_value(expr, "var initializer")?),
                None => None,
            };
            let init_ty = init.map(|v| self.type_of(v));
            let ty = match (binding.ty, init_ty) {
                (Some(declared), Some(found)) if declared != found => {
                    return Err(LowerError::mismatch(format!("initializer of '{}'", binding.name), declared, found));
                }
                (Some(declared), _) => declared,
                (None, Some(found)) => found,
                (None, None) => Type::Num,
            };

            let slot = self.builder.create_entry_slot(&binding.name, ty);
            if let Some(value) = init.or_else(|| self.zero_value(ty)) {
                self.builder.build_store(slot, value);
            }
            shadowed.push((binding.name.as_str(), self.scope.bind(&binding.name, Binding { slot, ty })));
        }

        self.lower_block(body)?;

        for (name, previous) in shadowed.into_iter().rev() {
            self.scope.restore(name, previous);
        }
        Ok(())
    }
}
