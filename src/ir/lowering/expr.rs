use tracing::trace;

use crate::ast::{BinaryOp, Expr};
use crate::ir::{ArithOp, ComparePred, Function, Value};
use crate::types::Type;

use super::{LowerError, LoweringContext};

/// How a binary operator lowers.
enum BinaryLowering {
    Arith(ArithOp),
    Compare(ComparePred),
    Assign,
}

fn classify(op: BinaryOp) -> BinaryLowering {
    match op {
        BinaryOp::Plus => BinaryLowering::Arith(ArithOp::Add),
        BinaryOp::Minus => BinaryLowering::Arith(ArithOp::Sub),
        BinaryOp::Mul => BinaryLowering::Arith(ArithOp::Mul),
        BinaryOp::Div => BinaryLowering::Arith(ArithOp::Div),
        BinaryOp::Less => BinaryLowering::Compare(ComparePred::Lt),
        BinaryOp::LessEqual => BinaryLowering::Compare(ComparePred::Le),
        BinaryOp::Greater => BinaryLowering::Compare(ComparePred::Gt),
        BinaryOp::GreaterEqual => BinaryLowering::Compare(ComparePred::Ge),
        BinaryOp::Equality => BinaryLowering::Compare(ComparePred::Eq),
        BinaryOp::NotEqual => BinaryLowering::Compare(ComparePred::Ne),
        BinaryOp::Assign => BinaryLowering::Assign,
    }
}

impl LoweringContext<'_> {
    /// Lower an expression. `None` is the result of a call to a void function.
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> Result<Option<Value>, LowerError> {
        match expr {
            Expr::Number(n) => Ok(Some(Value::Num(*n))),
            Expr::XString(s) => Ok(Some(Value::Str(self.module.intern_string(s)))),
            Expr::Variable(name) => {
                let binding = self.scope.lookup(name).ok_or_else(|| LowerError::UnknownVariable(name.clone()))?;
                Ok(Some(self.builder.build_load(binding.slot)))
            }
            Expr::Binary { op, left, right } => match classify(*op) {
                BinaryLowering::Assign => self.lower_assign(left, right).map(Some),
                BinaryLowering::Arith(arith) => {
                    let lhs = self.lower_num(left, op.symbol())?;
                    let rhs = self.lower_num(right, op.symbol())?;
                    Ok(Some(self.builder.build_arith(arith, lhs, rhs)))
                }
                BinaryLowering::Compare(pred) => {
                    let lhs = self.lower_num(left, op.symbol())?;
                    let rhs = self.lower_num(right, op.symbol())?;
                    Ok(Some(self.builder.build_compare(pred, lhs, rhs)))
                }
            },
            Expr::Call { callee, args } => self.lower_call(callee, args),
            Expr::If { condition, then_branch, else_branch } => {
                self.lower_if_expr(condition, then_branch, else_branch)
            }
        }
    }

    /// Lower an expression that must produce a value.
    pub(crate) fn lower_value(&mut self, expr: &Expr, context: &str) -> Result<Value, LowerError> {
        self.lower_expr(expr)?.ok_or_else(|| LowerError::VoidValue(format!("{context} operand '{expr}'")))
    }

    /// Lower an expression that must produce a number.
    pub(crate) fn lower_num(&mut self, expr: &Expr, context: &str) -> Result<Value, LowerError> {
        let value = self.lower_value(expr, context)?;
        match self.type_of(value) {
            Type::Num => Ok(value),
            found => Err(LowerError::mismatch(format!("operand of '{context}'"), Type::Num, found)),
        }
    }

    /// `x = e` stores into the slot bound to `x` and yields the stored value.
    fn lower_assign(&mut self, target: &Expr, value: &Expr) -> Result<Value, LowerError> {
        let Expr::Variable(name) = target else {
            return Err(LowerError::InvalidAssignTarget);
        };
        let value = self.lower_value(value, "=")?;
        let binding = self.scope.lookup(name).ok_or_else(|| LowerError::UnknownVariable(name.clone()))?;
        let found = self.type_of(value);
        if found != binding.ty {
            return Err(LowerError::mismatch(format!("assignment to '{name}'"), binding.ty, found));
        }
        self.builder.build_store(binding.slot, value);
        Ok(value)
    }

    /// Find the signature of `name`: the current unit first, then the
    /// registry, in which case a declaration is added to the unit.
    pub(crate) fn resolve_callee(&mut self, name: &str) -> Result<(Vec<Type>, Type), LowerError> {
        if let Some(function) = self.module.get_function(name) {
            return Ok((function.param_types(), function.ret));
        }
        let proto = self.registry.get(name).ok_or_else(|| LowerError::UnknownFunction(name.to_string()))?;
        let declared: &Function = self.module.declare_function(proto);
        trace!(callee = name, "declared from registry");
        Ok((declared.param_types(), declared.ret))
    }

    fn lower_call(&mut self, callee: &str, args: &[Expr]) -> Result<Option<Value>, LowerError> {
        let (params, ret) = self.resolve_callee(callee)?;
        if params.len() != args.len() {
            return Err(LowerError::ArityMismatch {
                callee: callee.to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (arg, expected)) in args.iter().zip(&params).enumerate() {
            let value = self.lower_value(arg, "call argument")?;
            let found = self.type_of(value);
            if found != *expected {
                return Err(LowerError::mismatch(format!("argument {} of '{callee}'", index + 1), *expected, found));
            }
            values.push(value);
        }
        Ok(self.builder.build_call(callee, values, ret))
    }

    /// Both arms store into a shared temporary slot which the merge block
    /// loads back.
    fn lower_if_expr(&mut self, condition: &Expr, then_expr: &Expr, else_expr: &Expr) -> Result<Option<Value>, LowerError> {
        let cond = self.lower_num(condition, "if")?;

        let then_bb = self.builder.append_block("then");
        let else_bb = self.builder.append_block("else");
        let merge_bb = self.builder.append_block("ifcont");
        self.builder.build_cond_br(cond, then_bb, else_bb);

        self.builder.position_at_end(then_bb);
        let then_value = self.lower_expr(then_expr)?;
        let result_ty = then_value.map_or(Type::Void, |v| self.type_of(v));
        let slot = result_ty.is_value().then(|| self.builder.create_entry_slot("iftmp", result_ty));
        if let (Some(slot), Some(value)) = (slot, then_value) {
            self.builder.build_store(slot, value);
        }
        self.builder.build_br(merge_bb);

        self.builder.position_at_end(else_bb);
        let else_value = self.lower_expr(else_expr)?;
        let else_ty = else_value.map_or(Type::Void, |v| self.type_of(v));
        if else_ty != result_ty {
            return Err(LowerError::mismatch("else branch of if expression", result_ty, else_ty));
        }
        if let (Some(slot), Some(value)) = (slot, else_value) {
            self.builder.build_store(slot, value);
        }
        self.builder.build_br(merge_bb);

        self.builder.position_at_end(merge_bb);
        Ok(slot.map(|slot| self.builder.build_load(slot)))
    }
}
