//! Abstract syntax tree.
//!
//! Every node owns its children; the tree is built once by the parser and
//! only read afterwards. `Display` renders a compact s-expression form.

use std::fmt;

use crate::types::{Param, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equality,
    NotEqual,
    Assign,
}

impl BinaryOp {
    /// Binding strength used by precedence climbing.
    pub fn precedence(&self) -> i32 {
        match self {
            BinaryOp::Mul | BinaryOp::Div => 20,
            BinaryOp::Plus | BinaryOp::Minus => 10,
            BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual
            | BinaryOp::Equality
            | BinaryOp::NotEqual => 5,
            BinaryOp::Assign => 2,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 5
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equality => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Assign => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    XString(String),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// Both branches are mandatory, unlike the statement form.
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarBinding {
    pub name: String,
    /// `None` when the annotation is omitted; the initializer decides.
    pub ty: Option<Type>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    ExprStmt(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    For {
        var: String,
        init: Expr,
        condition: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    /// Bindings are only visible inside `body`.
    Var {
        bindings: Vec<VarBinding>,
        body: Vec<Stmt>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
}

impl Prototype {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_type: Type) -> Self {
        Self { name: name.into(), params, return_type }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Vec<Stmt>,
}

/// One top-level construct as handed to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(Function),
    Extern(Prototype),
    Stmt(Stmt),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::XString(s) => write!(f, "\"{s}\""),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Binary { op, left, right } => write!(f, "({} {left} {right})", op.symbol()),
            Expr::Call { callee, args } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Expr::If { condition, then_branch, else_branch } => {
                write!(f, "(if {condition} {then_branch} {else_branch})")
            }
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, stmts: &[Stmt]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{stmt}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::ExprStmt(expr) => write!(f, "{expr};"),
            Stmt::Return(Some(expr)) => write!(f, "(return {expr})"),
            Stmt::Return(None) => write!(f, "(return)"),
            Stmt::If { condition, then_branch, else_branch } => {
                write!(f, "(if {condition} ")?;
                write_block(f, then_branch)?;
                if !else_branch.is_empty() {
                    write!(f, " else ")?;
                    write_block(f, else_branch)?;
                }
                write!(f, ")")
            }
            Stmt::For { var, init, condition, step, body } => {
                write!(f, "(for {var} {init} {condition}")?;
                if let Some(step) = step {
                    write!(f, " {step}")?;
                }
                write!(f, " ")?;
                write_block(f, body)?;
                write!(f, ")")
            }
            Stmt::Var { bindings, body } => {
                write!(f, "(var")?;
                for b in bindings {
                    write!(f, " [{}", b.name)?;
                    if let Some(ty) = b.ty {
                        write!(f, ": {ty}")?;
                    }
                    if let Some(init) = &b.init {
                        write!(f, " = {init}")?;
                    }
                    write!(f, "]")?;
                }
                write!(f, " ")?;
                write_block(f, body)?;
                write!(f, ")")
            }
            Stmt::Empty => write!(f, ";"),
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", p.name, p.ty)?;
        }
        write!(f, "): {}", self.return_type)
    }
}
