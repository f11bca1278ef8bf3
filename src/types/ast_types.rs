//! Type system definitions for the dust compiler
//!
//! The language has a fixed, small set of value types shared by the lexer,
//! parser, IR and both backends.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 64-bit float, the only numeric type.
    Num,
    /// Immutable string literal.
    Str,
    /// No value. Only valid as a return type.
    Void,
}

impl Type {
    /// Keyword spelling used in source code.
    pub fn keyword(&self) -> &'static str {
        match self {
            Type::Num => "num",
            Type::Str => "str",
            Type::Void => "void",
        }
    }

    pub fn is_value(&self) -> bool {
        !matches!(self, Type::Void)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty }
    }
}
