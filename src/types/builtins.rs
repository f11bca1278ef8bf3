//! Built-in type names and the externally linked intrinsic functions

use super::{Param, Type};

/// Map a type keyword to the Type enum. `None` for ordinary identifiers.
pub fn map_builtin_type(name: &str) -> Option<Type> {
    match name {
        "num" => Some(Type::Num),
        "str" => Some(Type::Str),
        "void" => Some(Type::Void),
        _ => None,
    }
}

/// Signature of a host-provided function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intrinsic {
    pub name: &'static str,
    pub params: &'static [(&'static str, Type)],
    pub ret: Type,
}

impl Intrinsic {
    pub fn params(&self) -> Vec<Param> {
        self.params.iter().map(|(name, ty)| Param::new(*name, *ty)).collect()
    }
}

/// Print/read primitives every session can call without an `extern`.
pub const INTRINSICS: &[Intrinsic] = &[
    Intrinsic { name: "putchard", params: &[("x", Type::Num)], ret: Type::Num },
    Intrinsic { name: "printd", params: &[("x", Type::Num)], ret: Type::Num },
    Intrinsic { name: "prints", params: &[("s", Type::Str)], ret: Type::Num },
    Intrinsic { name: "scand", params: &[], ret: Type::Num },
];

pub fn find_intrinsic(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.iter().find(|i| i.name == name)
}
