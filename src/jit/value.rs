use std::fmt;
use std::rc::Rc;

use crate::types::Type;

/// A value at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum RtValue {
    Num(f64),
    Str(Rc<str>),
    Void,
}

impl RtValue {
    pub fn ty(&self) -> Type {
        match self {
            RtValue::Num(_) => Type::Num,
            RtValue::Str(_) => Type::Str,
            RtValue::Void => Type::Void,
        }
    }

    pub fn zero(ty: Type) -> RtValue {
        match ty {
            Type::Num => RtValue::Num(0.0),
            Type::Str => RtValue::Str(Rc::from("")),
            Type::Void => RtValue::Void,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            RtValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RtValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for RtValue {
    fn from(n: f64) -> Self {
        RtValue::Num(n)
    }
}

impl From<&str> for RtValue {
    fn from(s: &str) -> Self {
        RtValue::Str(Rc::from(s))
    }
}

/// Numbers print with six decimals, like C's `%f`.
impl fmt::Display for RtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtValue::Num(n) => write!(f, "{n:.6}"),
            RtValue::Str(s) => write!(f, "{s}"),
            RtValue::Void => write!(f, "void"),
        }
    }
}
