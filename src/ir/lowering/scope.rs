use std::collections::HashMap;

use crate::ir::SlotId;
use crate::types::Type;

/// Storage of a named variable: its stack slot and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub slot: SlotId,
    pub ty: Type,
}

/// Variables visible in the function being lowered.
///
/// Every construct that introduces names (function parameters, `var`, `for`)
/// calls [`Scope::bind`] on entry and hands the returned previous binding back
/// to [`Scope::restore`] on exit, so shadowing unwinds exactly.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    /// Install `binding` for `name`, returning whatever it shadows.
    pub fn bind(&mut self, name: &str, binding: Binding) -> Option<Binding> {
        self.bindings.insert(name.to_string(), binding)
    }

    /// Undo a [`Scope::bind`]: reinstall the shadowed binding, or remove the
    /// name entirely when there was none.
    pub fn restore(&mut self, name: &str, previous: Option<Binding>) {
        match previous {
            Some(binding) => {
                self.bindings.insert(name.to_string(), binding);
            }
            None => {
                self.bindings.remove(name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_is_reversible() {
        let mut scope = Scope::new();
        let outer = Binding { slot: SlotId(0), ty: Type::Num };
        let inner = Binding { slot: SlotId(1), ty: Type::Str };

        assert_eq!(scope.bind("x", outer), None);
        let shadowed = scope.bind("x", inner);
        assert_eq!(scope.lookup("x"), Some(inner));

        scope.restore("x", shadowed);
        assert_eq!(scope.lookup("x"), Some(outer));
        scope.restore("x", None);
        assert!(scope.is_empty());
    }
}
