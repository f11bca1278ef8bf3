use std::collections::{HashMap, HashSet};

use crate::ast::Prototype;
use crate::types::INTRINSICS;

/// Canonical prototypes by function name, outliving individual compilation
/// units. Prototypes are last-write-wins; a body may be defined only once.
#[derive(Debug, Clone)]
pub struct DefinitionRegistry {
    prototypes: HashMap<String, Prototype>,
    defined: HashSet<String>,
}

impl DefinitionRegistry {
    /// A registry that already knows the host intrinsics.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for intrinsic in INTRINSICS {
            registry.register(Prototype::new(intrinsic.name, intrinsic.params(), intrinsic.ret));
        }
        registry
    }

    pub fn empty() -> Self {
        DefinitionRegistry { prototypes: HashMap::new(), defined: HashSet::new() }
    }

    /// Record `proto` as the canonical signature for its name, returning the
    /// prototype it replaces.
    pub fn register(&mut self, proto: Prototype) -> Option<Prototype> {
        self.prototypes.insert(proto.name.clone(), proto)
    }

    pub fn get(&self, name: &str) -> Option<&Prototype> {
        self.prototypes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prototypes.contains_key(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn mark_defined(&mut self, name: &str) {
        self.defined.insert(name.to_string());
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Param, Type};

    #[test]
    fn seeded_with_intrinsics() {
        let registry = DefinitionRegistry::new();
        let printd = registry.get("printd").unwrap();
        assert_eq!(printd.param_types(), vec![Type::Num]);
        assert!(!registry.is_defined("printd"));
    }

    #[test]
    fn last_write_wins() {
        let mut registry = DefinitionRegistry::empty();
        registry.register(Prototype::new("f", vec![], Type::Num));
        let old = registry.register(Prototype::new("f", vec![Param::new("a", Type::Str)], Type::Void));
        assert_eq!(old.map(|p| p.arity()), Some(0));
        assert_eq!(registry.get("f").map(|p| p.return_type), Some(Type::Void));
    }
}
