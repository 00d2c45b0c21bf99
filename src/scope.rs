//! Evaluation scope: the name → value mapping an expression sees

use crate::ast::Value;
use std::collections::HashMap;

/// Variables visible to an expression.
///
/// Bindings are plain values: data sources, library modules, functions and
/// anything the expression assigns. `set` overwrites silently; callers that
/// care about collisions check `contains` first.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bind `name`, returning the value it replaced
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.bindings.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bound names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_returns_previous_binding() {
        let mut scope = Scope::new();
        assert!(scope.set("d", Value::Number(1.0)).is_none());
        assert_eq!(scope.set("d", Value::Number(2.0)), Some(Value::Number(1.0)));
        assert_eq!(scope.get("d"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn names_are_sorted() {
        let mut scope = Scope::new();
        scope.set("d2", Value::None);
        scope.set("d", Value::None);
        scope.set("d1", Value::None);
        assert_eq!(scope.names(), vec!["d", "d1", "d2"]);
    }
}
