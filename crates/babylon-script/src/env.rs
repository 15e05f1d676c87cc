// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Environment for variable bindings.

use indexmap::IndexMap;

use babylon_runtime::{Frame, Value};

/// A scope in the environment.
#[derive(Debug, Default, Clone)]
struct Scope {
    bindings: IndexMap<String, Value>,
}

/// Variable bindings of one activation, innermost scope last.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Define a variable in the current scope.
    pub fn define(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.bindings.get_mut(name))
    }

    /// Assign to an existing variable.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Visible names, outermost first, shadowed names once.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for scope in &self.scopes {
            for name in scope.bindings.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}

/// Listener-facing view of the running frame: the active function's
/// locals over the program's globals.
pub(crate) struct FrameView<'a> {
    pub locals: Option<&'a Environment>,
    pub globals: &'a Environment,
}

impl Frame for FrameView<'_> {
    fn slot_names(&self) -> Vec<String> {
        let mut names = self.globals.names();
        if let Some(locals) = self.locals {
            for name in locals.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn read(&self, name: &str) -> Option<Value> {
        self.locals
            .and_then(|locals| locals.get(name))
            .or_else(|| self.globals.get(name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_shadow_and_restore() {
        let mut env = Environment::new();
        env.define("x".into(), Value::Int(1));
        env.push_scope();
        env.define("x".into(), Value::Int(2));
        assert_eq!(env.get("x"), Some(&Value::Int(2)));
        env.pop_scope();
        assert_eq!(env.get("x"), Some(&Value::Int(1)));
        assert!(!env.assign("y", Value::Null));
    }

    #[test]
    fn frame_view_prefers_locals() {
        let mut globals = Environment::new();
        globals.define("g".into(), Value::Int(1));
        globals.define("x".into(), Value::Int(1));
        let mut locals = Environment::new();
        locals.define("x".into(), Value::Int(2));
        let view = FrameView {
            locals: Some(&locals),
            globals: &globals,
        };
        assert_eq!(view.read("x"), Some(Value::Int(2)));
        assert_eq!(view.read("g"), Some(Value::Int(1)));
        assert_eq!(view.slot_names(), vec!["g".to_string(), "x".to_string()]);
        let snapshot = view.materialize();
        assert_eq!(snapshot.read("x"), Some(Value::Int(2)));
    }
}
