// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Read access to a guest activation frame.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Lexical variables visible at an execution point.
pub trait Frame {
    /// Visible slot names, outermost scope first.
    fn slot_names(&self) -> Vec<String>;

    fn read(&self, name: &str) -> Option<Value>;

    /// Copy the visible slots into an owned frame that outlives the run.
    fn materialize(&self) -> MaterializedFrame {
        let mut slots = IndexMap::new();
        for name in self.slot_names() {
            if let Some(value) = self.read(&name) {
                slots.insert(name, value);
            }
        }
        MaterializedFrame { slots }
    }
}

/// An owned snapshot of a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializedFrame {
    slots: IndexMap<String, Value>,
}

impl MaterializedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.slots.insert(name.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.slots.iter()
    }
}

impl Frame for MaterializedFrame {
    fn slot_names(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    fn read(&self, name: &str) -> Option<Value> {
        self.slots.get(name).cloned()
    }

    fn materialize(&self) -> MaterializedFrame {
        self.clone()
    }
}
