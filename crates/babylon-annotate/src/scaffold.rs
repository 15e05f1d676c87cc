// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rendering of new example annotations.

use babylon_runtime::FunctionDeclaration;

use crate::model::ProbeMode;

/// An `<Example />` annotation ready to be inserted above a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleScaffold {
    pub name: String,
    pub probe_mode: ProbeMode,
    /// Argument name and literal text, in order.
    pub bindings: Vec<(String, String)>,
}

impl ExampleScaffold {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe_mode: ProbeMode::Default,
            bindings: Vec::new(),
        }
    }

    /// Scaffold binding every declared argument, using defaults where the
    /// declaration has them.
    pub fn for_function(name: impl Into<String>, decl: &FunctionDeclaration, placeholder: &str) -> Self {
        let mut scaffold = Self::new(name);
        for arg in &decl.arguments {
            let value = arg.default_value.as_deref().unwrap_or(placeholder);
            scaffold = scaffold.bind(arg.name.clone(), value);
        }
        scaffold
    }

    pub fn with_probe_mode(mut self, mode: ProbeMode) -> Self {
        self.probe_mode = mode;
        self
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.push((name.into(), value.into()));
        self
    }

    /// The annotation as a one-line block comment.
    pub fn render(&self) -> String {
        let mut out = format!("/* <Example :name=\"{}\"", self.name);
        if self.probe_mode != ProbeMode::Default {
            out.push_str(&format!(" :probe-mode=\"{}\"", self.probe_mode));
        }
        for (name, value) in &self.bindings {
            out.push_str(&format!(" {}={}", name, value));
        }
        out.push_str(" /> */");
        out
    }
}
