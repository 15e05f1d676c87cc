// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Value of the node under a cursor, by the first strategy that knows.

use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use babylon_runtime::{
    EventContext, EventFilter, ExecutionListener, Frame, NodeInfo, NodeKind, Outcome, Value,
};
use babylon_source::{Source, SourceSection};

use crate::context::TraceContext;
use crate::coverage::CoverageStore;
use crate::error::EvaluateError;
use crate::runner::runner_reference;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    Value(Value),
    /// The program faulted before reaching the node.
    Error(String),
    /// No strategy could tell.
    Unknown,
}

impl Evaluation {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Evaluation::Unknown)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Value(value) => write!(f, "{}", value.repr()),
            Evaluation::Error(message) => write!(f, "error: {}", message),
            Evaluation::Unknown => write!(f, "unknown"),
        }
    }
}

pub struct Evaluator<'a> {
    ctx: &'a TraceContext,
    coverage: Option<&'a CoverageStore>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a TraceContext) -> Self {
        Self { ctx, coverage: None }
    }

    pub fn with_coverage(mut self, coverage: &'a CoverageStore) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Evaluate the innermost node at a 1-based position of `uri`.
    ///
    /// Strategies run in order until one is not `Unknown`: the literal
    /// itself, recorded coverage, a run to the node, the node's text on its
    /// own. Only a malformed runner reference is an error.
    pub fn evaluate(&self, uri: &str, line: usize, col: usize) -> Result<Evaluation, EvaluateError> {
        let source = self
            .ctx
            .source(uri)
            .ok_or_else(|| EvaluateError::DocumentNotFound(uri.to_string()))?;

        let node = match self.ctx.runtime.node_at(&source, line, col) {
            Ok(Some(node)) => node,
            Ok(None) => return Ok(Evaluation::Unknown),
            Err(err) => {
                debug!(uri, line, col, error = %err, "document does not parse");
                return Ok(Evaluation::Unknown);
            }
        };
        debug!(section = %node.section, kind = ?node.kind, "evaluating");

        if let NodeKind::Literal(value) = &node.kind {
            return Ok(Evaluation::Value(value.clone()));
        }

        let evaluation = self.replay_coverage(&source, &node);
        if !evaluation.is_unknown() {
            return Ok(evaluation);
        }

        let evaluation = self.run_to_section(&source, &node.section, None)?;
        if !evaluation.is_unknown() {
            return Ok(evaluation);
        }

        Ok(self.global(&source, &node))
    }

    /// Replay the node against the frame of the latest covered statement
    /// before or around it.
    fn replay_coverage(&self, source: &Rc<Source>, node: &NodeInfo) -> Evaluation {
        let Some(data) = self
            .coverage
            .and_then(|coverage| coverage.latest_before(&node.preceding))
        else {
            return Evaluation::Unknown;
        };

        if let NodeKind::ReadVariable(name) = &node.kind {
            if let Some(value) = data.frame.read(name) {
                return Evaluation::Value(value);
            }
        }

        let Some(code) = node.section.text(source.text()) else {
            return Evaluation::Unknown;
        };
        // Parsing registers the document's functions for the snippet.
        if let Err(err) = self.ctx.runtime.parse(Rc::clone(source)) {
            debug!(error = %err, "coverage replay skipped");
            return Evaluation::Unknown;
        }
        let result = self
            .ctx
            .runtime
            .parse_inline(code, &node.section, &data.frame)
            .and_then(|snippet| snippet.execute(&data.frame));
        match result {
            Ok(value) => Evaluation::Value(value),
            Err(err) => {
                debug!(code, error = %err, "coverage replay failed");
                Evaluation::Unknown
            }
        }
    }

    /// Run the document, or its runner, until `section` produces a value.
    ///
    /// With an `input_filter`, the run stops at the first input value that
    /// a matching child hands to the section instead.
    pub fn run_to_section(
        &self,
        source: &Rc<Source>,
        section: &SourceSection,
        input_filter: Option<EventFilter>,
    ) -> Result<Evaluation, EvaluateError> {
        let runner = match runner_reference(source)? {
            Some(uri) => uri,
            None => self
                .coverage
                .and_then(|coverage| coverage.runner_for(section))
                .unwrap_or(source.uri())
                .to_string(),
        };
        let program_source = if runner == source.uri() {
            Rc::clone(source)
        } else {
            match self.ctx.source(&runner) {
                Some(runner_source) => runner_source,
                None => {
                    warn!(runner = %runner, "runner script not found");
                    return Ok(Evaluation::Unknown);
                }
            }
        };
        debug!(runner = %runner, target = %section, "running to section");

        let program = match self.ctx.runtime.parse(program_source) {
            Ok(program) => program,
            Err(err) => return Ok(Evaluation::Error(err.message)),
        };
        let probe = Rc::new(RefCell::new(SectionProbe {
            inputs: input_filter.is_some(),
        }));
        let _subscription = self.ctx.runtime.attach_listener(
            EventFilter::new().section_equals(section),
            input_filter,
            probe,
        );

        Ok(match program.call() {
            Ok(Outcome::Escaped(value)) => Evaluation::Value(value),
            Ok(_) => Evaluation::Unknown,
            Err(err) => Evaluation::Error(err.message),
        })
    }

    /// The node's text as a program of its own.
    fn global(&self, source: &Source, node: &NodeInfo) -> Evaluation {
        let Some(code) = node.section.text(source.text()) else {
            return Evaluation::Unknown;
        };
        let snippet = Rc::new(Source::new(format!("{}#global", source.uri()), code));
        match self.ctx.runtime.parse(snippet).and_then(|program| program.call()) {
            Ok(Outcome::Returned(value)) => Evaluation::Value(value),
            Ok(_) => Evaluation::Unknown,
            Err(err) => {
                debug!(code, error = %err, "global evaluation failed");
                Evaluation::Unknown
            }
        }
    }
}

/// Stops the run at the first value seen at the target section.
struct SectionProbe {
    inputs: bool,
}

impl ExecutionListener for SectionProbe {
    fn on_return_value(
        &mut self,
        _ctx: &EventContext,
        _frame: &dyn Frame,
        result: Option<&Value>,
    ) -> ControlFlow<Value> {
        match result {
            Some(value) if !self.inputs => ControlFlow::Break(value.clone()),
            _ => ControlFlow::Continue(()),
        }
    }

    fn on_input_value(
        &mut self,
        _ctx: &EventContext,
        _frame: &dyn Frame,
        _input: &EventContext,
        _index: usize,
        value: &Value,
    ) -> ControlFlow<Value> {
        if self.inputs {
            ControlFlow::Break(value.clone())
        } else {
            ControlFlow::Continue(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_display_and_json() {
        assert_eq!(Evaluation::Value(Value::from("a")).to_string(), "\"a\"");
        assert_eq!(Evaluation::Error("boom".into()).to_string(), "error: boom");
        assert_eq!(Evaluation::Unknown.to_string(), "unknown");
        let json = serde_json::to_string(&Evaluation::Unknown).unwrap();
        assert_eq!(json, r#"{"kind":"unknown"}"#);
    }
}
