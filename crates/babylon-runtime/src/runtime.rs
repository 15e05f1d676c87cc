// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The runtime capability trait and the artifacts it hands out.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use babylon_source::{Source, SourceSection, Span};

use crate::event::SharedListener;
use crate::filter::EventFilter;
use crate::frame::Frame;
use crate::subscription::Subscription;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestErrorKind {
    /// The code could not be parsed.
    Syntax,
    /// The program faulted while running.
    Runtime,
}

/// A fault raised by guest code, or by parsing it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct GuestError {
    pub kind: GuestErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl GuestError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        GuestError {
            kind: GuestErrorKind::Syntax,
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        GuestError {
            kind: GuestErrorKind::Runtime,
            message: message.into(),
            span: None,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }
}

/// How a program run ended, when it did not fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Ran to completion; carries the program's result.
    Returned(Value),
    /// A listener cut the run short and handed back this value.
    Escaped(Value),
    /// The program called `exit`.
    Exited(i32),
}

/// A parsed program, ready to run.
pub trait Callable {
    fn call(&self) -> Result<Outcome, GuestError>;
}

/// A snippet parsed against a frame.
pub trait Evaluable {
    fn execute(&self, frame: &dyn Frame) -> Result<Value, GuestError>;
}

/// One declared argument of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDeclaration {
    pub name: String,
    /// Default value as source text, if the declaration has one.
    pub default_value: Option<String>,
}

/// Symbol table entry for a declared function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub arguments: Vec<ArgumentDeclaration>,
}

impl FunctionDeclaration {
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|arg| arg.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A literal whose value is known without running anything.
    Literal(Value),
    /// A plain variable read.
    ReadVariable(String),
    Expression,
    Statement,
}

/// The innermost instrumentable node at a cursor position.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub section: SourceSection,
    pub kind: NodeKind,
    /// Statements of the same root that end before this node or enclose
    /// it, in pre-order.
    pub preceding: Vec<SourceSection>,
}

/// What the tracer and evaluator need from a guest language.
pub trait Runtime {
    /// Language identifier, used in logs.
    fn language(&self) -> &str;

    fn parse(&self, source: Rc<Source>) -> Result<Box<dyn Callable>, GuestError>;

    /// Parse `code` so it can run inside a frame of the program containing
    /// `enclosing`. Inline evaluation emits no events.
    fn parse_inline(
        &self,
        code: &str,
        enclosing: &SourceSection,
        frame: &dyn Frame,
    ) -> Result<Box<dyn Evaluable>, GuestError>;

    /// Deliver events for nodes matching `filter`. When `input_filter` is
    /// set, input values of child nodes matching it are delivered as well.
    fn attach_listener(
        &self,
        filter: EventFilter,
        input_filter: Option<EventFilter>,
        listener: SharedListener,
    ) -> Subscription;

    /// Functions declared in `source`.
    fn declarations(&self, source: &Source) -> Result<Vec<FunctionDeclaration>, GuestError>;

    /// The innermost instrumentable node at a 1-based position.
    fn node_at(
        &self,
        source: &Source,
        line: usize,
        col: usize,
    ) -> Result<Option<NodeInfo>, GuestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_span_is_set_once() {
        let err = GuestError::runtime("boom").at(Span::new(1, 2)).at(Span::new(5, 6));
        assert_eq!(err.span, Some(Span::new(1, 2)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn declaration_lines() {
        let decl = FunctionDeclaration {
            name: "f".into(),
            start_line: 3,
            end_line: 5,
            arguments: vec![ArgumentDeclaration {
                name: "x".into(),
                default_value: None,
            }],
        };
        assert_eq!(decl.argument_names().collect::<Vec<_>>(), vec!["x"]);
    }
}
