// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Execution events delivered to listeners.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use babylon_source::{Source, SourceSection};

use crate::frame::Frame;
use crate::runtime::GuestError;
use crate::tag::{Tag, TagSet};
use crate::value::Value;

/// The instrumented node an event is about.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub section: SourceSection,
    pub tags: TagSet,
    /// The document the node was parsed from.
    pub source: Rc<Source>,
}

impl EventContext {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Text of a 1-based line of the node's document.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.source.line(line)
    }

    /// The node's own source text.
    pub fn text(&self) -> Option<&str> {
        self.section.text(self.source.text())
    }
}

/// Callbacks for instrumented execution.
///
/// Callbacks that see a value may return `ControlFlow::Break(value)` to
/// unwind the running program; the run then ends with
/// [`Outcome::Escaped`](crate::Outcome::Escaped) carrying that value.
pub trait ExecutionListener {
    fn on_enter(&mut self, _ctx: &EventContext, _frame: &dyn Frame) -> ControlFlow<Value> {
        ControlFlow::Continue(())
    }

    /// A node finished normally. `result` is `None` for nodes that produce
    /// no value, such as loops and conditionals.
    fn on_return_value(
        &mut self,
        _ctx: &EventContext,
        _frame: &dyn Frame,
        _result: Option<&Value>,
    ) -> ControlFlow<Value> {
        ControlFlow::Continue(())
    }

    fn on_return_exceptional(&mut self, _ctx: &EventContext, _frame: &dyn Frame, _error: &GuestError) {}

    /// A child node produced an input for the node in `ctx`.
    fn on_input_value(
        &mut self,
        _ctx: &EventContext,
        _frame: &dyn Frame,
        _input: &EventContext,
        _index: usize,
        _value: &Value,
    ) -> ControlFlow<Value> {
        ControlFlow::Continue(())
    }
}

pub type SharedListener = Rc<RefCell<dyn ExecutionListener>>;
