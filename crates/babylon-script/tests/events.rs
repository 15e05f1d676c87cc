// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Listener events seen through the `Runtime` interface.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use babylon_runtime::{
    EventContext, EventFilter, ExecutionListener, Frame, GuestError, MemoryDocuments, Outcome,
    Runtime, Tag, Value,
};
use babylon_script::ScriptRuntime;
use babylon_source::{Source, Span};

#[derive(Default)]
struct Recorder {
    returns: Vec<(usize, Option<Value>)>,
    faults: Vec<(usize, String)>,
    inputs: Vec<(usize, Value)>,
    escape_on_line: Option<usize>,
}

impl ExecutionListener for Recorder {
    fn on_return_value(
        &mut self,
        ctx: &EventContext,
        _frame: &dyn Frame,
        result: Option<&Value>,
    ) -> ControlFlow<Value> {
        self.returns.push((ctx.section.start_line, result.cloned()));
        match (self.escape_on_line, result) {
            (Some(line), Some(value)) if line == ctx.section.start_line => {
                ControlFlow::Break(value.clone())
            }
            _ => ControlFlow::Continue(()),
        }
    }

    fn on_return_exceptional(&mut self, ctx: &EventContext, _frame: &dyn Frame, error: &GuestError) {
        self.faults.push((ctx.section.start_line, error.message.clone()));
    }

    fn on_input_value(
        &mut self,
        _ctx: &EventContext,
        _frame: &dyn Frame,
        _input: &EventContext,
        index: usize,
        value: &Value,
    ) -> ControlFlow<Value> {
        self.inputs.push((index, value.clone()));
        ControlFlow::Continue(())
    }
}

fn runtime() -> ScriptRuntime {
    ScriptRuntime::new(Rc::new(MemoryDocuments::new()))
}

fn run(runtime: &ScriptRuntime, text: &str) -> Result<Outcome, GuestError> {
    runtime
        .parse(Rc::new(Source::new("file:///w/a.bab", text)))
        .and_then(|program| program.call())
}

const PROGRAM: &str = "let a = 1\nlet b = a + 2\nif (b > 2) {\n  b = 10\n}\nb\n";

#[test]
fn statements_report_their_values() {
    let runtime = runtime();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let subscription =
        runtime.attach_listener(EventFilter::new().tag_is(Tag::Statement), None, recorder.clone());

    assert_eq!(run(&runtime, PROGRAM).unwrap(), Outcome::Returned(Value::Int(10)));
    assert_eq!(
        recorder.borrow().returns,
        vec![
            (1, Some(Value::Int(1))),
            (2, Some(Value::Int(3))),
            (4, Some(Value::Int(10))),
            (3, None),
            (6, Some(Value::Int(10))),
        ]
    );

    drop(subscription);
    assert_eq!(runtime.listener_count(), 0);
    run(&runtime, PROGRAM).unwrap();
    assert_eq!(recorder.borrow().returns.len(), 5);
}

#[test]
fn breaking_a_statement_escapes_the_run() {
    let runtime = runtime();
    let recorder = Rc::new(RefCell::new(Recorder {
        escape_on_line: Some(2),
        ..Recorder::default()
    }));
    let _subscription =
        runtime.attach_listener(EventFilter::new().tag_is(Tag::Statement), None, recorder.clone());

    let outcome = run(&runtime, "let a = 1\nlet b = a + 2\nprint(b)\n").unwrap();
    assert_eq!(outcome, Outcome::Escaped(Value::Int(3)));
    assert_eq!(recorder.borrow().returns.len(), 2);
    assert_eq!(runtime.take_output(), "");
}

#[test]
fn inputs_of_a_selected_node() {
    let runtime = runtime();
    let source = Source::new("file:///w/a.bab", PROGRAM);
    // `a + 2` on the second line.
    let sum = source.section(Span::new(18, 23)).unwrap();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let _subscription = runtime.attach_listener(
        EventFilter::new().section_equals(&sum),
        Some(EventFilter::new()),
        recorder.clone(),
    );

    run(&runtime, PROGRAM).unwrap();
    let recorder = recorder.borrow();
    assert_eq!(recorder.inputs, vec![(0, Value::Int(1)), (1, Value::Int(2))]);
    assert_eq!(recorder.returns, vec![(2, Some(Value::Int(3)))]);
}

#[test]
fn faults_reach_enclosing_statements() {
    let runtime = runtime();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let _subscription =
        runtime.attach_listener(EventFilter::new().tag_is(Tag::Statement), None, recorder.clone());

    let err = run(&runtime, "let a = 1\nlet b = a / 0\n").unwrap_err();
    assert_eq!(err.message, "division by zero");
    assert_eq!(recorder.borrow().faults, vec![(2, "division by zero".to_string())]);
}
