// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The statement listener that turns marker comments into probes and
//! assertions while an example runs.

use std::ops::ControlFlow;
use std::rc::Rc;

use tracing::trace;

use babylon_annotate::{
    Assertion, AssertionPayload, Captured, Example, Literal, Marker, ParseContext, Probe, ProbeMode,
};
use babylon_runtime::{EventContext, ExecutionListener, Frame, Runtime, Value};
use babylon_source::resolve_sibling_uri;

pub(crate) struct ExampleListener {
    name: String,
    uri: String,
    probe_mode: ProbeMode,
    /// Line of the appended invocation in the example's document, when its
    /// events are ignored.
    invocation_line: Option<usize>,
    runtime: Rc<dyn Runtime>,
    markers: ParseContext,
    probes: Vec<Probe>,
    assertions: Vec<Assertion>,
}

impl ExampleListener {
    pub fn new(
        example: &Example,
        invocation_line: Option<usize>,
        runtime: Rc<dyn Runtime>,
        markers: ParseContext,
    ) -> Self {
        Self {
            name: example.name.clone(),
            uri: example.uri.clone(),
            probe_mode: example.probe_mode,
            invocation_line,
            runtime,
            markers,
            probes: Vec::new(),
            assertions: Vec::new(),
        }
    }

    /// Hand over everything recorded so far.
    pub fn finish(&mut self) -> (Vec<Probe>, Vec<Assertion>) {
        (
            std::mem::take(&mut self.probes),
            std::mem::take(&mut self.assertions),
        )
    }

    /// Marker comments directly above the statement, top-down, with their
    /// lines.
    fn markers_above(&self, ctx: &EventContext) -> Vec<(usize, Marker)> {
        let mut found = Vec::new();
        let mut line = ctx.section.start_line;
        while line > 1 {
            line -= 1;
            let Some(marker) = ctx
                .line_text(line)
                .and_then(|text| self.markers.classify_marker(text))
            else {
                break;
            };
            found.push((line, marker));
        }
        found.reverse();
        found
    }

    fn evaluate_inline(&self, code: &str, ctx: &EventContext, frame: &dyn Frame) -> Captured {
        let result = self
            .runtime
            .parse_inline(code, &ctx.section, frame)
            .and_then(|snippet| snippet.execute(frame));
        match result {
            Ok(value) => Captured::Value(value),
            Err(err) => {
                trace!(code, error = %err, "inline evaluation failed");
                Captured::Failure(err.message)
            }
        }
    }

    fn statement_probe(&self, uri: &str, ctx: &EventContext, value: Captured) -> Probe {
        Probe {
            uri: uri.to_string(),
            line: ctx.section.start_line,
            start_col: Some(ctx.section.start_col),
            end_col: Some(ctx.section.end_col),
            value,
        }
    }
}

impl ExecutionListener for ExampleListener {
    fn on_return_value(
        &mut self,
        ctx: &EventContext,
        frame: &dyn Frame,
        result: Option<&Value>,
    ) -> ControlFlow<Value> {
        let Some(result) = result else {
            return ControlFlow::Continue(());
        };
        if self.probe_mode == ProbeMode::Off {
            return ControlFlow::Continue(());
        }
        let section = &ctx.section;
        let same_file = section.uri == self.uri;
        if same_file && Some(section.start_line) == self.invocation_line {
            return ControlFlow::Continue(());
        }
        let uri = if same_file {
            self.uri.clone()
        } else {
            resolve_sibling_uri(&self.uri, &section.name)
        };

        let mut probed = false;
        for (line, marker) in self.markers_above(ctx) {
            match marker {
                Marker::Probe { expression: Some(code) } => {
                    probed = true;
                    let value = self.evaluate_inline(&code, ctx, frame);
                    self.probes.push(Probe {
                        uri: uri.clone(),
                        line,
                        start_col: None,
                        end_col: None,
                        value,
                    });
                }
                Marker::Probe { expression: None } => {
                    probed = true;
                    let probe = self.statement_probe(&uri, ctx, Captured::Value(result.clone()));
                    self.probes.push(probe);
                }
                Marker::Assertion { example, payload } if example == self.name => match payload {
                    AssertionPayload::Expected(expected) => self.assertions.push(Assertion {
                        uri: uri.clone(),
                        line: section.start_line,
                        start_col: Some(section.start_col),
                        end_col: Some(section.end_col),
                        expected,
                        actual: Captured::Value(result.clone()),
                    }),
                    AssertionPayload::Expression(code) => {
                        match self.evaluate_inline(&code, ctx, frame) {
                            Captured::Value(actual) => self.assertions.push(Assertion {
                                uri: uri.clone(),
                                line,
                                start_col: None,
                                end_col: None,
                                expected: Literal::Bool(true),
                                actual: Captured::Value(actual),
                            }),
                            failure => {
                                probed = true;
                                let probe = self.statement_probe(&uri, ctx, failure);
                                self.probes.push(probe);
                            }
                        }
                    }
                },
                Marker::Assertion { .. } => {}
            }
        }

        if !probed && self.probe_mode == ProbeMode::All {
            let probe = self.statement_probe(&uri, ctx, Captured::Value(result.clone()));
            self.probes.push(probe);
        }
        ControlFlow::Continue(())
    }
}
