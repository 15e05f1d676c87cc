// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Running one example under instrumentation.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use babylon_annotate::{Captured, Example};
use babylon_runtime::{EventFilter, GuestError, Outcome, Tag, Value};
use babylon_source::Source;

use crate::context::TraceContext;
use crate::coverage::{CoverageCollector, CoverageStore};
use crate::listener::ExampleListener;

pub struct Tracer<'a> {
    ctx: &'a TraceContext,
}

impl<'a> Tracer<'a> {
    pub fn new(ctx: &'a TraceContext) -> Self {
        Self { ctx }
    }

    /// Run `example` and return it with its result, probes and assertions
    /// filled in. Guest failures become the result; nothing is propagated.
    pub fn trace(&self, example: Example) -> Example {
        self.run(example, None)
    }

    /// Like [`Tracer::trace`], also recording the frame of every executed
    /// statement into `coverage`.
    pub fn trace_with_coverage(&self, example: Example, coverage: &mut CoverageStore) -> Example {
        self.run(example, Some(coverage))
    }

    /// Trace each example in turn.
    pub fn trace_all(&self, examples: Vec<Example>) -> Vec<Example> {
        examples.into_iter().map(|example| self.trace(example)).collect()
    }

    pub fn trace_all_with_coverage(
        &self,
        examples: Vec<Example>,
        coverage: &mut CoverageStore,
    ) -> Vec<Example> {
        examples
            .into_iter()
            .map(|example| self.trace_with_coverage(example, coverage))
            .collect()
    }

    fn run(&self, mut example: Example, coverage: Option<&mut CoverageStore>) -> Example {
        debug!(example = %example.name, invocation = %example.invocation, "tracing example");

        let Some(text) = self.ctx.documents.text(&example.uri) else {
            example.result = Some(Captured::Failure(format!(
                "document not found: {}",
                example.uri
            )));
            return example;
        };
        let source = Rc::new(Source::new(
            example.uri.clone(),
            format!("{}\n{}", text, example.invocation),
        ));
        let invocation_line = source.map().line_count();

        let listener = Rc::new(RefCell::new(ExampleListener::new(
            &example,
            self.ctx.options.ignore_invocation_line.then_some(invocation_line),
            Rc::clone(&self.ctx.runtime),
            self.ctx.markers.clone(),
        )));
        let collector = coverage
            .is_some()
            .then(|| Rc::new(RefCell::new(CoverageCollector::new(example.uri.clone()))));

        let result = {
            let statements = EventFilter::new().tag_is(Tag::Statement);
            let _subscription =
                self.ctx
                    .runtime
                    .attach_listener(statements.clone(), None, listener.clone());
            let _coverage = collector.as_ref().map(|collector| {
                self.ctx
                    .runtime
                    .attach_listener(statements.clone(), None, collector.clone())
            });
            self.invoke(source)
        };

        let (probes, assertions) = listener.borrow_mut().finish();
        example.probes.extend(probes);
        example.assertions.extend(assertions);
        if let (Some(store), Some(collector)) = (coverage, collector) {
            collector.borrow_mut().drain_into(store);
        }

        info!(
            example = %example.name,
            result = %result,
            probes = example.probes.len(),
            assertions = example.assertions.len(),
            "example traced"
        );
        example.result = Some(result);
        example
    }

    fn invoke(&self, source: Rc<Source>) -> Captured {
        let outcome = self
            .ctx
            .runtime
            .parse(source)
            .and_then(|program| program.call());
        captured(outcome)
    }
}

fn captured(outcome: Result<Outcome, GuestError>) -> Captured {
    match outcome {
        Ok(Outcome::Returned(value)) | Ok(Outcome::Escaped(value)) => Captured::Value(value),
        Ok(Outcome::Exited(0)) => Captured::Value(Value::Null),
        Ok(Outcome::Exited(code)) => Captured::Failure(format!("exited with code {}", code)),
        Err(err) => Captured::Failure(err.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_map_to_results() {
        assert_eq!(
            captured(Ok(Outcome::Returned(Value::Int(1)))),
            Captured::Value(Value::Int(1))
        );
        assert_eq!(captured(Ok(Outcome::Exited(0))), Captured::Value(Value::Null));
        assert_eq!(
            captured(Ok(Outcome::Exited(3))),
            Captured::Failure("exited with code 3".into())
        );
        assert_eq!(
            captured(Err(GuestError::runtime("boom"))),
            Captured::Failure("boom".into())
        );
    }
}
