// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Synchronous tracing work behind the server.
//!
//! The guest runtime is single-threaded, so an engine is built per request
//! from a snapshot of the open documents and dropped when the request is
//! answered. Only owned, thread-safe results leave it.

use std::collections::BTreeMap;
use std::rc::Rc;

use babylon_annotate::Example;
use babylon_config::Config;
use babylon_diagnostics::{Diagnostic, ToDiagnostic};
use babylon_runtime::{DocumentStore, FsDocuments, FunctionDeclaration};
use babylon_script::{Limits, ScriptRuntime};
use babylon_trace::{
    runner_reference, CoverageStore, EvaluateError, Evaluation, Evaluator, TraceContext,
    TraceError, Tracer,
};

use crate::decorations::{self, Decoration};

pub struct Engine {
    ctx: TraceContext,
}

impl Engine {
    pub fn new(documents: FsDocuments, config: &Config) -> Result<Self, TraceError> {
        let documents: Rc<dyn DocumentStore> = Rc::new(documents);
        let runtime = ScriptRuntime::new(Rc::clone(&documents))
            .with_limits(Limits::with_step_limit(config.trace.step_limit));
        Ok(Self {
            ctx: TraceContext::configured(Rc::new(runtime), documents, config)?,
        })
    }

    pub fn declarations(&self, uri: &str) -> Result<Vec<FunctionDeclaration>, TraceError> {
        let source = self
            .ctx
            .source(uri)
            .ok_or_else(|| TraceError::DocumentNotFound(uri.to_string()))?;
        Ok(self.ctx.runtime.declarations(&source)?)
    }

    pub fn examples(&self, uri: &str) -> Result<Vec<Example>, TraceError> {
        self.ctx.examples(uri)
    }

    /// Trace every example of `uri`. The returned store holds the frames
    /// the runs passed through.
    pub fn run_examples(&self, uri: &str) -> Result<(Vec<Example>, CoverageStore), TraceError> {
        let examples = self.ctx.examples(uri)?;
        let mut coverage = CoverageStore::new();
        let traced = Tracer::new(&self.ctx).trace_all_with_coverage(examples, &mut coverage);
        Ok((traced, coverage))
    }

    pub fn evaluate(
        &self,
        uri: &str,
        line: usize,
        col: usize,
        coverage: &CoverageStore,
    ) -> Result<Evaluation, EvaluateError> {
        Evaluator::new(&self.ctx)
            .with_coverage(coverage)
            .evaluate(uri, line, col)
    }

    pub fn decorations(&self, examples: &[Example]) -> BTreeMap<String, Vec<Decoration>> {
        decorations::collect(examples, self.ctx.documents.as_ref())
    }

    /// Problems worth showing in the editor: a bad runner reference and
    /// syntax errors.
    pub fn diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        let Some(source) = self.ctx.source(uri) else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();
        if let Err(err) = runner_reference(&source) {
            diagnostics.push(err.to_diagnostic());
        }
        if let Err(err) = self.ctx.runtime.declarations(&source) {
            diagnostics.push(err.to_diagnostic());
        }
        diagnostics
    }

    /// The document's diagnostics with `extra` added, unless it is already
    /// among them.
    pub fn diagnostics_with(&self, uri: &str, extra: Option<Diagnostic>) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics(uri);
        if let Some(extra) = extra {
            if !diagnostics.contains(&extra) {
                diagnostics.push(extra);
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_annotate::Captured;
    use babylon_runtime::Value;

    const DOC: &str = "/* <Example :name=\"twice\" n=4 /> */
function double(n) {
  // <Probe />
  let r = n * 2
  return r
}
";

    fn engine(text: &str) -> Engine {
        let mut docs = FsDocuments::new();
        docs.insert("file:///w/a.bab", text);
        Engine::new(docs, &Config::default()).unwrap()
    }

    #[test]
    fn runs_examples_and_keeps_coverage() {
        let engine = engine(DOC);
        let (examples, coverage) = engine.run_examples("file:///w/a.bab").unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].result, Some(Captured::Value(Value::Int(8))));
        assert_eq!(examples[0].probes.len(), 1);
        assert!(coverage.has_data("file:///w/a.bab"));

        let hovered = engine.evaluate("file:///w/a.bab", 5, 10, &coverage).unwrap();
        assert_eq!(hovered, Evaluation::Value(Value::Int(8)));
    }

    #[test]
    fn syntax_errors_become_diagnostics() {
        let engine = engine("function f( {\n");
        let diagnostics = engine.diagnostics("file:///w/a.bab");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert!(engine.diagnostics("file:///w/missing.bab").is_empty());
    }

    #[test]
    fn evaluation_errors_join_the_document_diagnostics() {
        let engine = engine("// runner: my main.bab\nfunction f(x) {\n  return x\n}\n");
        let err = engine
            .evaluate("file:///w/a.bab", 3, 10, &CoverageStore::new())
            .unwrap_err();

        let merged = engine.diagnostics_with("file:///w/a.bab", Some(err.to_diagnostic()));
        assert_eq!(merged, engine.diagnostics("file:///w/a.bab"));
        assert_eq!(merged.len(), 1);

        let other = Diagnostic::error("runner script not found");
        let merged = engine.diagnostics_with("file:///w/a.bab", Some(other.clone()));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1], other);
    }

    #[test]
    fn missing_argument_follows_config() {
        let mut docs = FsDocuments::new();
        docs.insert("a.bab", "/* <Example :name=\"e\" /> */\nfunction f(x) {\n  return x\n}\n");
        let mut config = Config::default();
        config.annotations.missing_argument = "0".into();
        let engine = Engine::new(docs, &config).unwrap();
        assert_eq!(engine.examples("a.bab").unwrap()[0].invocation, "f(0)");
    }
}
