// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Request-scoped state shared by the tracer and the evaluator.

use std::rc::Rc;

use tracing::debug;

use babylon_annotate::{Example, ParseContext};
use babylon_config::Config;
use babylon_runtime::{DocumentStore, Runtime};
use babylon_source::Source;

use crate::error::TraceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceOptions {
    /// Drop statement events from the appended invocation line, so a
    /// probe-all example does not report its own call.
    pub ignore_invocation_line: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            ignore_invocation_line: true,
        }
    }
}

pub struct TraceContext {
    pub runtime: Rc<dyn Runtime>,
    pub documents: Rc<dyn DocumentStore>,
    pub markers: ParseContext,
    pub options: TraceOptions,
}

impl TraceContext {
    pub fn new(runtime: Rc<dyn Runtime>, documents: Rc<dyn DocumentStore>) -> Result<Self, TraceError> {
        Ok(Self {
            runtime,
            documents,
            markers: ParseContext::new()?,
            options: TraceOptions::default(),
        })
    }

    /// A context whose markers and options follow `config`.
    pub fn configured(
        runtime: Rc<dyn Runtime>,
        documents: Rc<dyn DocumentStore>,
        config: &Config,
    ) -> Result<Self, TraceError> {
        let markers = ParseContext::new()?
            .with_missing_argument(config.annotations.missing_argument.clone());
        Ok(Self::new(runtime, documents)?
            .with_markers(markers)
            .with_options(TraceOptions {
                ignore_invocation_line: config.trace.ignore_invocation_line,
            }))
    }

    pub fn with_markers(mut self, markers: ParseContext) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_options(mut self, options: TraceOptions) -> Self {
        self.options = options;
        self
    }

    /// The current text of `uri` as a source.
    pub fn source(&self, uri: &str) -> Option<Rc<Source>> {
        let text = self.documents.text(uri)?;
        Some(Rc::new(Source::new(uri, text)))
    }

    /// Parse the examples declared in `uri`, unexecuted.
    pub fn examples(&self, uri: &str) -> Result<Vec<Example>, TraceError> {
        let source = self
            .source(uri)
            .ok_or_else(|| TraceError::DocumentNotFound(uri.to_string()))?;
        let declarations = self.runtime.declarations(&source)?;
        let examples = self
            .markers
            .parse_examples(source.text(), &declarations, uri);
        debug!(
            uri,
            language = self.runtime.language(),
            functions = declarations.len(),
            examples = examples.len(),
            "parsed examples"
        );
        Ok(examples)
    }
}
