// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Faults that reach the caller of the tracer or evaluator.
//!
//! Guest failures during a trace are not errors: they become the example's
//! result. Only problems with the request itself are reported here.

use thiserror::Error;

use babylon_annotate::PatternError;
use babylon_diagnostics::{codes, Diagnostic, ToDiagnostic};
use babylon_runtime::GuestError;
use babylon_source::Span;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error(transparent)]
    Guest(#[from] GuestError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluateError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    /// A `// runner:` comment on the first line that names no usable file.
    /// `index` is where the path starts and `length` is the line's length,
    /// both in bytes on the first line.
    #[error("invalid runner script reference: {reason}")]
    InvalidRunnerScript {
        reason: String,
        index: usize,
        length: usize,
    },
}

impl ToDiagnostic for TraceError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            TraceError::Guest(err) => err.to_diagnostic(),
            TraceError::DocumentNotFound(_) | TraceError::Pattern(_) => {
                Diagnostic::error(self.to_string())
            }
        }
    }
}

impl ToDiagnostic for EvaluateError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EvaluateError::DocumentNotFound(_) => Diagnostic::error(self.to_string()),
            EvaluateError::InvalidRunnerScript {
                reason,
                index,
                length,
            } => Diagnostic::error(reason)
                .with_code(codes::INVALID_RUNNER)
                // The first line starts at offset 0, so byte offsets are columns.
                .with_primary(Span::new(*index, *length), "runner reference")
                .with_help("name a single file, e.g. `// runner: main.bab`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_diagnostic_spans_first_line() {
        let err = EvaluateError::InvalidRunnerScript {
            reason: "runner script path is empty".into(),
            index: 10,
            length: 10,
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.message, "runner script path is empty");
        assert_eq!(diag.code.as_ref().unwrap().0, "B0200");
        assert_eq!(diag.primary_span(), Some(Span::new(10, 10)));
    }

    #[test]
    fn guest_errors_convert_through() {
        let err = TraceError::from(GuestError::syntax("unexpected `}`", Span::new(3, 4)));
        assert_eq!(err.to_string(), "unexpected `}`");
        assert_eq!(err.to_diagnostic().primary_span(), Some(Span::new(3, 4)));
    }
}
