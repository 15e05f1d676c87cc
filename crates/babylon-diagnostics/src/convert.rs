// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from runtime fault types to `Diagnostic`.

use babylon_runtime::{GuestError, GuestErrorKind};

use crate::{codes, Diagnostic, ToDiagnostic};

impl ToDiagnostic for GuestError {
    fn to_diagnostic(&self) -> Diagnostic {
        let (code, label) = match self.kind {
            GuestErrorKind::Syntax => (codes::SYNTAX, "here"),
            GuestErrorKind::Runtime => (codes::RUNTIME, "raised here"),
        };
        let diag = Diagnostic::error(&self.message).with_code(code);
        match self.span {
            Some(span) => diag.with_primary(span, label),
            None => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_source::Span;

    #[test]
    fn syntax_error_keeps_span() {
        let diag = GuestError::syntax("expected `)`", Span::new(4, 5)).to_diagnostic();
        assert_eq!(diag.code.as_ref().unwrap().0, codes::SYNTAX);
        assert_eq!(diag.primary_span(), Some(Span::new(4, 5)));
    }

    #[test]
    fn runtime_error_without_span() {
        let diag = GuestError::runtime("boom").to_diagnostic();
        assert_eq!(diag.message, "boom");
        assert!(diag.labels.is_empty());
    }
}
