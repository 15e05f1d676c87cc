// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `// runner: <path>` references.
//!
//! A document whose code is only reached from another program names that
//! program on its first line. Run-to-section evaluation then runs the
//! runner instead of the document.

use babylon_source::{resolve_sibling_uri, Source};

use crate::error::EvaluateError;

pub const RUNNER_PREFIX: &str = "// runner:";

/// The runner named by the first line of `source`, resolved next to it.
///
/// `Ok(None)` means the document has no runner reference.
pub fn runner_reference(source: &Source) -> Result<Option<String>, EvaluateError> {
    let Some(line) = source.line(1) else {
        return Ok(None);
    };
    let Some(rest) = line.strip_prefix(RUNNER_PREFIX) else {
        return Ok(None);
    };

    let index = RUNNER_PREFIX.len() + (rest.len() - rest.trim_start().len());
    let path = rest.trim();
    let invalid = |reason: &str| EvaluateError::InvalidRunnerScript {
        reason: reason.to_string(),
        index,
        length: line.len(),
    };

    if path.is_empty() {
        return Err(invalid("runner script path is empty"));
    }
    if path.chars().any(char::is_whitespace) {
        return Err(invalid("runner script path must not contain whitespace"));
    }
    if path.ends_with('/') {
        return Err(invalid("runner script path names a directory"));
    }
    Ok(Some(resolve_sibling_uri(source.uri(), path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(text: &str) -> Result<Option<String>, EvaluateError> {
        runner_reference(&Source::new("file:///w/lib.bab", text))
    }

    #[test]
    fn resolves_next_to_document() {
        assert_eq!(
            reference("// runner: main.bab\nfunction f() {}").unwrap(),
            Some("file:///w/main.bab".to_string())
        );
        assert_eq!(
            reference("// runner:  sub/run.bab  ").unwrap(),
            Some("file:///w/sub/run.bab".to_string())
        );
    }

    #[test]
    fn absent_reference() {
        assert_eq!(reference("let x = 1\n// runner: main.bab").unwrap(), None);
        assert_eq!(reference("").unwrap(), None);
    }

    #[test]
    fn malformed_references() {
        assert_eq!(
            reference("// runner:").unwrap_err(),
            EvaluateError::InvalidRunnerScript {
                reason: "runner script path is empty".into(),
                index: 10,
                length: 10,
            }
        );
        let Err(EvaluateError::InvalidRunnerScript { reason, index, length }) =
            reference("// runner: my main.bab")
        else {
            panic!("expected an invalid runner reference");
        };
        assert_eq!(reason, "runner script path must not contain whitespace");
        assert_eq!((index, length), (11, 22));
        assert!(reference("// runner: scripts/").is_err());
    }
}
