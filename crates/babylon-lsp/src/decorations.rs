// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Inline decorations for traced examples.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::{Position, Range};

use babylon_annotate::{Captured, Example};
use babylon_runtime::DocumentStore;

use crate::convert::utf16_len;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecorationKind {
    ProbeResult,
    AssertionResult,
    ExampleResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub range: Range,
    pub text: String,
    pub kind: DecorationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishDecorationsParams {
    pub uri: String,
    pub decorations: Vec<Decoration>,
}

/// `babylon/publishDecorations`, sent after examples are run.
pub enum PublishDecorations {}

impl Notification for PublishDecorations {
    type Params = PublishDecorationsParams;
    const METHOD: &'static str = "babylon/publishDecorations";
}

/// Decorations for every document the examples touched, keyed by URI.
///
/// Probes of a cross-file run land in the file they were recorded in.
pub fn collect(examples: &[Example], documents: &dyn DocumentStore) -> BTreeMap<String, Vec<Decoration>> {
    let mut builder = Builder {
        documents,
        texts: BTreeMap::new(),
        decorations: BTreeMap::new(),
    };
    for example in examples {
        builder.example(example);
    }
    builder.decorations
}

struct Builder<'a> {
    documents: &'a dyn DocumentStore,
    texts: BTreeMap<String, Option<String>>,
    decorations: BTreeMap<String, Vec<Decoration>>,
}

impl Builder<'_> {
    fn example(&mut self, example: &Example) {
        let glyph = example.glyph();
        if let Some(result) = &example.result {
            let end_col = example.definition_end_col;
            let character = self
                .line(&example.uri, example.definition_line)
                .and_then(|content| content.get(..end_col))
                .map(utf16_len)
                .unwrap_or(end_col as u32);
            let position = Position::new(lsp_line(example.definition_line), character);
            let text = match result {
                Captured::Value(value) => format!("{} {} => {}", glyph, example.name, value.repr()),
                Captured::Failure(message) => format!("{} {} failed: {}", glyph, example.name, message),
            };
            self.push(&example.uri, Range::new(position, position), text, DecorationKind::ExampleResult);
        }

        for probe in &example.probes {
            let Some(range) = self.end_of_line(&probe.uri, probe.line) else {
                continue;
            };
            let text = format!("{} {}", glyph, probe.value);
            self.push(&probe.uri, range, text, DecorationKind::ProbeResult);
        }

        for assertion in &example.assertions {
            let Some(range) = self.end_of_line(&assertion.uri, assertion.line) else {
                continue;
            };
            let text = if assertion.passed() {
                format!("{} ✓ {}", glyph, assertion.actual)
            } else {
                format!("{} ✗ expected {}, got {}", glyph, assertion.expected, assertion.actual)
            };
            self.push(&assertion.uri, range, text, DecorationKind::AssertionResult);
        }
    }

    /// Text of a 1-based line, fetched once per document.
    fn line(&mut self, uri: &str, line: usize) -> Option<&str> {
        let documents = self.documents;
        let text = self
            .texts
            .entry(uri.to_string())
            .or_insert_with(|| documents.text(uri))
            .as_deref()?;
        text.lines().nth(line.checked_sub(1)?)
    }

    fn end_of_line(&mut self, uri: &str, line: usize) -> Option<Range> {
        let content = self.line(uri, line)?;
        let position = Position::new(lsp_line(line), utf16_len(content));
        Some(Range::new(position, position))
    }

    fn push(&mut self, uri: &str, range: Range, text: String, kind: DecorationKind) {
        let decorations = self.decorations.entry(uri.to_string()).or_default();
        match decorations.iter_mut().find(|existing| existing.range == range) {
            Some(existing) => {
                existing.text.push_str(", ");
                existing.text.push_str(&text);
            }
            None => decorations.push(Decoration { range, text, kind }),
        }
    }
}

fn lsp_line(line: usize) -> u32 {
    line.saturating_sub(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_annotate::{Assertion, Literal, Probe, ProbeMode};
    use babylon_runtime::{MemoryDocuments, Value};
    use pretty_assertions::assert_eq;

    fn example(name: &str) -> Example {
        Example {
            name: name.into(),
            function_name: "f".into(),
            function_line: 2,
            invocation: "f(1)".into(),
            definition_line: 1,
            definition_end_col: 24,
            probe_mode: ProbeMode::Default,
            uri: "a.bab".into(),
            result: Some(Captured::Value(Value::Int(2))),
            probes: vec![Probe {
                uri: "a.bab".into(),
                line: 4,
                start_col: Some(3),
                end_col: Some(11),
                value: Captured::Value(Value::Int(2)),
            }],
            assertions: vec![Assertion {
                uri: "a.bab".into(),
                line: 4,
                start_col: Some(3),
                end_col: Some(11),
                expected: Literal::Int(3),
                actual: Captured::Value(Value::Int(2)),
            }],
            probe_sites: Vec::new(),
            assertion_sites: Vec::new(),
        }
    }

    fn documents() -> MemoryDocuments {
        let mut docs = MemoryDocuments::new();
        docs.insert(
            "a.bab",
            "/* <Example :name=\"e\" /> */\nfunction f(x) {\n  // <Probe />\n  let y = x + 1\n  return y\n}\n",
        );
        docs
    }

    #[test]
    fn same_line_results_are_merged() {
        let ex = example("e");
        let glyph = ex.glyph();
        let by_uri = collect(&[ex], &documents());
        let decorations = &by_uri["a.bab"];
        assert_eq!(decorations.len(), 2);

        assert_eq!(decorations[0].kind, DecorationKind::ExampleResult);
        assert_eq!(decorations[0].range.start, Position::new(0, 24));
        assert_eq!(decorations[0].text, format!("{} e => 2", glyph));

        assert_eq!(decorations[1].kind, DecorationKind::ProbeResult);
        assert_eq!(decorations[1].range.start, Position::new(3, 15));
        assert_eq!(
            decorations[1].text,
            format!("{} 2, {} ✗ expected 3, got 2", glyph, glyph)
        );
    }

    #[test]
    fn example_results_sit_after_the_directive_in_utf16_units() {
        let mut docs = MemoryDocuments::new();
        docs.insert(
            "a.bab",
            "/* é <Example :name=\"e\" /> */\nfunction f(x) {\n  // <Probe />\n  let y = x + 1\n  return y\n}\n",
        );
        let mut ex = example("e");
        // Byte column of the closing `>`.
        ex.definition_end_col = 27;
        let by_uri = collect(&[ex], &docs);
        assert_eq!(by_uri["a.bab"][0].range.start, Position::new(0, 26));
    }

    #[test]
    fn untraced_and_unknown_documents_are_skipped() {
        let mut ex = example("e");
        ex.result = None;
        ex.probes[0].uri = "missing.bab".into();
        ex.assertions.clear();
        assert!(collect(&[ex], &documents()).is_empty());
    }

    #[test]
    fn kinds_serialize_in_camel_case() {
        let json = serde_json::to_value(DecorationKind::AssertionResult).unwrap();
        assert_eq!(json, serde_json::json!("assertionResult"));
    }
}
