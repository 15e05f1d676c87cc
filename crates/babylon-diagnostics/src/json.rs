// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.

use serde::Serialize;

use babylon_source::TextMap;

use crate::{codes::ErrorCodeRegistry, line_col, Diagnostic, LabelStyle, Severity};

#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub file: String,
    pub success: bool,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonLabel {
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start: LineCol,
    pub end: LineCol,
    pub source_line: String,
}

/// Line/column pair (1-based).
#[derive(Debug, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, file: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let map = TextMap::new(source);
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let error_count = count(Severity::Error);

    DiagnosticReport {
        version: 1,
        file: file.to_string(),
        success: error_count == 0,
        diagnostics: diagnostics
            .iter()
            .map(|d| to_json_diagnostic(d, source, &map, &registry))
            .collect(),
        error_count,
        warning_count: count(Severity::Warning),
    }
}

fn to_json_diagnostic(
    diag: &Diagnostic,
    source: &str,
    map: &TextMap,
    registry: &ErrorCodeRegistry,
) -> JsonDiagnostic {
    let code = diag.code.as_ref().map(|c| c.0.clone());
    let category = code
        .as_deref()
        .and_then(|c| registry.get(c))
        .map(|info| info.category.to_string());

    let labels = diag
        .labels
        .iter()
        .map(|l| {
            let (start_line, start_col) = line_col(map, l.span.start);
            let (end_line, end_col) = line_col(map, l.span.end);
            JsonLabel {
                role: match l.style {
                    LabelStyle::Primary => "primary",
                    LabelStyle::Secondary => "secondary",
                },
                message: l.message.clone(),
                start: LineCol {
                    line: start_line,
                    column: start_col,
                    byte_offset: l.span.start,
                },
                end: LineCol {
                    line: end_line,
                    column: end_col,
                    byte_offset: l.span.end,
                },
                source_line: map.line_text(source, start_line).unwrap_or("").to_string(),
            }
        })
        .collect();

    JsonDiagnostic {
        severity: diag.severity.as_str(),
        code,
        category,
        message: diag.message.clone(),
        labels,
        notes: diag.notes.clone(),
        help: diag.help.as_ref().map(|h| h.message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_source::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_counts_and_locations() {
        let src = "let a = 1\nlet b = ;\n";
        let diags = vec![
            Diagnostic::error("expected expression")
                .with_code("B0001")
                .with_primary(Span::new(18, 19), "here"),
            Diagnostic::warning("unused"),
        ];
        let report = to_json_report(&diags, src, "a.bab");
        assert!(!report.success);
        assert_eq!((report.error_count, report.warning_count), (1, 1));

        let json = serde_json::to_value(&report.diagnostics[0]).unwrap();
        assert_eq!(json["category"], "Syntax");
        assert_eq!(json["labels"][0]["start"]["line"], 2);
        assert_eq!(json["labels"][0]["start"]["column"], 9);
        assert_eq!(json["labels"][0]["source_line"], "let b = ;");
        assert!(json.get("help").is_none());
    }
}
