// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! LSP protocol conversion utilities.
//!
//! LSP positions are 0-based and count UTF-16 code units; Babylon lines and
//! columns are 1-based and count bytes.

use tower_lsp::lsp_types::*;

use babylon_diagnostics::LabelStyle;

/// Convert an LSP position to a 1-based line and byte column.
pub fn position_to_line_col(source: &str, pos: Position) -> (usize, usize) {
    let line = pos.line as usize + 1;
    let text = source.lines().nth(pos.line as usize).unwrap_or("");
    let mut units = 0;
    let byte = text
        .char_indices()
        .find(|(_, ch)| {
            let reached = units >= pos.character as usize;
            units += ch.len_utf16();
            reached
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (line, byte + 1)
}

/// Convert byte offset to LSP Position.
pub fn byte_offset_to_position(source: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut col = 0u32;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += ch.len_utf16() as u32;
        }
    }

    Position::new(line, col)
}

/// Width of `text` in LSP characters.
pub fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// Convert a babylon diagnostic to an LSP diagnostic.
pub fn to_lsp_diagnostic(source: &str, diag: &babylon_diagnostics::Diagnostic) -> Diagnostic {
    let primary = diag
        .labels
        .iter()
        .find(|l| l.style == LabelStyle::Primary)
        .or(diag.labels.first());

    let range = match primary {
        Some(label) => Range::new(
            byte_offset_to_position(source, label.span.start),
            byte_offset_to_position(source, label.span.end),
        ),
        None => Range::default(),
    };

    let severity = Some(match diag.severity {
        babylon_diagnostics::Severity::Error => DiagnosticSeverity::ERROR,
        babylon_diagnostics::Severity::Warning => DiagnosticSeverity::WARNING,
        babylon_diagnostics::Severity::Note => DiagnosticSeverity::INFORMATION,
    });

    let mut message = diag.message.clone();
    if let Some(msg) = primary.and_then(|label| label.message.as_ref()) {
        message = format!("{}: {}", message, msg);
    }
    for note in &diag.notes {
        message = format!("{}\n\nnote: {}", message, note);
    }
    if let Some(help) = &diag.help {
        message = format!("{}\n\nhelp: {}", message, help.message);
    }

    Diagnostic {
        range,
        severity,
        code: diag.code.as_ref().map(|c| NumberOrString::String(c.0.clone())),
        source: Some("babylon".to_string()),
        message,
        ..Diagnostic::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_diagnostics::codes;
    use babylon_source::Span;

    #[test]
    fn positions_round_trip_through_columns() {
        let src = "let a = 1\nlet é = a\n";
        assert_eq!(position_to_line_col(src, Position::new(1, 4)), (2, 5));
        // `é` is two bytes, so the `=` after it sits at byte column 8.
        assert_eq!(position_to_line_col(src, Position::new(1, 6)), (2, 8));
        assert_eq!(position_to_line_col(src, Position::new(9, 0)), (10, 1));
        assert_eq!(byte_offset_to_position(src, 14), Position::new(1, 4));
    }

    #[test]
    fn astral_characters_take_two_units() {
        // `𝑥` is four bytes and two UTF-16 units.
        let src = "let s = \"𝑥\" + b\n";
        assert_eq!(position_to_line_col(src, Position::new(0, 11)), (1, 14));
        assert_eq!(position_to_line_col(src, Position::new(0, 14)), (1, 17));
        assert_eq!(byte_offset_to_position(src, 15), Position::new(0, 13));
        assert_eq!(utf16_len("\"𝑥\""), 4);
    }

    #[test]
    fn runner_diagnostic() {
        let src = "// runner: my file.bab\nlet a = 1\n";
        let diag = babylon_diagnostics::Diagnostic::error("runner script path must not contain whitespace")
            .with_code(codes::INVALID_RUNNER)
            .with_primary(Span::new(11, 22), "runner reference")
            .with_help("name a file next to this one");
        let lsp = to_lsp_diagnostic(src, &diag);
        assert_eq!(lsp.range, Range::new(Position::new(0, 11), Position::new(0, 22)));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(lsp.code, Some(NumberOrString::String("B0200".into())));
        assert!(lsp.message.starts_with("runner script path must not contain whitespace: runner reference"));
        assert!(lsp.message.ends_with("help: name a file next to this one"));
    }
}
