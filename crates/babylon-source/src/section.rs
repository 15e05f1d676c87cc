// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source sections: a span plus its resolved coordinates and owning document.

use std::fmt;

use crate::span::Span;
use crate::text_map::{TextMap, TextMapError};

/// A located region of one source document.
///
/// `end_col` is the column of the last character in the section, so a
/// one-character section has `start_col == end_col`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceSection {
    /// Full URI of the document.
    pub uri: String,
    /// File name of the document, the last path segment of `uri`.
    pub name: String,
    pub span: Span,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl SourceSection {
    /// Resolve a byte span against the document's text map.
    pub fn new(uri: &str, map: &TextMap, span: Span) -> Result<Self, TextMapError> {
        let (start_line, start_col) = map.offset_to_line_col(span.start)?;
        let (end_line, end_col) = if span.is_empty() {
            (start_line, start_col)
        } else {
            map.offset_to_line_col(span.end - 1)?
        };
        Ok(SourceSection {
            uri: uri.to_string(),
            name: file_name(uri).to_string(),
            span,
            start_line,
            start_col,
            end_line,
            end_col,
        })
    }

    /// The section's text within `source`.
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.span.start..self.span.end)
    }

    /// Same document and same coordinates, regardless of span bookkeeping.
    pub fn same_range(&self, other: &SourceSection) -> bool {
        self.uri == other.uri
            && self.start_line == other.start_line
            && self.start_col == other.start_col
            && self.end_line == other.end_line
            && self.end_col == other.end_col
    }
}

impl fmt::Display for SourceSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.name, self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// Last path segment of a URI or path.
pub fn file_name(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(idx) => &uri[idx + 1..],
        None => uri,
    }
}

/// URI of `file_name` in the same directory as `base_uri`.
///
/// Everything up to and including the last `/` of `base_uri` is kept.
pub fn resolve_sibling_uri(base_uri: &str, file_name: &str) -> String {
    match base_uri.rfind('/') {
        Some(idx) => format!("{}{}", &base_uri[..=idx], file_name),
        None => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_coordinates() {
        let src = "let a = 1\nlet b = a + 2\n";
        let map = TextMap::new(src);
        let section = SourceSection::new("file:///w/main.bab", &map, Span::new(18, 23)).unwrap();
        assert_eq!(section.name, "main.bab");
        assert_eq!((section.start_line, section.start_col), (2, 9));
        assert_eq!((section.end_line, section.end_col), (2, 13));
        assert_eq!(section.text(src), Some("a + 2"));
        assert_eq!(section.to_string(), "main.bab:2:9-2:13");
    }

    #[test]
    fn sibling_uris() {
        assert_eq!(
            resolve_sibling_uri("file:///w/src/main.bab", "lib.bab"),
            "file:///w/src/lib.bab"
        );
        assert_eq!(resolve_sibling_uri("main.bab", "lib.bab"), "lib.bab");
        assert_eq!(file_name("file:///w/src/lib.bab"), "lib.bab");
    }

    #[test]
    fn same_range_ignores_span_offsets() {
        let map = TextMap::new("abc\ndef");
        let a = SourceSection::new("u/x", &map, Span::new(4, 7)).unwrap();
        let mut b = a.clone();
        b.span = Span::new(0, 0);
        assert!(a.same_range(&b));
        assert_ne!(a, b);
    }
}
