// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! A named document together with its line map.

use crate::section::{file_name, SourceSection};
use crate::span::Span;
use crate::text_map::{TextMap, TextMapError};

#[derive(Debug, Clone)]
pub struct Source {
    uri: String,
    text: String,
    map: TextMap,
}

impl Source {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let map = TextMap::new(&text);
        Source {
            uri: uri.into(),
            text,
            map,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Last path segment of the URI.
    pub fn name(&self) -> &str {
        file_name(&self.uri)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn map(&self) -> &TextMap {
        &self.map
    }

    /// Text of a 1-based line, without its newline.
    pub fn line(&self, line: usize) -> Option<&str> {
        self.map.line_text(&self.text, line)
    }

    pub fn section(&self, span: Span) -> Result<SourceSection, TextMapError> {
        SourceSection::new(&self.uri, &self.map, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_and_sections() {
        let source = Source::new("file:///tmp/a.bab", "f(1)\ng(2)\n");
        assert_eq!(source.name(), "a.bab");
        assert_eq!(source.line(2), Some("g(2)"));
        assert_eq!(source.line(3), None);
        let section = source.section(Span::new(5, 9)).unwrap();
        assert_eq!((section.start_line, section.end_col), (2, 4));
    }
}
