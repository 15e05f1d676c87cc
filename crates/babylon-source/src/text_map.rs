// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Offset ↔ line/column translation.
//!
//! Offsets are 0-based byte offsets; lines and columns are 1-based. A newline
//! occupies the last column of the line it terminates. Text that does not end
//! in a newline still counts its final fragment as a line, but a trailing
//! newline does not open a new one. Empty text has no lines.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextMapError {
    #[error("offset {offset} out of bounds for text of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("line {line} out of bounds for text with {count} lines")]
    LineOutOfBounds { line: usize, count: usize },
    #[error("column {col} out of bounds for line {line}")]
    ColumnOutOfBounds { line: usize, col: usize },
}

/// Precomputed line-start offsets for O(log n) lookups.
#[derive(Debug, Clone)]
pub struct TextMap {
    /// Byte offset of the start of each line. line_starts[0] is always 0.
    line_starts: Vec<usize>,
    len: usize,
    final_newline: bool,
}

impl TextMap {
    /// Build a map by scanning the text for newlines. O(n).
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' && i + 1 < text.len() {
                line_starts.push(i + 1);
            }
        }
        TextMap {
            line_starts,
            len: text.len(),
            final_newline: text.ends_with('\n'),
        }
    }

    /// Length of the mapped text in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of lines. A trailing newline does not start another line.
    pub fn line_count(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.line_starts.len()
        }
    }

    /// 1-based line containing the byte at `offset`.
    pub fn offset_to_line(&self, offset: usize) -> Result<usize, TextMapError> {
        if offset >= self.len {
            if offset == 0 && self.len == 0 {
                return Ok(1);
            }
            return Err(TextMapError::OffsetOutOfBounds {
                offset,
                len: self.len,
            });
        }
        Ok(self.line_starts.partition_point(|&start| start <= offset))
    }

    /// 1-based column of the byte at `offset`.
    pub fn offset_to_col(&self, offset: usize) -> Result<usize, TextMapError> {
        let line = self.offset_to_line(offset)?;
        Ok(offset - self.line_starts[line - 1] + 1)
    }

    /// Both coordinates at once.
    pub fn offset_to_line_col(&self, offset: usize) -> Result<(usize, usize), TextMapError> {
        let line = self.offset_to_line(offset)?;
        Ok((line, offset - self.line_starts[line - 1] + 1))
    }

    /// Byte offset of the first character of `line`.
    pub fn line_start_offset(&self, line: usize) -> Result<usize, TextMapError> {
        if self.len == 0 {
            return Ok(0);
        }
        self.check_line(line)?;
        Ok(self.line_starts[line - 1])
    }

    /// Length of `line` in bytes, excluding its newline.
    pub fn line_length(&self, line: usize) -> Result<usize, TextMapError> {
        if self.len == 0 {
            return Ok(0);
        }
        self.check_line(line)?;
        let start = self.line_starts[line - 1];
        match self.line_starts.get(line) {
            Some(&next) => Ok(next - start - 1),
            None if self.final_newline => Ok(self.len - start - 1),
            None => Ok(self.len - start),
        }
    }

    /// Text of a 1-based line, without its newline.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> Option<&'a str> {
        let start = self.line_start_offset(line).ok()?;
        let length = self.line_length(line).ok()?;
        source.get(start..start + length)
    }

    /// Byte offset of a 1-based (line, col) position. The column just past
    /// the end of the line is accepted so cursors at end of line resolve.
    pub fn position_to_offset(&self, line: usize, col: usize) -> Result<usize, TextMapError> {
        let start = self.line_start_offset(line)?;
        let length = self.line_length(line)?;
        if col == 0 || col > length + 1 {
            return Err(TextMapError::ColumnOutOfBounds { line, col });
        }
        Ok(start + col - 1)
    }

    fn check_line(&self, line: usize) -> Result<(), TextMapError> {
        let count = self.line_count();
        if line == 0 || line > count {
            return Err(TextMapError::LineOutOfBounds { line, count });
        }
        Ok(())
    }
}
