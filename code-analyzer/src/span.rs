//! Source location model.
//!
//! `Span` keeps both line and byte ranges: lines drive coverage attribution,
//! bytes drive exact text extraction. Lines are 1-based and inclusive, bytes
//! are 0-based with an exclusive end.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start line (1-based).
    pub start_line: usize,
    /// Inclusive end line (1-based).
    pub end_line: usize,
    /// Inclusive start byte (0-based).
    pub start_byte: usize,
    /// Exclusive end byte (0-based).
    pub end_byte: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize, start_byte: usize, end_byte: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_byte,
            end_byte,
        }
    }

    /// Span of a tree-sitter node.
    ///
    /// Tree-sitter reports the end point *after* the last byte; when a node
    /// swallows its trailing newline the end lands on column 0 of the next
    /// row, which must not count as a spanned line.
    pub fn of_node(node: Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        let end_line = if end.column == 0 && end.row > start.row {
            end.row
        } else {
            end.row + 1
        };
        Self::new(start.row + 1, end_line, node.start_byte(), node.end_byte())
    }

    /// Lines spanned (1-based inclusive).
    pub fn line_count(&self) -> usize {
        if self.end_line >= self.start_line {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }

    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Extract a snippet from `text` by byte offsets, with safe bounds.
    pub fn slice_text<'a>(&self, text: &'a str) -> &'a str {
        let len = text.len();
        let start = self.start_byte.min(len);
        let end = self.end_byte.min(len).max(start);
        text.get(start..end).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_count_is_inclusive() {
        assert_eq!(Span::new(3, 5, 0, 0).line_count(), 3);
        assert_eq!(Span::new(4, 4, 0, 0).line_count(), 1);
        assert_eq!(Span::new(5, 4, 0, 0).line_count(), 0);
    }

    #[test]
    fn slice_clamps_out_of_range_offsets() {
        let span = Span::new(1, 1, 2, 100);
        assert_eq!(span.slice_text("hello"), "llo");
    }
}
