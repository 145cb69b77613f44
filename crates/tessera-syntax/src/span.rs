//! Source location tracking for AST nodes and diagnostics.
//!
//! A [`Span`] names a file, a 1-indexed line and column, and a length in
//! bytes. The type checker never reads source text; it only carries spans
//! through to the diagnostics it reports.
//!
//! ```
//! use tessera_syntax::span::{FileId, Span};
//!
//! let span = Span::new(FileId(0), 4, 9, 3);
//! assert_eq!(span.to_string(), "4:9");
//! assert_eq!(span.end_column(), 12);
//! ```

use std::fmt;

/// Identifier of a source file, assigned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileId(pub u32);

/// A source region: file, start line/column (1-indexed) and byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// File the region belongs to.
    pub file: FileId,
    /// Start line, 1-indexed.
    pub line: u32,
    /// Start column in bytes, 1-indexed.
    pub column: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(file: FileId, line: u32, column: u32, len: u32) -> Self {
        Self {
            file,
            line,
            column,
            len,
        }
    }

    /// Zero-length span at a position.
    #[must_use]
    pub const fn point(file: FileId, line: u32, column: u32) -> Self {
        Self::new(file, line, column, 0)
    }

    /// Span for synthesized nodes with no source location.
    #[must_use]
    pub const fn dummy() -> Self {
        Self::new(FileId(0), 0, 0, 0)
    }

    /// Whether this is the [`Span::dummy`] location.
    #[must_use]
    pub const fn is_dummy(&self) -> bool {
        self.line == 0 && self.column == 0
    }

    /// Whether the span covers no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column just past the end, assuming the span does not cross a line.
    #[must_use]
    pub const fn end_column(&self) -> u32 {
        self.column + self.len
    }

    /// Smallest single-line span covering both, when both start on the same line.
    ///
    /// Spans on different lines keep `self`'s start and length.
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        if self.file != other.file || self.line != other.line {
            return self;
        }
        let start = self.column.min(other.column);
        let end = self.end_column().max(other.end_column());
        Span::new(self.file, self.line, start, end - start)
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Anything that knows its source location.
pub trait Spanned {
    /// The node's span.
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_is_empty() {
        let span = Span::point(FileId(1), 3, 7);
        assert!(span.is_empty());
        assert_eq!(span.end_column(), 7);
    }

    #[test]
    fn test_dummy() {
        assert!(Span::dummy().is_dummy());
        assert!(!Span::new(FileId(0), 1, 1, 1).is_dummy());
        assert_eq!(Span::default(), Span::dummy());
    }

    #[test]
    fn test_merge_same_line() {
        let left = Span::new(FileId(0), 2, 5, 3);
        let right = Span::new(FileId(0), 2, 12, 4);
        let merged = left.merge(right);
        assert_eq!(merged.column, 5);
        assert_eq!(merged.len, 11);
    }

    #[test]
    fn test_merge_different_lines_keeps_left() {
        let left = Span::new(FileId(0), 2, 5, 3);
        let right = Span::new(FileId(0), 3, 1, 4);
        assert_eq!(left.merge(right), left);
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(FileId(0), 10, 4, 2).to_string(), "10:4");
    }
}
