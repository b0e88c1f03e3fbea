//! Source locations attached to runtime errors.

use std::fmt;

use serde::Serialize;

/// A character range in the original script, plus the line/column of its start.
///
/// The parser (an external collaborator) hands spans to the runtime through
/// the tokens it blames for an error; the runtime only carries them through to
/// the termination channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Start offset in characters, inclusive.
    pub start: usize,
    /// End offset in characters, exclusive.
    pub end: usize,
    /// 1-based line of `start`.
    pub line: usize,
    /// 1-based column of `start`.
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Builds a span for `start..end` by locating it inside `source`.
    pub fn locate(source: &str, start: usize, end: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for (offset, ch) in source.chars().enumerate() {
            if offset == start {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self::new(start, end.max(start), line, column)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_counts_lines_and_columns() {
        let source = "x = 1;\ny = x + \"a\";";
        let span = Span::locate(source, 11, 18);
        assert_eq!(span.line, 2);
        assert_eq!(span.column, 5);
        assert_eq!(span.len(), 7);
        assert_eq!(span.to_string(), "2:5");
    }

    #[test]
    fn test_locate_clamps_reversed_range() {
        let span = Span::locate("abc", 2, 1);
        assert!(span.is_empty());
        assert_eq!(span.column, 3);
    }

    #[test]
    fn test_reversed_span_has_zero_length() {
        let span = Span::new(4, 1, 1, 5);
        assert_eq!(span.len(), 0);
        assert!(span.is_empty());
    }
}
