//! Human-readable source positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-indexed line/column position within a source file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// The line number (1-indexed).
    pub line: u32,
    /// The column number (1-indexed, counted in characters).
    pub column: u32,
}

impl Location {
    /// Creates a new location.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Computes the location of a byte offset within `content`.
    ///
    /// Offsets past the end of the content clamp to the final position.
    pub fn of_offset(content: &str, byte_offset: usize) -> Self {
        let mut offset = byte_offset.min(content.len());
        while !content.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &content[..offset];
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map_or(0, |pos| pos + 1);
        let column = before[line_start..].chars().count() as u32 + 1;
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_resolve_to_line_and_column() {
        let src = "abc\ndef\nghi";
        assert_eq!(Location::of_offset(src, 0), Location::new(1, 1));
        assert_eq!(Location::of_offset(src, 4), Location::new(2, 1));
        assert_eq!(Location::of_offset(src, 5), Location::new(2, 2));
        assert_eq!(Location::of_offset(src, 8), Location::new(3, 1));
    }

    #[test]
    fn offset_past_end_clamps() {
        assert_eq!(Location::of_offset("ab", 99), Location::new(1, 3));
    }

    #[test]
    fn multibyte_columns_count_chars() {
        let src = "é;x";
        assert_eq!(Location::of_offset(src, 3), Location::new(1, 3));
    }

    #[test]
    fn display_format() {
        assert_eq!(Location::new(10, 5).to_string(), "10:5");
    }
}
