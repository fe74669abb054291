use serde::{Deserialize, Serialize};

/// Position in a source file (0-indexed).
///
/// Ordering is line-major, so `a <= b` means `a` is at or before `b`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, UTF-16 code units)
    pub character: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    /// Move this position down by `lines`, leaving the column untouched.
    #[must_use]
    pub const fn offset_lines(self, lines: usize) -> Self {
        Self {
            line: self.line + lines,
            character: self.character,
        }
    }
}

/// Range in a source file, inclusive of both ends for containment checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains_position(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    #[must_use]
    pub fn contains_range(&self, other: &Self) -> bool {
        self.contains_position(other.start) && self.contains_position(other.end)
    }

    #[must_use]
    pub const fn offset_lines(self, lines: usize) -> Self {
        Self {
            start: self.start.offset_lines(lines),
            end: self.end.offset_lines(lines),
        }
    }
}

/// Calculate the position of a byte offset in `source`.
///
/// Offsets past the end clamp to the end of the text.
#[must_use]
pub fn position_from_offset(source: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut character = 0;

    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += ch.len_utf16();
        }
    }

    Position::new(line, character)
}
