use serde::{Deserialize, Serialize};

/// Zero-based line/column position. Columns count bytes, not characters;
/// conversions to an editor's own addressing scheme belong to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRange {
    pub start: Position,
    pub end: Position,
}

/// Maps between byte offsets and line/column positions for one text snapshot.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Byte offset for a position, or `None` when the position lies outside
    /// the text (past the last line, or past the end of its line).
    pub fn offset(&self, pos: Position) -> Option<usize> {
        let line = pos.line as usize;
        let start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.len + 1);
        let offset = start + pos.column as usize;
        (offset < line_end).then_some(offset)
    }

    /// Position of a byte offset; offsets past the end map to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|&s| s <= offset) - 1;
        Position {
            line: line as u32,
            column: (offset - self.line_starts[line]) as u32,
        }
    }

    pub fn range(&self, start: usize, end: usize) -> PositionRange {
        PositionRange {
            start: self.position(start),
            end: self.position(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_both_ways() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.offset(Position::new(0, 1)), Some(1));
        assert_eq!(index.offset(Position::new(1, 0)), Some(3));
        assert_eq!(index.offset(Position::new(2, 0)), Some(6));
        assert_eq!(index.position(4), Position::new(1, 1));
        assert_eq!(index.position(7), Position::new(3, 0));
    }

    #[test]
    fn rejects_positions_outside_the_text() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(Position::new(0, 3)), None);
        assert_eq!(index.offset(Position::new(5, 0)), None);
        // the last line has no trailing newline, so its end is addressable
        assert_eq!(index.offset(Position::new(1, 2)), Some(5));
    }

    #[test]
    fn positions_clamp_to_the_end() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(99), Position::new(0, 2));
    }
}
