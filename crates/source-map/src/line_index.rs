//! Byte offset to line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A 0-based line and column. The column counts bytes from the line start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Line start offsets of one source text.
///
/// `\n`, `\r\n` and a lone `\r` each end a line, matching the newline
/// tokens of the markup scanner and the line terminators of scripts.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![TextSize::from(0)];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    starts.push(TextSize::from(i as u32));
                }
                b'\r' | b'\n' => {
                    i += 1;
                    starts.push(TextSize::from(i as u32));
                }
                _ => i += 1,
            }
        }
        Self {
            starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// The number of lines; an empty text has one.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Returns the position of `offset`, or `None` past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }
        let line = self.starts.partition_point(|start| *start <= offset) - 1;
        let col = offset - self.starts[line];
        Some(LineCol::new(line as u32, col.into()))
    }

    /// Like [`LineIndex::line_col`], clamping offsets past the end to the
    /// end of the text.
    pub fn line_col_at(&self, offset: usize) -> LineCol {
        let offset = TextSize::from(offset as u32).min(self.len);
        self.line_col(offset).unwrap_or_default()
    }

    /// Returns the offset of a position, or `None` if the line does not
    /// exist or the column runs past the line.
    pub fn offset(&self, position: LineCol) -> Option<ByteOffset> {
        let line = position.line as usize;
        let start = *self.starts.get(line)?;
        let end = self.starts.get(line + 1).copied().unwrap_or(self.len);
        let offset = start + TextSize::from(position.col);
        (offset <= end).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(index: &LineIndex, offset: u32) -> Option<LineCol> {
        index.line_col(TextSize::from(offset))
    }

    #[test]
    fn test_line_endings() {
        // "a\nb" "\r\n" "c" "\r" "d"
        let index = LineIndex::new("a\nb\r\nc\rd");
        assert_eq!(index.line_count(), 4);
        assert_eq!(at(&index, 0), Some(LineCol::new(0, 0)));
        assert_eq!(at(&index, 2), Some(LineCol::new(1, 0)));
        assert_eq!(at(&index, 3), Some(LineCol::new(1, 1)));
        assert_eq!(at(&index, 5), Some(LineCol::new(2, 0)));
        assert_eq!(at(&index, 7), Some(LineCol::new(3, 0)));
    }

    #[test]
    fn test_end_of_text() {
        let index = LineIndex::new("<App/>\n");
        assert_eq!(at(&index, 7), Some(LineCol::new(1, 0)));
        assert_eq!(at(&index, 8), None);
        assert_eq!(index.line_col_at(100), LineCol::new(1, 0));
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "<App>\r\n  <Text>{x}</Text>\n</App>";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() as u32 {
            let offset = TextSize::from(offset);
            let position = index.line_col(offset).unwrap();
            assert_eq!(index.offset(position), Some(offset));
        }
        assert_eq!(index.offset(LineCol::new(0, 40)), None);
        assert_eq!(index.offset(LineCol::new(9, 0)), None);
    }
}
