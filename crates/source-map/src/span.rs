//! Byte ranges into a source text.

use text_size::{TextRange, TextSize};

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)`.
///
/// Spans produced for an embedded fragment (a script inside an attribute
/// value, a code-behind body) start out relative to that fragment and are
/// moved into document coordinates with [`Span::shift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// A zero-width span at `offset`.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self::new(offset, offset)
    }

    /// Builds a span from `usize` offsets as produced by string slicing.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self::new(start as u32, end as u32)
    }

    /// The smallest span enclosing both `self` and `other`.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Moves the span forward by `delta` bytes.
    #[inline]
    pub fn shift(self, delta: impl Into<ByteOffset>) -> Span {
        let delta = delta.into();
        Span::new(self.start + delta, self.end + delta)
    }

    #[inline]
    pub fn start_usize(&self) -> usize {
        u32::from(self.start) as usize
    }

    #[inline]
    pub fn end_usize(&self) -> usize {
        u32::from(self.end) as usize
    }

    /// Width in bytes; a reversed span counts as empty.
    #[inline]
    pub fn len_usize(&self) -> usize {
        self.end_usize().saturating_sub(self.start_usize())
    }

    /// The covered slice of `source`, or `""` when the span does not fit it.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start_usize()..self.end_usize()).unwrap_or_default()
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Span::new(range.start(), range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shift_into_document() {
        // `a + ` sits at offset 7 of the attribute below.
        let source = "<A x=\"{a + }\" />";
        let in_fragment = Span::from_offsets(2, 3);
        let in_document = in_fragment.shift(7u32);
        assert_eq!(in_document, Span::from_offsets(9, 10));
        assert_eq!(in_document.text(source), "+");
    }

    #[test]
    fn test_text_out_of_range() {
        assert_eq!(Span::from_offsets(40, 50).text("<App />"), "");
        // Not a char boundary.
        assert_eq!(Span::from_offsets(1, 2).text("é"), "");
    }

    #[test]
    fn test_cover_and_len() {
        let open = Span::from_offsets(0, 5);
        let close = Span::from_offsets(12, 18);
        let element = open.cover(close);
        assert_eq!(element, Span::from_offsets(0, 18));
        assert_eq!(close.cover(open), element);
        assert_eq!(element.len_usize(), 18);
        assert_eq!(Span::empty(4u32).len_usize(), 0);
    }

    #[test]
    fn test_from_text_range() {
        let range = TextRange::new(TextSize::from(3), TextSize::from(8));
        assert_eq!(Span::from(range), Span::from_offsets(3, 8));
    }
}
