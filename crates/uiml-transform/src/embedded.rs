//! Script text embedded in markup, with a map back to document offsets.
//!
//! Attribute values have their entities replaced and text content is
//! whitespace-collapsed before scripts are parsed out of them, so offsets in
//! the parsed text differ from document offsets. [`EmbeddedText`] records an
//! anchor wherever the two drift apart and re-anchors parse errors with it.

use source_map::{LineIndex, Span};
use uiml_markup::ENTITIES;
use uiml_script::ParseError;

/// Text extracted from markup.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedText {
    text: String,
    /// `(text offset, document offset)` pairs, ascending.
    anchors: Vec<(u32, u32)>,
    /// A space to emit before the next non-whitespace text.
    pending_space: Option<u32>,
}

impl EmbeddedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of an attribute value: entities replaced, whitespace kept.
    pub fn attribute(raw: &str, start: u32) -> Self {
        let mut text = Self::new();
        text.push_unescaped(raw, start, false);
        text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Document offset of the first character, if any.
    pub fn start(&self) -> Option<u32> {
        self.anchors.first().map(|(_, source)| *source)
    }

    /// Maps an offset into the text back to the document.
    pub fn source_offset(&self, offset: u32) -> u32 {
        let index = self.anchors.partition_point(|(text, _)| *text <= offset);
        match index.checked_sub(1).and_then(|i| self.anchors.get(i)) {
            Some((text, source)) => source + (offset - text),
            None => self.start().unwrap_or(0),
        }
    }

    /// Maps a span of the text back to the document.
    pub fn source_span(&self, span: Span) -> Span {
        let start = self.source_offset(u32::from(span.start));
        let end = self.source_offset(u32::from(span.end)).max(start);
        Span::new(start, end)
    }

    /// Re-anchors a parse error of this text into the document.
    pub fn reanchor(&self, mut error: ParseError, line_index: &LineIndex) -> ParseError {
        error.span = self.source_span(error.span);
        error.position = line_index.line_col_at(error.span.start_usize());
        error
    }

    fn anchor(&mut self, source: u32) {
        let at = self.text.len() as u32;
        if let Some((text, last)) = self.anchors.last() {
            if last + (at - text) == source {
                return;
            }
        }
        self.anchors.push((at, source));
    }

    fn push_str(&mut self, s: &str, source: u32) {
        if s.is_empty() {
            return;
        }
        self.flush_space();
        self.anchor(source);
        self.text.push_str(s);
    }

    fn push_char(&mut self, c: char, source: u32) {
        self.flush_space();
        self.anchor(source);
        self.text.push(c);
    }

    fn flush_space(&mut self) {
        if let Some(at) = self.pending_space.take() {
            if !self.text.is_empty() {
                self.anchor(at);
                self.text.push(' ');
            }
        }
    }

    /// Appends `raw`, found at document offset `start`, replacing entities.
    /// With `collapse`, whitespace runs become single spaces and leading or
    /// trailing whitespace of the whole text is dropped.
    pub fn push_unescaped(&mut self, raw: &str, start: u32, collapse: bool) {
        let mut offset = 0;
        while offset < raw.len() {
            let rest = &raw[offset..];
            let source = start + offset as u32;
            if let Some((entity, c)) = ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
                self.push_char(*c, source);
                offset += entity.len();
                continue;
            }
            let Some(c) = rest.chars().next() else {
                break;
            };
            if collapse && c.is_whitespace() {
                let run = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
                self.pending_space.get_or_insert(source);
                offset += run;
                continue;
            }
            let run = rest
                .find(|c: char| c == '&' || (collapse && c.is_whitespace()))
                .unwrap_or(rest.len())
                .max(c.len_utf8());
            self.push_str(&rest[..run], source);
            offset += run;
        }
    }

    /// Appends CDATA content verbatim.
    pub fn push_verbatim(&mut self, raw: &str, start: u32) {
        self.push_str(raw, start);
    }

    /// Drops leading and trailing whitespace, keeping the offset map valid.
    pub fn trim(&mut self) {
        self.pending_space = None;
        let end = self.text.trim_end().len();
        self.text.truncate(end);
        let cut = self.text.len() - self.text.trim_start().len();
        if cut == 0 {
            return;
        }
        let cut = cut as u32;
        let first = (0, self.source_offset(cut));
        self.text.drain(..cut as usize);
        let rest = self
            .anchors
            .iter()
            .filter(|(text, _)| *text > cut)
            .map(|(text, source)| (text - cut, *source));
        self.anchors = std::iter::once(first).chain(rest).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attribute_entities_are_mapped() {
        // <A v="a &amp;&amp; b(">: the value starts at document offset 6
        let text = EmbeddedText::attribute("a &amp;&amp; b(", 6);
        assert_eq!(text.as_str(), "a && b(");
        assert_eq!(text.source_offset(0), 6);
        assert_eq!(text.source_offset(3), 13);
        assert_eq!(text.source_offset(5), 19);
        assert_eq!(text.source_span(Span::from_offsets(5, 7)), Span::from_offsets(19, 21));
    }

    #[test]
    fn test_collapsed_text() {
        let mut text = EmbeddedText::new();
        text.push_unescaped("\n   count  +\n 1 ", 10, true);
        text.push_verbatim(" raw  ", 40);
        assert_eq!(text.as_str(), "count + 1  raw  ");
        assert_eq!(text.start(), Some(14));
        assert_eq!(text.source_offset(6), 21);
        assert_eq!(text.source_offset(8), 24);
        assert_eq!(text.source_offset(9), 25);
        assert_eq!(text.source_offset(11), 41);
    }

    #[test]
    fn test_trailing_whitespace_is_dropped() {
        let mut text = EmbeddedText::new();
        text.push_unescaped("  Hello \t world \n", 0, true);
        assert_eq!(text.as_str(), "Hello world");
    }

    #[test]
    fn test_trim_shifts_anchors() {
        let mut text = EmbeddedText::new();
        text.push_unescaped("\n  a &lt; b\n", 5, false);
        text.trim();
        assert_eq!(text.as_str(), "a < b");
        assert_eq!(text.source_offset(0), 8);
        assert_eq!(text.source_offset(4), 15);
    }
}
