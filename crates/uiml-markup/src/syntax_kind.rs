//! Token and node kinds of the markup syntax tree.

/// Every kind of token and node in a markup tree.
///
/// Tokens come first, nodes after them. The numeric value is what rowan
/// stores, so variants are only ever appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // === Tokens ===
    /// `<`
    LessThan = 0,
    /// `</`
    CloseTagOpen,
    /// `>`
    GreaterThan,
    /// `/>`
    SelfClose,
    /// `=`
    Equal,
    /// `:`
    Colon,
    /// A tag or attribute name part.
    Identifier,
    /// `'…'`, `"…"` or `` `…` `` including the quotes.
    StringLiteral,
    /// `<![CDATA[…]]>`
    CData,
    /// The body of a `<script>` element.
    Script,
    /// One of `&amp; &lt; &gt; &apos; &quot;`.
    Entity,
    /// Character data between tags.
    Text,
    /// `<!-- … -->`
    Comment,
    /// Spaces and tabs.
    Whitespace,
    /// `\n`, `\r\n` or `\r`.
    Newline,
    /// A character that cannot start any token here.
    Unknown,
    /// End of input. Never stored in the tree.
    Eof,

    // === Nodes ===
    Document,
    Element,
    TagName,
    AttributeList,
    Attribute,
    AttributeKey,
    AttributeValue,
    ContentList,
    /// Wraps tokens the parser could not place, or that failed to scan.
    Error,
}

const ALL: [SyntaxKind; 26] = [
    SyntaxKind::LessThan,
    SyntaxKind::CloseTagOpen,
    SyntaxKind::GreaterThan,
    SyntaxKind::SelfClose,
    SyntaxKind::Equal,
    SyntaxKind::Colon,
    SyntaxKind::Identifier,
    SyntaxKind::StringLiteral,
    SyntaxKind::CData,
    SyntaxKind::Script,
    SyntaxKind::Entity,
    SyntaxKind::Text,
    SyntaxKind::Comment,
    SyntaxKind::Whitespace,
    SyntaxKind::Newline,
    SyntaxKind::Unknown,
    SyntaxKind::Eof,
    SyntaxKind::Document,
    SyntaxKind::Element,
    SyntaxKind::TagName,
    SyntaxKind::AttributeList,
    SyntaxKind::Attribute,
    SyntaxKind::AttributeKey,
    SyntaxKind::AttributeValue,
    SyntaxKind::ContentList,
    SyntaxKind::Error,
];

impl SyntaxKind {
    /// Returns true for comments, whitespace and newlines.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Comment | SyntaxKind::Whitespace | SyntaxKind::Newline)
    }

    /// Returns true for the kinds that make up text content.
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self, SyntaxKind::Text | SyntaxKind::Entity | SyntaxKind::CData)
    }

    /// Returns the kind stored under `raw`, or `Error` for unknown values.
    pub fn from_raw(raw: u16) -> SyntaxKind {
        ALL.get(raw as usize).copied().unwrap_or(SyntaxKind::Error)
    }

    /// Returns a human-readable name for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            SyntaxKind::LessThan => "'<'",
            SyntaxKind::CloseTagOpen => "'</'",
            SyntaxKind::GreaterThan => "'>'",
            SyntaxKind::SelfClose => "'/>'",
            SyntaxKind::Equal => "'='",
            SyntaxKind::Colon => "':'",
            SyntaxKind::Identifier => "identifier",
            SyntaxKind::StringLiteral => "string",
            SyntaxKind::CData => "CDATA section",
            SyntaxKind::Script => "script",
            SyntaxKind::Entity => "entity",
            SyntaxKind::Text => "text",
            SyntaxKind::Comment => "comment",
            SyntaxKind::Whitespace => "whitespace",
            SyntaxKind::Newline => "newline",
            SyntaxKind::Unknown => "unknown character",
            SyntaxKind::Eof => "end of file",
            SyntaxKind::Document => "document",
            SyntaxKind::Element => "element",
            SyntaxKind::TagName => "tag name",
            SyntaxKind::AttributeList => "attribute list",
            SyntaxKind::Attribute => "attribute",
            SyntaxKind::AttributeKey => "attribute key",
            SyntaxKind::AttributeValue => "attribute value",
            SyntaxKind::ContentList => "content",
            SyntaxKind::Error => "error",
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

/// The rowan language tag for markup trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkupLanguage {}

impl rowan::Language for MarkupLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        SyntaxKind::from_raw(raw.0)
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<MarkupLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<MarkupLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<MarkupLanguage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for kind in ALL {
            assert_eq!(SyntaxKind::from_raw(kind as u16), kind);
        }
        assert_eq!(SyntaxKind::from_raw(999), SyntaxKind::Error);
    }
}
