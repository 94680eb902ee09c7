//! Typed views over the markup syntax tree.
//!
//! Each type wraps a [`SyntaxNode`] of one kind. Accessors return `None`
//! where the parser had to recover and the part is missing.

use crate::scanner::unescape_entities;
use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};
use smol_str::SmolStr;
use source_map::Span;

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            /// Wraps `node` if it has the matching kind.
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$name).then(|| Self(node))
            }

            /// Returns the underlying node.
            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }

            /// Returns the source range of the node, trivia inside it included.
            pub fn span(&self) -> Span {
                self.0.text_range().into()
            }
        }
    };
}

ast_node!(
    /// The root of a markup tree.
    Document
);
ast_node!(
    /// `<name attributes>content</name>` or `<name attributes/>`.
    Element
);
ast_node!(
    /// `name` or `namespace:name` in a start or end tag.
    TagName
);
ast_node!(AttributeList);
ast_node!(Attribute);
ast_node!(AttributeKey);
ast_node!(
    /// The quoted value of an attribute.
    AttributeValue
);
ast_node!(ContentList);

fn child<N>(node: &SyntaxNode, cast: fn(SyntaxNode) -> Option<N>) -> Option<N> {
    node.children().find_map(cast)
}

fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == kind)
}

/// Identifier tokens of a qualified name, in order.
fn name_parts(node: &SyntaxNode) -> Vec<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| token.kind() == SyntaxKind::Identifier)
        .collect()
}

fn token_span(token: &SyntaxToken) -> Span {
    token.text_range().into()
}

impl Document {
    pub(crate) fn from_root(node: SyntaxNode) -> Self {
        Self(node)
    }

    /// Elements at the top level. A valid document has exactly one.
    pub fn root_elements(&self) -> impl Iterator<Item = Element> {
        self.0.children().filter_map(Element::cast)
    }

    /// The first top-level element.
    pub fn root(&self) -> Option<Element> {
        self.root_elements().next()
    }
}

impl Element {
    /// The name in the start tag.
    pub fn tag_name(&self) -> Option<TagName> {
        child(&self.0, TagName::cast)
    }

    /// The name in the end tag, if the element has one.
    pub fn close_tag_name(&self) -> Option<TagName> {
        self.0.children().filter_map(TagName::cast).nth(1)
    }

    /// The full start-tag name, e.g. `Button` or `x:Button`.
    pub fn name(&self) -> Option<SmolStr> {
        self.tag_name().map(|name| name.full_name())
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> {
        child(&self.0, AttributeList::cast)
            .into_iter()
            .flat_map(|list| list.attributes().collect::<Vec<_>>())
    }

    /// Looks up an attribute by its full key.
    pub fn attribute(&self, key: &str) -> Option<Attribute> {
        self.attributes()
            .find(|attribute| attribute.key().is_some_and(|k| k.full_name() == key))
    }

    pub fn content(&self) -> Option<ContentList> {
        child(&self.0, ContentList::cast)
    }

    /// True for `<name/>`.
    pub fn is_self_closing(&self) -> bool {
        token(&self.0, SyntaxKind::SelfClose).is_some()
    }

    /// The span of `<name`, used to anchor diagnostics about the element.
    pub fn open_span(&self) -> Span {
        let start = Span::empty(self.0.text_range().start());
        match self.tag_name() {
            Some(name) => start.cover(name.name_span()),
            None => start,
        }
    }

    /// Child content items; empty for self-closing elements.
    pub fn children(&self) -> Vec<Content> {
        self.content().map(|content| content.items()).unwrap_or_default()
    }
}

impl TagName {
    /// The namespace prefix of `prefix:Name`.
    pub fn namespace(&self) -> Option<SmolStr> {
        qualified_namespace(&self.0)
    }

    /// The local name, without namespace.
    pub fn local_name(&self) -> SmolStr {
        qualified_local(&self.0)
    }

    /// The name as written, without trivia.
    pub fn full_name(&self) -> SmolStr {
        qualified_full(&self.0)
    }

    /// The span of the name tokens, trivia excluded.
    pub fn name_span(&self) -> Span {
        qualified_span(&self.0)
    }
}

impl AttributeList {
    pub fn attributes(&self) -> impl Iterator<Item = Attribute> {
        self.0.children().filter_map(Attribute::cast)
    }
}

impl Attribute {
    pub fn key(&self) -> Option<AttributeKey> {
        child(&self.0, AttributeKey::cast)
    }

    pub fn value(&self) -> Option<AttributeValue> {
        child(&self.0, AttributeValue::cast)
    }

    /// True when the attribute has no `=value` part.
    pub fn is_key_only(&self) -> bool {
        token(&self.0, SyntaxKind::Equal).is_none()
    }
}

impl AttributeKey {
    pub fn namespace(&self) -> Option<SmolStr> {
        qualified_namespace(&self.0)
    }

    pub fn local_name(&self) -> SmolStr {
        qualified_local(&self.0)
    }

    pub fn full_name(&self) -> SmolStr {
        qualified_full(&self.0)
    }

    pub fn name_span(&self) -> Span {
        qualified_span(&self.0)
    }
}

impl AttributeValue {
    fn literal(&self) -> Option<SyntaxToken> {
        self.0
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == SyntaxKind::StringLiteral)
    }

    /// The value token text, quotes included.
    pub fn raw_text(&self) -> Option<SmolStr> {
        self.literal().map(|token| SmolStr::new(token.text()))
    }

    /// The text between the quotes, still escaped, and the offset where it
    /// starts in the document.
    pub fn inner(&self) -> Option<(String, u32)> {
        let token = self.literal()?;
        let text = token.text();
        let quote = text.chars().next()?;
        let body = &text[quote.len_utf8()..];
        let body = body.strip_suffix(quote).unwrap_or(body);
        let offset = u32::from(token.text_range().start()) + quote.len_utf8() as u32;
        Some((body.to_string(), offset))
    }

    /// The unquoted value with entities replaced.
    pub fn value(&self) -> Option<String> {
        self.inner().map(|(text, _)| unescape_entities(&text))
    }
}

/// One item of element content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Element),
    Text(SyntaxToken),
    Entity(SyntaxToken),
    CData(SyntaxToken),
    Script(SyntaxToken),
}

impl Content {
    pub fn span(&self) -> Span {
        match self {
            Content::Element(element) => element.span(),
            Content::Text(token) | Content::Entity(token) | Content::CData(token) | Content::Script(token) => {
                token_span(token)
            }
        }
    }
}

impl ContentList {
    /// The content items in order. Trivia and error nodes are skipped.
    pub fn items(&self) -> Vec<Content> {
        self.0
            .children_with_tokens()
            .filter_map(|element| match element {
                rowan::NodeOrToken::Node(node) => Element::cast(node).map(Content::Element),
                rowan::NodeOrToken::Token(token) => match token.kind() {
                    SyntaxKind::Text => Some(Content::Text(token)),
                    SyntaxKind::Entity => Some(Content::Entity(token)),
                    SyntaxKind::CData => Some(Content::CData(token)),
                    SyntaxKind::Script => Some(Content::Script(token)),
                    _ => None,
                },
            })
            .collect()
    }
}

fn qualified_namespace(node: &SyntaxNode) -> Option<SmolStr> {
    let parts = name_parts(node);
    let has_colon = token(node, SyntaxKind::Colon).is_some();
    match parts.as_slice() {
        [prefix, _] if has_colon => Some(SmolStr::new(prefix.text())),
        _ => None,
    }
}

fn qualified_local(node: &SyntaxNode) -> SmolStr {
    name_parts(node)
        .last()
        .map(|token| SmolStr::new(token.text()))
        .unwrap_or_default()
}

fn qualified_full(node: &SyntaxNode) -> SmolStr {
    let text: String = node
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| matches!(token.kind(), SyntaxKind::Identifier | SyntaxKind::Colon))
        .map(|token| token.text().to_string())
        .collect();
    SmolStr::new(text)
}

fn qualified_span(node: &SyntaxNode) -> Span {
    let mut tokens = node
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| !token.kind().is_trivia());
    let Some(first) = tokens.next() else {
        return Span::empty(node.text_range().start());
    };
    let first = token_span(&first);
    tokens.fold(first, |span, token| span.cover(token_span(&token)))
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_element_accessors() {
        let source = "<x:Card title=\"a &amp; b\" enabled>\n  Hi <Icon/>\n</x:Card>";
        let parse = parse(source);
        assert!(parse.errors().is_empty());
        let card = parse.document().root().unwrap();
        let name = card.tag_name().unwrap();
        assert_eq!(name.namespace().as_deref(), Some("x"));
        assert_eq!(name.local_name(), "Card");
        assert_eq!(card.close_tag_name().unwrap().full_name(), "x:Card");
        assert_eq!(card.open_span().text(source), "<x:Card");

        let title = card.attribute("title").unwrap();
        assert_eq!(title.value().unwrap().value().as_deref(), Some("a & b"));
        let (inner, offset) = title.value().unwrap().inner().unwrap();
        assert_eq!(&source[offset as usize..offset as usize + inner.len()], "a &amp; b");
        assert!(card.attribute("enabled").unwrap().is_key_only());

        let children = card.children();
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[1], super::Content::Element(icon) if icon.is_self_closing()));
    }
}
