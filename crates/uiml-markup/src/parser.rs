//! Recursive descent parser producing a lossless rowan tree.
//!
//! Every scanned token ends up in the tree, so `parse.syntax().text()` is the
//! source. Structural problems are reported once and the parser carries on
//! with a best guess. Tokens the scanner complained about, and tokens that
//! fit nowhere, are wrapped in `Error` nodes.

use crate::ast::Document;
use crate::error::{ErrorCode, MarkupError};
use crate::scanner::{ScanMode, Scanner, Token};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use rowan::{GreenNode, GreenNodeBuilder};
use smol_str::SmolStr;
use source_map::Span;

/// The result of parsing a markup document.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<MarkupError>,
}

impl Parse {
    /// Returns the root of the syntax tree.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Returns the typed document root.
    pub fn document(&self) -> Document {
        Document::from_root(self.syntax())
    }

    /// Scanner and parser diagnostics, ordered by position.
    pub fn errors(&self) -> &[MarkupError] {
        &self.errors
    }
}

/// Parses `source` into a syntax tree.
pub fn parse(source: &str) -> Parse {
    log::debug!("parsing markup ({} bytes)", source.len());
    let mut scan_errors = Vec::new();
    let tokens: Vec<Token> = Scanner::new(source, ScanMode::Full)
        .on_error(|error| scan_errors.push(error))
        .collect();

    let flagged = tokens
        .iter()
        .map(|token| scan_errors.iter().any(|error| error.span == token.span))
        .collect();
    let mut parser = Parser {
        tokens,
        flagged,
        pos: 0,
        builder: GreenNodeBuilder::new(),
        errors: scan_errors,
        open: Vec::new(),
    };
    parser.parse_document();

    let mut errors = parser.errors;
    errors.sort_by_key(|error| error.span.start);
    log::debug!("parsed markup with {} diagnostics", errors.len());
    Parse {
        green: parser.builder.finish(),
        errors,
    }
}

/// A name read from a start or end tag.
#[derive(Debug, Clone)]
struct TagInfo {
    name: SmolStr,
    span: Span,
}

struct Parser {
    tokens: Vec<Token>,
    /// Parallel to `tokens`: the scanner reported an error for this token.
    flagged: Vec<bool>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<MarkupError>,
    /// Names of the elements currently open, innermost last.
    open: Vec<Option<SmolStr>>,
}

impl Parser {
    // === Token helpers ===

    /// Index of the next non-trivia token.
    fn significant(&self) -> usize {
        let mut index = self.pos;
        while index + 1 < self.tokens.len() && self.tokens[index].kind.is_trivia() {
            index += 1;
        }
        index
    }

    fn nth(&self, n: usize) -> &Token {
        let mut index = self.significant();
        for _ in 0..n {
            index += 1;
            while index + 1 < self.tokens.len() && self.tokens[index].kind.is_trivia() {
                index += 1;
            }
        }
        &self.tokens[index.min(self.tokens.len() - 1)]
    }

    fn current(&self) -> SyntaxKind {
        self.nth(0).kind
    }

    fn current_span(&self) -> Span {
        self.nth(0).span
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// End offset of the last consumed token.
    fn previous_end(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(index) => Span::empty(self.tokens[index].span.end),
            None => Span::empty(0u32),
        }
    }

    /// Emits the token at `pos`, wrapped in an `Error` node when flagged.
    fn emit(&mut self) {
        let token = &self.tokens[self.pos];
        if token.kind != SyntaxKind::Eof {
            if self.flagged[self.pos] {
                self.builder.start_node(SyntaxKind::Error.into());
                self.builder.token(token.kind.into(), token.text.as_str());
                self.builder.finish_node();
            } else {
                self.builder.token(token.kind.into(), token.text.as_str());
            }
        }
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat_trivia(&mut self) {
        while self.pos + 1 < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.emit();
        }
    }

    /// Consumes the next significant token along with the trivia before it.
    fn bump(&mut self) -> Token {
        self.eat_trivia();
        let token = self.tokens[self.pos].clone();
        self.emit();
        token
    }

    /// Starts a node after any pending trivia, so trivia stays outside it.
    fn start_node(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span, context: Span) {
        self.errors.push(MarkupError::new(code, message, span, context));
    }

    /// Reports the next token as unexpected and wraps it in an `Error` node.
    fn bump_unexpected(&mut self, context: Span) {
        self.eat_trivia();
        let index = self.pos;
        let token = self.tokens[index].clone();
        if !self.flagged[index] {
            self.error(
                ErrorCode::UnexpectedToken,
                format!("unexpected {}", token.kind.describe()),
                token.span,
                context,
            );
            self.builder.start_node(SyntaxKind::Error.into());
            self.emit();
            self.finish_node();
        } else {
            self.emit();
        }
    }

    // === Grammar ===

    fn parse_document(&mut self) {
        self.builder.start_node(SyntaxKind::Document.into());
        let mut first_root: Option<Span> = None;
        loop {
            match self.current() {
                SyntaxKind::Eof => break,
                SyntaxKind::LessThan => {
                    let start = self.current_span();
                    let (open, span) = self.parse_element();
                    match first_root {
                        None => first_root = Some(span),
                        Some(first) => self.error(
                            ErrorCode::MultipleRoots,
                            "a document must have exactly one root element",
                            open.map_or(start, |tag| start.cover(tag.span)),
                            first,
                        ),
                    }
                }
                SyntaxKind::CloseTagOpen => self.parse_stray_close_tag(),
                _ => {
                    let context = self.current_span();
                    self.bump_unexpected(context);
                }
            }
        }
        self.eat_trivia();
        self.finish_node();
    }

    /// `</name>` with nothing open becomes one `Error` node.
    fn parse_stray_close_tag(&mut self) {
        self.start_node(SyntaxKind::Error);
        let mut span = self.bump().span;
        while matches!(self.current(), SyntaxKind::Identifier | SyntaxKind::Colon) {
            span = span.cover(self.bump().span);
        }
        if self.at(SyntaxKind::GreaterThan) {
            span = span.cover(self.bump().span);
        }
        self.finish_node();
        self.error(ErrorCode::UnexpectedToken, "unexpected closing tag", span, span);
    }

    /// Parses an element starting at `<`. Returns its start-tag name and its span.
    fn parse_element(&mut self) -> (Option<TagInfo>, Span) {
        self.start_node(SyntaxKind::Element);
        let less_than = self.bump();
        let name = self.parse_tag_name(less_than.span);
        let open_span = name
            .as_ref()
            .map_or(less_than.span, |tag| less_than.span.cover(tag.span));
        self.parse_attribute_list();

        match self.current() {
            SyntaxKind::SelfClose => {
                self.bump();
            }
            SyntaxKind::GreaterThan if name.is_none() => {
                self.bump();
            }
            SyntaxKind::GreaterThan => {
                self.bump();
                self.open.push(name.as_ref().map(|tag| tag.name.clone()));
                self.parse_content_list();
                self.open.pop();
                self.parse_close_tag(name.as_ref(), open_span);
            }
            SyntaxKind::Eof if self.ends_in_scan_error() => {}
            _ => {
                let span = self.current_span();
                self.error(ErrorCode::GreaterThanExpected, "'>' expected", span, open_span);
            }
        }

        self.finish_node();
        let span = less_than.span.cover(self.previous_end());
        (name, span)
    }

    fn parse_tag_name(&mut self, opener: Span) -> Option<TagInfo> {
        if !self.at(SyntaxKind::Identifier) {
            let span = self.current_span();
            self.error(ErrorCode::TagNameExpected, "tag name expected", span, opener);
            return None;
        }
        Some(self.parse_qualified_name(SyntaxKind::TagName))
    }

    /// `name` or `namespace:name`, as a node of `kind`.
    fn parse_qualified_name(&mut self, kind: SyntaxKind) -> TagInfo {
        self.start_node(kind);
        let first = self.bump();
        let mut name = first.text.to_string();
        let mut span = first.span;
        if self.at(SyntaxKind::Colon) {
            let colon = self.bump();
            name.push(':');
            span = span.cover(colon.span);
            if self.at(SyntaxKind::Identifier) {
                let local = self.bump();
                name.push_str(&local.text);
                span = span.cover(local.span);
            } else {
                let at = self.current_span();
                self.error(ErrorCode::TagNameExpected, "name expected after ':'", at, span);
            }
        }
        self.finish_node();
        TagInfo {
            name: SmolStr::new(name),
            span,
        }
    }

    fn parse_attribute_list(&mut self) {
        self.start_node(SyntaxKind::AttributeList);
        let mut seen: Vec<TagInfo> = Vec::new();
        loop {
            match self.current() {
                SyntaxKind::Identifier => self.parse_attribute(&mut seen),
                SyntaxKind::GreaterThan
                | SyntaxKind::SelfClose
                | SyntaxKind::LessThan
                | SyntaxKind::CloseTagOpen
                | SyntaxKind::Eof => break,
                _ => {
                    let context = self.current_span();
                    self.bump_unexpected(context);
                }
            }
        }
        self.finish_node();
    }

    fn parse_attribute(&mut self, seen: &mut Vec<TagInfo>) {
        self.start_node(SyntaxKind::Attribute);
        let key = self.parse_qualified_name(SyntaxKind::AttributeKey);

        let local = key.name.rsplit(':').next().unwrap_or_default();
        if local.starts_with(|c: char| c.is_uppercase()) {
            self.error(
                ErrorCode::UppercaseAttribute,
                format!("attribute name '{}' must not start with an uppercase letter", key.name),
                key.span,
                key.span,
            );
        }
        match seen.iter().find(|other| other.name == key.name) {
            Some(first) => {
                let context = first.span;
                self.error(
                    ErrorCode::DuplicateAttribute,
                    format!("duplicate attribute '{}'", key.name),
                    key.span,
                    context,
                );
            }
            None => seen.push(key.clone()),
        }

        if self.at(SyntaxKind::Equal) {
            let equal = self.bump();
            if self.at(SyntaxKind::StringLiteral) {
                self.start_node(SyntaxKind::AttributeValue);
                self.bump();
                self.finish_node();
            } else {
                let span = self.current_span();
                self.error(
                    ErrorCode::AttributeValueExpected,
                    "attribute value expected",
                    span,
                    key.span.cover(equal.span),
                );
            }
        }
        self.finish_node();
    }

    fn parse_content_list(&mut self) {
        self.start_node(SyntaxKind::ContentList);
        loop {
            match self.current() {
                SyntaxKind::Eof | SyntaxKind::CloseTagOpen => break,
                SyntaxKind::LessThan => {
                    self.parse_element();
                }
                SyntaxKind::Text | SyntaxKind::Entity | SyntaxKind::CData | SyntaxKind::Script => {
                    self.bump();
                }
                _ => {
                    let context = self.current_span();
                    self.bump_unexpected(context);
                }
            }
        }
        self.finish_node();
    }

    fn parse_close_tag(&mut self, open: Option<&TagInfo>, open_span: Span) {
        let open_name = open.map(|tag| tag.name.as_str()).unwrap_or_default();
        if self.at(SyntaxKind::Eof) {
            if !self.ends_in_scan_error() {
                let span = self.current_span();
                self.error(
                    ErrorCode::UnclosedTag,
                    format!("closing tag expected for <{open_name}>"),
                    span,
                    open_span,
                );
            }
            return;
        }

        let close_name = self.peek_close_name();
        if close_name.as_deref() != Some(open_name) {
            let closes_ancestor = close_name
                .as_ref()
                .is_some_and(|name| self.open.iter().any(|open| open.as_ref() == Some(name)));
            if closes_ancestor {
                let span = self.current_span();
                self.error(
                    ErrorCode::UnclosedTag,
                    format!("closing tag expected for <{open_name}>"),
                    span,
                    open_span,
                );
                return;
            }
        }

        let close_open = self.bump();
        if self.at(SyntaxKind::Identifier) {
            let close = self.parse_qualified_name(SyntaxKind::TagName);
            if close.name != open_name {
                self.error(
                    ErrorCode::MismatchedClosingTag,
                    format!("expected </{open_name}>, found </{}>", close.name),
                    close.span,
                    open_span,
                );
            }
        } else {
            let span = self.current_span();
            self.error(ErrorCode::TagNameExpected, "tag name expected", span, close_open.span);
        }
        if self.at(SyntaxKind::GreaterThan) {
            self.bump();
        } else {
            let span = self.current_span();
            self.error(ErrorCode::GreaterThanExpected, "'>' expected", span, close_open.span);
        }
    }

    /// Reads the name of the `</name` at the current position without consuming it.
    fn peek_close_name(&self) -> Option<SmolStr> {
        let first = self.nth(1);
        if first.kind != SyntaxKind::Identifier {
            return None;
        }
        if self.nth(2).kind == SyntaxKind::Colon && self.nth(3).kind == SyntaxKind::Identifier {
            return Some(SmolStr::new(format!("{}:{}", first.text, self.nth(3).text)));
        }
        Some(first.text.clone())
    }

    /// True when the token before end of input failed to scan, e.g. an
    /// unterminated comment that swallowed the closing tag.
    fn ends_in_scan_error(&self) -> bool {
        self.flagged.iter().rev().skip(1).take(1).any(|flagged| *flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codes(source: &str) -> Vec<&'static str> {
        parse(source).errors().iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_parse_empty() {
        let parse = parse("");
        assert!(parse.errors().is_empty());
        assert_eq!(parse.syntax().kind(), SyntaxKind::Document);
    }

    #[test]
    fn test_tree_shape() {
        let parse = parse("<A x=\"1\"><B/></A>");
        assert!(parse.errors().is_empty());
        let element = parse.syntax().first_child().unwrap();
        let kinds: Vec<SyntaxKind> = element.children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::TagName,
                SyntaxKind::AttributeList,
                SyntaxKind::ContentList,
                SyntaxKind::TagName,
            ]
        );
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(codes("<A></B>"), vec!["U003"]);
        assert_eq!(codes("<A>"), vec!["U002"]);
        assert_eq!(codes("<A><B></A>"), vec!["U002"]);
        assert_eq!(codes("<A x='1' x='2'/>"), vec!["U004"]);
        assert_eq!(codes("<A Foo='1'/>"), vec!["U005"]);
        assert_eq!(codes("<A><></A>"), vec!["U006"]);
        assert_eq!(codes("<A x='open"), vec!["U102"]);
        assert_eq!(codes("<A x=/>"), vec!["U007"]);
        assert_eq!(codes("<A x='1' <B/>"), vec!["U008", "U009"]);
        assert_eq!(codes("<A/><B/>"), vec!["U009"]);
        assert_eq!(codes("text<A/>"), vec!["U001"]);
        assert_eq!(codes("<A/></A>"), vec!["U001"]);
    }

    #[test]
    fn test_namespaces_must_match() {
        assert_eq!(codes("<x:A></x:A>"), Vec::<&str>::new());
        assert_eq!(codes("<x:A></y:A>"), vec!["U003"]);
    }

    #[test]
    fn test_error_spans() {
        let source = "<Stack>\n</Stck>";
        let errors = parse(source).errors().to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.text(source), "Stck");
        assert_eq!(errors[0].context.text(source), "<Stack");
    }

    #[test]
    fn test_recovery_keeps_every_token() {
        for source in ["<A><B x='1' x='2'></A>", "<A #><!-- x", "<A></B> tail <C/>", "<A x='open"] {
            assert_eq!(parse(source).syntax().text().to_string(), source);
        }
    }
}
