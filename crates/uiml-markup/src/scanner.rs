//! Markup scanner.
//!
//! The scanner is context sensitive: inside a tag (`<` up to `>` or `/>`) it
//! produces names, `=`, `:` and strings; between tags it produces text,
//! entities, comments and CDATA sections. The body of a `<script>` element is
//! a single [`SyntaxKind::Script`] token.
//!
//! Trivia is never discarded in [`ScanMode::Full`], so the concatenated token
//! texts always reproduce the source. Malformed input is reported through the
//! error callback and still yields a token covering the bad text.

use crate::error::{ErrorCode, MarkupError};
use crate::syntax_kind::SyntaxKind;
use smol_str::SmolStr;
use source_map::Span;

/// The named entities recognized in text and attribute values.
pub const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&apos;", '\''),
    ("&quot;", '"'),
];

/// A markup token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: SyntaxKind,
    /// The exact source text.
    pub text: SmolStr,
    /// The span of the token in the source.
    pub span: Span,
}

/// Whether trivia tokens are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Every token, trivia included.
    #[default]
    Full,
    /// Comments, whitespace and newlines are skipped.
    SkipTrivia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Content,
    Tag,
    ScriptBody,
}

/// A scanner over markup source.
pub struct Scanner<'src> {
    source: &'src str,
    pos: usize,
    mode: ScanMode,
    context: Context,
    /// The last non-trivia token kind seen inside the current tag.
    previous: SyntaxKind,
    /// Set between `<script` and the `>` ending its start tag.
    script_start_tag: bool,
    on_error: Option<Box<dyn FnMut(MarkupError) + 'src>>,
    finished: bool,
}

impl<'src> Scanner<'src> {
    /// Creates a scanner in the given mode.
    pub fn new(source: &'src str, mode: ScanMode) -> Self {
        Self {
            source,
            pos: 0,
            mode,
            context: Context::Content,
            previous: SyntaxKind::Eof,
            script_start_tag: false,
            on_error: None,
            finished: false,
        }
    }

    /// Sets the callback receiving scan errors.
    pub fn on_error(mut self, callback: impl FnMut(MarkupError) + 'src) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Returns the source being scanned.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Scans the next token. Returns `Eof` at the end, repeatedly.
    pub fn scan(&mut self) -> Token {
        loop {
            let token = self.scan_any();
            if self.mode == ScanMode::SkipTrivia && token.kind.is_trivia() {
                continue;
            }
            return token;
        }
    }

    fn scan_any(&mut self) -> Token {
        let start = self.pos;
        if start >= self.source.len() {
            return self.token(SyntaxKind::Eof, start);
        }
        let kind = match self.context {
            Context::ScriptBody => match self.scan_script_body() {
                Some(kind) => kind,
                None => self.scan_content(),
            },
            Context::Content => self.scan_content(),
            Context::Tag => self.scan_tag(),
        };
        self.token(kind, start)
    }

    fn token(&self, kind: SyntaxKind, start: usize) -> Token {
        Token {
            kind,
            text: SmolStr::new(&self.source[start..self.pos]),
            span: Span::from_offsets(start, self.pos),
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn report(&mut self, code: ErrorCode, message: &str, start: usize) {
        let span = Span::from_offsets(start, self.pos);
        if let Some(callback) = self.on_error.as_mut() {
            callback(MarkupError::new(code, message, span, span));
        }
    }

    /// Scans everything up to `</script`. Returns `None` for an empty body.
    fn scan_script_body(&mut self) -> Option<SyntaxKind> {
        self.context = Context::Content;
        let start = self.pos;
        match self.rest().find("</script") {
            Some(0) => None,
            Some(len) => {
                self.pos += len;
                Some(SyntaxKind::Script)
            }
            None => {
                self.pos = self.source.len();
                self.report(ErrorCode::UnterminatedScript, "unterminated script", start);
                Some(SyntaxKind::Script)
            }
        }
    }

    fn scan_content(&mut self) -> SyntaxKind {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("<!--") {
            return self.scan_delimited(4, "-->", SyntaxKind::Comment, ErrorCode::UnterminatedComment, "unterminated comment");
        }
        if rest.starts_with("<![CDATA[") {
            return self.scan_delimited(9, "]]>", SyntaxKind::CData, ErrorCode::UnterminatedCData, "unterminated CDATA section");
        }
        if rest.starts_with("</") {
            self.pos += 2;
            self.enter_tag(SyntaxKind::CloseTagOpen);
            return SyntaxKind::CloseTagOpen;
        }
        if rest.starts_with('<') {
            self.pos += 1;
            self.enter_tag(SyntaxKind::LessThan);
            return SyntaxKind::LessThan;
        }
        if let Some(len) = entity_len(rest) {
            self.pos += len;
            return SyntaxKind::Entity;
        }

        let run = text_run_len(rest);
        if rest[..run].chars().all(char::is_whitespace) {
            return self.scan_whitespace();
        }
        self.pos = start + run;
        SyntaxKind::Text
    }

    fn scan_delimited(
        &mut self,
        open_len: usize,
        close: &str,
        kind: SyntaxKind,
        code: ErrorCode,
        message: &str,
    ) -> SyntaxKind {
        let start = self.pos;
        match self.source[start + open_len..].find(close) {
            Some(len) => self.pos = start + open_len + len + close.len(),
            None => {
                self.pos = self.source.len();
                self.report(code, message, start);
            }
        }
        kind
    }

    fn enter_tag(&mut self, opener: SyntaxKind) {
        self.context = Context::Tag;
        self.previous = opener;
        self.script_start_tag = false;
    }

    fn scan_whitespace(&mut self) -> SyntaxKind {
        let rest = self.rest();
        if rest.starts_with("\r\n") {
            self.pos += 2;
            return SyntaxKind::Newline;
        }
        if rest.starts_with('\n') || rest.starts_with('\r') {
            self.pos += 1;
            return SyntaxKind::Newline;
        }
        let len = rest
            .find(|c: char| !c.is_whitespace() || c == '\n' || c == '\r')
            .unwrap_or(rest.len());
        self.pos += len.max(1);
        SyntaxKind::Whitespace
    }

    fn scan_tag(&mut self) -> SyntaxKind {
        let start = self.pos;
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return SyntaxKind::Eof;
        };

        let kind = match c {
            c if c.is_whitespace() => return self.scan_whitespace(),
            '/' if rest.starts_with("/>") => {
                self.pos += 2;
                self.context = Context::Content;
                self.script_start_tag = false;
                SyntaxKind::SelfClose
            }
            '>' => {
                self.pos += 1;
                self.context = if self.script_start_tag {
                    Context::ScriptBody
                } else {
                    Context::Content
                };
                self.script_start_tag = false;
                SyntaxKind::GreaterThan
            }
            '<' if rest.starts_with("</") => {
                self.pos += 2;
                self.enter_tag(SyntaxKind::CloseTagOpen);
                SyntaxKind::CloseTagOpen
            }
            '<' => {
                self.pos += 1;
                self.enter_tag(SyntaxKind::LessThan);
                SyntaxKind::LessThan
            }
            '=' => {
                self.pos += 1;
                SyntaxKind::Equal
            }
            ':' => {
                self.pos += 1;
                SyntaxKind::Colon
            }
            '"' | '\'' | '`' => self.scan_string(c),
            c if is_name_start(c) => {
                let len = rest
                    .find(|c: char| !is_name_char(c))
                    .unwrap_or(rest.len());
                self.pos += len;
                if self.previous == SyntaxKind::LessThan && &rest[..len] == "script" {
                    self.script_start_tag = true;
                }
                SyntaxKind::Identifier
            }
            c => {
                self.pos += c.len_utf8();
                self.report(ErrorCode::InvalidCharacter, &format!("invalid character '{c}'"), start);
                SyntaxKind::Unknown
            }
        };
        self.previous = kind;
        kind
    }

    fn scan_string(&mut self, quote: char) -> SyntaxKind {
        let start = self.pos;
        match self.source[start + 1..].find(quote) {
            Some(len) => self.pos = start + 1 + len + 1,
            None => {
                self.pos = self.source.len();
                self.report(ErrorCode::UnterminatedString, "unterminated string", start);
            }
        }
        SyntaxKind::StringLiteral
    }
}

impl<'src> Iterator for Scanner<'src> {
    type Item = Token;

    /// Yields every token including a final `Eof`, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.scan();
        if token.kind == SyntaxKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '.')
}

/// Returns the length of the entity `text` starts with, if any.
pub(crate) fn entity_len(text: &str) -> Option<usize> {
    ENTITIES
        .iter()
        .find(|(entity, _)| text.starts_with(entity))
        .map(|(entity, _)| entity.len())
}

/// Length of the text run at the start of `text`: up to `<` or an entity.
fn text_run_len(text: &str) -> usize {
    let mut offset = 0;
    while offset < text.len() {
        let rest = &text[offset..];
        if rest.starts_with('<') || (offset > 0 && entity_len(rest).is_some()) {
            break;
        }
        match rest.find(['<', '&']) {
            Some(0) => offset += 1,
            Some(next) => offset += next,
            None => offset = text.len(),
        }
    }
    offset
}

/// Replaces the five named entities in `text` with their characters.
pub fn unescape_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find('&') {
        result.push_str(&rest[..index]);
        rest = &rest[index..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                result.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str, mode: ScanMode) -> Vec<SyntaxKind> {
        Scanner::new(source, mode)
            .map(|t| t.kind)
            .filter(|k| *k != SyntaxKind::Eof)
            .collect()
    }

    fn errors(source: &str) -> Vec<ErrorCode> {
        let mut found = Vec::new();
        Scanner::new(source, ScanMode::Full)
            .on_error(|error| found.push(error.code))
            .for_each(drop);
        found
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            kinds("<Stack attr='val' />", ScanMode::SkipTrivia),
            vec![
                SyntaxKind::LessThan,
                SyntaxKind::Identifier,
                SyntaxKind::Identifier,
                SyntaxKind::Equal,
                SyntaxKind::StringLiteral,
                SyntaxKind::SelfClose,
            ]
        );
    }

    #[test]
    fn test_full_mode_keeps_trivia() {
        assert_eq!(
            kinds("<A>\n  <!-- c --></A>", ScanMode::Full),
            vec![
                SyntaxKind::LessThan,
                SyntaxKind::Identifier,
                SyntaxKind::GreaterThan,
                SyntaxKind::Newline,
                SyntaxKind::Whitespace,
                SyntaxKind::Comment,
                SyntaxKind::CloseTagOpen,
                SyntaxKind::Identifier,
                SyntaxKind::GreaterThan,
            ]
        );
    }

    #[test]
    fn test_text_and_entities() {
        let tokens: Vec<Token> = Scanner::new("<A>a &amp; b &c</A>", ScanMode::Full).collect();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["<", "A", ">", "a ", "&amp;", " b &c", "</", "A", ">", ""]);
        assert_eq!(tokens[4].kind, SyntaxKind::Entity);
    }

    #[test]
    fn test_namespaced_names() {
        assert_eq!(
            kinds("<my:Button x.y-z=\"1\">", ScanMode::SkipTrivia),
            vec![
                SyntaxKind::LessThan,
                SyntaxKind::Identifier,
                SyntaxKind::Colon,
                SyntaxKind::Identifier,
                SyntaxKind::Identifier,
                SyntaxKind::Equal,
                SyntaxKind::StringLiteral,
                SyntaxKind::GreaterThan,
            ]
        );
    }

    #[test]
    fn test_script_body_is_one_token() {
        let tokens: Vec<Token> = Scanner::new("<script>if (a < b) x = '</';</script>", ScanMode::Full).collect();
        assert_eq!(tokens[3].kind, SyntaxKind::Script);
        assert_eq!(tokens[3].text, "if (a < b) x = '</';");
        assert_eq!(tokens[4].kind, SyntaxKind::CloseTagOpen);
    }

    #[test]
    fn test_cdata() {
        assert_eq!(
            kinds("<A><![CDATA[<b>]]></A>", ScanMode::Full)[3],
            SyntaxKind::CData
        );
    }

    #[test]
    fn test_round_trip() {
        let source = "<App xmlns:x=\"component-ns\">\r\n\t<x:Item/> text &lt; <![CDATA[raw]]><!--c--></App> tail";
        for token in Scanner::new(source, ScanMode::Full) {
            assert_eq!(token.span.text(source), token.text.as_str());
        }
        let joined: String = Scanner::new(source, ScanMode::Full).map(|t| t.text.to_string()).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_errors_keep_scanning() {
        assert_eq!(errors("<A #>"), vec![ErrorCode::InvalidCharacter]);
        assert_eq!(errors("<A b='x>"), vec![ErrorCode::UnterminatedString]);
        assert_eq!(errors("<A><!--open"), vec![ErrorCode::UnterminatedComment]);
        assert_eq!(errors("<A><![CDATA[open"), vec![ErrorCode::UnterminatedCData]);
        assert_eq!(errors("<script>x = 1;"), vec![ErrorCode::UnterminatedScript]);
        assert_eq!(
            kinds("<A #>", ScanMode::Full),
            vec![
                SyntaxKind::LessThan,
                SyntaxKind::Identifier,
                SyntaxKind::Whitespace,
                SyntaxKind::Unknown,
                SyntaxKind::GreaterThan,
            ]
        );
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("a &lt;b&gt; &amp;&amp; &quot;c&apos; &x;"), "a <b> && \"c' &x;");
    }
}
