//! Script lexer using logos.
//!
//! The lexer handles tokenization of the scripting language:
//! - punctuators and operators (longest match)
//! - keywords; contextual words (`async`, `await`, `of`, `from`, `as`) stay identifiers
//! - numeric and string literals (values are built later, at AST-build time)
//! - template literals, which switch the lexer into a text mode between
//!   `` ` `` and `${`, and back again on the `}` closing an interpolation
//!
//! Whitespace and comments are skipped. The parser drives the lexer through
//! [`Lexer::peek`], [`Lexer::get`] and the bounded [`Lexer::ahead`] lookahead.

use logos::Logos;
use smol_str::SmolStr;
use source_map::{LineCol, LineIndex, Span};
use std::collections::VecDeque;

/// The maximum lookahead distance the parser may request.
pub const MAX_LOOKAHEAD: usize = 8;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: SmolStr,
    /// The span of the token in the source.
    pub span: Span,
    /// Line/column of the first character.
    pub start: LineCol,
    /// Line/column just past the last character.
    pub end: LineCol,
}

impl Token {
    /// Returns true if this token is the given kind.
    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Returns true if this token is an identifier with the given text.
    ///
    /// Used for contextual keywords such as `async`, `of` and `from`.
    #[inline]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }
}

/// Token kinds of the scripting language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip(r"([ \t\r\n\x0b\x0c\x{feff}\x{a0}]+|//[^\n]*|/\*([^*]|\*+[^*/])*\*+/)", allow_greedy = true))]
pub enum TokenKind {
    // === Brackets and separators ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Spread,
    #[token("?.")]
    OptionalChain,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("=>")]
    Arrow,
    #[token("`")]
    Backtick,

    // === Operators ===
    #[token("=")]
    Assign,
    #[token("==")]
    Equal,
    #[token("===")]
    StrictEqual,
    #[token("!=")]
    NotEqual,
    #[token("!==")]
    StrictNotEqual,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanOrEqual,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanOrEqual,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    SignedShiftRight,
    #[token(">>>")]
    ShiftRight,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,
    #[token("%")]
    Remainder,
    #[token("**")]
    Exponent,
    #[token("++")]
    IncOp,
    #[token("--")]
    DecOp,
    #[token("&")]
    BitwiseAnd,
    #[token("|")]
    BitwiseOr,
    #[token("^")]
    BitwiseXor,
    #[token("!")]
    LogicalNot,
    #[token("~")]
    BitwiseNot,
    #[token("&&")]
    LogicalAnd,
    #[token("||")]
    LogicalOr,
    #[token("??")]
    NullCoalesce,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubtractAssign,
    #[token("*=")]
    MultiplyAssign,
    #[token("/=")]
    DivideAssign,
    #[token("%=")]
    RemainderAssign,
    #[token("**=")]
    ExponentAssign,
    #[token("<<=")]
    ShiftLeftAssign,
    #[token(">>=")]
    SignedShiftRightAssign,
    #[token(">>>=")]
    ShiftRightAssign,
    #[token("&=")]
    BitwiseAndAssign,
    #[token("|=")]
    BitwiseOrAssign,
    #[token("^=")]
    BitwiseXorAssign,
    #[token("&&=")]
    LogicalAndAssign,
    #[token("||=")]
    LogicalOrAssign,
    #[token("??=")]
    NullCoalesceAssign,

    // === Keywords ===
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("function")]
    Function,
    #[token("new")]
    New,
    #[token("typeof")]
    Typeof,
    #[token("delete")]
    Delete,
    #[token("import")]
    Import,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    // === Literals ===
    /// An identifier (including contextual words like `async`).
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    /// A numeric literal: decimal, real, hexadecimal or binary.
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    Number,

    /// A complete single- or double-quoted string literal.
    #[regex(r#""([^"\\\n]|\\(.|\n))*""#)]
    #[regex(r#"'([^'\\\n]|\\(.|\n))*'"#)]
    StringLiteral,

    /// A quoted string missing its closing quote.
    #[regex(r#""([^"\\\n]|\\(.|\n))*"#)]
    #[regex(r#"'([^'\\\n]|\\(.|\n))*"#)]
    UnterminatedString,

    // === Template mode (produced by the wrapper, not by logos) ===
    /// Raw text between template delimiters.
    TemplateChunk,
    /// `${` inside a template literal.
    DollarLBrace,

    /// End of input.
    Eof,

    /// Invalid/unknown character.
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Assign => "'='",
            TokenKind::Arrow => "'=>'",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::UnterminatedString => "unterminated string",
            TokenKind::TemplateChunk => "template text",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid character",
            _ => "token",
        }
    }

    /// Returns true for keyword tokens, which are valid property names
    /// after `.` and as object literal keys.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::In
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Throw
                | TokenKind::Function
                | TokenKind::New
                | TokenKind::Typeof
                | TokenKind::Delete
                | TokenKind::Import
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Undefined
        )
    }

    /// Returns true if this token kind is an assignment operator.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AddAssign
                | TokenKind::SubtractAssign
                | TokenKind::MultiplyAssign
                | TokenKind::DivideAssign
                | TokenKind::RemainderAssign
                | TokenKind::ExponentAssign
                | TokenKind::ShiftLeftAssign
                | TokenKind::SignedShiftRightAssign
                | TokenKind::ShiftRightAssign
                | TokenKind::BitwiseAndAssign
                | TokenKind::BitwiseOrAssign
                | TokenKind::BitwiseXorAssign
                | TokenKind::LogicalAndAssign
                | TokenKind::LogicalOrAssign
                | TokenKind::NullCoalesceAssign
        )
    }
}

/// Template-literal bookkeeping.
#[derive(Debug, Default)]
struct TemplateState {
    /// True while scanning raw template text.
    in_text: bool,
    /// Brace depth inside each open `${` interpolation.
    frames: Vec<u32>,
}

/// A lexer for script source code.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    line_index: LineIndex,
    lookahead: VecDeque<Token>,
    template: TemplateState,
    consumed_end: usize,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self::with_offset(source, 0)
    }

    /// Creates a lexer that starts scanning at byte `offset` of `source`.
    ///
    /// Spans stay relative to the whole `source`, so a single expression
    /// embedded in a longer template string is positioned correctly.
    pub fn with_offset(source: &'src str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut inner = TokenKind::lexer(source);
        inner.bump(offset);
        Self {
            inner,
            source,
            line_index: LineIndex::new(source),
            lookahead: VecDeque::new(),
            template: TemplateState::default(),
            consumed_end: offset,
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the line index of the source.
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        self.ahead(0)
    }

    /// Returns the token `n` positions ahead without consuming anything.
    ///
    /// `ahead(0)` is the same as [`Lexer::peek`]. At most [`MAX_LOOKAHEAD`]
    /// tokens are buffered; larger `n` are clamped to the last slot.
    pub fn ahead(&mut self, n: usize) -> &Token {
        let n = n.min(MAX_LOOKAHEAD - 1);
        while self.lookahead.len() <= n {
            let token = self.fetch();
            self.lookahead.push_back(token);
        }
        &self.lookahead[n]
    }

    /// Consumes and returns the next token.
    pub fn get(&mut self) -> Token {
        let token = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.fetch(),
        };
        if token.kind != TokenKind::Eof {
            self.consumed_end = token.span.end_usize();
        }
        token
    }

    /// Returns the unconsumed remainder of the source.
    ///
    /// Tokens sitting in the lookahead buffer count as unconsumed.
    pub fn tail(&self) -> &'src str {
        &self.source[self.consumed_end..]
    }

    /// Returns the byte offset where [`Lexer::tail`] starts.
    pub fn offset(&self) -> usize {
        self.consumed_end
    }

    fn fetch(&mut self) -> Token {
        if self.template.in_text {
            return self.scan_template_text();
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                self.track_template(kind);
                let range = self.inner.span();
                self.make(kind, range.start, range.end)
            }
            Some(Err(())) => {
                let range = self.inner.span();
                self.make(TokenKind::Error, range.start, range.end)
            }
            None => {
                let end = self.source.len();
                self.make(TokenKind::Eof, end, end)
            }
        }
    }

    fn track_template(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::Backtick => self.template.in_text = true,
            TokenKind::LBrace => {
                if let Some(depth) = self.template.frames.last_mut() {
                    *depth += 1;
                }
            }
            TokenKind::RBrace => {
                if let Some(depth) = self.template.frames.last_mut() {
                    if *depth == 0 {
                        self.template.frames.pop();
                        self.template.in_text = true;
                    } else {
                        *depth -= 1;
                    }
                }
            }
            _ => {}
        }
    }

    /// Scans raw template text up to the next `` ` `` or `${`.
    fn scan_template_text(&mut self) -> Token {
        let start = self.inner.span().end;
        let rest = self.inner.remainder();

        if rest.is_empty() {
            self.template.in_text = false;
            return self.make(TokenKind::Eof, start, start);
        }
        if rest.starts_with('`') {
            self.inner.bump(1);
            self.template.in_text = false;
            return self.make(TokenKind::Backtick, start, start + 1);
        }
        if rest.starts_with("${") {
            self.inner.bump(2);
            self.template.in_text = false;
            self.template.frames.push(0);
            return self.make(TokenKind::DollarLBrace, start, start + 2);
        }

        let mut len = 0;
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    // The escaped character never terminates the chunk.
                    len = match chars.next() {
                        Some((j, escaped)) => j + escaped.len_utf8(),
                        None => i + 1,
                    };
                    continue;
                }
                '`' => break,
                '$' if matches!(chars.peek(), Some((_, '{'))) => break,
                _ => len = i + c.len_utf8(),
            }
        }
        self.inner.bump(len);
        self.make(TokenKind::TemplateChunk, start, start + len)
    }

    fn make(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            text: SmolStr::new(&self.source[start..end]),
            span: Span::from_offsets(start, end),
            start: self.line_index.line_col_at(start),
            end: self.line_index.line_col_at(end),
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.get();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            tokenize("a >>>= b ?? c?.d ** 2"),
            vec![
                TokenKind::Identifier,
                TokenKind::ShiftRightAssign,
                TokenKind::Identifier,
                TokenKind::NullCoalesce,
                TokenKind::Identifier,
                TokenKind::OptionalChain,
                TokenKind::Identifier,
                TokenKind::Exponent,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn test_keywords_and_contextual_words() {
        assert_eq!(
            tokenize("const async = await of"),
            vec![
                TokenKind::Const,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokenize("a // line\n /* block\n */ b"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_numbers() {
        let texts: Vec<_> = Lexer::new("12 3.5e-2 .5 0xFF 0b1010 1_000")
            .map(|t| (t.kind, t.text.to_string()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (TokenKind::Number, "12".to_string()),
                (TokenKind::Number, "3.5e-2".to_string()),
                (TokenKind::Number, ".5".to_string()),
                (TokenKind::Number, "0xFF".to_string()),
                (TokenKind::Number, "0b1010".to_string()),
                (TokenKind::Number, "1_000".to_string()),
            ]
        );
    }

    #[test]
    fn test_strings_and_unterminated() {
        assert_eq!(
            tokenize(r#"'a\'b' "c""#),
            vec![TokenKind::StringLiteral, TokenKind::StringLiteral]
        );
        assert_eq!(tokenize(r#""abc"#), vec![TokenKind::UnterminatedString]);
    }

    #[test]
    fn test_template_mode_switch() {
        let tokens: Vec<_> = Lexer::new("`a${ {x: 1}.x }b` + 1")
            .map(|t| (t.kind, t.text.to_string()))
            .collect();
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Backtick, "`".to_string()),
                (TokenKind::TemplateChunk, "a".to_string()),
                (TokenKind::DollarLBrace, "${".to_string()),
                (TokenKind::LBrace, "{".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Colon, ":".to_string()),
                (TokenKind::Number, "1".to_string()),
                (TokenKind::RBrace, "}".to_string()),
                (TokenKind::Dot, ".".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::RBrace, "}".to_string()),
                (TokenKind::TemplateChunk, "b".to_string()),
                (TokenKind::Backtick, "`".to_string()),
                (TokenKind::Plus, "+".to_string()),
                (TokenKind::Number, "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_template_escaped_delimiters() {
        let tokens: Vec<_> = Lexer::new(r"`a\`b\${c}`")
            .map(|t| (t.kind, t.text.to_string()))
            .collect();
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Backtick, "`".to_string()),
                (TokenKind::TemplateChunk, r"a\`b\${c}".to_string()),
                (TokenKind::Backtick, "`".to_string()),
            ]
        );
    }

    #[test]
    fn test_peek_ahead_and_tail() {
        let mut lexer = Lexer::new("a + b} rest");
        assert_eq!(lexer.ahead(2).text, "b");
        assert_eq!(lexer.peek().text, "a");
        assert_eq!(lexer.get().text, "a");
        assert_eq!(lexer.tail(), " + b} rest");
        lexer.get();
        lexer.get();
        assert_eq!(lexer.get().kind, TokenKind::RBrace);
        assert_eq!(lexer.tail(), " rest");
    }

    #[test]
    fn test_ahead_is_bounded() {
        let mut lexer = Lexer::new("a b c d e f g h i j k l");
        assert_eq!(lexer.ahead(MAX_LOOKAHEAD - 1).text, "h");
        assert_eq!(lexer.ahead(100).text, "h");
        assert_eq!(lexer.peek().text, "a");
    }

    #[test]
    fn test_with_offset_keeps_absolute_spans() {
        let mut lexer = Lexer::with_offset("Hello {name}!", 7);
        let token = lexer.get();
        assert_eq!(token.text, "name");
        assert_eq!(token.span, Span::from_offsets(7, 11));
        assert_eq!(token.start, LineCol::new(0, 7));
    }

    #[test]
    fn test_line_columns() {
        let mut lexer = Lexer::new("a\n  b");
        lexer.get();
        let b = lexer.get();
        assert_eq!(b.start, LineCol::new(1, 2));
        assert_eq!(b.end, LineCol::new(1, 3));
    }

    #[test]
    fn test_error_token() {
        assert_eq!(
            tokenize("a # b"),
            vec![TokenKind::Identifier, TokenKind::Error, TokenKind::Identifier]
        );
    }
}
