//! Recursive descent parser for the scripting language.
//!
//! The parser pulls tokens from [`Lexer`] on demand, so a single expression
//! can be parsed out of a longer text (see [`Parser::with_offset`] and
//! [`Parser::parse_embedded_expression`]). Parsing stops at the first error.

mod expressions;
mod patterns;
mod statements;

use crate::ast::*;
use crate::error::{ErrorCode, ParseError};
use crate::lexer::{Lexer, Token, TokenKind};
use source_map::{LineCol, Span};
use std::sync::Arc;

pub use patterns::expression_to_pattern;

/// Result type used inside the parser.
pub(crate) type PResult<T> = Result<T, ParseError>;

/// The script parser.
pub struct Parser<'src> {
    /// The token source.
    lexer: Lexer<'src>,
    /// Stamps node ids.
    ids: NodeIdGenerator,
    /// Errors recorded so far (at most one per parse call).
    errors: Vec<ParseError>,
    /// End offset of the last consumed token.
    prev_end: usize,
    /// Line/column just past the last consumed token.
    prev_end_pos: LineCol,
}

impl<'src> Parser<'src> {
    /// Creates a parser over the whole of `source`.
    pub fn new(source: &'src str, ids: NodeIdGenerator) -> Self {
        Self::with_offset(source, 0, ids)
    }

    /// Creates a parser that starts at byte `offset` of `source`.
    ///
    /// Node spans and error positions are relative to the whole `source`.
    pub fn with_offset(source: &'src str, offset: usize, ids: NodeIdGenerator) -> Self {
        let lexer = Lexer::with_offset(source, offset);
        let prev_end_pos = lexer.line_index().line_col_at(offset);
        Self {
            lexer,
            ids,
            errors: Vec::new(),
            prev_end: offset,
            prev_end_pos,
        }
    }

    /// Returns the errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns the unconsumed rest of the source.
    pub fn tail(&self) -> &'src str {
        self.lexer.tail()
    }

    /// Returns the offset where [`Parser::tail`] starts.
    pub fn offset(&self) -> usize {
        self.lexer.offset()
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> &Token {
        self.lexer.peek()
    }

    /// Consumes the next token.
    pub fn next_token(&mut self) -> Token {
        self.advance()
    }

    /// Parses the whole input as a single expression.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        log::trace!("parsing expression at offset {}", self.prev_end);
        let expr = self.parse_expr()?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// Parses one expression and stops at the first token that cannot
    /// continue it; the rest stays available through [`Parser::tail`].
    pub fn parse_embedded_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr()
    }

    /// Parses the whole input as a statement list. `import` is rejected.
    pub fn parse_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        log::trace!("parsing statements at offset {}", self.prev_end);
        let mut statements = Vec::new();
        while !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Parses the whole input as a module: a contiguous run of `import`
    /// declarations followed by statements.
    pub fn parse_module(&mut self) -> Result<Vec<Stmt>, ParseError> {
        log::trace!("parsing module at offset {}", self.prev_end);
        let mut statements = Vec::new();
        while self.at(TokenKind::Import) {
            statements.push(self.parse_import()?);
        }
        while !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    // === Token helpers ===

    pub(crate) fn peek(&mut self) -> &Token {
        self.lexer.peek()
    }

    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    pub(crate) fn ahead(&mut self, n: usize) -> &Token {
        self.lexer.ahead(n)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_word(&mut self, word: &str) -> bool {
        self.peek().is_word(word)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.lexer.get();
        if token.kind != TokenKind::Eof {
            self.prev_end = token.span.end_usize();
            self.prev_end_pos = token.end;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of `kind` or fails with `code`.
    pub(crate) fn expect(&mut self, kind: TokenKind, code: ErrorCode, message: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(code, message))
        }
    }

    fn expect_eof(&mut self) -> PResult<()> {
        if self.at(TokenKind::Eof) {
            Ok(())
        } else {
            let found = self.peek().text.clone();
            Err(self.error_here(ErrorCode::UnexpectedToken, format!("unexpected token '{found}'")))
        }
    }

    /// True when the next token starts on a later line than the last one.
    pub(crate) fn newline_before_next(&mut self) -> bool {
        let line = self.prev_end_pos.line;
        self.peek().start.line > line
    }

    /// Start offset of the next token.
    pub(crate) fn start(&mut self) -> usize {
        self.peek().span.start_usize()
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: usize) -> Span {
        Span::from_offsets(start, self.prev_end.max(start))
    }

    // === Node construction ===

    pub(crate) fn expr(&self, start: usize, kind: ExprKind) -> Expr {
        Arc::new(Expression {
            id: self.ids.next_id(),
            span: self.span_from(start),
            kind,
        })
    }

    pub(crate) fn stmt(&self, start: usize, kind: StmtKind) -> Stmt {
        Arc::new(Statement {
            id: self.ids.next_id(),
            span: self.span_from(start),
            kind,
        })
    }

    // === Errors ===

    /// Records an error at the next token and returns it.
    pub(crate) fn error_here(&mut self, code: ErrorCode, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        let (span, position) = (token.span, token.start);
        let code = if token.kind == TokenKind::Eof && code == ErrorCode::ExpressionExpected {
            ErrorCode::UnexpectedEof
        } else {
            code
        };
        self.error_at(code, message, span, position)
    }

    /// Records an error at an explicit location and returns it.
    pub(crate) fn error_at(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        position: LineCol,
    ) -> ParseError {
        let error = ParseError::new(code, message, span, position);
        log::debug!("script parse error {} at {}:{}", error.code, error.line(), error.column());
        self.errors.push(error.clone());
        error
    }

    /// Records an error covering an already-built node.
    pub(crate) fn error_on(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) -> ParseError {
        let position = self.lexer.line_index().line_col_at(span.start_usize());
        self.error_at(code, message, span, position)
    }
}

/// Parses `source` as a single expression.
pub fn parse_expression(source: &str, ids: &NodeIdGenerator) -> Result<Expr, ParseError> {
    Parser::new(source, ids.clone()).parse_expression()
}

/// Parses `source` as a statement list.
pub fn parse_statements(source: &str, ids: &NodeIdGenerator) -> Result<Vec<Stmt>, ParseError> {
    Parser::new(source, ids.clone()).parse_statements()
}

/// Parses `source` as a module (imports allowed at the top).
pub fn parse_module(source: &str, ids: &NodeIdGenerator) -> Result<Vec<Stmt>, ParseError> {
    Parser::new(source, ids.clone()).parse_module()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expr(source: &str) -> Expr {
        parse_expression(source, &NodeIdGenerator::new()).unwrap()
    }

    fn expr_error(source: &str) -> ParseError {
        parse_expression(source, &NodeIdGenerator::new()).unwrap_err()
    }

    fn stmts(source: &str) -> Vec<Stmt> {
        parse_statements(source, &NodeIdGenerator::new()).unwrap()
    }

    fn stmt_error(source: &str) -> ParseError {
        parse_statements(source, &NodeIdGenerator::new()).unwrap_err()
    }

    #[test]
    fn test_precedence_shape() {
        let e = expr("1 + 2 * 3");
        let ExprKind::Binary { op, left, right } = &e.kind else {
            panic!("expected binary, got {:?}", e.kind);
        };
        assert_eq!(*op, BinaryOp::Add);
        assert_eq!(left.as_literal(), Some(&LiteralValue::Number(1.0)));
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let e = expr("2 ** 3 ** 2");
        let ExprKind::Binary { left, right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(left.as_literal(), Some(&LiteralValue::Number(2.0)));
        assert_eq!(right.node_type(), NodeType::BinaryExpression);
    }

    #[test]
    fn test_logical_precedence() {
        let e = expr("a ?? b || c && d");
        let ExprKind::Binary { op, right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::NullCoalesce);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::LogicalOr,
                ..
            }
        ));
    }

    #[test]
    fn test_spans_cover_tokens() {
        let source = "  foo.bar(1)  ";
        let e = expr(source);
        assert_eq!(e.source_text(source), "foo.bar(1)");
    }

    #[test]
    fn test_node_ids_increase() {
        let ids = NodeIdGenerator::new();
        let e = parse_expression("a + b", &ids).unwrap();
        let ExprKind::Binary { left, right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert!(left.id < right.id);
        assert!(right.id < e.id);
        assert_eq!(ids.last_id(), e.id);
    }

    #[test]
    fn test_arrow_forms() {
        for source in ["x => x", "(x) => x", "(a, [b], {c}) => c", "(...rest) => rest", "() => {}"] {
            let e = expr(source);
            assert_eq!(e.node_type(), NodeType::ArrowExpression, "{source}");
        }
        let ExprKind::Arrow(arrow) = &expr("(a, ...b) => a").kind else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.params.len(), 1);
        assert!(arrow.params.rest.is_some());
    }

    #[test]
    fn test_async_arrows_and_async_identifier() {
        let ExprKind::Arrow(arrow) = &expr("async x => x").kind else {
            panic!("expected arrow");
        };
        assert!(arrow.is_async);
        let ExprKind::Arrow(arrow) = &expr("async (a, b) => a").kind else {
            panic!("expected arrow");
        };
        assert!(arrow.is_async);
        assert_eq!(arrow.params.len(), 2);
        assert_eq!(expr("async(1)").node_type(), NodeType::FunctionInvocationExpression);

        let statements = stmts("const async = 42");
        let StmtKind::Const(decls) = &statements[0].kind else {
            panic!("expected const");
        };
        assert_eq!(decls[0].target.bound_names(), vec!["async"]);
    }

    #[test]
    fn test_await_is_contextual() {
        assert_eq!(expr("await x").node_type(), NodeType::AwaitExpression);
        assert_eq!(expr("await - 1").node_type(), NodeType::BinaryExpression);
    }

    #[test]
    fn test_new_with_member_chain() {
        let e = expr("new a.B(1).c");
        let ExprKind::Member { object, member, .. } = &e.kind else {
            panic!("expected member");
        };
        assert_eq!(member, "c");
        let ExprKind::New { callee, arguments } = &object.kind else {
            panic!("expected new");
        };
        assert_eq!(callee.node_type(), NodeType::MemberAccessExpression);
        assert_eq!(arguments.len(), 1);
    }

    #[test]
    fn test_optional_chain() {
        let e = expr("a?.b?.[c]?.(d)");
        let ExprKind::Call { optional, callee, .. } = &e.kind else {
            panic!("expected call");
        };
        assert!(*optional);
        assert!(matches!(callee.kind, ExprKind::ComputedMember { optional: true, .. }));
    }

    #[test]
    fn test_template_literal() {
        let e = expr("`a${b + 1}c`");
        let ExprKind::TemplateLiteral { parts } = &e.kind else {
            panic!("expected template");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].as_literal(), Some(&LiteralValue::String("a".into())));
        assert_eq!(parts[1].node_type(), NodeType::BinaryExpression);
    }

    #[test]
    fn test_object_literal_keys() {
        let e = expr("{ a, 'b c': 1, 2: 3, [d]: 4, if: 5, ...e }");
        let ExprKind::ObjectLiteral { properties } = &e.kind else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 6);
        assert!(matches!(&properties[1], ObjectProperty::KeyValue { key: PropertyKey::Named(k), .. } if k == "b c"));
        assert!(matches!(&properties[2], ObjectProperty::KeyValue { key: PropertyKey::Named(k), .. } if k == "2"));
        assert!(matches!(&properties[4], ObjectProperty::KeyValue { key: PropertyKey::Named(k), .. } if k == "if"));
    }

    #[test]
    fn test_big_literal_promotes() {
        let e = expr("123456789012345678901234567890");
        assert!(matches!(e.as_literal(), Some(LiteralValue::BigInt(_))));
    }

    #[test]
    fn test_missing_paren_error() {
        let error = expr_error("foo(bar");
        assert_eq!(error.code, ErrorCode::RParenExpected);
        insta::assert_snapshot!(error.to_string(), @"W006: ')' expected (missing closing parenthesis)");
    }

    #[test]
    fn test_error_is_recorded() {
        let ids = NodeIdGenerator::new();
        let mut parser = Parser::new("a +", ids);
        let error = parser.parse_expression().unwrap_err();
        assert_eq!(error.code, ErrorCode::UnexpectedEof);
        assert_eq!(parser.errors(), &[error]);
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(expr_error("a + b = 1").code, ErrorCode::InvalidAssignmentTarget);
        assert_eq!(expr_error("1++").code, ErrorCode::InvalidAssignmentTarget);
    }

    #[test]
    fn test_invalid_arrow_params() {
        assert_eq!(expr_error("(a + 1) => a").code, ErrorCode::InvalidArrowParams);
        assert_eq!(expr_error("(...a, b) => a").code, ErrorCode::RestNotLast);
    }

    #[test]
    fn test_embedded_expression_leaves_tail() {
        let source = "Hello {name}!";
        let mut parser = Parser::with_offset(source, 7, NodeIdGenerator::new());
        let e = parser.parse_embedded_expression().unwrap();
        assert_eq!(e.as_identifier(), Some("name"));
        assert_eq!(e.span, Span::from_offsets(7, 11));
        assert_eq!(parser.peek_token().kind, TokenKind::RBrace);
        assert_eq!(parser.tail(), "}!");
    }

    #[test]
    fn test_statement_errors() {
        assert_eq!(stmt_error("const a;").code, ErrorCode::ConstWithoutInit);
        assert_eq!(stmt_error("try {}").code, ErrorCode::CatchOrFinallyExpected);
        assert_eq!(stmt_error("do {} (x)").code, ErrorCode::WhileExpected);
        assert_eq!(stmt_error("switch (a) { default: default: }").code, ErrorCode::DuplicateDefault);
        assert_eq!(stmt_error("switch (a) { x }").code, ErrorCode::CaseOrDefaultExpected);
        assert_eq!(stmt_error("import { a } from 'b'").code, ErrorCode::ImportNotAtStart);
        assert_eq!(stmt_error("function () {}").code, ErrorCode::FunctionNameExpected);
        assert_eq!(stmt_error("a b").code, ErrorCode::SemicolonExpected);
        assert_eq!(stmt_error("x = `abc").code, ErrorCode::UnterminatedTemplate);
        assert_eq!(stmt_error("x = 'abc").code, ErrorCode::UnterminatedString);
    }

    #[test]
    fn test_error_position_is_one_based_for_display() {
        let error = stmt_error("let a = 1;\nlet b = (2;");
        assert_eq!(error.code, ErrorCode::RParenExpected);
        assert_eq!(error.line(), 2);
        assert_eq!(error.column(), 11);
    }

    #[test]
    fn test_module_imports() {
        let ids = NodeIdGenerator::new();
        let module = parse_module("import { a, b as c } from './x';\nimport d from \"y\"\nlet z = a;", &ids).unwrap();
        assert_eq!(module.len(), 3);
        let StmtKind::Import(import) = &module[0].kind else {
            panic!("expected import");
        };
        assert_eq!(import.module, "./x");
        assert_eq!(import.specifiers[1].imported, "b");
        assert_eq!(import.specifiers[1].local, "c");
        let StmtKind::Import(import) = &module[1].kind else {
            panic!("expected import");
        };
        assert_eq!(import.specifiers[0].imported, "default");

        let error = parse_module("let z = 1;\nimport { a } from 'x';", &ids).unwrap_err();
        assert_eq!(error.code, ErrorCode::ImportNotAtStart);
        assert_eq!(error.line(), 2);
    }
}
