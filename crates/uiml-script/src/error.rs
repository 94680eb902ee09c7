//! Script parse error types.

use source_map::{LineCol, Span};
use thiserror::Error;

/// Stable error codes of the script parser.
///
/// The textual form (`W001` ...) is part of the external contract consumed by
/// editor tooling; codes are never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `W001`
    UnexpectedToken,
    /// `W002`
    ExpressionExpected,
    /// `W003`
    IdentifierExpected,
    /// `W004`
    RBraceExpected,
    /// `W005`
    RBracketExpected,
    /// `W006`
    RParenExpected,
    /// `W007`
    LParenExpected,
    /// `W008`
    ColonExpected,
    /// `W009`
    EqualExpected,
    /// `W010`
    SemicolonExpected,
    /// `W011`
    InvalidArrowParams,
    /// `W012`
    InvalidDestructuring,
    /// `W013`
    RestNotLast,
    /// `W014`
    ConstWithoutInit,
    /// `W015`
    CatchOrFinallyExpected,
    /// `W016`
    CaseOrDefaultExpected,
    /// `W017`
    DuplicateDefault,
    /// `W018`
    InvalidAssignmentTarget,
    /// `W019`
    ImportNotAtStart,
    /// `W020`
    FromExpected,
    /// `W021`
    StringLiteralExpected,
    /// `W022`
    UnterminatedTemplate,
    /// `W023`
    InvalidNumber,
    /// `W024`
    WhileExpected,
    /// `W025`
    InOrOfExpected,
    /// `W026`
    UnterminatedString,
    /// `W027`
    FunctionNameExpected,
    /// `W028`
    UnexpectedEof,
    /// `W029`
    InvalidLoopVariable,
}

impl ErrorCode {
    /// Returns the stable textual code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "W001",
            ErrorCode::ExpressionExpected => "W002",
            ErrorCode::IdentifierExpected => "W003",
            ErrorCode::RBraceExpected => "W004",
            ErrorCode::RBracketExpected => "W005",
            ErrorCode::RParenExpected => "W006",
            ErrorCode::LParenExpected => "W007",
            ErrorCode::ColonExpected => "W008",
            ErrorCode::EqualExpected => "W009",
            ErrorCode::SemicolonExpected => "W010",
            ErrorCode::InvalidArrowParams => "W011",
            ErrorCode::InvalidDestructuring => "W012",
            ErrorCode::RestNotLast => "W013",
            ErrorCode::ConstWithoutInit => "W014",
            ErrorCode::CatchOrFinallyExpected => "W015",
            ErrorCode::CaseOrDefaultExpected => "W016",
            ErrorCode::DuplicateDefault => "W017",
            ErrorCode::InvalidAssignmentTarget => "W018",
            ErrorCode::ImportNotAtStart => "W019",
            ErrorCode::FromExpected => "W020",
            ErrorCode::StringLiteralExpected => "W021",
            ErrorCode::UnterminatedTemplate => "W022",
            ErrorCode::InvalidNumber => "W023",
            ErrorCode::WhileExpected => "W024",
            ErrorCode::InOrOfExpected => "W025",
            ErrorCode::UnterminatedString => "W026",
            ErrorCode::FunctionNameExpected => "W027",
            ErrorCode::UnexpectedEof => "W028",
            ErrorCode::InvalidLoopVariable => "W029",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A script syntax error.
///
/// Parsing stops at the first error. The error is returned to the caller and
/// also recorded in the parser's error list, so tooling can read the position
/// after the call has unwound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ParseError {
    /// The stable error code.
    pub code: ErrorCode,
    /// The human-readable message.
    pub message: String,
    /// The offending range (byte offsets into the parsed text).
    pub span: Span,
    /// The 0-based line/column of `span.start`.
    pub position: LineCol,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span, position: LineCol) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            position,
        }
    }

    /// 1-based line number, as shown to users.
    pub fn line(&self) -> u32 {
        self.position.line + 1
    }

    /// 1-based column number, as shown to users.
    pub fn column(&self) -> u32 {
        self.position.col + 1
    }

    /// Returns this error moved forward by `delta` bytes.
    ///
    /// The line/column is left untouched; callers that re-anchor into a
    /// larger document recompute it from their own line index.
    pub fn shifted(mut self, delta: u32) -> Self {
        self.span = self.span.shift(delta);
        self
    }
}
