//! Markup diagnostics.

use source_map::Span;
use thiserror::Error;

/// Stable codes of the markup scanner (`U1xx`) and parser (`U0xx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `U001`
    UnexpectedToken,
    /// `U002`
    UnclosedTag,
    /// `U003`
    MismatchedClosingTag,
    /// `U004`
    DuplicateAttribute,
    /// `U005`
    UppercaseAttribute,
    /// `U006`
    TagNameExpected,
    /// `U007`
    AttributeValueExpected,
    /// `U008`
    GreaterThanExpected,
    /// `U009`
    MultipleRoots,
    /// `U101`
    InvalidCharacter,
    /// `U102`
    UnterminatedString,
    /// `U103`
    UnterminatedComment,
    /// `U104`
    UnterminatedCData,
    /// `U105`
    UnterminatedScript,
}

impl ErrorCode {
    /// Returns the stable textual code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "U001",
            ErrorCode::UnclosedTag => "U002",
            ErrorCode::MismatchedClosingTag => "U003",
            ErrorCode::DuplicateAttribute => "U004",
            ErrorCode::UppercaseAttribute => "U005",
            ErrorCode::TagNameExpected => "U006",
            ErrorCode::AttributeValueExpected => "U007",
            ErrorCode::GreaterThanExpected => "U008",
            ErrorCode::MultipleRoots => "U009",
            ErrorCode::InvalidCharacter => "U101",
            ErrorCode::UnterminatedString => "U102",
            ErrorCode::UnterminatedComment => "U103",
            ErrorCode::UnterminatedCData => "U104",
            ErrorCode::UnterminatedScript => "U105",
        }
    }

    /// Returns true for codes reported by the scanner.
    pub fn is_scan_error(&self) -> bool {
        self.as_str().starts_with("U1")
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A markup diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct MarkupError {
    /// The stable error code.
    pub code: ErrorCode,
    /// The human-readable message.
    pub message: String,
    /// The exact offending range.
    pub span: Span,
    /// A wider range giving context, e.g. the open tag an unclosed element
    /// started with. Equals `span` for scanner errors.
    pub context: Span,
}

impl MarkupError {
    /// Creates a new diagnostic.
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span, context: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MarkupError::new(
            ErrorCode::UnterminatedComment,
            "unterminated comment",
            Span::from_offsets(7, 23),
            Span::from_offsets(7, 23),
        );
        insta::assert_snapshot!(error.to_string(), @"U103: unterminated comment");
        assert!(error.code.is_scan_error());
        assert!(!ErrorCode::MultipleRoots.is_scan_error());
    }
}
