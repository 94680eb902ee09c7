//! Diagnostic types shared by every compile phase.

use crate::error::TransformError;
use source_map::Span;
use uiml_markup::MarkupError;
use uiml_script::ParseError;

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
    /// The source location.
    pub span: Span,
    /// A wider range giving context, when the phase provides one.
    pub context: Option<Span>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            span,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Span) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<MarkupError> for Diagnostic {
    fn from(error: MarkupError) -> Self {
        Diagnostic::new(DiagnosticCode::Markup(error.code), error.message, error.span).with_context(error.context)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Diagnostic::new(DiagnosticCode::Script(error.code), error.message, error.span)
    }
}

impl From<TransformError> for Diagnostic {
    fn from(error: TransformError) -> Self {
        Diagnostic::new(DiagnosticCode::Transform(error.code()), error.to_string(), error.span())
    }
}

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Valid input that is probably not what was meant.
    Warning,
    /// Input the compiler rejects.
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Diagnostic codes of all phases. Each phase keeps its own prefix:
/// `W` for scripts, `U` for markup, `T` for the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    Script(uiml_script::ErrorCode),
    Markup(uiml_markup::ErrorCode),
    Transform(crate::error::TransformCode),
}

impl DiagnosticCode {
    /// Returns the default severity for this diagnostic code.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::Markup(uiml_markup::ErrorCode::UppercaseAttribute) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Returns the diagnostic code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Script(code) => code.as_str(),
            DiagnosticCode::Markup(code) => code.as_str(),
            DiagnosticCode::Transform(code) => code.as_str(),
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
