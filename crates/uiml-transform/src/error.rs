//! Transform error types.

use smol_str::SmolStr;
use source_map::Span;
use thiserror::Error;
use uiml_script::ParseError;

/// Stable codes of the transform phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformCode {
    /// `T001`
    RootCount,
    /// `T002`
    MultipleScripts,
    /// `T003`
    NestedCompound,
    /// `T004`
    MixedContent,
    /// `T005`
    NameRequired,
    /// `T006`
    ValueRequired,
    /// `T007`
    InvalidAttributeName,
    /// `T008`
    CompoundNameCase,
    /// `T009`
    CompoundWithoutChild,
    /// `T010`
    MisplacedHelper,
    /// `T011`
    InvalidUses,
    /// `T012`
    Script,
    /// `T013`
    InvalidNamespace,
}

impl TransformCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformCode::RootCount => "T001",
            TransformCode::MultipleScripts => "T002",
            TransformCode::NestedCompound => "T003",
            TransformCode::MixedContent => "T004",
            TransformCode::NameRequired => "T005",
            TransformCode::ValueRequired => "T006",
            TransformCode::InvalidAttributeName => "T007",
            TransformCode::CompoundNameCase => "T008",
            TransformCode::CompoundWithoutChild => "T009",
            TransformCode::MisplacedHelper => "T010",
            TransformCode::InvalidUses => "T011",
            TransformCode::Script => "T012",
            TransformCode::InvalidNamespace => "T013",
        }
    }
}

/// A semantic error found while walking the markup tree.
///
/// Every variant except [`TransformError::Script`] stops the transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The document has no root element or more than one.
    #[error("a document must contain exactly one root element")]
    RootCount { span: Span },

    /// An element holds more than one `<script>`.
    #[error("an element may contain at most one <script> tag")]
    MultipleScripts { span: Span },

    /// A `<Component>` definition inside another component.
    #[error("reusable component definitions cannot be nested")]
    NestedCompound { span: Span },

    /// Text next to child components.
    #[error("<{element}> mixes text with child components")]
    MixedContent { element: SmolStr, span: Span },

    /// A helper element without its `name` attribute.
    #[error("<{helper}> requires a 'name' attribute")]
    NameRequired { helper: SmolStr, span: Span },

    /// A value-holding helper with neither a `value` attribute nor content.
    #[error("<{helper}> requires a value")]
    ValueRequired { helper: SmolStr, span: Span },

    /// An attribute name that does not segment into `[prefix.]name`.
    #[error("invalid attribute name '{name}'")]
    InvalidAttributeName { name: SmolStr, span: Span },

    /// A reusable component name starting with a lowercase letter.
    #[error("component name '{name}' must start with an uppercase letter")]
    CompoundNameCase { name: SmolStr, span: Span },

    /// A reusable component definition without a body.
    #[error("component '{name}' has no child component")]
    CompoundWithoutChild { name: SmolStr, span: Span },

    /// A helper element where it has no meaning, e.g. `<item>` outside
    /// `<property>`.
    #[error("<{helper}> cannot be used here")]
    MisplacedHelper { helper: SmolStr, span: Span },

    /// A `<uses>` value that is not a comma-separated name list.
    #[error("invalid <uses> value '{value}'")]
    InvalidUses { value: String, span: Span },

    /// An embedded script failed to parse. The error is already anchored
    /// in document coordinates.
    #[error("{0}")]
    Script(ParseError),

    /// An undeclared namespace prefix or an empty namespace.
    #[error("invalid namespace '{name}'")]
    InvalidNamespace { name: SmolStr, span: Span },
}

impl TransformError {
    pub fn code(&self) -> TransformCode {
        match self {
            TransformError::RootCount { .. } => TransformCode::RootCount,
            TransformError::MultipleScripts { .. } => TransformCode::MultipleScripts,
            TransformError::NestedCompound { .. } => TransformCode::NestedCompound,
            TransformError::MixedContent { .. } => TransformCode::MixedContent,
            TransformError::NameRequired { .. } => TransformCode::NameRequired,
            TransformError::ValueRequired { .. } => TransformCode::ValueRequired,
            TransformError::InvalidAttributeName { .. } => TransformCode::InvalidAttributeName,
            TransformError::CompoundNameCase { .. } => TransformCode::CompoundNameCase,
            TransformError::CompoundWithoutChild { .. } => TransformCode::CompoundWithoutChild,
            TransformError::MisplacedHelper { .. } => TransformCode::MisplacedHelper,
            TransformError::InvalidUses { .. } => TransformCode::InvalidUses,
            TransformError::Script(_) => TransformCode::Script,
            TransformError::InvalidNamespace { .. } => TransformCode::InvalidNamespace,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TransformError::RootCount { span }
            | TransformError::MultipleScripts { span }
            | TransformError::NestedCompound { span }
            | TransformError::MixedContent { span, .. }
            | TransformError::NameRequired { span, .. }
            | TransformError::ValueRequired { span, .. }
            | TransformError::InvalidAttributeName { span, .. }
            | TransformError::CompoundNameCase { span, .. }
            | TransformError::CompoundWithoutChild { span, .. }
            | TransformError::MisplacedHelper { span, .. }
            | TransformError::InvalidUses { span, .. }
            | TransformError::InvalidNamespace { span, .. } => *span,
            TransformError::Script(error) => error.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TransformError::NameRequired {
            helper: "property".into(),
            span: Span::from_offsets(3, 12),
        };
        insta::assert_snapshot!(error.to_string(), @"<property> requires a 'name' attribute");
        assert_eq!(error.code().as_str(), "T005");
        assert_eq!(error.span(), Span::from_offsets(3, 12));
    }
}
