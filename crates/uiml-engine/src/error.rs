//! Engine error types.

use crate::value::Value;
use smol_str::SmolStr;
use source_map::Span;
use thiserror::Error;

/// Errors that abort evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A read-only value or binding was mutated.
    #[error("cannot modify read-only value '{path}'")]
    ReadOnly { path: String, span: Span },

    /// A `const` binding was assigned.
    #[error("assignment to constant variable '{name}'")]
    ConstAssignment { name: SmolStr, span: Span },

    /// `for..of` over something that is not iterable.
    #[error("{found} is not iterable")]
    IteratorExpected { found: String, span: Span },

    /// The step or time budget ran out.
    #[error("evaluation exceeded its budget after {steps} steps")]
    Timeout { steps: u64 },

    /// A thrown value nobody caught.
    #[error("uncaught {message}")]
    Uncaught { message: String },
}

impl EngineError {
    /// The source range the error points at, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            EngineError::ReadOnly { span, .. }
            | EngineError::ConstAssignment { span, .. }
            | EngineError::IteratorExpected { span, .. } => Some(*span),
            EngineError::Timeout { .. } | EngineError::Uncaught { .. } => None,
        }
    }

    pub(crate) fn uncaught(thrown: &Value) -> Self {
        let message = match thrown {
            Value::Object(entries) => {
                let entries = entries.borrow();
                match (entries.get("name"), entries.get("message")) {
                    (Some(name), Some(message)) => format!("{name}: {message}"),
                    (None, Some(message)) => message.to_string(),
                    _ => thrown.to_string(),
                }
            }
            other => other.to_string(),
        };
        EngineError::Uncaught { message }
    }
}

/// Why evaluation of a queue item stopped early.
#[derive(Debug)]
pub(crate) enum Fault {
    /// Aborts the whole thread.
    Fatal(EngineError),
    /// A catchable exception.
    Throw(Value),
}

impl From<EngineError> for Fault {
    fn from(error: EngineError) -> Self {
        Fault::Fatal(error)
    }
}

pub(crate) type Flow<T> = Result<T, Fault>;

/// A catchable `TypeError`.
pub(crate) fn type_error(message: impl Into<String>) -> Fault {
    Fault::Throw(Value::error("TypeError", message))
}

/// A catchable `RangeError`.
pub(crate) fn range_error(message: impl Into<String>) -> Fault {
    Fault::Throw(Value::error("RangeError", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_uncaught_messages() {
        let error = EngineError::uncaught(&Value::error("TypeError", "x is not a function"));
        assert_eq!(error.to_string(), "uncaught TypeError: x is not a function");
        assert_eq!(EngineError::uncaught(&Value::Number(42.0)).to_string(), "uncaught 42");
        assert_eq!(error.span(), None);
    }
}
