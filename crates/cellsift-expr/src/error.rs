//! Error taxonomy for the expression engine
//!
//! Three recoverable categories, all caught at the facade boundary and
//! surfaced through the result's `error` field rather than propagated:
//!
//! - [`ParseError`]: malformed text; the user edits and retries
//! - [`SecurityError`]: syntactically valid but forbidden; surfaced verbatim
//! - [`EvalError`]: safe tree that failed during execution

use crate::eval::EvalError;
use crate::parser::ParseError;
use crate::security::SecurityError;
use thiserror::Error;

/// Umbrella error for every engine failure mode
#[derive(Debug, Clone, Error)]
pub enum ExpressionError {
    /// Malformed expression text
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Forbidden construct in otherwise valid text
    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    /// Failure while evaluating a validated tree
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_conversion_and_display() {
        let err: ExpressionError = ParseError::Empty.into();
        assert!(err.to_string().starts_with("Parse error"));

        let err: ExpressionError = SecurityError::AttributeAccess.into();
        assert!(err.to_string().starts_with("Security error"));

        let err: ExpressionError = EvalError::UnknownColumn("a".to_string()).into();
        assert!(err.to_string().contains("Unknown variable: a"));
    }
}
