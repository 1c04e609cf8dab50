//! Typed results of expression evaluation and validation

use crate::error::ExpressionError;
use crate::eval::Value;
use serde::{Deserialize, Serialize};

/// Classification of an evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    /// A boolean scalar or mask; usable as a row filter
    Boolean,
    /// A numeric scalar
    Numeric,
    /// A numeric array
    Array,
}

impl ResultKind {
    /// Classify a runtime value by its shape and type
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) | Value::Mask(_) => ResultKind::Boolean,
            Value::Array(_) => ResultKind::Array,
            Value::Scalar(_) => ResultKind::Numeric,
        }
    }
}

/// Outcome of one `evaluate` call
///
/// Exactly one of `value` and `error` is set.
#[derive(Debug, Clone)]
pub struct ExpressionResult {
    /// The computed value, absent on failure
    pub value: Option<Value>,
    /// Classification of `value`, absent on failure
    pub kind: Option<ResultKind>,
    /// Columns resolved during evaluation, first-visit order, deduplicated
    pub column_dependencies: Vec<String>,
    /// Wall-clock time spent, measured up to the failure point on error
    pub execution_time_ms: f64,
    /// The failure, absent on success
    pub error: Option<ExpressionError>,
}

impl ExpressionResult {
    /// Build a successful result
    pub fn success(value: Value, column_dependencies: Vec<String>, execution_time_ms: f64) -> Self {
        Self {
            kind: Some(ResultKind::of(&value)),
            value: Some(value),
            column_dependencies,
            execution_time_ms,
            error: None,
        }
    }

    /// Build a failed result
    pub fn failure(error: ExpressionError, execution_time_ms: f64) -> Self {
        Self {
            value: None,
            kind: None,
            column_dependencies: Vec::new(),
            execution_time_ms,
            error: Some(error),
        }
    }

    /// True when evaluation produced a value
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Render the error for display, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

/// Outcome of one `validate` call; cheap enough to run per keystroke
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when the text parses and references only known columns
    pub valid: bool,
    /// Every column the expression references, first-visit order
    pub referenced_columns: Vec<String>,
    /// Referenced columns absent from the known set
    pub unknown_columns: Vec<String>,
    /// Parse/security failure rendered for display
    pub error: Option<String>,
}

impl ValidationReport {
    /// Build a report for text that failed before column analysis
    pub fn invalid(error: String) -> Self {
        Self {
            valid: false,
            referenced_columns: Vec::new(),
            unknown_columns: Vec::new(),
            error: Some(error),
        }
    }
}

/// One registered function, for UI autocomplete/help
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Name used in expressions
    pub name: String,
    /// Call signature
    pub signature: String,
    /// One-line description
    pub description: String,
}
