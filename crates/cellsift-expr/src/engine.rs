//! Engine facade
//!
//! The only entry points outer layers call. [`evaluate`] runs the full
//! normalize → screen → parse → validate → evaluate → classify pipeline and
//! never lets a failure escape as anything but the result's `error` field.
//! [`validate`] is the cheap parse-and-check path for live syntax feedback
//! while the user is still typing.

use std::time::Instant;

use tracing::debug;

use crate::error::ExpressionError;
use crate::eval::{ColumnSource, Evaluator, Value};
use crate::parser::{normalize, parse_expression};
use crate::result::{ExpressionResult, FunctionInfo, ValidationReport};
use crate::security::{screen_source, validate_tree};

/// Evaluate an expression against a dataset binding
///
/// Never panics and never returns an error type; every failure mode ends up
/// in the result's `error` field with the time spent up to that point.
pub fn evaluate<C: ColumnSource>(text: &str, columns: &C) -> ExpressionResult {
    let start = Instant::now();
    let outcome = run_pipeline(text, columns);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok((value, dependencies)) => {
            debug!(elapsed_ms, columns = dependencies.len(), "expression evaluated");
            ExpressionResult::success(value, dependencies, elapsed_ms)
        }
        Err(error) => {
            debug!(elapsed_ms, error = %error, "expression rejected");
            ExpressionResult::failure(error, elapsed_ms)
        }
    }
}

fn run_pipeline<C: ColumnSource>(
    text: &str,
    columns: &C,
) -> Result<(Value, Vec<String>), ExpressionError> {
    let normalized = normalize(text);
    screen_source(&normalized)?;
    let tree = parse_expression(&normalized)?;
    validate_tree(&tree)?;

    let mut evaluator = Evaluator::new(columns);
    let value = evaluator.evaluate(&tree)?;
    Ok((value, evaluator.into_dependencies()))
}

/// Check an expression against a column schema without evaluating it
///
/// Safe to call on every keystroke; the UI is expected to debounce.
pub fn validate(text: &str, known_columns: &[String]) -> ValidationReport {
    let normalized = normalize(text);
    if let Err(e) = screen_source(&normalized) {
        return ValidationReport::invalid(e.to_string());
    }
    let tree = match parse_expression(&normalized) {
        Ok(tree) => tree,
        Err(e) => return ValidationReport::invalid(e.to_string()),
    };
    if let Err(e) = validate_tree(&tree) {
        return ValidationReport::invalid(e.to_string());
    }

    let mut referenced = Vec::new();
    tree.collect_columns(&mut referenced);
    let unknown: Vec<String> = referenced
        .iter()
        .filter(|c| !known_columns.iter().any(|k| k == *c))
        .cloned()
        .collect();

    ValidationReport {
        valid: unknown.is_empty(),
        referenced_columns: referenced,
        unknown_columns: unknown,
        error: None,
    }
}

/// List every callable function, for UI autocomplete/help
pub fn list_functions() -> Vec<FunctionInfo> {
    cellsift_stats::FUNCTIONS
        .iter()
        .map(|f| FunctionInfo {
            name: f.name.to_string(),
            signature: f.signature.to_string(),
            description: f.description.to_string(),
        })
        .collect()
}
