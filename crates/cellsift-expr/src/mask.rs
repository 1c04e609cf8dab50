//! Helpers for consumers of boolean selection masks
//!
//! The engine hands row filters back as [`Value::Mask`] (or a scalar
//! [`Value::Bool`] when the expression never touched a column). Callers
//! applying a filter to their rows use these to turn a result into a
//! concrete mask and to combine stored masks.

use crate::eval::Value;

/// Extract a row mask from an evaluation result
///
/// A scalar boolean broadcasts to the row count. Numeric results are not
/// filters and yield `None`.
pub fn result_mask(value: &Value, rows: usize) -> Option<Vec<bool>> {
    match value {
        Value::Mask(mask) => Some(mask.clone()),
        Value::Bool(b) => Some(vec![*b; rows]),
        Value::Scalar(_) | Value::Array(_) => None,
    }
}

/// Count the number of selected rows
pub fn count_selected(mask: &[bool]) -> usize {
    mask.iter().filter(|&&selected| selected).count()
}

/// Row indices where the mask is set
pub fn selected_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, &selected)| selected)
        .map(|(row, _)| row)
        .collect()
}

/// Invert a selection
pub fn invert_mask(mask: &[bool]) -> Vec<bool> {
    mask.iter().map(|&selected| !selected).collect()
}

fn zip_masks(a: &[bool], b: &[bool], f: fn(bool, bool) -> bool) -> Vec<bool> {
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

/// Intersect two selections
pub fn and_masks(a: &[bool], b: &[bool]) -> Vec<bool> {
    zip_masks(a, b, |x, y| x && y)
}

/// Union two selections
pub fn or_masks(a: &[bool], b: &[bool]) -> Vec<bool> {
    zip_masks(a, b, |x, y| x || y)
}
