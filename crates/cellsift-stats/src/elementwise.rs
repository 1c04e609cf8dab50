//! Clamped elementwise transforms
//!
//! `sqrt`, `log` and `log10` clamp their inputs so degenerate measurements
//! (zero areas, negative background-subtracted intensities) transform to
//! finite values instead of NaN or -inf.

/// Inputs to `log`/`log10` are clamped to at least this value
pub const LOG_EPSILON: f64 = 1e-10;

/// Absolute value, elementwise
pub fn abs(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x.abs()).collect()
}

/// Square root with negative inputs clamped to zero
pub fn sqrt(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x.max(0.0).sqrt()).collect()
}

/// Natural logarithm with inputs clamped to [`LOG_EPSILON`]
pub fn log(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x.max(LOG_EPSILON).ln()).collect()
}

/// Base-10 logarithm with inputs clamped to [`LOG_EPSILON`]
pub fn log10(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x.max(LOG_EPSILON).log10()).collect()
}
