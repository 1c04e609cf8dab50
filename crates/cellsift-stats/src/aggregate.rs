//! NaN-tolerant aggregate functions
//!
//! Every aggregate filters its input down to finite values first; NaN and
//! ±inf entries count as missing. An input with no finite entries yields NaN
//! rather than an error.

use thiserror::Error;

/// Errors from the statistical function library
#[derive(Debug, Clone, Error)]
pub enum StatsError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("percentile q must be in [0, 100], got {0}")]
    PercentileRange(f64),

    #[error("{function} requires a second argument")]
    MissingArgument { function: String },

    #[error("{function} takes no second argument")]
    UnexpectedArgument { function: String },
}

/// Keep only the finite entries of a slice
fn finite(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Mean of the finite entries; NaN if there are none
pub fn mean(data: &[f64]) -> f64 {
    let finite = finite(data);
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().sum::<f64>() / finite.len() as f64
}

/// Population variance of the finite entries; NaN if there are none
pub fn var(data: &[f64]) -> f64 {
    let finite = finite(data);
    if finite.is_empty() {
        return f64::NAN;
    }
    let m = finite.iter().sum::<f64>() / finite.len() as f64;
    finite.iter().map(|x| (x - m).powi(2)).sum::<f64>() / finite.len() as f64
}

/// Population standard deviation of the finite entries; NaN if there are none
pub fn std(data: &[f64]) -> f64 {
    var(data).sqrt()
}

/// Minimum finite entry; NaN if there are none
pub fn min(data: &[f64]) -> f64 {
    let finite = finite(data);
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Maximum finite entry; NaN if there are none
pub fn max(data: &[f64]) -> f64 {
    let finite = finite(data);
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Sum of the finite entries; 0 if there are none
pub fn sum(data: &[f64]) -> f64 {
    data.iter().copied().filter(|x| x.is_finite()).sum()
}

/// Number of finite entries
pub fn count(data: &[f64]) -> f64 {
    data.iter().filter(|x| x.is_finite()).count() as f64
}

/// Median of the finite entries; NaN if there are none
pub fn median(data: &[f64]) -> f64 {
    let mut sorted = finite(data);
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Linear-interpolated percentile of the finite entries
///
/// `q` must lie in `[0, 100]` inclusive. `percentile(data, 0)` is the
/// minimum and `percentile(data, 100)` the maximum. NaN if there are no
/// finite entries.
pub fn percentile(data: &[f64], q: f64) -> Result<f64, StatsError> {
    if !(0.0..=100.0).contains(&q) {
        return Err(StatsError::PercentileRange(q));
    }
    let mut sorted = finite(data);
    if sorted.is_empty() {
        return Ok(f64::NAN);
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    if lo + 1 >= sorted.len() {
        Ok(sorted[sorted.len() - 1])
    } else {
        Ok(sorted[lo] * (1.0 - frac) + sorted[lo + 1] * frac)
    }
}
