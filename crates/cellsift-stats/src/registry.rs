//! The closed function registry
//!
//! Every function callable from a filter expression lives in the compile-time
//! [`FUNCTIONS`] table. The expression engine's safety validator checks call
//! names against this table, and its UI callers render the table as
//! autocomplete/help entries. There is no way to register a function at
//! runtime.

use serde::{Deserialize, Serialize};

use crate::aggregate::{self, StatsError};
use crate::elementwise;

/// Whether a function reduces its input or maps over it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    /// Reduces an array to a scalar
    Aggregate,
    /// Maps an array to an array of the same length
    Elementwise,
}

/// Description of one registered function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    /// Name used in expressions
    pub name: &'static str,
    /// Call signature for UI help
    pub signature: &'static str,
    /// One-line description for UI help
    pub description: &'static str,
    /// Aggregate or elementwise
    pub kind: FunctionKind,
}

/// The full registry, in the order shown to users
pub const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec {
        name: "mean",
        signature: "mean(column)",
        description: "Mean of the non-missing values",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "std",
        signature: "std(column)",
        description: "Standard deviation of the non-missing values",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "var",
        signature: "var(column)",
        description: "Variance of the non-missing values",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "min",
        signature: "min(column)",
        description: "Smallest non-missing value",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "max",
        signature: "max(column)",
        description: "Largest non-missing value",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "median",
        signature: "median(column)",
        description: "Median of the non-missing values",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "percentile",
        signature: "percentile(column, q)",
        description: "Linear-interpolated percentile, q in [0, 100]",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "sum",
        signature: "sum(column)",
        description: "Sum of the non-missing values",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "count",
        signature: "count(column)",
        description: "Number of non-missing values",
        kind: FunctionKind::Aggregate,
    },
    FunctionSpec {
        name: "abs",
        signature: "abs(column)",
        description: "Absolute value of each entry",
        kind: FunctionKind::Elementwise,
    },
    FunctionSpec {
        name: "sqrt",
        signature: "sqrt(column)",
        description: "Square root of each entry, negatives clamped to 0",
        kind: FunctionKind::Elementwise,
    },
    FunctionSpec {
        name: "log",
        signature: "log(column)",
        description: "Natural log of each entry, clamped away from zero",
        kind: FunctionKind::Elementwise,
    },
    FunctionSpec {
        name: "log10",
        signature: "log10(column)",
        description: "Base-10 log of each entry, clamped away from zero",
        kind: FunctionKind::Elementwise,
    },
];

/// Look up a function by name
pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Check whether a name is registered
pub fn is_registered(name: &str) -> bool {
    lookup(name).is_some()
}

/// Result of a registry dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionValue {
    /// Aggregate result
    Scalar(f64),
    /// Elementwise result, same length as the input
    Array(Vec<f64>),
}

/// Dispatch a call by name
///
/// `extra` carries the second argument for `percentile`; every other
/// function rejects one.
pub fn dispatch(name: &str, data: &[f64], extra: Option<f64>) -> Result<FunctionValue, StatsError> {
    if name != "percentile" && extra.is_some() {
        return Err(StatsError::UnexpectedArgument {
            function: name.to_string(),
        });
    }

    let value = match name {
        "mean" => FunctionValue::Scalar(aggregate::mean(data)),
        "std" => FunctionValue::Scalar(aggregate::std(data)),
        "var" => FunctionValue::Scalar(aggregate::var(data)),
        "min" => FunctionValue::Scalar(aggregate::min(data)),
        "max" => FunctionValue::Scalar(aggregate::max(data)),
        "median" => FunctionValue::Scalar(aggregate::median(data)),
        "sum" => FunctionValue::Scalar(aggregate::sum(data)),
        "count" => FunctionValue::Scalar(aggregate::count(data)),
        "percentile" => {
            let q = extra.ok_or_else(|| StatsError::MissingArgument {
                function: name.to_string(),
            })?;
            FunctionValue::Scalar(aggregate::percentile(data, q)?)
        }
        "abs" => FunctionValue::Array(elementwise::abs(data)),
        "sqrt" => FunctionValue::Array(elementwise::sqrt(data)),
        "log" => FunctionValue::Array(elementwise::log(data)),
        "log10" => FunctionValue::Array(elementwise::log10(data)),
        _ => return Err(StatsError::UnknownFunction(name.to_string())),
    };

    Ok(value)
}
