//! cellsift-expr - Filter expression engine for cellsift
//!
//! This crate parses, safety-checks, and evaluates user-typed filter
//! expressions against a columnar table of measured objects, producing a
//! boolean inclusion mask, a derived numeric array, or a scalar.
//!
//! # Expression Syntax
//!
//! - **Comparisons**: `area > 1000`, `0.5 < circularity < 0.9`
//! - **Arithmetic**: `+ - * / // % **`, bitwise `& | ^ << >>`
//! - **Boolean logic**: `AND`/`OR`/`NOT` (any case) or `&&`/`||`/`!`
//! - **Statistics**: `area > mean(area) + 2 * std(area)`,
//!   `intensity > percentile(intensity, 75)`
//!
//! # Examples
//!
//! ```ignore
//! use cellsift_expr::engine;
//!
//! let result = engine::evaluate("area > mean(area)", &columns);
//! let report = engine::validate("area > mea(", &known_columns);
//! let help = engine::list_functions();
//! ```
//!
//! Hostile input never executes: the safety validator rejects anything
//! outside arithmetic, comparison, boolean combination, and calls into the
//! fixed statistical function registry, and the facade converts every
//! failure into a structured error instead of panicking.

pub mod ast;
pub mod engine;
pub mod error;
pub mod eval;
pub mod mask;
pub mod parser;
pub mod result;
pub mod security;

pub use ast::*;
pub use engine::{evaluate, list_functions, validate};
pub use error::ExpressionError;
pub use eval::{ColumnSource, EvalError, Evaluator, Value};
pub use mask::*;
pub use parser::{normalize, parse_expression, ParseError};
pub use result::{ExpressionResult, FunctionInfo, ResultKind, ValidationReport};
pub use security::{screen_source, validate_tree, SecurityError};

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
