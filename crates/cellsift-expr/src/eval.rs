//! Vectorized evaluation of filter expressions
//!
//! Reduces a validated tree to a single [`Value`] given a column binding.
//! Scalars broadcast against arrays; boolean operators work elementwise over
//! full-length masks and never short-circuit; arrays of unequal length fail
//! loudly instead of truncating.

use crate::ast::*;
use cellsift_stats::{FunctionValue, StatsError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Evaluation errors
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("Unknown variable: {0}")]
    UnknownColumn(String),

    #[error("Array length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// A runtime value produced during evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A numeric scalar
    Scalar(f64),
    /// A boolean scalar
    Bool(bool),
    /// A numeric array, one entry per row
    Array(Vec<f64>),
    /// A boolean mask, one entry per row
    Mask(Vec<bool>),
}

impl Value {
    /// Row count for array-shaped values, None for scalars
    pub fn row_count(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.len()),
            Value::Mask(m) => Some(m.len()),
            Value::Scalar(_) | Value::Bool(_) => None,
        }
    }

    /// True for boolean-typed values (scalar or mask)
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Mask(_))
    }
}

/// Numeric truthiness: everything but zero is true (NaN included)
fn truthy(x: f64) -> bool {
    x != 0.0
}

/// Numeric view of a value; booleans coerce to 0/1
enum Numeric {
    Scalar(f64),
    Array(Vec<f64>),
}

fn to_numeric(value: Value) -> Numeric {
    match value {
        Value::Scalar(x) => Numeric::Scalar(x),
        Value::Bool(b) => Numeric::Scalar(if b { 1.0 } else { 0.0 }),
        Value::Array(a) => Numeric::Array(a),
        Value::Mask(m) => {
            Numeric::Array(m.into_iter().map(|b| if b { 1.0 } else { 0.0 }).collect())
        }
    }
}

/// Logical view of a value; numerics coerce by truthiness
enum Logical {
    Scalar(bool),
    Mask(Vec<bool>),
}

fn to_logical(value: Value) -> Logical {
    match value {
        Value::Bool(b) => Logical::Scalar(b),
        Value::Scalar(x) => Logical::Scalar(truthy(x)),
        Value::Mask(m) => Logical::Mask(m),
        Value::Array(a) => Logical::Mask(a.into_iter().map(truthy).collect()),
    }
}

fn check_len(left: usize, right: usize) -> EvalResult<()> {
    if left != right {
        return Err(EvalError::LengthMismatch { left, right });
    }
    Ok(())
}

/// Apply a scalar->scalar function over a numeric value
fn map_numeric(value: Value, f: impl Fn(f64) -> f64) -> Value {
    match to_numeric(value) {
        Numeric::Scalar(x) => Value::Scalar(f(x)),
        Numeric::Array(a) => Value::Array(a.into_iter().map(f).collect()),
    }
}

/// Apply a binary arithmetic/bitwise operator with broadcasting
fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    // Bitwise operators on boolean operands stay logical
    if matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
        && lhs.is_boolean()
        && rhs.is_boolean()
    {
        let f: fn(bool, bool) -> bool = match op {
            BinaryOp::BitAnd => |a, b| a && b,
            BinaryOp::BitOr => |a, b| a || b,
            _ => |a, b| a != b,
        };
        return combine_logical(f, to_logical(lhs), to_logical(rhs));
    }

    match (to_numeric(lhs), to_numeric(rhs)) {
        (Numeric::Scalar(a), Numeric::Scalar(b)) => Ok(Value::Scalar(op.apply(a, b))),
        (Numeric::Scalar(a), Numeric::Array(b)) => {
            Ok(Value::Array(b.into_iter().map(|x| op.apply(a, x)).collect()))
        }
        (Numeric::Array(a), Numeric::Scalar(b)) => {
            Ok(Value::Array(a.into_iter().map(|x| op.apply(x, b)).collect()))
        }
        (Numeric::Array(a), Numeric::Array(b)) => {
            check_len(a.len(), b.len())?;
            Ok(Value::Array(
                a.into_iter()
                    .zip(b)
                    .map(|(x, y)| op.apply(x, y))
                    .collect(),
            ))
        }
    }
}

/// Apply a comparison operator with broadcasting
fn apply_compare(op: CompareOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (to_numeric(lhs), to_numeric(rhs)) {
        (Numeric::Scalar(a), Numeric::Scalar(b)) => Ok(Value::Bool(op.evaluate(a, b))),
        (Numeric::Scalar(a), Numeric::Array(b)) => Ok(Value::Mask(
            b.into_iter().map(|x| op.evaluate(a, x)).collect(),
        )),
        (Numeric::Array(a), Numeric::Scalar(b)) => Ok(Value::Mask(
            a.into_iter().map(|x| op.evaluate(x, b)).collect(),
        )),
        (Numeric::Array(a), Numeric::Array(b)) => {
            check_len(a.len(), b.len())?;
            Ok(Value::Mask(
                a.into_iter()
                    .zip(b)
                    .map(|(x, y)| op.evaluate(x, y))
                    .collect(),
            ))
        }
    }
}

/// Combine two logical values elementwise; no short-circuiting
fn combine_logical(f: fn(bool, bool) -> bool, lhs: Logical, rhs: Logical) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Logical::Scalar(a), Logical::Scalar(b)) => Ok(Value::Bool(f(a, b))),
        (Logical::Scalar(a), Logical::Mask(b)) => {
            Ok(Value::Mask(b.into_iter().map(|x| f(a, x)).collect()))
        }
        (Logical::Mask(a), Logical::Scalar(b)) => {
            Ok(Value::Mask(a.into_iter().map(|x| f(x, b)).collect()))
        }
        (Logical::Mask(a), Logical::Mask(b)) => {
            check_len(a.len(), b.len())?;
            Ok(Value::Mask(
                a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect(),
            ))
        }
    }
}

/// Combine two values with a boolean operator, elementwise
fn apply_bool(op: BoolOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    let f: fn(bool, bool) -> bool = match op {
        BoolOp::And => |a, b| a && b,
        BoolOp::Or => |a, b| a || b,
    };
    combine_logical(f, to_logical(lhs), to_logical(rhs))
}

/// Context that supplies column arrays by name
///
/// All columns must have the same length (the row count); the engine reads
/// but never mutates them.
pub trait ColumnSource {
    /// Get the array bound to a column name
    fn column(&self, name: &str) -> Option<&[f64]>;
}

impl ColumnSource for HashMap<String, Vec<f64>> {
    fn column(&self, name: &str) -> Option<&[f64]> {
        self.get(name).map(|v| v.as_slice())
    }
}

/// Evaluator for filter expressions
///
/// Holds the per-call dependency list; create a fresh one per evaluation so
/// concurrent calls never share state.
pub struct Evaluator<'a, C: ColumnSource> {
    source: &'a C,
    dependencies: Vec<String>,
}

impl<'a, C: ColumnSource> Evaluator<'a, C> {
    /// Create a new evaluator over a column source
    pub fn new(source: &'a C) -> Self {
        Self {
            source,
            dependencies: Vec::new(),
        }
    }

    /// Column names resolved so far, first-visit order, no duplicates
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Consume the evaluator, returning the dependency list
    pub fn into_dependencies(self) -> Vec<String> {
        self.dependencies
    }

    /// Reduce an expression tree to a value
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(Literal::Number(n)) => Ok(Value::Scalar(*n)),
            Expr::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),

            Expr::Column(name) => {
                let data = self
                    .source
                    .column(name)
                    .ok_or_else(|| EvalError::UnknownColumn(name.clone()))?;
                if !self.dependencies.iter().any(|c| c == name) {
                    self.dependencies.push(name.clone());
                }
                Ok(Value::Array(data.to_vec()))
            }

            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                Ok(match op {
                    UnaryOp::Neg => map_numeric(value, |x| -x),
                    UnaryOp::Pos => map_numeric(value, |x| x),
                    UnaryOp::Not => match to_logical(value) {
                        Logical::Scalar(b) => Value::Bool(!b),
                        Logical::Mask(m) => Value::Mask(m.into_iter().map(|b| !b).collect()),
                    },
                })
            }

            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                apply_binary(*op, lhs, rhs)
            }

            Expr::Compare { ops, operands } => {
                let values: Vec<Value> = operands
                    .iter()
                    .map(|operand| self.evaluate(operand))
                    .collect::<EvalResult<_>>()?;

                // a < b < c compares each adjacent pair and ANDs the results
                let mut combined: Option<Value> = None;
                for (i, op) in ops.iter().enumerate() {
                    let pair = apply_compare(*op, values[i].clone(), values[i + 1].clone())?;
                    combined = Some(match combined {
                        None => pair,
                        Some(acc) => apply_bool(BoolOp::And, acc, pair)?,
                    });
                }
                combined.ok_or_else(|| {
                    EvalError::InvalidArguments("comparison with no operator".to_string())
                })
            }

            Expr::Bool { op, operands } => {
                let mut values = operands.iter().map(|operand| self.evaluate(operand));
                let mut acc = values.next().ok_or_else(|| {
                    EvalError::InvalidArguments("boolean expression with no operands".to_string())
                })??;
                for value in values {
                    acc = apply_bool(*op, acc, value?)?;
                }
                Ok(acc)
            }

            Expr::Call { name, args, kwargs } => self.evaluate_call(name, args, kwargs),
        }
    }

    /// Evaluate a call into the statistical function library
    fn evaluate_call(
        &mut self,
        name: &str,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> EvalResult<Value> {
        if args.is_empty() {
            return Err(EvalError::InvalidArguments(format!(
                "{name} requires a data argument"
            )));
        }
        if args.len() > 2 {
            return Err(EvalError::InvalidArguments(format!(
                "{name} takes at most two arguments, got {}",
                args.len()
            )));
        }

        let data = match to_numeric(self.evaluate(&args[0])?) {
            Numeric::Array(a) => a,
            Numeric::Scalar(x) => vec![x],
        };

        let mut extra = None;
        if let Some(arg) = args.get(1) {
            extra = Some(self.scalar_argument(name, arg)?);
        }
        for (kw, arg) in kwargs {
            if kw != "q" {
                return Err(EvalError::InvalidArguments(format!(
                    "{name} got an unexpected keyword argument '{kw}'"
                )));
            }
            if extra.is_some() {
                return Err(EvalError::InvalidArguments(format!(
                    "{name} got multiple values for 'q'"
                )));
            }
            extra = Some(self.scalar_argument(name, arg)?);
        }

        match cellsift_stats::dispatch(name, &data, extra)? {
            FunctionValue::Scalar(x) => Ok(Value::Scalar(x)),
            FunctionValue::Array(a) => Ok(Value::Array(a)),
        }
    }

    /// Evaluate an argument that must reduce to a scalar
    fn scalar_argument(&mut self, name: &str, arg: &Expr) -> EvalResult<f64> {
        match to_numeric(self.evaluate(arg)?) {
            Numeric::Scalar(x) => Ok(x),
            Numeric::Array(_) => Err(EvalError::InvalidArguments(format!(
                "{name} expects a scalar second argument"
            ))),
        }
    }
}
