//! Expression tree for filter expressions
//!
//! This module defines the closed set of node kinds a parsed expression can
//! contain. The enum is deliberately exhaustive: there is no variant for
//! definitions, imports, attribute access, or anything else outside the
//! filter grammar, so a built tree cannot represent them.

use serde::{Deserialize, Serialize};

/// A literal value in an expression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// A numeric literal
    Number(f64),
    /// A boolean literal
    Bool(bool),
}

/// A node in the expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal number or boolean
    Literal(Literal),

    /// A column reference, resolved against the dataset at evaluation time
    Column(String),

    /// A unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// A binary arithmetic/bitwise operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// A comparison chain: `operands[0] ops[0] operands[1] ops[1] ...`
    ///
    /// `a < b < c` parses to two ops over three operands. Adjacent pairs are
    /// compared independently and the pairwise results are AND-combined.
    Compare {
        ops: Vec<CompareOp>,
        operands: Vec<Expr>,
    },

    /// Logical AND/OR over two or more operands, folded left to right
    Bool { op: BoolOp, operands: Vec<Expr> },

    /// A call into the statistical function library
    Call {
        name: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
}

impl Expr {
    /// Create an AND expression
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Bool {
            op: BoolOp::And,
            operands: vec![left, right],
        }
    }

    /// Create an OR expression
    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Bool {
            op: BoolOp::Or,
            operands: vec![left, right],
        }
    }

    /// Create a NOT expression
    pub fn not(expr: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(expr),
        }
    }

    /// Create a numeric literal
    pub fn number(n: f64) -> Self {
        Expr::Literal(Literal::Number(n))
    }

    /// Create a column reference
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// Check if this is an atomic expression (no operators)
    pub fn is_atomic(&self) -> bool {
        matches!(self, Expr::Literal(_) | Expr::Column(_) | Expr::Call { .. })
    }

    /// Collect every column name referenced anywhere in the tree,
    /// first-visit order, without duplicates
    pub fn collect_columns(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Column(name) => {
                if !out.iter().any(|c| c == name) {
                    out.push(name.clone());
                }
            }
            Expr::Unary { operand, .. } => operand.collect_columns(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_columns(out);
                rhs.collect_columns(out);
            }
            Expr::Compare { operands, .. } | Expr::Bool { operands, .. } => {
                for operand in operands {
                    operand.collect_columns(out);
                }
            }
            Expr::Call { args, kwargs, .. } => {
                for arg in args {
                    arg.collect_columns(out);
                }
                for (_, arg) in kwargs {
                    arg.collect_columns(out);
                }
            }
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation (-)
    Neg,
    /// Arithmetic identity (+)
    Pos,
    /// Logical negation (NOT / !)
    Not,
}

impl UnaryOp {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "!",
        }
    }
}

/// Binary arithmetic and bitwise operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Floor division (//)
    FloorDiv,
    /// Modulo (%), sign follows the divisor
    Mod,
    /// Exponentiation (**)
    Pow,
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Left shift (<<)
    Shl,
    /// Right shift (>>)
    Shr,
}

impl BinaryOp {
    /// Apply the operator to two scalars
    ///
    /// Division by zero flows through as ±inf/NaN rather than failing;
    /// bitwise and shift operands round-trip through i64.
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::FloorDiv => (lhs / rhs).floor(),
            BinaryOp::Mod => lhs - rhs * (lhs / rhs).floor(),
            BinaryOp::Pow => lhs.powf(rhs),
            BinaryOp::BitAnd => ((lhs as i64) & (rhs as i64)) as f64,
            BinaryOp::BitOr => ((lhs as i64) | (rhs as i64)) as f64,
            BinaryOp::BitXor => ((lhs as i64) ^ (rhs as i64)) as f64,
            BinaryOp::Shl => int_shift(lhs, rhs, |a, s| a << s),
            BinaryOp::Shr => int_shift(lhs, rhs, |a, s| a >> s),
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

/// Shift amounts outside `0..64` have no defined i64 result; yield NaN
fn int_shift(lhs: f64, rhs: f64, f: fn(i64, u32) -> i64) -> f64 {
    let amount = rhs as i64;
    if !(0..64).contains(&amount) {
        return f64::NAN;
    }
    f(lhs as i64, amount as u32) as f64
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
}

impl CompareOp {
    /// Evaluate the comparison for two f64 values
    pub fn evaluate(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => (lhs - rhs).abs() < 1e-10,
            CompareOp::Ne => (lhs - rhs).abs() >= 1e-10,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// Boolean combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    /// Logical AND, elementwise over masks
    And,
    /// Logical OR, elementwise over masks
    Or,
}

impl BoolOp {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "&&",
            BoolOp::Or => "||",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_operators() {
        assert!(CompareOp::Lt.evaluate(1.0, 2.0));
        assert!(!CompareOp::Lt.evaluate(2.0, 1.0));
        assert!(CompareOp::Le.evaluate(1.0, 1.0));
        assert!(CompareOp::Gt.evaluate(2.0, 1.0));
        assert!(CompareOp::Eq.evaluate(1.0, 1.0));
        assert!(CompareOp::Ne.evaluate(1.0, 2.0));
    }

    #[test]
    fn test_binary_floor_semantics() {
        // Sign follows the divisor, like the floor-division family
        assert_eq!(BinaryOp::FloorDiv.apply(7.0, 2.0), 3.0);
        assert_eq!(BinaryOp::FloorDiv.apply(-7.0, 2.0), -4.0);
        assert_eq!(BinaryOp::Mod.apply(-7.0, 2.0), 1.0);
        assert_eq!(BinaryOp::Mod.apply(7.0, -2.0), -1.0);
    }

    #[test]
    fn test_binary_div_by_zero_is_not_an_error() {
        assert!(BinaryOp::Div.apply(1.0, 0.0).is_infinite());
    }

    #[test]
    fn test_bitwise_roundtrip() {
        assert_eq!(BinaryOp::BitAnd.apply(6.0, 3.0), 2.0);
        assert_eq!(BinaryOp::BitOr.apply(6.0, 3.0), 7.0);
        assert_eq!(BinaryOp::BitXor.apply(6.0, 3.0), 5.0);
        assert_eq!(BinaryOp::Shl.apply(1.0, 3.0), 8.0);
        assert_eq!(BinaryOp::Shr.apply(8.0, 2.0), 2.0);
    }

    #[test]
    fn test_shift_out_of_range_yields_nan() {
        assert!(BinaryOp::Shl.apply(1.0, 70.0).is_nan());
        assert!(BinaryOp::Shl.apply(1.0, -1.0).is_nan());
        assert!(BinaryOp::Shr.apply(8.0, 64.0).is_nan());
        // a NaN amount casts to 0, shifting by nothing
        assert_eq!(BinaryOp::Shr.apply(8.0, f64::NAN), 8.0);
    }

    #[test]
    fn test_collect_columns_dedups_in_order() {
        let expr = Expr::Compare {
            ops: vec![CompareOp::Gt],
            operands: vec![
                Expr::column("area"),
                Expr::Call {
                    name: "mean".to_string(),
                    args: vec![Expr::column("area")],
                    kwargs: vec![],
                },
            ],
        };
        let mut cols = Vec::new();
        expr.collect_columns(&mut cols);
        assert_eq!(cols, vec!["area".to_string()]);
    }

    #[test]
    fn test_tree_survives_serde_round_trip() {
        let expr = Expr::and(
            Expr::Compare {
                ops: vec![CompareOp::Gt],
                operands: vec![Expr::column("area"), Expr::number(100.0)],
            },
            Expr::not(Expr::Call {
                name: "sqrt".to_string(),
                args: vec![Expr::column("intensity")],
                kwargs: vec![],
            }),
        );
        let json = serde_json::to_string(&expr).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, back);
    }

    #[test]
    fn test_is_atomic() {
        assert!(Expr::number(1.0).is_atomic());
        assert!(Expr::column("x").is_atomic());
        assert!(!Expr::and(Expr::column("x"), Expr::column("y")).is_atomic());
    }
}
