//! Safety validation for filter expressions
//!
//! Two passes, both before any evaluation:
//!
//! 1. [`screen_source`] scans the normalized source text for constructs the
//!    grammar should never see at all: definition/import keywords, dunder
//!    names, attribute access, and oversized or over-nested input.
//! 2. [`validate_tree`] walks the built tree and checks that every call
//!    names an entry in the statistical function registry.
//!
//! A tree that passes both cannot express anything beyond arithmetic,
//! comparison, boolean combination, and registered function calls.

use crate::ast::Expr;
use thiserror::Error;

/// Maximum accepted expression length in bytes
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Maximum accepted nesting depth
///
/// Applies to parenthesis nesting, to runs of prefix operators (`-x`,
/// `!x`), and to the number of `**` operators. Each of those drives one
/// level of parser recursion, so capping them bounds stack use.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Keywords rejected anywhere in an expression, case-insensitive whole words
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "import", "def", "class", "lambda", "global", "nonlocal", "exec", "eval", "compile",
    "getattr", "setattr", "delattr", "open",
];

/// Security validation errors
#[derive(Debug, Clone, Error)]
pub enum SecurityError {
    #[error("Forbidden keyword '{0}' in expression")]
    ForbiddenKeyword(String),

    #[error("Names with leading double underscores are not allowed: '{0}'")]
    DunderName(String),

    #[error("Attribute access is not allowed")]
    AttributeAccess,

    #[error("Expression too long: {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("Expression nested too deeply (max {0} levels)")]
    TooDeep(usize),

    #[error("Call to unregistered function '{0}'")]
    UnregisteredFunction(String),
}

/// Screen normalized source text before parsing
pub fn screen_source(normalized: &str) -> Result<(), SecurityError> {
    if normalized.len() > MAX_EXPRESSION_LEN {
        return Err(SecurityError::TooLong {
            len: normalized.len(),
            max: MAX_EXPRESSION_LEN,
        });
    }

    let chars: Vec<char> = normalized.chars().collect();
    let mut depth: usize = 0;
    let mut prefix_run: usize = 0;
    let mut power_count: usize = 0;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' {
            depth += 1;
            if depth > MAX_NESTING_DEPTH {
                return Err(SecurityError::TooDeep(MAX_NESTING_DEPTH));
            }
            prefix_run = 0;
            i += 1;
        } else if c == ')' {
            depth = depth.saturating_sub(1);
            prefix_run = 0;
            i += 1;
        } else if c == '.' {
            if is_attribute_dot(&chars, i) {
                return Err(SecurityError::AttributeAccess);
            }
            prefix_run = 0;
            i += 1;
        } else if c == '-' || c == '+' || c == '!' {
            // `- - - 1` recurses once per sign in the parser
            prefix_run += 1;
            if prefix_run > MAX_NESTING_DEPTH {
                return Err(SecurityError::TooDeep(MAX_NESTING_DEPTH));
            }
            i += 1;
        } else if c == '*' && chars.get(i + 1) == Some(&'*') {
            // `**` is right-associative and recurses per occurrence
            power_count += 1;
            if power_count > MAX_NESTING_DEPTH {
                return Err(SecurityError::TooDeep(MAX_NESTING_DEPTH));
            }
            prefix_run = 0;
            i += 2;
        } else if c.is_whitespace() {
            i += 1;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word.starts_with("__") {
                return Err(SecurityError::DunderName(word));
            }
            if FORBIDDEN_KEYWORDS
                .iter()
                .any(|k| word.eq_ignore_ascii_case(k))
            {
                return Err(SecurityError::ForbiddenKeyword(word));
            }
            prefix_run = 0;
        } else {
            prefix_run = 0;
            i += 1;
        }
    }
    Ok(())
}

/// A dot reads as attribute access when a name character follows it,
/// unless it is the decimal point of a float in scientific notation
/// (`1.e5`, `2.E-3`)
fn is_attribute_dot(chars: &[char], dot: usize) -> bool {
    let next = match chars.get(dot + 1) {
        Some(c) => *c,
        None => return false,
    };
    if !(next.is_alphabetic() || next == '_') {
        return false;
    }

    let prev_is_digit = dot > 0 && chars[dot - 1].is_ascii_digit();
    if prev_is_digit && (next == 'e' || next == 'E') {
        let after = chars.get(dot + 2);
        if matches!(after, Some(c) if c.is_ascii_digit() || *c == '+' || *c == '-') {
            return false;
        }
    }
    true
}

/// Walk a built tree and enforce the registered-functions rule
pub fn validate_tree(expr: &Expr) -> Result<(), SecurityError> {
    match expr {
        Expr::Literal(_) | Expr::Column(_) => Ok(()),
        Expr::Unary { operand, .. } => validate_tree(operand),
        Expr::Binary { lhs, rhs, .. } => {
            validate_tree(lhs)?;
            validate_tree(rhs)
        }
        Expr::Compare { operands, .. } | Expr::Bool { operands, .. } => {
            for operand in operands {
                validate_tree(operand)?;
            }
            Ok(())
        }
        Expr::Call { name, args, kwargs } => {
            if !cellsift_stats::is_registered(name) {
                return Err(SecurityError::UnregisteredFunction(name.clone()));
            }
            for arg in args {
                validate_tree(arg)?;
            }
            for (_, arg) in kwargs {
                validate_tree(arg)?;
            }
            Ok(())
        }
    }
}
