//! Filter expression parser using nom
//!
//! Grammar, loosest to tightest binding:
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ('||' and_expr)*
//! and_expr   := not_expr ('&&' not_expr)*
//! not_expr   := '!' not_expr | comparison
//! comparison := bitor (cmp_op bitor)*
//! cmp_op     := '==' | '!=' | '<=' | '>=' | '<' | '>'
//! bitor      := bitxor ('|' bitxor)*
//! bitxor     := bitand ('^' bitand)*
//! bitand     := shift ('&' shift)*
//! shift      := additive (('<<' | '>>') additive)*
//! additive   := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '//' | '/' | '%') unary)*
//! unary      := ('-' | '+') unary | power
//! power      := atom ('**' unary)?
//! atom       := '(' expr ')' | bool | call | column | number
//! call       := ident '(' (arg (',' arg)*)? ')'
//! arg        := ident '=' expr | expr
//! ```
//!
//! The word keywords `AND`/`OR`/`NOT` (any case) are rewritten to
//! `&&`/`||`/`!` by [`normalize`] before parsing.

use crate::ast::*;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};
use thiserror::Error;

/// Parse errors
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Empty expression")]
    Empty,

    #[error("Unexpected input at offset {offset}: '{remainder}'")]
    Trailing { offset: usize, remainder: String },

    #[error("Invalid syntax in '{input}': {message}")]
    Syntax { input: String, message: String },
}

/// Rewrite word keywords and collapse redundant whitespace
///
/// Whole-word, case-insensitive `AND`/`OR`/`NOT` become `&&`/`||`/`!`;
/// identifiers that merely contain those words (`android`, `nothing`) are
/// untouched.
pub fn normalize(input: &str) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();
    let mut out = String::with_capacity(collapsed.len());

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            match word.to_ascii_lowercase().as_str() {
                "and" => out.push_str("&&"),
                "or" => out.push_str("||"),
                "not" => out.push('!'),
                _ => out.push_str(&word),
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Parse a filter expression from (raw or normalized) source text
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let normalized = normalize(input);
    if normalized.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    match expr(normalized.as_str()) {
        Ok(("", result)) => Ok(result),
        Ok((remaining, _)) => Err(ParseError::Trailing {
            offset: normalized.len() - remaining.len(),
            remainder: remaining.trim().to_string(),
        }),
        Err(e) => {
            let message = format!("{:?}", e);
            Err(ParseError::Syntax {
                input: normalized,
                message,
            })
        }
    }
}

/// Parse whitespace around an inner parser
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// A single-char operator that must not be followed by any of `not_next`
fn lone_op<'a>(c: char, not_next: &'static [char]) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    move |input: &'a str| {
        let (rest, parsed) = char(c)(input)?;
        if rest.starts_with(not_next) {
            Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Char,
            )))
        } else {
            Ok((rest, parsed))
        }
    }
}

/// Parse an expression (entry point)
fn expr(input: &str) -> IResult<&str, Expr> {
    or_expr(input)
}

/// Parse OR expressions
fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("||")), and_expr))(input)?;

    if rest.is_empty() {
        return Ok((input, first));
    }
    let mut operands = vec![first];
    operands.extend(rest);
    Ok((
        input,
        Expr::Bool {
            op: BoolOp::Or,
            operands,
        },
    ))
}

/// Parse AND expressions
fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("&&")), not_expr))(input)?;

    if rest.is_empty() {
        return Ok((input, first));
    }
    let mut operands = vec![first];
    operands.extend(rest);
    Ok((
        input,
        Expr::Bool {
            op: BoolOp::And,
            operands,
        },
    ))
}

/// Parse NOT expressions ('!' but not '!=')
fn not_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(lone_op('!', &['='])), not_expr), Expr::not),
        comparison,
    ))(input)
}

/// Parse a (possibly chained) comparison
fn comparison(input: &str) -> IResult<&str, Expr> {
    let (input, first) = bitor_expr(input)?;
    let (input, rest) = many0(pair(ws(compare_op), bitor_expr))(input)?;

    if rest.is_empty() {
        return Ok((input, first));
    }
    let mut ops = Vec::with_capacity(rest.len());
    let mut operands = vec![first];
    for (op, operand) in rest {
        ops.push(op);
        operands.push(operand);
    }
    Ok((input, Expr::Compare { ops, operands }))
}

/// Parse a comparison operator
fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Lt, lone_op('<', &['<', '='])),
        value(CompareOp::Gt, lone_op('>', &['>', '='])),
    ))(input)
}

/// Parse bitwise OR ('|' but not '||')
fn bitor_expr(input: &str) -> IResult<&str, Expr> {
    binary_chain(input, bitxor_expr, |i| {
        value(BinaryOp::BitOr, lone_op('|', &['|']))(i)
    })
}

/// Parse bitwise XOR
fn bitxor_expr(input: &str) -> IResult<&str, Expr> {
    binary_chain(input, bitand_expr, |i| value(BinaryOp::BitXor, char('^'))(i))
}

/// Parse bitwise AND ('&' but not '&&')
fn bitand_expr(input: &str) -> IResult<&str, Expr> {
    binary_chain(input, shift_expr, |i| {
        value(BinaryOp::BitAnd, lone_op('&', &['&']))(i)
    })
}

/// Parse shift expressions
fn shift_expr(input: &str) -> IResult<&str, Expr> {
    binary_chain(input, additive_expr, |i| {
        alt((
            value(BinaryOp::Shl, tag("<<")),
            value(BinaryOp::Shr, tag(">>")),
        ))(i)
    })
}

/// Parse additive expressions
fn additive_expr(input: &str) -> IResult<&str, Expr> {
    binary_chain(input, multiplicative_expr, |i| {
        alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))(i)
    })
}

/// Parse multiplicative expressions ('*' but not '**')
fn multiplicative_expr(input: &str) -> IResult<&str, Expr> {
    binary_chain(input, unary_expr, |i| {
        alt((
            value(BinaryOp::FloorDiv, tag("//")),
            value(BinaryOp::Mul, lone_op('*', &['*'])),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Mod, char('%')),
        ))(i)
    })
}

/// Left-fold a chain of binary operators at one precedence level
fn binary_chain<'a>(
    input: &'a str,
    mut operand: impl FnMut(&'a str) -> IResult<&'a str, Expr>,
    mut op: impl FnMut(&'a str) -> IResult<&'a str, BinaryOp>,
) -> IResult<&'a str, Expr> {
    let (input, first) = operand(input)?;
    let (input, rest) = many0(pair(ws(&mut op), &mut operand))(input)?;

    let result = rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    });
    Ok((input, result))
}

/// Parse unary sign expressions
fn unary_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |e| Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(e),
        }),
        map(preceded(ws(char('+')), unary_expr), |e| Expr::Unary {
            op: UnaryOp::Pos,
            operand: Box::new(e),
        }),
        power_expr,
    ))(input)
}

/// Parse power expressions; '**' is right-associative and binds tighter
/// than a leading sign
fn power_expr(input: &str) -> IResult<&str, Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(ws(tag("**")), unary_expr))(input)?;

    match exponent {
        Some(exp) => Ok((
            input,
            Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exp),
            },
        )),
        None => Ok((input, base)),
    }
}

/// Parse atomic expressions
fn atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        // Parenthesized expression
        delimited(char('('), expr, ws(char(')'))),
        // Boolean literal (whole word)
        bool_literal,
        // Function call
        call,
        // Column reference
        map(identifier, |s: &str| Expr::Column(s.to_string())),
        // Numeric literal
        map(double, Expr::number),
    )))(input)
}

/// Parse a boolean literal, case-insensitive whole word
fn bool_literal(input: &str) -> IResult<&str, Expr> {
    let (rest, word) = identifier(input)?;
    match word.to_ascii_lowercase().as_str() {
        "true" => Ok((rest, Expr::Literal(Literal::Bool(true)))),
        "false" => Ok((rest, Expr::Literal(Literal::Bool(false)))),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parse an identifier (starts with letter or underscore, followed by
/// alphanumeric or underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse a function call with positional and keyword arguments
fn call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, items) = delimited(
        char('('),
        separated_list0(ws(char(',')), call_arg),
        ws(char(')')),
    )(input)?;

    let mut args = Vec::new();
    let mut kwargs = Vec::new();
    for (kw, value) in items {
        match kw {
            Some(name) => kwargs.push((name, value)),
            None => args.push(value),
        }
    }
    Ok((
        input,
        Expr::Call {
            name: name.to_string(),
            args,
            kwargs,
        },
    ))
}

/// Parse one call argument, keyword (`name=expr`) or positional
fn call_arg(input: &str) -> IResult<&str, (Option<String>, Expr)> {
    alt((
        map(kwarg, |(name, value)| (Some(name), value)),
        map(expr, |e| (None, e)),
    ))(input)
}

/// Parse a keyword argument ('=' but not '==')
fn kwarg(input: &str) -> IResult<&str, (String, Expr)> {
    let (input, name) = ws(identifier)(input)?;
    let (input, _) = lone_op('=', &['='])(input)?;
    let (input, value) = expr(input)?;
    Ok((input, (name.to_string(), value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keywords() {
        assert_eq!(normalize("a AND b"), "a && b");
        assert_eq!(normalize("a or b"), "a || b");
        assert_eq!(normalize("Not a"), "! a");
        assert_eq!(normalize("  a   AND\t b "), "a && b");
    }

    #[test]
    fn test_normalize_leaves_identifiers_alone() {
        assert_eq!(normalize("android > nothing"), "android > nothing");
        assert_eq!(normalize("orb AND anderson"), "orb && anderson");
    }

    #[test]
    fn test_parse_simple_comparison() {
        let result = parse_expression("x > 0").unwrap();
        match result {
            Expr::Compare { ops, operands } => {
                assert_eq!(ops, vec![CompareOp::Gt]);
                assert!(matches!(operands[0], Expr::Column(ref c) if c == "x"));
                assert!(matches!(operands[1], Expr::Literal(Literal::Number(n)) if n == 0.0));
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chained_comparison() {
        let result = parse_expression("0 < x < 10").unwrap();
        match result {
            Expr::Compare { ops, operands } => {
                assert_eq!(ops, vec![CompareOp::Lt, CompareOp::Lt]);
                assert_eq!(operands.len(), 3);
            }
            other => panic!("Expected chained comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_keyword_booleans() {
        let result = parse_expression("x > 0 AND y < 10").unwrap();
        assert!(matches!(result, Expr::Bool { op: BoolOp::And, .. }));

        let result = parse_expression("x > 0 or y < 10").unwrap();
        assert!(matches!(result, Expr::Bool { op: BoolOp::Or, .. }));

        let result = parse_expression("NOT (x > 0)").unwrap();
        assert!(matches!(
            result,
            Expr::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_precedence_arithmetic_over_comparison() {
        // area > mean + 2 * std  parses as  area > (mean + (2 * std))
        let result = parse_expression("a > b + 2 * c").unwrap();
        match result {
            Expr::Compare { operands, .. } => {
                assert!(matches!(
                    operands[1],
                    Expr::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("Expected comparison at root, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_power_right_associative() {
        let result = parse_expression("2 ** 3 ** 2").unwrap();
        match result {
            Expr::Binary {
                op: BinaryOp::Pow,
                rhs,
                ..
            } => {
                assert!(matches!(
                    *rhs,
                    Expr::Binary {
                        op: BinaryOp::Pow,
                        ..
                    }
                ));
            }
            other => panic!("Expected power at root, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_floor_div_and_mod() {
        assert!(matches!(
            parse_expression("a // 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::FloorDiv,
                ..
            }
        ));
        assert!(matches!(
            parse_expression("a % 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Mod,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_bitwise_and_shift() {
        assert!(matches!(
            parse_expression("a & 1").unwrap(),
            Expr::Binary {
                op: BinaryOp::BitAnd,
                ..
            }
        ));
        assert!(matches!(
            parse_expression("a << 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Shl,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_function_with_kwarg() {
        let result = parse_expression("percentile(intensity, q=75)").unwrap();
        match result {
            Expr::Call { name, args, kwargs } => {
                assert_eq!(name, "percentile");
                assert_eq!(args.len(), 1);
                assert_eq!(kwargs.len(), 1);
                assert_eq!(kwargs[0].0, "q");
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_call() {
        let result = parse_expression("area > mean(area) + 2 * std(area)").unwrap();
        assert!(matches!(result, Expr::Compare { .. }));
    }

    #[test]
    fn test_parse_bare_literal() {
        let result = parse_expression("42").unwrap();
        assert!(matches!(result, Expr::Literal(Literal::Number(n)) if n == 42.0));
    }

    #[test]
    fn test_parse_bool_literal() {
        assert!(matches!(
            parse_expression("true").unwrap(),
            Expr::Literal(Literal::Bool(true))
        ));
        assert!(matches!(
            parse_expression("FALSE").unwrap(),
            Expr::Literal(Literal::Bool(false))
        ));
    }

    #[test]
    fn test_parse_scientific_notation() {
        let result = parse_expression("mass > 1e10").unwrap();
        match result {
            Expr::Compare { operands, .. } => {
                assert!(matches!(operands[1], Expr::Literal(Literal::Number(n)) if n == 1e10));
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(parse_expression(""), Err(ParseError::Empty)));
        assert!(matches!(parse_expression("   "), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parse_unbalanced_parens_is_error() {
        assert!(parse_expression("(a > 1").is_err());
        assert!(parse_expression("a > 1)").is_err());
    }

    #[test]
    fn test_parse_trailing_garbage_is_error() {
        assert!(matches!(
            parse_expression("a > 1 $$"),
            Err(ParseError::Trailing { .. })
        ));
    }

    #[test]
    fn test_parse_typical_filter_expressions() {
        for text in [
            "area > mean(area)",
            "aspect_ratio < 1.5 AND intensity > percentile(intensity, 75)",
            "NOT (intensity < 100 OR area < 50)",
            "circularity > 0.8 OR area > 1000",
        ] {
            assert!(parse_expression(text).is_ok(), "{}", text);
        }
    }
}
