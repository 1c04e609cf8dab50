//! End-to-end scenarios through the engine facade

use std::collections::HashMap;

use cellsift_expr::{engine, ExpressionError, ResultKind, Value};

fn columns(pairs: &[(&str, &[f64])]) -> HashMap<String, Vec<f64>> {
    pairs
        .iter()
        .map(|(name, data)| (name.to_string(), data.to_vec()))
        .collect()
}

#[test]
fn comparison_yields_full_length_mask() {
    let data = columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]);
    let result = engine::evaluate("x > 3", &data);
    assert_eq!(result.kind, Some(ResultKind::Boolean));
    assert_eq!(
        result.value,
        Some(Value::Mask(vec![false, false, false, true, true]))
    );
}

#[test]
fn arithmetic_yields_numeric_array() {
    let data = columns(&[("area", &[10.0, 20.0, 30.0])]);
    let result = engine::evaluate("area + 10", &data);
    assert_eq!(result.kind, Some(ResultKind::Array));
    assert_eq!(result.value, Some(Value::Array(vec![20.0, 30.0, 40.0])));
}

#[test]
fn bare_literal_yields_scalar() {
    let data = columns(&[]);
    let result = engine::evaluate("42", &data);
    assert_eq!(result.kind, Some(ResultKind::Numeric));
    assert_eq!(result.value, Some(Value::Scalar(42.0)));
}

#[test]
fn empty_expression_is_parse_error() {
    let data = columns(&[]);
    let result = engine::evaluate("", &data);
    assert!(matches!(result.error, Some(ExpressionError::Parse(_))));

    let result = engine::evaluate("   ", &data);
    assert!(matches!(result.error, Some(ExpressionError::Parse(_))));
}

#[test]
fn import_construct_is_security_error() {
    let data = columns(&[("a", &[1.0])]);
    for text in [
        "__import__('os')",
        "import os",
        "a.b > 1",
        "lambda a: a",
        "eval(a)",
        "system(a) > 0",
    ] {
        let result = engine::evaluate(text, &data);
        assert!(
            matches!(result.error, Some(ExpressionError::Security(_))),
            "{} should be rejected",
            text
        );
        assert!(result.value.is_none(), "{} must not execute", text);
    }
}

#[test]
fn percentile_out_of_range_is_evaluation_error() {
    let data = columns(&[("a", &[1.0, 2.0, 3.0])]);
    let result = engine::evaluate("percentile(a, 150)", &data);
    assert!(matches!(result.error, Some(ExpressionError::Evaluation(_))));

    let result = engine::evaluate("percentile(a, -1)", &data);
    assert!(matches!(result.error, Some(ExpressionError::Evaluation(_))));
}

#[test]
fn percentile_boundaries_match_min_max() {
    let data = columns(&[("a", &[3.0, 1.0, 2.0])]);
    let low = engine::evaluate("percentile(a, 0) == min(a)", &data);
    assert_eq!(low.value, Some(Value::Bool(true)));
    let high = engine::evaluate("percentile(a, 100) == max(a)", &data);
    assert_eq!(high.value, Some(Value::Bool(true)));
}

#[test]
fn unknown_column_is_evaluation_error() {
    let data = columns(&[("a", &[1.0])]);
    let result = engine::evaluate("unknown_col > 5", &data);
    match result.error {
        Some(ExpressionError::Evaluation(e)) => {
            assert!(e.to_string().contains("Unknown variable"))
        }
        other => panic!("Expected evaluation error, got {:?}", other),
    }
}

#[test]
fn nan_tolerant_aggregates() {
    let data = columns(&[("v", &[1.0, f64::NAN, 3.0, f64::NAN, 5.0])]);
    let result = engine::evaluate("count(v)", &data);
    assert_eq!(result.value, Some(Value::Scalar(3.0)));

    let result = engine::evaluate("mean(v)", &data);
    assert_eq!(result.value, Some(Value::Scalar(3.0)));

    let result = engine::evaluate("sum(v)", &data);
    assert_eq!(result.value, Some(Value::Scalar(9.0)));
}

#[test]
fn dependencies_are_deduplicated() {
    let data = columns(&[("area", &[10.0, 20.0, 30.0])]);
    let result = engine::evaluate("area > mean(area)", &data);
    assert_eq!(result.column_dependencies, vec!["area".to_string()]);
}

#[test]
fn evaluate_is_idempotent() {
    let data = columns(&[("x", &[1.0, 2.0, 3.0])]);
    let first = engine::evaluate("x > mean(x)", &data);
    let second = engine::evaluate("x > mean(x)", &data);
    assert_eq!(first.value, second.value);
    assert_eq!(first.kind, second.kind);
    assert_eq!(first.column_dependencies, second.column_dependencies);
}

#[test]
fn typical_filter_expressions_produce_masks() {
    let data = columns(&[
        ("area", &[40.0, 600.0, 1200.0]),
        ("intensity", &[90.0, 180.0, 260.0]),
        ("aspect_ratio", &[1.1, 1.7, 1.3]),
        ("circularity", &[0.9, 0.4, 0.7]),
    ]);
    for text in [
        "area > mean(area)",
        "aspect_ratio < 1.5 AND intensity > percentile(intensity, 75)",
        "NOT (intensity < 100 OR area < 50)",
        "circularity > 0.8 OR area > 1000",
    ] {
        let result = engine::evaluate(text, &data);
        assert_eq!(
            result.kind,
            Some(ResultKind::Boolean),
            "{} should produce a mask: {:?}",
            text,
            result.error_message()
        );
        match result.value {
            Some(Value::Mask(mask)) => assert_eq!(mask.len(), 3),
            other => panic!("{} produced {:?}", text, other),
        }
    }
}

#[test]
fn not_of_or_combination() {
    let data = columns(&[
        ("area", &[40.0, 600.0, 1200.0]),
        ("intensity", &[90.0, 180.0, 260.0]),
    ]);
    // intensity < 100: [T, F, F]; area < 50: [T, F, F]; NOT(OR) -> [F, T, T]
    let result = engine::evaluate("NOT (intensity < 100 OR area < 50)", &data);
    assert_eq!(result.value, Some(Value::Mask(vec![false, true, true])));
}

#[test]
fn out_of_range_shifts_flow_through_as_nan() {
    let data = columns(&[("x", &[1.0, 2.0])]);
    for text in ["x << 70", "x >> -1", "x << -3", "1 << 1000"] {
        let result = engine::evaluate(text, &data);
        assert!(result.is_ok(), "{} should not fail: {:?}", text, result.error_message());
        match result.value {
            Some(Value::Array(values)) => assert!(values.iter().all(|v| v.is_nan()), "{}", text),
            Some(Value::Scalar(value)) => assert!(value.is_nan(), "{}", text),
            other => panic!("{} produced {:?}", text, other),
        }
    }
}

#[test]
fn runaway_operator_chains_are_rejected() {
    let data = columns(&[("x", &[1.0])]);
    let signs = format!("{}1", "-".repeat(4000));
    let result = engine::evaluate(&signs, &data);
    assert!(matches!(result.error, Some(ExpressionError::Security(_))));

    let nots = format!("{}x > 0", "!".repeat(3000));
    let result = engine::evaluate(&nots, &data);
    assert!(matches!(result.error, Some(ExpressionError::Security(_))));

    let powers = format!("{}2", "2**".repeat(1000));
    let result = engine::evaluate(&powers, &data);
    assert!(matches!(result.error, Some(ExpressionError::Security(_))));
}

#[test]
fn hostile_inputs_never_panic() {
    let data = columns(&[("a", &[1.0])]);
    for text in [
        ")))(((",
        "a >>> 1",
        "a ** ** 2",
        "mean()",
        "mean(a, b, c)",
        "percentile(a)",
        "@#$%^",
        "a = 5",
        "1 +",
        "((a)",
        "0x1f",
    ] {
        let result = engine::evaluate(text, &data);
        assert!(result.error.is_some(), "{} should fail cleanly", text);
    }
}
