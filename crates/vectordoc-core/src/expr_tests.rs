//! Tests for `expr` module

use serde_json::json;

use super::distance::DistanceMetric;
use super::document::Document;
use super::error::{Error, Result};
use super::expr::*;
use super::value::Value;

fn registry() -> OperatorRegistry {
    OperatorRegistry::with_builtins(DistanceMetric::Cosine)
}

fn doc(json: serde_json::Value) -> Document {
    Document::from_json(1, json).expect("object body")
}

fn eval(expr: &Expr, doc: &Document) -> Result<Option<Value>> {
    let registry = registry();
    let params = Params::new();
    let ctx = CompileContext::new(&registry, &params, 4096);
    ctx.compile(expr)?.eval_owned(doc)
}

fn eval_with(expr: &Expr, doc: &Document, params: &Params) -> Result<Option<Value>> {
    let registry = registry();
    let ctx = CompileContext::new(&registry, params, 4096);
    ctx.compile(expr)?.eval_owned(doc)
}

// -------------------------------------------------------------------------
// Three-valued logic
// -------------------------------------------------------------------------

#[test]
fn test_missing_field_is_undefined() {
    let d = doc(json!({"a": 1}));

    assert_eq!(eval(&Expr::field("b"), &d).expect("eval"), None);
    assert_eq!(eval(&Expr::field("b").eq(1_i64), &d).expect("eval"), None);
}

#[test]
fn test_and_or_truth_tables() {
    let d = doc(json!({"t": true, "f": false}));
    let t = || Expr::field("t");
    let f = || Expr::field("f");
    let u = || Expr::field("missing");

    assert_eq!(eval(&t().and(u()), &d).expect("eval"), None);
    assert_eq!(eval(&f().and(u()), &d).expect("eval"), Some(Value::Bool(false)));
    assert_eq!(eval(&u().and(f()), &d).expect("eval"), Some(Value::Bool(false)));
    assert_eq!(eval(&t().or(u()), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&u().or(t()), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&f().or(u()), &d).expect("eval"), None);
    assert_eq!(eval(&u().not(), &d).expect("eval"), None);
    assert_eq!(eval(&f().not(), &d).expect("eval"), Some(Value::Bool(true)));
}

#[test]
fn test_and_short_circuits_errors() {
    // Right side would fail with a dimension mismatch if evaluated.
    let d = doc(json!({"f": false, "v": [1, 0]}));
    let failing = Expr::distance("v", vec![1.0_f32, 0.0, 0.0]).lt(1.0);

    let result = eval(&Expr::field("f").and(failing), &d).expect("short-circuit");

    assert_eq!(result, Some(Value::Bool(false)));
}

#[test]
fn test_is_null_treats_undefined_as_null() {
    let d = doc(json!({"n": null, "x": 1}));

    assert_eq!(eval(&Expr::field("n").is_null(), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&Expr::field("missing").is_null(), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&Expr::field("x").is_null(), &d).expect("eval"), Some(Value::Bool(false)));
    assert_eq!(eval(&Expr::field("x").is_not_null(), &d).expect("eval"), Some(Value::Bool(true)));
}

#[test]
fn test_comparisons() {
    let d = doc(json!({"n": 5, "s": "abc"}));

    assert_eq!(eval(&Expr::field("n").gt(4.5), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&Expr::field("n").lte(5_i64), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&Expr::field("n").not_eq(5_i64), &d).expect("eval"), Some(Value::Bool(false)));
    assert_eq!(eval(&Expr::field("s").lt("abd"), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&Expr::field("s").gt(1_i64), &d).expect("eval"), None);
}

#[test]
fn test_neg_and_id() {
    let d = Document::new(42).with("n", 3_i64);

    assert_eq!(
        eval(&Expr::Neg(Box::new(Expr::field("n"))), &d).expect("eval"),
        Some(Value::Int(-3))
    );
    assert_eq!(eval(&Expr::field("_id"), &d).expect("eval"), Some(Value::Int(42)));
}

#[test]
fn test_matches_only_on_true() {
    let registry = registry();
    let params = Params::new();
    let ctx = CompileContext::new(&registry, &params, 4096);
    let d = doc(json!({"n": 1}));

    let hit = ctx.compile(&Expr::field("n").eq(1_i64)).expect("compile");
    let undefined = ctx.compile(&Expr::field("zz").eq(1_i64)).expect("compile");
    let not_bool = ctx.compile(&Expr::field("n")).expect("compile");

    assert!(hit.matches(&d).expect("eval"));
    assert!(!undefined.matches(&d).expect("eval"));
    assert!(!not_bool.matches(&d).expect("eval"));
}

// -------------------------------------------------------------------------
// Parameters and registry
// -------------------------------------------------------------------------

#[test]
fn test_parameters_are_substituted() {
    let d = doc(json!({"n": 3}));
    let mut params = Params::new();
    params.insert("min".to_string(), Value::Int(2));

    let result = eval_with(&Expr::field("n").gte(Expr::param("min")), &d, &params).expect("eval");

    assert_eq!(result, Some(Value::Bool(true)));
}

#[test]
fn test_missing_parameter_fails_at_compile() {
    let d = doc(json!({}));

    let err = eval(&Expr::field("n").eq(Expr::param("nope")), &d).expect_err("unbound");

    assert_eq!(err, Error::MissingParameter("nope".to_string()));
}

#[test]
fn test_unknown_operator() {
    let d = doc(json!({}));

    let err = eval(&Expr::call("frobnicate", vec![Expr::field("a")]), &d).expect_err("unknown");

    assert_eq!(
        err,
        Error::UnknownOperator {
            name: "FROBNICATE".to_string(),
            arity: 1
        }
    );
}

#[test]
fn test_registry_dispatch_is_case_insensitive_and_by_arity() {
    let registry = registry();

    assert!(registry.resolve("distance", 2).is_ok());
    assert!(registry.resolve("Cosine_Distance", 2).is_ok());
    assert!(registry.resolve("NEAR", 3).is_ok());
    assert!(registry.resolve("near", 4).is_ok());
    assert!(registry.resolve("DISTANCE", 3).is_ok());
    assert!(matches!(
        registry.resolve("DISTANCE", 4),
        Err(Error::UnknownOperator { arity: 4, .. })
    ));
    assert!(matches!(
        registry.resolve("COSINE_DISTANCE", 3),
        Err(Error::UnknownOperator { arity: 3, .. })
    ));
    assert!(registry.contains("dimension"));
    assert_eq!(registry.len(), 8);
}

#[derive(Debug)]
struct Double;

impl NamedOperator for Double {
    fn name(&self) -> &str {
        "double"
    }

    fn arity(&self) -> usize {
        1
    }

    fn call(&self, args: &[Option<&Value>]) -> Result<Option<Value>> {
        Ok(args
            .first()
            .copied()
            .flatten()
            .and_then(Value::as_f64)
            .map(|n| Value::Double(n * 2.0)))
    }
}

#[test]
fn test_custom_operator_registration() {
    let mut registry = registry();
    registry.register(Double);
    let params = Params::new();
    let ctx = CompileContext::new(&registry, &params, 4096);
    let d = doc(json!({"n": 4}));

    let compiled = ctx
        .compile(&Expr::call("DOUBLE", vec![Expr::field("n")]))
        .expect("compile");

    assert_eq!(compiled.eval_owned(&d).expect("eval"), Some(Value::Double(8.0)));
}

#[test]
fn test_register_replaces_same_name_and_arity() {
    let mut registry = OperatorRegistry::new();
    registry.register(DistanceOperator::new("SCORE", DistanceMetric::Cosine));
    registry.register(DistanceOperator::new("score", DistanceMetric::Euclidean));

    assert_eq!(registry.len(), 1);
}

// -------------------------------------------------------------------------
// Vector operators
// -------------------------------------------------------------------------

#[test]
fn test_distance_operator_values() {
    let d = doc(json!({"v": [1, 1]}));

    let cos = eval(&Expr::distance("v", vec![1.0_f32, 0.0]), &d)
        .expect("eval")
        .and_then(|v| v.as_f64())
        .expect("defined");
    let l2 = eval(
        &Expr::call(
            "EUCLIDEAN_DISTANCE",
            vec![Expr::field("v"), Expr::from(vec![1.0_f32, 0.0])],
        ),
        &d,
    )
    .expect("eval")
    .and_then(|v| v.as_f64())
    .expect("defined");

    assert!((cos - 0.292_893_2).abs() < 1e-6);
    assert!((l2 - 1.0).abs() < 1e-6);
}

#[test]
fn test_distance_on_absent_or_non_vector_field_is_undefined() {
    let d = doc(json!({"word": "hello"}));

    assert_eq!(eval(&Expr::distance("missing", vec![1.0_f32]), &d).expect("eval"), None);
    assert_eq!(eval(&Expr::distance("word", vec![1.0_f32]), &d).expect("eval"), None);
    assert_eq!(
        eval(&Expr::distance("missing", vec![1.0_f32]).lt(0.5), &d).expect("eval"),
        None
    );
}

#[test]
fn test_distance_dimension_mismatch_is_error() {
    let d = doc(json!({"v": [1, 0]}));

    let err = eval(&Expr::distance("v", vec![1.0_f32, 0.0, 0.0]), &d).expect_err("mismatch");

    assert_eq!(
        err,
        Error::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn test_bad_target_fails_at_compile() {
    let d = doc(json!({"v": [1, 0]}));

    let empty = eval(&Expr::distance("v", Value::Array(vec![])), &d).expect_err("empty");
    let text = eval(&Expr::distance("v", "not a vector"), &d).expect_err("text");

    assert_eq!(empty, Error::EmptyVector);
    assert!(matches!(text, Error::TypeMismatch(_)));
}

#[test]
fn test_target_above_dimension_limit_is_rejected() {
    let registry = registry();
    let params = Params::new();
    let ctx = CompileContext::new(&registry, &params, 2);

    let err = ctx
        .compile(&Expr::distance("v", vec![1.0_f32, 0.0, 0.0]))
        .expect_err("too large");

    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_prepare_casts_target_once() {
    let registry = registry();
    let mut params = Params::new();
    params.insert("q".to_string(), Value::from("[1, 0]"));
    let ctx = CompileContext::new(&registry, &params, 4096);

    let compiled = ctx
        .compile(&Expr::distance("v", Expr::param("q")))
        .expect("compile");

    let CompiledExpr::Call { args, .. } = compiled else {
        panic!("expected a call");
    };
    assert!(matches!(&args[1], CompiledExpr::Literal(Value::Vector(_))));
}

#[test]
fn test_near_operator() {
    let d = doc(json!({"v": [1, 1]}));
    let near = |max: f64| {
        Expr::call(
            "NEAR",
            vec![Expr::field("v"), Expr::from(vec![1.0_f32, 0.0]), Expr::from(max)],
        )
    };

    assert_eq!(eval(&near(0.3), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&near(0.25), &d).expect("eval"), Some(Value::Bool(false)));
}

#[test]
fn test_near_rejects_non_numeric_bound() {
    let d = doc(json!({"v": [1, 1]}));
    let expr = Expr::call(
        "NEAR",
        vec![Expr::field("v"), Expr::from(vec![1.0_f32, 0.0]), Expr::from("far")],
    );

    assert!(matches!(eval(&expr, &d), Err(Error::TypeMismatch(_))));
}

#[test]
fn test_near_with_metric_argument() {
    let d = doc(json!({"v": [1, 1]}));
    let near = |max: f64, metric: &str| {
        Expr::call(
            "NEAR",
            vec![
                Expr::field("v"),
                Expr::from(vec![1.0_f32, 0.0]),
                Expr::from(max),
                Expr::from(metric),
            ],
        )
    };

    // cosine distance is about 0.293, euclidean distance is 1.0
    assert_eq!(eval(&near(0.3, "cosine"), &d).expect("eval"), Some(Value::Bool(true)));
    assert_eq!(eval(&near(0.3, "l2"), &d).expect("eval"), Some(Value::Bool(false)));
    assert_eq!(eval(&near(1.0, "L2"), &d).expect("eval"), Some(Value::Bool(true)));
}

#[test]
fn test_metric_argument_is_checked_when_bound() {
    let d = doc(json!({"v": [1, 1]}));
    let unknown = Expr::call(
        "NEAR",
        vec![Expr::field("v"), Expr::from(vec![1.0_f32]), Expr::from(0.1), Expr::from("hamming")],
    );
    let not_text = Expr::call(
        "DISTANCE",
        vec![Expr::field("v"), Expr::from(vec![1.0_f32]), Expr::from(2_i64)],
    );

    assert!(matches!(eval(&unknown, &d), Err(Error::InvalidArgument(_))));
    assert!(matches!(eval(&not_text, &d), Err(Error::TypeMismatch(_))));
}

#[test]
fn test_distance_with_metric_argument() {
    let d = doc(json!({"v": [3, 4], "m": "dot"}));
    let distance = |metric: Expr| {
        Expr::call("DISTANCE", vec![Expr::field("v"), Expr::from(vec![1.0_f32, 0.0]), metric])
    };

    let euclidean = eval(&distance(Expr::from("euclidean")), &d)
        .expect("eval")
        .and_then(|v| v.as_f64())
        .expect("number");
    assert!((euclidean - 20.0_f64.sqrt()).abs() < 1e-5);
    assert_eq!(
        eval(&distance(Expr::field("m")), &d).expect("eval"),
        Some(Value::Double(-3.0))
    );
    assert_eq!(eval(&distance(Expr::field("missing")), &d).expect("eval"), None);
}

#[test]
fn test_dimension_operator() {
    let d = doc(json!({"v": [1, 2, 3], "s": "x"}));

    assert_eq!(
        eval(&Expr::call("DIMENSION", vec![Expr::field("v")]), &d).expect("eval"),
        Some(Value::Int(3))
    );
    assert_eq!(
        eval(&Expr::call("dimension", vec![Expr::field("s")]), &d).expect("eval"),
        None
    );
}

#[test]
fn test_conjunct_helpers() {
    let a = Expr::field("a").eq(1_i64);
    let b = Expr::field("b").eq(2_i64);
    let c = Expr::call("NEAR", vec![]);

    let parts = a.clone().and(b.clone()).and(c.clone()).into_conjuncts();

    assert_eq!(parts, vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(Expr::conjunction(vec![a.clone(), b.clone()]), Some(a.and(b)));
    assert_eq!(Expr::conjunction(vec![]), None);
    assert!(c.contains_call("near"));
}
