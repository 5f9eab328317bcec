// tests/eval_tests.rs
//
// Parse-then-evaluate round trips: the parsed tree applied to concrete
// values must agree with the directly-written Rust equivalent.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sieve_lang::parser::{parse_lambda, parse_predicate};
use sieve_lang::{
    EnumDescriptor, EvalError, Evaluator, IntTy, Parameter, Ty, TypeDescriptor, TypeRegistry,
    Value,
};

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with_object(
            TypeDescriptor::new("Product")
                .with_property("Name", Ty::Str)
                .with_property("Stock", Ty::Int(IntTy::I32)),
        )
        .with_enum(
            EnumDescriptor::new("Severity", IntTy::I32)
                .with_member("Low", 0)
                .with_member("Medium", 1)
                .with_member("High", 2),
        )
}

fn eval_predicate(text: &str, it: Ty, arg: Value) -> bool {
    let lambda = parse_predicate(text, &registry(), it).expect("parse failure");
    let result = Evaluator::new()
        .eval_lambda(&lambda, &[arg])
        .expect("eval failure");
    result == Value::Bool(true)
}

fn eval_expr(text: &str, it: Ty, arg: Value) -> Value {
    let lambda = parse_lambda(
        text,
        &registry(),
        vec![Parameter::it(it)],
        None,
        Vec::new(),
    )
    .expect("parse failure");
    Evaluator::new()
        .eval_lambda(&lambda, &[arg])
        .expect("eval failure")
}

fn product(name: &str, stock: i64) -> Value {
    let ty = Arc::new(
        TypeDescriptor::new("Product")
            .with_property("Name", Ty::Str)
            .with_property("Stock", Ty::Int(IntTy::I32)),
    );
    let mut fields = HashMap::new();
    fields.insert("Name".to_string(), Value::Str(name.to_string()));
    fields.insert("Stock".to_string(), Value::Int(stock));
    Value::Object { ty, fields }
}

fn map_product(name: &str, stock: i64) -> Value {
    let mut fields = HashMap::new();
    fields.insert("Name".to_string(), Value::Str(name.to_string()));
    fields.insert("Stock".to_string(), Value::Int(stock));
    Value::Map(fields)
}

// ============================================================================
// Predicate agreement
// ============================================================================

#[test]
fn test_length_predicate_agrees_with_direct_filter() {
    let lambda = parse_predicate("it.Length == 4", &registry(), Ty::Str).unwrap();
    let mut evaluator = Evaluator::new();
    let values = ["bar", "dog", "food", "water"];
    let kept: Vec<&str> = values
        .iter()
        .filter(|v| {
            evaluator
                .eval_lambda(&lambda, &[Value::Str(v.to_string())])
                .unwrap()
                == Value::Bool(true)
        })
        .copied()
        .collect();
    assert_eq!(kept, vec!["food"]);
}

#[test]
fn test_arithmetic_predicate_agrees_over_a_domain() {
    let lambda = parse_predicate("it * 2 + 1 > 10", &registry(), Ty::Int(IntTy::I32)).unwrap();
    let mut evaluator = Evaluator::new();
    for n in -20i64..20 {
        let expected = n * 2 + 1 > 10;
        let got = evaluator.eval_lambda(&lambda, &[Value::Int(n)]).unwrap();
        assert_eq!(got, Value::Bool(expected), "disagreement at {}", n);
    }
}

// ============================================================================
// Enum against integral variables
// ============================================================================

#[test]
fn test_enum_equality_on_matching_width() {
    assert!(eval_predicate(
        "it == Severity.High",
        Ty::Int(IntTy::I32),
        Value::Int(2)
    ));
    assert!(!eval_predicate(
        "it == Severity.High",
        Ty::Int(IntTy::I32),
        Value::Int(1)
    ));
}

#[test]
fn test_enum_equality_on_wider_variable() {
    assert!(eval_predicate(
        "it == Severity.Medium",
        Ty::Int(IntTy::I64),
        Value::Int(1)
    ));
    assert!(!eval_predicate(
        "it == Severity.Medium",
        Ty::Int(IntTy::I64),
        Value::Int(2)
    ));
}

#[test]
fn test_enum_through_explicit_conversion() {
    assert!(eval_predicate(
        "it == Int32(Severity.High)",
        Ty::Int(IntTy::I32),
        Value::Int(2)
    ));
}

#[test]
fn test_enum_relational_ordering() {
    let lambda = parse_predicate(
        "it >= Severity.Medium",
        &registry(),
        Ty::Enum(registry().enumeration("Severity").unwrap()),
    )
    .unwrap();
    let severity = |value| Value::Enum {
        ty: registry().enumeration("Severity").unwrap(),
        value,
    };
    let mut evaluator = Evaluator::new();
    assert_eq!(
        evaluator.eval_lambda(&lambda, &[severity(2)]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        evaluator.eval_lambda(&lambda, &[severity(0)]).unwrap(),
        Value::Bool(false)
    );
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_decimal_arithmetic_is_exact() {
    assert!(eval_predicate(
        "0.1M + 0.2M == 0.3M",
        Ty::Int(IntTy::I32),
        Value::Int(0)
    ));
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(
        eval_expr("it / 2", Ty::Int(IntTy::I32), Value::Int(7)),
        Value::Int(3)
    );
}

#[test]
fn test_division_by_zero_is_an_error() {
    let lambda = parse_lambda(
        "1 / it",
        &registry(),
        vec![Parameter::it(Ty::Int(IntTy::I32))],
        None,
        Vec::new(),
    )
    .unwrap();
    let err = Evaluator::new()
        .eval_lambda(&lambda, &[Value::Int(0)])
        .unwrap_err();
    assert!(matches!(err, EvalError::DivisionByZero));
}

#[test]
fn test_short_circuit_skips_the_right_operand() {
    // the division would fail if evaluated
    assert!(!eval_predicate(
        "false && 1 / it == 1",
        Ty::Int(IntTy::I32),
        Value::Int(0)
    ));
    assert!(eval_predicate(
        "true || 1 / it == 1",
        Ty::Int(IntTy::I32),
        Value::Int(0)
    ));
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        eval_expr("-it", Ty::Int(IntTy::I32), Value::Int(5)),
        Value::Int(-5)
    );
    assert!(eval_predicate("not (it > 2)", Ty::Int(IntTy::I32), Value::Int(1)));
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(
        eval_expr("(it & 3) | 8", Ty::Int(IntTy::I32), Value::Int(6)),
        Value::Int(10)
    );
    assert_eq!(
        eval_expr("it ^ 1", Ty::Int(IntTy::I32), Value::Int(6)),
        Value::Int(7)
    );
}

#[test]
fn test_narrowing_conversion_truncates() {
    assert_eq!(
        eval_expr("Int16(it)", Ty::Int(IntTy::I32), Value::Int(70000)),
        Value::Int(4464)
    );
}

#[test]
fn test_modulo() {
    assert_eq!(
        eval_expr("it % 3", Ty::Int(IntTy::I32), Value::Int(7)),
        Value::Int(1)
    );
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_conditional_operator() {
    assert_eq!(
        eval_expr(
            "it > 2 ? \"big\" : \"small\"",
            Ty::Int(IntTy::I32),
            Value::Int(3)
        ),
        Value::Str("big".to_string())
    );
}

#[test]
fn test_iif_matches_the_operator_form() {
    let ternary = eval_expr(
        "it > 2 ? it * 10 : it",
        Ty::Int(IntTy::I32),
        Value::Int(4),
    );
    let iif = eval_expr(
        "iif(it > 2, it * 10, it)",
        Ty::Int(IntTy::I32),
        Value::Int(4),
    );
    assert_eq!(ternary, iif);
}

// ============================================================================
// String methods
// ============================================================================

#[test]
fn test_string_methods() {
    let s = || Value::Str("hello world".to_string());
    assert!(eval_predicate("it.Contains(\"lo w\")", Ty::Str, s()));
    assert!(eval_predicate("it.StartsWith(\"hell\")", Ty::Str, s()));
    assert!(eval_predicate("it.EndsWith(\"rld\")", Ty::Str, s()));
    assert_eq!(
        eval_expr("it.Substring(6)", Ty::Str, s()),
        Value::Str("world".to_string())
    );
    assert_eq!(
        eval_expr("it.Substring(0, 5).ToUpper()", Ty::Str, s()),
        Value::Str("HELLO".to_string())
    );
    assert_eq!(eval_expr("it.IndexOf(\"world\")", Ty::Str, s()), Value::Int(6));
}

#[test]
fn test_regex_matches() {
    assert!(eval_predicate(
        "it.Matches(\"^h.*d$\")",
        Ty::Str,
        Value::Str("hello world".to_string())
    ));
    let lambda = parse_predicate("it.Matches(\"[\")", &registry(), Ty::Str).unwrap();
    let err = Evaluator::new()
        .eval_lambda(&lambda, &[Value::Str("x".to_string())])
        .unwrap_err();
    assert!(matches!(err, EvalError::TypeError(_)));
}

// ============================================================================
// is / as
// ============================================================================

#[test]
fn test_is_checks_the_dynamic_type() {
    assert!(eval_predicate(
        "it is System.String",
        Ty::Dynamic,
        Value::Str("hello".to_string())
    ));
    assert!(!eval_predicate(
        "it is System.String",
        Ty::Dynamic,
        Value::Int(2)
    ));
}

#[test]
fn test_as_yields_value_or_null() {
    assert_eq!(
        eval_expr("(it as System.String).Length", Ty::Dynamic, Value::Str("hello".to_string())),
        Value::Int(5)
    );
    // failed conversion yields null, and the chained access stays total
    assert_eq!(
        eval_expr("(it as System.String).Length", Ty::Dynamic, Value::Int(2)),
        Value::Null
    );
}

#[test]
fn test_is_numeric_singleton_check_is_lossless() {
    assert!(eval_predicate("it is Int32", Ty::Dynamic, Value::Int(5)));
    assert!(!eval_predicate(
        "it is Int16",
        Ty::Dynamic,
        Value::Int(70000)
    ));
}

// ============================================================================
// Dynamic member chains
// ============================================================================

#[test]
fn test_typed_and_dynamic_access_agree() {
    // the same expression over a typed object and a string-keyed map
    let text = "it.Name.Length > 4";
    let typed = parse_predicate(text, &registry(), Ty::Object(registry().object("Product").unwrap())).unwrap();
    let dynamic = parse_predicate(text, &registry(), Ty::Map).unwrap();
    let mut evaluator = Evaluator::new();
    for (name, stock) in [("anvil", 3), ("nail", 7)] {
        let a = evaluator
            .eval_lambda(&typed, &[product(name, stock)])
            .unwrap();
        let b = evaluator
            .eval_lambda(&dynamic, &[map_product(name, stock)])
            .unwrap();
        assert_eq!(a, b, "typed and dynamic disagree for {}", name);
    }
}

#[test]
fn test_missing_dynamic_member_chain_yields_null() {
    assert_eq!(
        eval_expr("it.missing.deeper.still", Ty::Map, Value::Map(HashMap::new())),
        Value::Null
    );
}

#[test]
fn test_null_comparison_over_dynamic_members() {
    assert!(eval_predicate(
        "it.missing == null",
        Ty::Map,
        Value::Map(HashMap::new())
    ));
    assert!(!eval_predicate(
        "it.Name == null",
        Ty::Map,
        map_product("anvil", 3)
    ));
}

#[test]
fn test_dynamic_members_participate_in_arithmetic() {
    assert_eq!(
        eval_expr("it.Stock * 2", Ty::Map, map_product("anvil", 3)),
        Value::Int(6)
    );
}

// ============================================================================
// Indexing and placeholders
// ============================================================================

#[test]
fn test_list_indexing() {
    let list = Value::List(vec![Value::Int(5), Value::Int(7)]);
    assert_eq!(
        eval_expr("it[1]", Ty::List(Box::new(Ty::Int(IntTy::I64))), list.clone()),
        Value::Int(7)
    );
    // out-of-range reads are absent, not errors
    assert_eq!(
        eval_expr("it[9]", Ty::List(Box::new(Ty::Int(IntTy::I64))), list),
        Value::Null
    );
}

#[test]
fn test_map_indexing_by_key() {
    assert_eq!(
        eval_expr("it[\"Name\"]", Ty::Map, map_product("anvil", 3)),
        Value::Str("anvil".to_string())
    );
}

#[test]
fn test_placeholder_values_substitute() {
    let lambda = parse_lambda(
        "it > @0 && it < @1",
        &registry(),
        vec![Parameter::it(Ty::Int(IntTy::I64))],
        Some(Ty::Bool),
        vec![Value::Int(2), Value::Int(10)],
    )
    .unwrap();
    let mut evaluator = Evaluator::new();
    assert_eq!(
        evaluator.eval_lambda(&lambda, &[Value::Int(5)]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        evaluator.eval_lambda(&lambda, &[Value::Int(11)]).unwrap(),
        Value::Bool(false)
    );
}

// ============================================================================
// Decimal conversions
// ============================================================================

#[test]
fn test_decimal_mixes_with_integers() {
    assert_eq!(
        eval_expr("it + 0.5M", Ty::Int(IntTy::I32), Value::Int(2)),
        Value::Decimal(Decimal::from_str_exact("2.5").unwrap())
    );
}
