// tests/parser_tests.rs

use sieve_lang::parser::{parse_lambda, parse_ordering, parse_predicate};
use sieve_lang::{
    BinOp, EnumDescriptor, Expr, IntTy, Parameter, ParseError, Ty, TypeDescriptor, TypeRegistry,
    Value,
};

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with_object(
            TypeDescriptor::new("Product")
                .with_property("Name", Ty::Str)
                .with_property("Price", Ty::Decimal)
                .with_property("Stock", Ty::Int(IntTy::I32)),
        )
        .with_enum(
            EnumDescriptor::new("Severity", IntTy::I32)
                .with_member("Low", 0)
                .with_member("Medium", 1)
                .with_member("High", 2),
        )
}

fn product_ty() -> Ty {
    Ty::Object(registry().object("Product").unwrap())
}

fn parse_with_it(text: &str, it: Ty) -> Result<sieve_lang::ParsedLambda, ParseError> {
    parse_lambda(text, &registry(), vec![Parameter::it(it)], None, Vec::new())
}

// ============================================================================
// Precedence and structure
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let lambda = parse_with_it("1 + 2 * 3", Ty::Int(IntTy::I32)).unwrap();
    let Expr::Binary {
        op: BinOp::Add,
        right,
        ..
    } = lambda.body
    else {
        panic!("expected addition at the root");
    };
    assert!(matches!(
        *right,
        Expr::Binary {
            op: BinOp::Multiply,
            ..
        }
    ));
}

#[test]
fn test_parentheses_group() {
    let lambda = parse_with_it("(1 + 2) * 3", Ty::Int(IntTy::I32)).unwrap();
    let Expr::Binary {
        op: BinOp::Multiply,
        left,
        ..
    } = lambda.body
    else {
        panic!("expected multiplication at the root");
    };
    assert!(matches!(*left, Expr::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_comparison_has_boolean_type() {
    let lambda = parse_with_it("it > 100", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_logical_ladder() {
    let lambda = parse_with_it("it > 1 && it < 5 || it == 9", Ty::Int(IntTy::I32)).unwrap();
    assert!(matches!(
        lambda.body,
        Expr::Binary { op: BinOp::Or, .. }
    ));
}

#[test]
fn test_word_operators_parse_like_symbols() {
    let lambda = parse_with_it("not (it > 1 and it < 5)", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_bitwise_operators_bind() {
    let masked = parse_with_it("it & 3", Ty::Int(IntTy::I32)).unwrap();
    assert!(matches!(
        masked.body,
        Expr::Binary {
            op: BinOp::BitAnd,
            ..
        }
    ));
    assert_eq!(masked.body.ty(), Ty::Int(IntTy::I32));
    let tested = parse_with_it("(it & 1) == 1", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(tested.body.ty(), Ty::Bool);
}

#[test]
fn test_conditional_is_right_associative() {
    let lambda = parse_with_it(
        "it > 1 ? 1 : it > 2 ? 2 : 3",
        Ty::Int(IntTy::I32),
    )
    .unwrap();
    let Expr::Conditional { otherwise, .. } = lambda.body else {
        panic!("expected a conditional at the root");
    };
    assert!(matches!(*otherwise, Expr::Conditional { .. }));
}

#[test]
fn test_iif_is_the_function_form() {
    let lambda = parse_with_it("iif(it > 1, \"yes\", \"no\")", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Str);
}

// ============================================================================
// Numeric promotion and conversions
// ============================================================================

#[test]
fn test_mixed_width_operands_promote_to_the_wider_type() {
    let lambda = parse_lambda(
        "x + y",
        &registry(),
        vec![
            Parameter::new("x", Ty::Int(IntTy::I32)),
            Parameter::new("y", Ty::Int(IntTy::I64)),
        ],
        None,
        Vec::new(),
    )
    .unwrap();
    assert_eq!(lambda.body.ty(), Ty::Int(IntTy::I64));
    let Expr::Binary { left, .. } = lambda.body else {
        panic!("expected a binary node");
    };
    assert!(matches!(*left, Expr::Convert { .. }));
}

#[test]
fn test_conditional_branches_promote() {
    let lambda = parse_with_it("it > 1 ? 1 : 2.5", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Float(sieve_lang::FloatTy::F64));
}

#[test]
fn test_conditional_branch_mismatch_is_rejected() {
    let err = parse_with_it("it > 1 ? 1 : \"x\"", Ty::Int(IntTy::I32)).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

#[test]
fn test_explicit_conversion_call() {
    let lambda = parse_with_it("Int64(it)", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Int(IntTy::I64));
}

#[test]
fn test_signed_unsigned_64_bit_mix_is_ambiguous() {
    let err = parse_lambda(
        "x == y",
        &registry(),
        vec![
            Parameter::new("x", Ty::Int(IntTy::I64)),
            Parameter::new("y", Ty::Int(IntTy::U64)),
        ],
        None,
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::AmbiguousMatch { .. }));
}

#[test]
fn test_string_concatenation() {
    let lambda = parse_with_it("it + \"!\"", Ty::Str).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Str);
}

#[test]
fn test_string_plus_number_is_rejected() {
    let err = parse_with_it("it + 1", Ty::Str).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_compares_against_underlying_width() {
    let lambda = parse_with_it("it == Severity.High", Ty::Int(IntTy::I32)).unwrap();
    let Expr::Binary { left, right, .. } = lambda.body else {
        panic!("expected a comparison");
    };
    // the enum operand collapses to the integral side, not the reverse
    assert_eq!(left.ty(), Ty::Int(IntTy::I32));
    assert!(matches!(*right, Expr::Convert { .. }));
}

#[test]
fn test_enum_compares_against_wider_integral_without_cast() {
    let lambda = parse_with_it("it == Severity.High", Ty::Int(IntTy::I64)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_enum_member_through_conversion_call() {
    let lambda = parse_with_it("it == Int32(Severity.High)", Ty::Int(IntTy::I32)).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_unknown_enum_member() {
    let err = parse_with_it("it == Severity.Extreme", Ty::Int(IntTy::I32)).unwrap_err();
    assert!(matches!(err, ParseError::UnknownIdentifier { .. }));
}

#[test]
fn test_different_enum_types_do_not_compare() {
    let reg = registry().with_enum(
        EnumDescriptor::new("Color", IntTy::I32)
            .with_member("Red", 0)
            .with_member("Blue", 1),
    );
    let err = parse_lambda(
        "Severity.Low == Color.Red",
        &reg,
        Vec::new(),
        None,
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

// ============================================================================
// Identifier resolution and the allow-list
// ============================================================================

#[test]
fn test_unknown_identifier() {
    let err = parse_with_it("nonsense > 1", Ty::Int(IntTy::I32)).unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnknownIdentifier { ref name, .. } if name == "nonsense"
    ));
}

#[test]
fn test_declared_but_not_allowed_type_is_disallowed() {
    let mut reg = registry();
    reg.declare_enum(
        EnumDescriptor::new("Hidden", IntTy::I32).with_member("A", 0),
    );
    let err = parse_lambda(
        "it == Hidden.A",
        &reg,
        vec![Parameter::it(Ty::Int(IntTy::I32))],
        None,
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::DisallowedType { ref name, .. } if name == "Hidden"
    ));
}

#[test]
fn test_qualified_primitive_name_resolves() {
    let lambda = parse_with_it("it is System.String", Ty::Dynamic).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_member_access_on_registered_object() {
    let lambda = parse_with_it("it.Name.Length > 3", product_ty()).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_unknown_member_on_registered_object() {
    let err = parse_with_it("it.Weight > 3", product_ty()).unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnknownIdentifier { ref name, .. } if name == "Weight"
    ));
}

#[test]
fn test_map_member_access_defers() {
    let lambda = parse_with_it("it.anything", Ty::Map).unwrap();
    assert!(matches!(lambda.body, Expr::DynamicMember { .. }));
    assert_eq!(lambda.body.ty(), Ty::Dynamic);
}

#[test]
fn test_method_call_on_dynamic_is_rejected() {
    let err = parse_with_it("it.anything.Foo(1)", Ty::Map).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

#[test]
fn test_it_is_not_bound_for_named_parameters() {
    let err = parse_lambda(
        "it > 1",
        &registry(),
        vec![Parameter::new("x", Ty::Int(IntTy::I32))],
        None,
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnknownIdentifier { ref name, .. } if name == "it"
    ));
}

// ============================================================================
// String method overloads
// ============================================================================

#[test]
fn test_substring_overloads_resolve_by_arity() {
    let one = parse_with_it("it.Substring(1)", Ty::Str).unwrap();
    let two = parse_with_it("it.Substring(1, 2)", Ty::Str).unwrap();
    assert_eq!(one.body.ty(), Ty::Str);
    assert_eq!(two.body.ty(), Ty::Str);
}

#[test]
fn test_wrong_argument_type_is_no_applicable_method() {
    let err = parse_with_it("it.Contains(5)", Ty::Str).unwrap_err();
    assert!(matches!(err, ParseError::NoApplicableMethod { .. }));
}

#[test]
fn test_wrong_argument_count() {
    let err = parse_with_it("it.Trim(1)", Ty::Str).unwrap_err();
    assert!(matches!(err, ParseError::ArgumentCountMismatch { .. }));
}

#[test]
fn test_unknown_method() {
    let err = parse_with_it("it.Reverse()", Ty::Str).unwrap_err();
    assert!(matches!(err, ParseError::UnknownIdentifier { .. }));
}

// ============================================================================
// is / as
// ============================================================================

#[test]
fn test_as_produces_the_target_type() {
    let lambda = parse_with_it("(it as System.String).Length", Ty::Dynamic).unwrap();
    assert_eq!(lambda.body.ty(), Ty::Int(IntTy::I32));
}

#[test]
fn test_as_between_unrelated_types_is_rejected() {
    let err = parse_with_it("it as Boolean", Ty::Str).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

// ============================================================================
// Placeholders and trailing input
// ============================================================================

#[test]
fn test_placeholder_takes_the_value_type() {
    let lambda = parse_lambda(
        "it > @0",
        &registry(),
        vec![Parameter::it(Ty::Int(IntTy::I64))],
        Some(Ty::Bool),
        vec![Value::Int(10)],
    )
    .unwrap();
    assert_eq!(lambda.body.ty(), Ty::Bool);
}

#[test]
fn test_placeholder_out_of_range() {
    let err = parse_lambda(
        "it > @1",
        &registry(),
        vec![Parameter::it(Ty::Int(IntTy::I64))],
        None,
        vec![Value::Int(10)],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnknownIdentifier { ref name, .. } if name == "@1"
    ));
}

#[test]
fn test_trailing_input_is_a_syntax_error() {
    let err = parse_with_it("1 + 2 3", Ty::Int(IntTy::I32)).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn test_error_positions_point_at_the_offender() {
    let err = parse_with_it("it > unknown_name", Ty::Int(IntTy::I32)).unwrap_err();
    assert_eq!(err.position(), 5);
}

#[test]
fn test_result_type_mismatch() {
    let err = parse_predicate("it.Name", &registry(), product_ty()).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

#[test]
fn test_bare_type_name_is_not_an_expression() {
    let err = parse_with_it("String", Ty::Int(IntTy::I32)).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

// ============================================================================
// Ordering parser
// ============================================================================

#[test]
fn test_ordering_directions_default_to_ascending() {
    let parsed = parse_ordering(
        "Price desc, Name",
        &registry(),
        product_ty(),
    )
    .unwrap();
    assert_eq!(parsed.orderings.len(), 2);
    assert!(!parsed.orderings[0].ascending);
    assert!(parsed.orderings[1].ascending);
}

#[test]
fn test_ordering_accepts_long_direction_keywords() {
    let parsed = parse_ordering(
        "Stock ascending, Price descending",
        &registry(),
        product_ty(),
    )
    .unwrap();
    assert!(parsed.orderings[0].ascending);
    assert!(!parsed.orderings[1].ascending);
}

#[test]
fn test_ordering_rejects_unorderable_selectors() {
    let err = parse_ordering("it", &registry(), product_ty()).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { .. }));
}

#[test]
fn test_ordering_rejects_trailing_input() {
    let err = parse_ordering(
        "Price desc extra",
        &registry(),
        product_ty(),
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}
