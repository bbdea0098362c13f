//! Property-based check of invariant 5 (constraint round-trip): serializing
//! any constraint to its wire form and parsing it back must yield an equal
//! value, across randomly generated shapes, operators, priorities and
//! rational parameters rather than the handful of fixed examples in
//! `constraint.rs`'s unit tests.

use lss_core::{AnchorId, Attribute, ComparisonOp, Constraint, ConstraintKind, Priority, Rational};
use num_bigint::BigInt;
use proptest::prelude::*;

fn attribute_strategy() -> impl Strategy<Value = Attribute> {
    prop_oneof![
        Just(Attribute::Left),
        Just(Attribute::Top),
        Just(Attribute::Right),
        Just(Attribute::Bottom),
        Just(Attribute::CenterX),
        Just(Attribute::CenterY),
        Just(Attribute::Width),
        Just(Attribute::Height),
    ]
}

fn op_strategy() -> impl Strategy<Value = ComparisonOp> {
    prop_oneof![Just(ComparisonOp::Eq), Just(ComparisonOp::Le), Just(ComparisonOp::Ge)]
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Weak), Just(Priority::Medium), Just(Priority::Strong), Just(Priority::Required)]
}

fn rational_strategy() -> impl Strategy<Value = Rational> {
    (-1_000_000i64..1_000_000i64, 1i64..1_000i64).prop_map(|(n, d)| Rational::new(BigInt::from(n), BigInt::from(d)))
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_map(|s| s)
}

fn constant_strategy() -> impl Strategy<Value = Constraint> {
    (name_strategy(), attribute_strategy(), rational_strategy(), op_strategy(), priority_strategy(), 1u32..50)
        .prop_map(|(view, attr, b, op, priority, sample_count)| Constraint::Constant {
            kind: ConstraintKind::SizeConstant,
            y: AnchorId::new(view, attr),
            b: Some(b),
            op,
            priority,
            sample_count,
            is_falsified: false,
        })
}

fn linear_strategy() -> impl Strategy<Value = Constraint> {
    (
        name_strategy(),
        attribute_strategy(),
        name_strategy(),
        attribute_strategy(),
        rational_strategy(),
        rational_strategy(),
        op_strategy(),
        priority_strategy(),
        1u32..50,
    )
        .prop_map(|(y_view, y_attr, x_view, x_attr, a, b, op, priority, sample_count)| Constraint::Linear {
            kind: ConstraintKind::PosLtrbOffset,
            y: AnchorId::new(y_view, y_attr),
            x: AnchorId::new(x_view, x_attr),
            a: Some(a),
            b: Some(b),
            op,
            priority,
            sample_count,
            is_falsified: false,
        })
}

proptest! {
    #[test]
    fn constant_constraint_round_trips(constraint in constant_strategy()) {
        let wire = constraint.to_wire();
        let json = serde_json::to_string(&wire).unwrap();
        let parsed: lss_core::ConstraintWire = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, wire);
    }

    #[test]
    fn linear_constraint_round_trips(constraint in linear_strategy()) {
        let wire = constraint.to_wire();
        let json = serde_json::to_string(&wire).unwrap();
        let parsed: lss_core::ConstraintWire = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed.clone(), wire);
        prop_assert_eq!(parsed.parse_op(), Some(constraint.op()));
        let expected_a = match &constraint {
            Constraint::Linear { a, .. } => a.clone(),
            Constraint::Constant { .. } => None,
        };
        prop_assert_eq!(parsed.parse_a(), expected_a);
    }
}
