//! Property-based checks of the three lens laws (§8) over arbitrary small
//! `Value` trees and `Focus` compositions, gated behind the `arb` feature
//! like any other proptest-only module.

use crate::focus::Focus;
use crate::value::Value;
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn arb_primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::boolean),
        any::<i32>().prop_map(|n| Value::number(n as f64)),
        "[a-z]{1,8}".prop_map(Value::text),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = arb_primitive();
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(Value::Array),
            btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Value::Object),
        ]
    })
}

/// A single-step key/index focus guaranteed to resolve against `sample`.
fn arb_resolving_focus(sample: &Value) -> Option<Focus> {
    match sample {
        Value::Object(m) => m.keys().next().map(|k| Focus::key(k.clone())),
        Value::Array(vs) if !vs.is_empty() => Some(Focus::index(0)),
        _ => None,
    }
}

proptest! {
    #[test]
    fn get_put_law_holds(s in arb_value()) {
        if let Some(lens) = arb_resolving_focus(&s) {
            let a = lens.view(&s).unwrap();
            prop_assert_eq!(lens.put(s.clone(), a).unwrap(), s);
        }
    }

    #[test]
    fn put_get_law_holds(s in arb_value(), replacement in arb_primitive()) {
        if let Some(lens) = arb_resolving_focus(&s) {
            let s2 = lens.put(s, replacement.clone()).unwrap();
            prop_assert_eq!(lens.view(&s2).unwrap(), replacement);
        }
    }

    #[test]
    fn put_put_law_holds(s in arb_value(), a in arb_primitive(), b in arb_primitive()) {
        if let Some(lens) = arb_resolving_focus(&s) {
            let once = lens.put(s.clone(), a).unwrap();
            let twice = lens.put(once, b.clone()).unwrap();
            let direct = lens.put(s, b).unwrap();
            prop_assert_eq!(twice, direct);
        }
    }
}
