use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use substrate_lens::Value;

/// The structural distance `d*` the dual loss is measured with (§4.F):
/// a weighted combination of module-count ratio, interface overlap, and
/// composition-tree similarity, default weights `0.4, 0.3, 0.3`. Unlike the
/// primary loss's oracle-supplied `d`, this distance is a pure function of
/// two modular-form [`Value`] trees -- no oracle call, no sampling, fully
/// deterministic, matching the "structural distance" framing in the
/// original design (as opposed to semantic distance).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuralWeights {
    pub module_count: f64,
    pub interface_overlap: f64,
    pub composition_tree: f64,
}

impl Default for StructuralWeights {
    fn default() -> Self {
        Self {
            module_count: 0.4,
            interface_overlap: 0.3,
            composition_tree: 0.3,
        }
    }
}

/// Total number of nodes in the tree, standing in for "module count": every
/// object, array, primitive, and null counts as one module of the composed
/// form.
fn module_count(value: &Value) -> usize {
    match value {
        Value::Null | Value::Primitive(_) => 1,
        Value::Array(items) => 1 + items.iter().map(module_count).sum::<usize>(),
        Value::Object(fields) => 1 + fields.values().map(module_count).sum::<usize>(),
    }
}

fn module_count_ratio_distance(a: &Value, b: &Value) -> f64 {
    let (ca, cb) = (module_count(a) as f64, module_count(b) as f64);
    if ca == 0.0 && cb == 0.0 {
        return 0.0;
    }
    1.0 - ca.min(cb) / ca.max(cb)
}

/// The set of every object-key name used anywhere in the tree, standing in
/// for the "interface" a modular form exposes.
fn interfaces(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Null | Value::Primitive(_) => {}
        Value::Array(items) => items.iter().for_each(|v| interfaces(v, out)),
        Value::Object(fields) => {
            for (key, v) in fields {
                out.insert(key.clone());
                interfaces(v, out);
            }
        }
    }
}

fn interface_overlap_distance(a: &Value, b: &Value) -> f64 {
    let (mut ia, mut ib) = (BTreeSet::new(), BTreeSet::new());
    interfaces(a, &mut ia);
    interfaces(b, &mut ib);
    if ia.is_empty() && ib.is_empty() {
        return 0.0;
    }
    let intersection = ia.intersection(&ib).count() as f64;
    let union = ia.union(&ib).count() as f64;
    1.0 - intersection / union
}

/// Recursive shape match: two nodes agree if they have the same [`Kind`]
/// and, for composites, line up their children (by index for arrays, by
/// key for objects). Returns `(matched, total)` node counts so the caller
/// can normalize across the whole tree pair.
fn composition_match(a: &Value, b: &Value) -> (usize, usize) {
    use substrate_lens::Kind;
    let total = module_count(a).max(module_count(b));
    if a.kind() != b.kind() {
        return (0, total);
    }
    match (a, b) {
        (Value::Null, Value::Null) => (1, total),
        (Value::Primitive(pa), Value::Primitive(pb)) => {
            (if pa.kind_of() == pb.kind_of() { 1 } else { 0 }, total)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            let mut matched = 1;
            for (x, y) in xs.iter().zip(ys.iter()) {
                matched += composition_match(x, y).0;
            }
            (matched, total)
        }
        (Value::Object(xs), Value::Object(ys)) => {
            let mut matched = 1;
            for (key, x) in xs {
                if let Some(y) = ys.get(key) {
                    matched += composition_match(x, y).0;
                }
            }
            (matched, total)
        }
        _ => (0, total),
    }
}

fn composition_tree_distance(a: &Value, b: &Value) -> f64 {
    let (matched, total) = composition_match(a, b);
    if total == 0 {
        return 0.0;
    }
    1.0 - matched as f64 / total as f64
}

/// Computes `d*(a, b)` over two modular-form [`Value`] trees (§4.F).
pub fn structural_distance(a: &Value, b: &Value, weights: &StructuralWeights) -> f64 {
    let d = weights.module_count * module_count_ratio_distance(a, b)
        + weights.interface_overlap * interface_overlap_distance(a, b)
        + weights.composition_tree * composition_tree_distance(a, b);
    d.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_trees_have_zero_distance() {
        let v = Value::Object(
            [("a".to_string(), Value::text("x"))].into_iter().collect(),
        );
        assert_eq!(structural_distance(&v, &v, &StructuralWeights::default()), 0.0);
    }

    #[test]
    fn differing_interfaces_increase_distance() {
        let a = Value::Object([("a".to_string(), Value::number(1.0))].into_iter().collect());
        let b = Value::Object([("b".to_string(), Value::number(1.0))].into_iter().collect());
        let d = structural_distance(&a, &b, &StructuralWeights::default());
        assert!(d > 0.0);
    }

    #[test]
    fn weights_sum_to_one_by_default() {
        let w = StructuralWeights::default();
        assert!((w.module_count + w.interface_overlap + w.composition_tree - 1.0).abs() < 1e-9);
    }
}
