use substrate_lens::Value;

/// Pairs two records into the single value whose loss is measured to detect
/// a super-additive contradiction between them (§4.F, §4.G).
pub fn combine(a: &Value, b: &Value) -> Value {
    Value::Array(vec![a.clone(), b.clone()])
}

/// True when the combined loss exceeds the sum of the two records'
/// individual losses by more than `margin` (`\mu`): the records are
/// coherent individually but the oracle cannot round-trip them together,
/// which is the signature of a logical contradiction rather than
/// independent noise (§4.F).
pub fn is_super_additive(loss_a: f64, loss_b: f64, combined_loss: f64, margin: f64) -> bool {
    combined_loss > loss_a + loss_b + margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combined_loss_exceeding_sum_plus_margin() {
        assert!(is_super_additive(0.1, 0.1, 0.5, 0.1));
        assert!(!is_super_additive(0.1, 0.1, 0.25, 0.1));
    }
}
