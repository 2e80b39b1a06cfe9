use crate::error::Result;
use crate::oracle::SemanticOracle;
use async_trait::async_trait;
use substrate_lens::Value;

/// A deterministic test double (§8): `restructure`/`reconstitute` are the
/// identity, and `distance` is a fixed structural-diff ratio in `[0, 1]`,
/// counting mismatched leaves over total leaves. Two structurally identical
/// values always have distance exactly `0.0`; two values with no leaves in
/// common at all are distance `1.0`.
#[derive(Clone, Debug, Default)]
pub struct MockOracle;

impl MockOracle {
    pub fn new() -> Self {
        Self
    }
}

fn leaves(v: &Value, out: &mut Vec<Value>) {
    match v {
        Value::Array(vs) => vs.iter().for_each(|v| leaves(v, out)),
        Value::Object(m) => m.values().for_each(|v| leaves(v, out)),
        leaf => out.push(leaf.clone()),
    }
}

fn diff_ratio(a: &Value, b: &Value) -> f64 {
    if a == b {
        return 0.0;
    }
    let (mut la, mut lb) = (Vec::new(), Vec::new());
    leaves(a, &mut la);
    leaves(b, &mut lb);
    let total = la.len().max(lb.len()).max(1);
    let matching = la.iter().zip(lb.iter()).filter(|(x, y)| x == y).count();
    1.0 - (matching as f64 / total as f64)
}

#[async_trait]
impl SemanticOracle for MockOracle {
    async fn restructure(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }

    async fn reconstitute(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }

    async fn distance(&self, a: &Value, b: &Value) -> Result<f64> {
        Ok(diff_ratio(a, b))
    }
}

/// An oracle that fails its first `fail_count` calls with
/// [`crate::Error::Unavailable`] before delegating to `inner`. Grounds the
/// "oracle unavailable, graceful degradation, then background
/// reclassification" scenario (§8) without needing a real flaky backend.
pub struct FlakyOracle {
    inner: MockOracle,
    remaining_failures: std::sync::atomic::AtomicUsize,
}

impl FlakyOracle {
    pub fn new(fail_count: usize) -> Self {
        Self {
            inner: MockOracle::new(),
            remaining_failures: std::sync::atomic::AtomicUsize::new(fail_count),
        }
    }
}

#[async_trait]
impl SemanticOracle for FlakyOracle {
    async fn restructure(&self, value: &Value) -> Result<Value> {
        self.try_consume_failure()?;
        self.inner.restructure(value).await
    }

    async fn reconstitute(&self, value: &Value) -> Result<Value> {
        self.try_consume_failure()?;
        self.inner.reconstitute(value).await
    }

    async fn distance(&self, a: &Value, b: &Value) -> Result<f64> {
        self.try_consume_failure()?;
        self.inner.distance(a, b).await
    }
}

impl FlakyOracle {
    fn try_consume_failure(&self) -> Result<()> {
        use std::sync::atomic::Ordering;
        let mut remaining = self.remaining_failures.load(Ordering::Relaxed);
        loop {
            if remaining == 0 {
                return Ok(());
            }
            match self.remaining_failures.compare_exchange_weak(
                remaining,
                remaining - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Err(crate::Error::Unavailable("simulated outage".into())),
                Err(actual) => remaining = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn identical_values_have_zero_distance() {
        let oracle = MockOracle::new();
        let v = Value::text("hello");
        assert_eq!(oracle.distance(&v, &v).await.unwrap(), 0.0);
    }

    #[async_std::test]
    async fn disjoint_values_have_nonzero_distance() {
        let oracle = MockOracle::new();
        let d = oracle.distance(&Value::text("a"), &Value::number(1.0)).await.unwrap();
        assert!(d > 0.0);
    }

    #[async_std::test]
    async fn flaky_oracle_recovers_after_failures_exhausted() {
        let oracle = FlakyOracle::new(2);
        assert!(oracle.distance(&Value::Null, &Value::Null).await.is_err());
        assert!(oracle.distance(&Value::Null, &Value::Null).await.is_err());
        assert!(oracle.distance(&Value::Null, &Value::Null).await.is_ok());
    }
}
