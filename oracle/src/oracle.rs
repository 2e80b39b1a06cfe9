use crate::error::Result;
use async_trait::async_trait;
use substrate_lens::Value;

/// The pluggable boundary between the Loss Engine and whatever actually
/// judges semantic equivalence (§4.E) -- an LLM, an embedding model, a
/// rule-based comparator, or (in tests) a fixed deterministic function.
/// Every method is `async` and may suspend on outbound I/O; callers are
/// expected to bound concurrency and apply a timeout (§5) rather than this
/// trait doing so itself.
#[async_trait]
pub trait SemanticOracle: Send + Sync {
    /// Restructures `value` into the oracle's canonical normal form -- the
    /// forward half of the round trip the Galois loss measures.
    async fn restructure(&self, value: &Value) -> Result<Value>;

    /// Reconstitutes a restructured value back into the original shape --
    /// the backward half of the round trip.
    async fn reconstitute(&self, value: &Value) -> Result<Value>;

    /// A symmetric, non-negative distance between two values in the
    /// oracle's own semantic space. `distance(a, a) == 0.0`.
    async fn distance(&self, a: &Value, b: &Value) -> Result<f64>;
}
