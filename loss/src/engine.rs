use crate::classification::{Classification, Layer};
use crate::config::LossConfig;
use crate::error::Result;
use crate::structural::structural_distance;
use substrate_lens::Value;
use substrate_oracle::{sample_distance, SemanticOracle};

/// The full measurement taken for one value: the restructured/reconstituted
/// round trip, the primary and dual losses, their weighted total, and the
/// classification/layer that total resolves to (§4.F).
#[derive(Clone, Debug, PartialEq)]
pub struct LossMeasurement {
    pub primary_loss: f64,
    pub dual_loss: f64,
    pub total_loss: f64,
    pub classification: Classification,
    pub layer: Layer,
    /// Standard deviation of the primary-loss samples, reported alongside
    /// the mean so a caller can judge how much to trust a single
    /// measurement from a non-deterministic oracle.
    pub primary_loss_stddev: f64,
}

/// Measures `value` against `oracle`: `P -> restructure -> M -> reconstitute
/// -> P'`, `L(P) = d(P, P')` (the oracle's own semantic distance, sampled
/// `config.sample_count` times to compensate for non-determinism, §4.E),
/// `L*(M) = d*(M, restructure(P'))` (the pure structural distance of
/// [`structural_distance`], not an oracle call -- §4.F names it a distinct
/// metric from `d`), `total = alpha * L(P) + beta * L*(restructure(P))`.
pub async fn measure(value: &Value, oracle: &dyn SemanticOracle, config: &LossConfig) -> Result<LossMeasurement> {
    let restructured = oracle.restructure(value).await?;
    let reconstituted = oracle.reconstitute(&restructured).await?;

    let primary_stats = sample_distance(oracle, value, &reconstituted, config.sample_count).await?;
    let primary_loss = primary_stats.mean;

    let dual_target = oracle.restructure(&reconstituted).await?;
    let dual_loss = structural_distance(&restructured, &dual_target, &config.dual_distance_weights);

    let total_loss = config.alpha * primary_loss + config.beta * dual_loss;

    Ok(LossMeasurement {
        primary_loss,
        dual_loss,
        total_loss,
        classification: Classification::of(total_loss, config),
        layer: Layer::of(total_loss, config),
        primary_loss_stddev: primary_stats.stddev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_oracle::MockOracle;

    #[async_std::test]
    async fn identity_oracle_yields_zero_loss() {
        let oracle = MockOracle::new();
        let config = LossConfig::default();
        let value = Value::text("stable fact");
        let measurement = measure(&value, &oracle, &config).await.unwrap();
        assert_eq!(measurement.primary_loss, 0.0);
        assert_eq!(measurement.total_loss, 0.0);
        assert_eq!(measurement.classification, Classification::Deterministic);
    }
}
