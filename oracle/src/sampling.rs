use crate::error::Result;
use crate::oracle::SemanticOracle;
use substrate_lens::Value;

/// Mean and standard deviation of a repeated oracle sample, used to
/// compensate for non-deterministic oracles (§4.E, §4.F): a single call to
/// a model-backed oracle is a draw from a distribution, not a fixed answer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleStats {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

/// Calls `oracle.distance(a, b)` `samples` times (§4.E default: 5) and
/// returns the mean and population standard deviation. A deterministic
/// oracle's stddev is always exactly `0.0`.
pub async fn sample_distance(
    oracle: &dyn SemanticOracle,
    a: &Value,
    b: &Value,
    samples: usize,
) -> Result<SampleStats> {
    let mut values = Vec::with_capacity(samples);
    for _ in 0..samples {
        values.push(oracle.distance(a, b).await?);
    }
    Ok(stats_of(&values))
}

pub(crate) fn stats_of(values: &[f64]) -> SampleStats {
    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    SampleStats {
        mean,
        stddev: variance.sqrt(),
        samples: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_samples_have_zero_stddev() {
        let stats = stats_of(&[0.2, 0.2, 0.2, 0.2, 0.2]);
        assert_eq!(stats.mean, 0.2);
        assert_eq!(stats.stddev, 0.0);
    }

    #[test]
    fn variance_reflects_spread() {
        let stats = stats_of(&[0.0, 1.0]);
        assert_eq!(stats.mean, 0.5);
        assert!((stats.stddev - 0.5).abs() < 1e-9);
    }
}
