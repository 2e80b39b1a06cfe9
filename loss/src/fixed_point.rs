use crate::config::LossConfig;
use crate::error::Result;
use substrate_lens::Value;
use substrate_oracle::SemanticOracle;

/// The result of iterating a value through repeated restructure/reconstitute
/// round trips looking for a fixed point -- a value the oracle judges
/// (within tolerance) to already be in canonical form. Such a value is an
/// "axiom candidate": a record the oracle cannot simplify further (§4.F).
#[derive(Clone, Debug, PartialEq)]
pub struct FixedPointResult {
    pub axiom_candidate: Value,
    pub converged: bool,
    pub steps: usize,
    pub final_step_loss: f64,
}

/// Repeatedly applies `P_{k+1} = reconstitute(restructure(P_k))`, stopping
/// as soon as `d(P_k, P_{k+1}) < config.fixed_point_tolerance` (converged)
/// or after `config.fixed_point_max_steps` steps (not converged -- the
/// caller still gets the last iterate back as its best candidate, just
/// without the axiom guarantee).
pub async fn iterate_to_fixed_point(
    initial: &Value,
    oracle: &dyn SemanticOracle,
    config: &LossConfig,
) -> Result<FixedPointResult> {
    let mut current = initial.clone();
    let mut steps = 0;
    let mut final_step_loss = f64::INFINITY;

    for _ in 0..config.fixed_point_max_steps {
        let restructured = oracle.restructure(&current).await?;
        let next = oracle.reconstitute(&restructured).await?;
        let step_loss = oracle.distance(&current, &next).await?;
        steps += 1;
        final_step_loss = step_loss;
        if step_loss < config.fixed_point_tolerance {
            return Ok(FixedPointResult {
                axiom_candidate: next,
                converged: true,
                steps,
                final_step_loss,
            });
        }
        current = next;
    }

    Ok(FixedPointResult {
        axiom_candidate: current,
        converged: false,
        steps,
        final_step_loss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_oracle::MockOracle;

    #[async_std::test]
    async fn identity_oracle_converges_in_one_step() {
        let oracle = MockOracle::new();
        let config = LossConfig::default();
        let result = iterate_to_fixed_point(&Value::text("axiom"), &oracle, &config).await.unwrap();
        assert!(result.converged);
        assert_eq!(result.steps, 1);
        assert_eq!(result.axiom_candidate, Value::text("axiom"));
    }
}
