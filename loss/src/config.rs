use crate::structural::StructuralWeights;
use serde::{Deserialize, Serialize};

/// Tunable parameters of the Galois Loss Engine (§4.F). Every threshold
/// named in the original design is a field here with the documented
/// default, so a deployment can recalibrate against its own corpus without
/// recompiling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    /// Weight of the primary loss `L(P)` in the total loss. Default `0.6`.
    pub alpha: f64,
    /// Weight of the dual loss `L*(M)` in the total loss. Default `0.4`.
    pub beta: f64,
    /// Total loss below this is classified `Deterministic`. Default `0.15`.
    pub deterministic_threshold: f64,
    /// Total loss below this (and at/above `deterministic_threshold`) is
    /// `Probabilistic`; at or above it, `Chaotic`. Default `0.45`.
    pub probabilistic_threshold: f64,
    /// Margin `\mu` a combined loss must exceed the sum of two individual
    /// losses by before being flagged super-additive contradiction. Default
    /// `0.1`.
    pub contradiction_margin: f64,
    /// Minimum acceptable score on the ethical assessment dimension.
    /// Default `0.6`.
    pub ethical_floor: f64,
    /// Convergence tolerance `\tau` for fixed-point axiom iteration. Default
    /// `1e-3`.
    pub fixed_point_tolerance: f64,
    /// Maximum fixed-point iteration steps `K` before giving up without
    /// convergence. Default `7`.
    pub fixed_point_max_steps: usize,
    /// Number of oracle samples drawn per distance measurement to
    /// compensate for non-determinism (§4.E). Default `5`.
    pub sample_count: usize,
    /// Upper bound of each of the seven corpus-calibrated layers' loss
    /// band, in ascending order. The last entry should be `>= 1.0`.
    /// Default: evenly spaced thirds-of-a-seventh up to `1.0`.
    pub layer_bands: [f64; 7],
    /// Weights combining module-count ratio, interface overlap, and
    /// composition-tree similarity into the dual loss's structural
    /// distance `d*`. Default `0.4, 0.3, 0.3`; the original design leaves
    /// whether these are universally optimal unresolved, so they are
    /// configuration rather than constants.
    pub dual_distance_weights: StructuralWeights,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.4,
            deterministic_threshold: 0.15,
            probabilistic_threshold: 0.45,
            contradiction_margin: 0.1,
            ethical_floor: 0.6,
            fixed_point_tolerance: 1e-3,
            fixed_point_max_steps: 7,
            sample_count: 5,
            layer_bands: [0.05, 0.15, 0.25, 0.40, 0.55, 0.70, 1.01],
            dual_distance_weights: StructuralWeights::default(),
        }
    }
}
