use crate::config::LossConfig;
use std::cmp::Ordering;

/// The coarse determinism classification a total loss falls into (§4.F).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Classification {
    Deterministic,
    Probabilistic,
    Chaotic,
}

impl Classification {
    pub fn of(total_loss: f64, config: &LossConfig) -> Self {
        if total_loss < config.deterministic_threshold {
            Self::Deterministic
        } else if total_loss < config.probabilistic_threshold {
            Self::Probabilistic
        } else {
            Self::Chaotic
        }
    }
}

/// A corpus-calibrated layer assignment, `L1` (lowest loss) through `L7`
/// (highest), or `Unknown` when no oracle could be consulted (§4.F
/// graceful degradation).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Layer {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
    Unknown,
}

impl Layer {
    /// Finds the first band whose upper bound the loss falls under.
    /// `layer_bands` is assumed ascending; a loss at or above the last
    /// band's bound still resolves to `L7` rather than panicking.
    pub fn of(total_loss: f64, config: &LossConfig) -> Self {
        const LAYERS: [Layer; 7] = [
            Layer::L1,
            Layer::L2,
            Layer::L3,
            Layer::L4,
            Layer::L5,
            Layer::L6,
            Layer::L7,
        ];
        for (bound, layer) in config.layer_bands.iter().zip(LAYERS.iter()) {
            if total_loss < *bound {
                return *layer;
            }
        }
        Layer::L7
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Layer::L1 => 1,
            Layer::L2 => 2,
            Layer::L3 => 3,
            Layer::L4 => 4,
            Layer::L5 => 5,
            Layer::L6 => 6,
            Layer::L7 => 7,
            Layer::Unknown => 0,
        }
    }
}

/// Deterministic tie-break ordering for records with equal loss: older
/// `created_at` first, then lexicographic id (§4.F/§4.G: fixed-point
/// iteration and contradiction scans must produce the same order on every
/// replica regardless of processing order).
pub fn rank_order(
    a: (f64, u64, &str),
    b: (f64, u64, &str),
) -> Ordering {
    a.0.partial_cmp(&b.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.2.cmp(b.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_threshold() {
        let config = LossConfig::default();
        assert_eq!(Classification::of(0.05, &config), Classification::Deterministic);
        assert_eq!(Classification::of(0.20, &config), Classification::Probabilistic);
        assert_eq!(Classification::of(0.90, &config), Classification::Chaotic);
    }

    #[test]
    fn layer_bands_are_monotonic() {
        let config = LossConfig::default();
        assert_eq!(Layer::of(0.0, &config), Layer::L1);
        assert_eq!(Layer::of(0.99, &config), Layer::L7);
    }

    #[test]
    fn rank_order_breaks_ties_by_age_then_id() {
        let mut items = vec![(0.2, 5, "b"), (0.2, 5, "a"), (0.2, 1, "z")];
        items.sort_by(|a, b| rank_order(*a, *b));
        assert_eq!(items, vec![(0.2, 1, "z"), (0.2, 5, "a"), (0.2, 5, "b")]);
    }
}
