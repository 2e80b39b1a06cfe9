use crate::config::LossConfig;

/// The outcome of checking a record's ethical-dimension score against the
/// configured floor (§4.F, §8: "an ethical-floor violation that doesn't
/// block the write"). A violation is recorded as metadata for downstream
/// review, never rejected at ingestion time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EthicalAssessment {
    pub score: f64,
    pub floor: f64,
    pub violates: bool,
}

pub fn assess(score: f64, config: &LossConfig) -> EthicalAssessment {
    EthicalAssessment {
        score,
        floor: config.ethical_floor,
        violates: score < config.ethical_floor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_floor_is_flagged_not_rejected() {
        let config = LossConfig::default();
        let assessment = assess(0.4, &config);
        assert!(assessment.violates);
    }

    #[test]
    fn at_or_above_floor_does_not_violate() {
        let config = LossConfig::default();
        assert!(!assess(0.6, &config).violates);
        assert!(!assess(0.9, &config).violates);
    }
}
