use crate::classification::Layer;
use crate::engine::LossMeasurement;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use substrate_datum::DatumId;

/// One record's cached classification outcome. `measurement` is `None` when
/// the oracle was unavailable at classification time; the record still gets
/// a `Layer::Unknown` entry rather than no entry at all, so the Coordinator
/// can tell "never classified" apart from "classified as unknown" when
/// deciding what to hand to the background reclassification pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedClassification {
    pub measurement: Option<LossMeasurement>,
    pub layer: Layer,
}

/// A per-record classification cache (§4.F/§4.G). Read-heavy: the
/// Coordinator consults it on every contradiction scan, so reads take a
/// shared lock and only a reclassification actually blocks other readers.
#[derive(Default)]
pub struct ClassificationCache {
    entries: RwLock<BTreeMap<DatumId, CachedClassification>>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, id: &DatumId) -> Option<CachedClassification> {
        self.entries.read().get(id).cloned()
    }

    pub fn record_measurement(&self, id: DatumId, measurement: LossMeasurement) {
        let layer = measurement.layer;
        self.entries.write().insert(
            id,
            CachedClassification {
                measurement: Some(measurement),
                layer,
            },
        );
    }

    /// Degrades a record to `Layer::Unknown` with no measurement, recorded
    /// when the oracle could not be reached (§4.F graceful degradation).
    pub fn record_unavailable(&self, id: DatumId) {
        self.entries.write().insert(
            id,
            CachedClassification {
                measurement: None,
                layer: Layer::Unknown,
            },
        );
    }

    /// Ids whose cached layer is `Unknown`, the candidate set for a
    /// background reclassification pass once the oracle recovers.
    pub fn pending_reclassification(&self) -> Vec<DatumId> {
        self.entries
            .read()
            .iter()
            .filter(|(_, c)| c.layer == Layer::Unknown)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Classification;

    fn sample_measurement() -> LossMeasurement {
        LossMeasurement {
            primary_loss: 0.05,
            dual_loss: 0.05,
            total_loss: 0.05,
            classification: Classification::Deterministic,
            layer: Layer::L1,
            primary_loss_stddev: 0.0,
        }
    }

    #[test]
    fn unavailable_records_are_pending_until_reclassified() {
        let cache = ClassificationCache::new();
        let id = DatumId::of(b"a");
        cache.record_unavailable(id);
        assert_eq!(cache.pending_reclassification(), vec![id]);

        cache.record_measurement(id, sample_measurement());
        assert!(cache.pending_reclassification().is_empty());
        assert_eq!(cache.get(&id).unwrap().layer, Layer::L1);
    }
}
