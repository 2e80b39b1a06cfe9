use substrate_datum::{DatumId, Metadata};

/// A first-class derived relationship between two records (§3 "Edge").
/// Edges are themselves persisted as datums in a namespace's shadow
/// `<namespace>::edges` partition, so the same idempotence and causal
/// machinery covers them without a second storage mechanism.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    /// The edge's own content-derived id, computed like any other datum.
    pub id: DatumId,
    /// The record the edge points from.
    pub source_id: DatumId,
    /// The record the edge points to.
    pub target_id: DatumId,
    /// What relationship this edge expresses, e.g. `"contradicts"`.
    pub kind: String,
    /// Small scalar tags attached to the edge, e.g. the contradiction
    /// margin that triggered it.
    pub metadata: Metadata,
    /// Monotonic nanoseconds since a fixed epoch, assigned on first write.
    pub created_at: u64,
}

/// Events emitted on the Coordinator's local event channel (§6). Ordered
/// consistently with per-namespace write order; delivery is lossless with
/// backpressure (§5) rather than drop-on-full.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new datum was persisted into the Datum Track.
    DatumInserted {
        id: DatumId,
        namespace: String,
        created_at: u64,
    },
    /// A new version of a row was written into the Schema Track.
    RowUpserted {
        table: String,
        primary_key: String,
        version: usize,
    },
    /// A first-class edge was derived between two records.
    EdgeAdded {
        edge: Edge,
    },
    /// A record's coherence classification was computed or refreshed.
    ClassificationAssigned {
        id: DatumId,
        layer: String,
        loss: Option<f64>,
        confidence: f64,
    },
    /// Two records were found to be a super-additive contradiction.
    ContradictionDetected {
        source_id: DatumId,
        target_id: DatumId,
        margin: f64,
    },
}
