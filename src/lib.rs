#![deny(missing_docs)]
//! A dual-track persistence substrate: a schema-free, content-addressed
//! Datum Store (Track A) and a versioned, typed Schema Track (Track C),
//! unified by a Bridge functor and coherence-measured by a pluggable
//! Semantic Oracle and Galois Loss Engine. The [`Coordinator`] ties every
//! track together behind one `ingest` entry point.

mod config;
mod coordinator;
mod descriptor;
mod error;
mod events;
mod limiter;

pub use config::{ConfigError, SubstrateConfig};
pub use coordinator::{Coordinator, IngestOutcome};
pub use descriptor::{RecordDescriptor, Track};
pub use error::{Error, Result};
pub use events::{Edge, Event};
pub use limiter::{OracleLimiter, Permit};

pub use substrate_bridge::{BridgePut, RowBridge};
pub use substrate_datum::{Datum, DatumId, DatumStore, LogDatumStore, MemoryDatumStore, MetaValue, Metadata, PutOutcome};
pub use substrate_lens::{Focus, Kind, Lens, Lenses, PrimitiveKind, PrimitiveValue, Prop, Schema, Value};
pub use substrate_loss::{
    Classification, EthicalAssessment, FixedPointResult, Layer, LossConfig, LossMeasurement, StructuralWeights,
};
pub use substrate_oracle::{Ensemble, FlakyOracle, MockOracle, SampleStats, SemanticOracle};
pub use substrate_schema_track::{Migration, Row, SchemaStore, Table};

/// Installs the engine-wide `tracing` subscriber: an env-filtered `fmt`
/// subscriber writing to stderr, with active/close span events and
/// `log`-crate records bridged in. Safe to call more than once; later calls
/// are no-ops once a global subscriber is set.
pub fn init_tracing() {
    tracing_log::LogTracer::init().ok();
    let env = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| "info".to_owned());
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::ACTIVE | tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_env_filter(tracing_subscriber::EnvFilter::new(env))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    log_panics::init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[async_std::test]
    async fn end_to_end_ingest_through_the_coordinator() {
        let store: Arc<dyn DatumStore> = Arc::new(MemoryDatumStore::new());
        let oracle: Arc<dyn SemanticOracle> = Arc::new(MockOracle::new());
        let (coordinator, _events) = Coordinator::new(store, oracle, SubstrateConfig::default());

        let descriptor = RecordDescriptor::new("notes", b"water boils at 100C".to_vec());
        let outcome = coordinator.ingest(descriptor).await.unwrap();
        assert!(outcome.inserted);
        assert_eq!(outcome.layer, Layer::L1);
    }
}
