use substrate_datum::DatumId;
use thiserror::Error;

/// The Coordinator's aggregated error taxonomy (§7), aggregating every
/// sub-crate's error type plus the handful of kinds that only make sense
/// at the orchestration layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A Datum Track error (§4.A).
    #[error(transparent)]
    Datum(#[from] substrate_datum::Error),

    /// A lens-law violation (§4.B).
    #[error(transparent)]
    Lens(#[from] substrate_lens::Error),

    /// A Schema Track error (§4.C).
    #[error(transparent)]
    SchemaTrack(#[from] substrate_schema_track::Error),

    /// A Bridge functor error (§4.D).
    #[error(transparent)]
    Bridge(#[from] substrate_bridge::Error),

    /// A Semantic Oracle error (§4.E). Always local; the Coordinator
    /// degrades to `layer=unknown` rather than propagating these.
    #[error(transparent)]
    Oracle(#[from] substrate_oracle::Error),

    /// A Galois Loss Engine error (§4.F).
    #[error(transparent)]
    Loss(#[from] substrate_loss::Error),

    /// A migration is incompatible with the on-disk schema version. Fatal:
    /// halts startup pending operator intervention.
    #[error("schema conflict: {0}")]
    SchemaConflict(String),

    /// Event consumers have blocked producers for longer than the
    /// configured threshold. Recovered locally, surfaced as a warning.
    #[error("event channel backpressure stall")]
    BackpressureStall,

    /// A write attempted to restructure a datum already frozen as an axiom
    /// candidate. Local: rejected, surfaced to the caller.
    #[error("datum {0} is frozen as an axiom candidate and cannot be restructured")]
    AxiomTampered(DatumId),
}

/// The Coordinator's result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// `SchemaConflict` and `IntegrityViolation` are fatal: they stop the
    /// engine rather than being recovered locally (§7 propagation policy).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::SchemaConflict(_))
            || matches!(self, Error::Datum(substrate_datum::Error::IntegrityViolation(_)))
    }

    /// `FocusMissing`, `CausalMissing`, and `AxiomTampered` are local: they
    /// are returned to the caller to branch on, not persistent failures.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::AxiomTampered(_))
            || matches!(self, Error::Datum(substrate_datum::Error::CausalMissing(_)))
            || matches!(self, Error::Lens(substrate_lens::Error::FocusMissing { .. }))
    }
}
