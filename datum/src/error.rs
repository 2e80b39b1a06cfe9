use crate::id::DatumId;
use thiserror::Error;

/// Errors raised by a [`crate::store::DatumStore`] backend.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared causal parent does not resolve to an existing datum at
    /// write time. Local to the caller: retry after the parent is persisted.
    #[error("causal parent {0} does not exist")]
    CausalMissing(DatumId),

    /// A persisted datum's content hash does not match its id on read. Fatal:
    /// reads from the affected namespace must halt.
    #[error("datum {0} failed content-hash verification on read")]
    IntegrityViolation(DatumId),

    /// A metadata key was written with a value that contradicts a prior
    /// value for the same key (§3 invariant 3: metadata may extend, never
    /// contradict).
    #[error("metadata key {key} already has a conflicting value")]
    MetadataConflict { key: String },

    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
