use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("row did not decode as a value: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Datum(#[from] substrate_datum::Error),

    #[error(transparent)]
    SchemaTrack(#[from] substrate_schema_track::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
