use thiserror::Error;

/// Errors raised by the Schema Track (§4.C).
#[derive(Debug, Error)]
pub enum Error {
    #[error("table {0} is already registered")]
    TableExists(String),

    #[error("table {0} is not registered")]
    NoSuchTable(String),

    #[error("row has no value for primary key column {0}")]
    MissingPrimaryKey(String),

    #[error("row does not conform to table {table}'s current schema: {reason}")]
    RowSchemaMismatch { table: String, reason: String },

    #[error("migration rejected: {0}")]
    Migration(#[from] substrate_lens::Error),

    #[error("index {0} already exists")]
    IndexExists(String),

    #[error("index {0} does not exist")]
    NoSuchIndex(String),
}

pub type Result<T> = std::result::Result<T, Error>;
