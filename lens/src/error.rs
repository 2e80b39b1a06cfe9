use thiserror::Error;

/// Errors raised by the lens algebra and by schema/value transforms.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A lens was applied to a value outside its declared focus domain.
    ///
    /// This is not a persistent error: callers branch on it directly, it is
    /// never retried and never fatal.
    #[error("lens focus missing at {path}")]
    FocusMissing { path: String },

    /// A migration lens does not apply to the current schema shape.
    #[error("lens not applicable to schema: {0}")]
    SchemaMismatch(String),
}

impl Error {
    pub fn focus_missing(path: impl Into<String>) -> Self {
        Self::FocusMissing { path: path.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
