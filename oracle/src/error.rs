use thiserror::Error;

/// Errors a [`crate::SemanticOracle`] call can surface. All local: the
/// Coordinator degrades to `layer=unknown` rather than treating any of
/// these as a reason to reject a write (§4.E, §4.G).
#[derive(Debug, Error)]
pub enum Error {
    #[error("oracle call timed out")]
    Timeout,

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle call failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
