//! Track E: the Semantic Oracle Interface (§4.E). A pluggable async
//! boundary for restructuring, reconstitution, and semantic distance, with
//! a weighted-ensemble combinator and deterministic test doubles.

mod ensemble;
mod error;
mod mock;
mod oracle;
mod sampling;

pub use ensemble::Ensemble;
pub use error::{Error, Result};
pub use mock::{FlakyOracle, MockOracle};
pub use oracle::SemanticOracle;
pub use sampling::{sample_distance, SampleStats};
