//! Track F: the Galois Loss Engine (§4.F). Measures how much a value
//! degrades across an oracle's restructure/reconstitute round trip,
//! classifies records by determinism, assigns corpus-calibrated layers,
//! and detects super-additive contradictions between records.

mod cache;
mod classification;
mod config;
mod contradiction;
mod engine;
mod error;
mod ethics;
mod fixed_point;
mod structural;

pub use cache::{CachedClassification, ClassificationCache};
pub use classification::{rank_order, Classification, Layer};
pub use config::LossConfig;
pub use contradiction::{combine, is_super_additive};
pub use engine::{measure, LossMeasurement};
pub use error::{Error, Result};
pub use ethics::{assess, EthicalAssessment};
pub use fixed_point::{iterate_to_fixed_point, FixedPointResult};
pub use structural::{structural_distance, StructuralWeights};
