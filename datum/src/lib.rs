//! Track A: the Datum Store (§4.A). A schema-free, content-addressed,
//! append-only store of causally-linked records ("datums"), with an
//! in-memory and a durable append-log backend sharing one [`DatumStore`]
//! trait.

mod datum;
mod error;
mod id;
mod log;
mod meta;
mod store;

pub use crate::datum::Datum;
pub use error::{Error, Result};
pub use id::DatumId;
pub use log::LogDatumStore;
pub use meta::{merge_non_conflicting, MetaValue, Metadata};
pub use store::{DatumStore, MemoryDatumStore, MonotonicClock, PutOutcome};
