//! # Lens Algebra
//!
//! Composable, law-abiding focused access (§4.B) over the schema-free
//! [`Value`] tree shared by datum payloads, typed-row columns (via the
//! Bridge), and schema migrations.
//!
//! Two distinct vocabularies live here:
//!
//! - [`focus::Focus`] is the classical get/put lens: `view`, `put`, `over`,
//!   and associative `compose`, satisfying GetPut/PutGet/PutPut for every
//!   primitive and every composition (see the property tests in [`props`]).
//! - [`migration::Lens`] is a bidirectional *schema* transform (add/remove a
//!   property, wrap/unwrap an array, convert a primitive kind, ...), the
//!   vocabulary the Schema Track's forward-only migrations are built from.
//!
//! Both operate over the same [`Value`]/[`Schema`] pair so a document's
//! payload, a table's row, and a migration's before/after shape are all the
//! same kind of thing.

mod error;
mod focus;
mod migration;
mod schema;
mod value;

#[cfg(any(test, feature = "arb"))]
mod props;

pub use error::{Error, Result};
pub use focus::{over, view, Focus};
pub use migration::{Lens, Lenses};
pub use schema::Schema;
pub use value::{Kind, PrimitiveKind, PrimitiveValue, Prop, Value};
