use crate::error::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use substrate_datum::{DatumId, DatumStore, Metadata};
use substrate_lens::Value;
use substrate_schema_track::SchemaStore;

/// Lifts one table's typed rows into the Datum Store's schema-free
/// interface (§4.D). The table in `schema` remains the source of truth for
/// typed validation and migration; every upsert is additionally recorded as
/// a content-addressed datum in `store`, causally chained to the previous
/// datum written for the same primary key -- so a row's edit history is a
/// real Track A causal chain, not just an overwrite. `get` reads that datum
/// straight back: `get(put(d))` is the identical content (the functor law,
/// §4.D), with `source`/`table` metadata tags the only addition.
/// The outcome of [`RowBridge::put`]: the datum id assigned to this
/// version of the row, whether it was a new insertion, the row's primary
/// key, and how many times that key has now been written (§6 `RowUpserted`
/// event needs all four).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgePut {
    pub id: DatumId,
    pub inserted: bool,
    pub primary_key: String,
    pub version: usize,
}

pub struct RowBridge {
    schema: Arc<Mutex<SchemaStore>>,
    store: Arc<dyn DatumStore>,
    table: String,
    /// Primary key -> most recently written datum id, so the next write for
    /// that key can be chained as its causal parent.
    latest: RwLock<BTreeMap<String, DatumId>>,
    /// Primary key -> number of times it has been written, for
    /// `BridgePut::version`.
    versions: RwLock<BTreeMap<String, usize>>,
}

impl RowBridge {
    pub fn new(schema: Arc<Mutex<SchemaStore>>, store: Arc<dyn DatumStore>, table: impl Into<String>) -> Self {
        Self {
            schema,
            store,
            table: table.into(),
            latest: RwLock::new(BTreeMap::new()),
            versions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Deserializes `content` as a row, upserts it into the typed table,
    /// and records the version as a causally-chained datum.
    pub fn put(&self, content: &[u8]) -> Result<BridgePut> {
        let json: serde_json::Value = serde_json::from_slice(content)?;
        let row = Value::from_json(&json);

        let pk = {
            let schema = self.schema.lock();
            schema.table(&self.table)?.primary_key(&row)?
        };
        let prior = self.latest.read().get(&pk).copied();

        {
            let mut schema = self.schema.lock();
            schema.upsert(&self.table, row, prior.map(|id| id.to_string()))?;
        }

        let mut metadata = Metadata::new();
        metadata.insert("source".into(), "schema-track".into());
        metadata.insert("table".into(), self.table.clone().into());
        metadata.insert("primary_key".into(), pk.clone().into());
        let outcome = self.store.put(&self.table, content.to_vec(), prior, metadata)?;
        self.latest.write().insert(pk.clone(), outcome.id);
        let version = if outcome.inserted {
            let mut versions = self.versions.write();
            let entry = versions.entry(pk.clone()).or_insert(0);
            *entry += 1;
            *entry
        } else {
            *self.versions.read().get(&pk).unwrap_or(&1)
        };
        tracing::debug!(table = %self.table, id = %outcome.id, version, "row bridged into datum view");
        Ok(BridgePut {
            id: outcome.id,
            inserted: outcome.inserted,
            primary_key: pk,
            version,
        })
    }

    /// Reads a datum back and parses it as a `Value`. Returns `Ok(None)` if
    /// the id is unknown; propagates [`substrate_datum::Error::IntegrityViolation`]
    /// for a corrupted datum.
    pub fn get(&self, id: &DatumId) -> Result<Option<Value>> {
        let Some(datum) = self.store.get(id)? else {
            return Ok(None);
        };
        let json: serde_json::Value = serde_json::from_slice(datum.content())?;
        Ok(Some(Value::from_json(&json)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_datum::MemoryDatumStore;
    use substrate_lens::{Kind, PrimitiveKind, PrimitiveValue};

    fn number_field<'a>(row: &'a Value, field: &str) -> Option<f64> {
        match row.as_object()?.get(field)? {
            Value::Primitive(PrimitiveValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn sample_row(id: &str, age: f64) -> Vec<u8> {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("id".to_string(), Value::text(id));
        fields.insert("age".to_string(), Value::number(age));
        serde_json::to_vec(&Value::Object(fields).to_json()).unwrap()
    }

    fn schema_with_users_table() -> Arc<Mutex<SchemaStore>> {
        let mut schema = SchemaStore::new();
        schema.register_table("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        schema
            .apply_migration(
                "users",
                substrate_schema_track::Migration::AddColumn {
                    name: "age".into(),
                    kind: Kind::Primitive(PrimitiveKind::Number),
                },
            )
            .unwrap();
        Arc::new(Mutex::new(schema))
    }

    #[test]
    fn round_trip_preserves_row_exactly() {
        let schema = schema_with_users_table();
        let store: Arc<dyn DatumStore> = Arc::new(MemoryDatumStore::new());
        let bridge = RowBridge::new(schema, store, "users");
        let content = sample_row("u1", 41.0);
        let put = bridge.put(&content).unwrap();
        assert!(put.inserted);
        let fetched = bridge.get(&put.id).unwrap().unwrap();
        let expected = Value::from_json(&serde_json::from_slice(&content).unwrap());
        assert_eq!(fetched, expected);
    }

    #[test]
    fn put_is_idempotent_on_identical_row() {
        let schema = schema_with_users_table();
        let store: Arc<dyn DatumStore> = Arc::new(MemoryDatumStore::new());
        let bridge = RowBridge::new(schema, store, "users");
        let content = sample_row("u1", 41.0);
        let a = bridge.put(&content).unwrap();
        let b = bridge.put(&content).unwrap();
        assert_eq!(a.id, b.id);
        assert!(!b.inserted);
        assert_eq!(a.version, b.version);
    }

    #[test]
    fn successive_writes_of_the_same_key_form_a_causal_chain() {
        let schema = schema_with_users_table();
        let store: Arc<dyn DatumStore> = Arc::new(MemoryDatumStore::new());
        let bridge = RowBridge::new(schema.clone(), store.clone(), "users");
        let first = bridge.put(&sample_row("u1", 41.0)).unwrap();
        let second = bridge.put(&sample_row("u1", 42.0)).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.version, 2);
        let datum = store.get(&second.id).unwrap().unwrap();
        assert_eq!(datum.causal_parent(), Some(first.id));

        let row = schema.lock().get("users", "u1").unwrap().unwrap();
        assert_eq!(number_field(&row.data, "age"), Some(42.0));
    }
}
