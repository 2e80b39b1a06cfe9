use crate::error::{Error, Result};
use crate::migration::Migration;
use crate::table::{Row, Table};
use std::collections::BTreeMap;
use substrate_lens::{Kind, Value};

/// The registry of every table in Track C (§4.C), keyed by name --
/// `register_table`/`upsert`/`get`/`query`/`apply_migration` as named in
/// the original design. A table's own write lock and the schema-wide
/// exclusive lock used during migration (§5) are the caller's
/// responsibility (the Coordinator holds one `SchemaStore` behind its own
/// per-table/table-wide locking scheme); this type is a plain, unsynchronized
/// registry so it composes with whatever locking discipline wraps it.
#[derive(Default)]
pub struct SchemaStore {
    tables: BTreeMap<String, Table>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_table(
        &mut self,
        name: impl Into<String>,
        primary_key: impl Into<String>,
        primary_key_kind: Kind,
    ) -> Result<()> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(Error::TableExists(name));
        }
        let table = Table::register(name.clone(), primary_key, primary_key_kind)?;
        self.tables.insert(name, table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables.get(name).ok_or_else(|| Error::NoSuchTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables.get_mut(name).ok_or_else(|| Error::NoSuchTable(name.to_string()))
    }

    /// Upserts `row` into `table`, returning the primary key value it was
    /// keyed by.
    pub fn upsert(&mut self, table: &str, row: Value, causal_parent: Option<String>) -> Result<String> {
        self.table_mut(table)?.upsert(row, causal_parent)
    }

    pub fn get(&self, table: &str, primary_key_value: &str) -> Result<Option<Row>> {
        Ok(self.table(table)?.get(primary_key_value).cloned())
    }

    pub fn query(&self, table: &str, predicate: impl Fn(&Value) -> bool) -> Result<Vec<Value>> {
        Ok(self.table(table)?.query(predicate))
    }

    /// Applies `migration` to `table`. A backend "refuses to proceed if its
    /// schema version exceeds the highest version the running engine
    /// recognizes" (§4.C) is the caller's concern at startup, since that
    /// check spans every table at once; per-table idempotence is handled
    /// by [`Table::apply_migration`] itself.
    pub fn apply_migration(&mut self, table: &str, migration: Migration) -> Result<bool> {
        self.table_mut(table)?.apply_migration(migration)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &String> {
        self.tables.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_lens::PrimitiveKind;

    fn sample_row(id: &str) -> Value {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("id".to_string(), Value::text(id));
        Value::Object(fields)
    }

    #[test]
    fn registering_the_same_table_twice_fails() {
        let mut store = SchemaStore::new();
        store.register_table("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        let err = store.register_table("users", "id", Kind::Primitive(PrimitiveKind::Text));
        assert!(matches!(err, Err(Error::TableExists(_))));
    }

    #[test]
    fn upsert_get_and_query_round_trip_through_the_store() {
        let mut store = SchemaStore::new();
        store.register_table("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        let key = store.upsert("users", sample_row("u1"), None).unwrap();
        assert_eq!(key, "u1");
        assert!(store.get("users", "u1").unwrap().is_some());
        assert_eq!(store.query("users", |_| true).unwrap().len(), 1);
    }
}
