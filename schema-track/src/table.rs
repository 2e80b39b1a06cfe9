use crate::error::{Error, Result};
use crate::migration::Migration;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use substrate_lens::{Kind, Lenses, PrimitiveValue, Prop, Schema, Value};

fn primary_key_string(v: &Value) -> Option<String> {
    match v {
        Value::Primitive(PrimitiveValue::Text(s)) => Some(s.clone()),
        Value::Primitive(PrimitiveValue::Number(n)) => Some(n.to_string()),
        Value::Primitive(PrimitiveValue::Boolean(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Strictly increasing nanosecond timestamps for a table's `created_at`
/// system column (§3 Typed Row: "system columns `created_at`, optional
/// `causal_parent`"). A table has its own ordering domain, independent of
/// any other table's or Track A's -- "writes across namespaces are not
/// globally ordered" (§5) applies equally across tables.
#[derive(Default, Debug)]
struct MonotonicClock(AtomicU64);

impl MonotonicClock {
    fn next(&self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let mut last = self.0.load(Ordering::Relaxed);
        loop {
            let candidate = wall.max(last + 1);
            match self
                .0
                .compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// One stored row: the typed column data (validated against the table's
/// declared schema) plus the two system columns every row carries
/// alongside it (§3). `created_at` is assigned once, on the row's first
/// write, and never changes on subsequent upserts; `causal_parent` may be
/// updated by later writes like any other column.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub data: Value,
    pub created_at: u64,
    pub causal_parent: Option<String>,
}

/// A versioned typed table (§4.C): a column schema built from the primitive
/// [`Migration`] vocabulary, rows keyed by a primary key column, and a
/// forward-only migration log. Re-applying a migration already reflected in
/// the current schema is a no-op (§3 invariant: "schema migrations are
/// idempotent when reapplied").
#[derive(Debug)]
pub struct Table {
    name: String,
    primary_key: Prop,
    lenses: Lenses,
    migrations: Vec<Migration>,
    indexes: BTreeMap<String, Prop>,
    rows: BTreeMap<String, Row>,
    clock: MonotonicClock,
}

impl Table {
    /// Registers a new table with a single primary key column. The
    /// underlying document schema starts as `Make(Object)` followed by the
    /// primary key's own `AddColumn`, so `to_schema()` is always a valid
    /// object schema from the very first version.
    pub fn register(name: impl Into<String>, primary_key: impl Into<Prop>, primary_key_kind: Kind) -> Result<Self> {
        let primary_key = primary_key.into();
        let mut lenses = Lenses::new(vec![substrate_lens::Lens::Make(Kind::Object)]);
        let pk_migration = Migration::AddColumn {
            name: primary_key.clone(),
            kind: primary_key_kind,
        };
        let schema = lenses.to_schema()?;
        for step in pk_migration.lens_steps(&schema)? {
            lenses.push(step);
        }
        Ok(Self {
            name: name.into(),
            primary_key,
            lenses,
            migrations: vec![pk_migration],
            indexes: BTreeMap::new(),
            rows: BTreeMap::new(),
            clock: MonotonicClock::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> usize {
        self.migrations.len()
    }

    pub fn schema(&self) -> Result<Schema> {
        Ok(self.lenses.to_schema()?)
    }

    pub fn lenses(&self) -> &Lenses {
        &self.lenses
    }

    /// Extracts the primary key string a row would be keyed by, without
    /// upserting it. Used by the Bridge (§4.D) to look up a row's prior
    /// version before writing a new one.
    pub fn primary_key(&self, row: &Value) -> Result<String> {
        let fields = row.as_object().ok_or_else(|| Error::RowSchemaMismatch {
            table: self.name.clone(),
            reason: "row is not an object".into(),
        })?;
        let pk_value = fields
            .get(&self.primary_key)
            .ok_or_else(|| Error::MissingPrimaryKey(self.primary_key.clone()))?;
        primary_key_string(pk_value).ok_or_else(|| Error::MissingPrimaryKey(self.primary_key.clone()))
    }

    /// Applies `migration` against the table's current schema, migrating
    /// every stored row forward in place. Idempotent: if the migration's
    /// effect is already reflected (column present for `AddColumn`, absent
    /// for `DropColumn`, index already registered for `AddIndex`), this
    /// returns `Ok(false)` without touching the schema or rows.
    pub fn apply_migration(&mut self, migration: Migration) -> Result<bool> {
        let current = self.schema()?;
        let has_column = |name: &Prop| matches!(&current, Schema::Object(m) if m.contains_key(name));

        match &migration {
            Migration::AddColumn { name, .. } if has_column(name) => return Ok(false),
            Migration::DropColumn { name } if !has_column(name) => return Ok(false),
            Migration::AddIndex { name, column } => {
                if let Some(existing) = self.indexes.get(name) {
                    if existing == column {
                        return Ok(false);
                    }
                    return Err(Error::IndexExists(name.clone()));
                }
                if !has_column(column) {
                    return Err(Error::RowSchemaMismatch {
                        table: self.name.clone(),
                        reason: format!("cannot index missing column {}", column),
                    });
                }
                self.indexes.insert(name.clone(), column.clone());
                self.migrations.push(migration);
                return Ok(true);
            }
            _ => {}
        }

        let steps = migration.lens_steps(&current).map_err(|e| match e {
            Error::RowSchemaMismatch { reason, .. } => Error::RowSchemaMismatch {
                table: self.name.clone(),
                reason,
            },
            other => other,
        })?;
        for step in &steps {
            let mut schema = self.schema()?;
            step.transform_schema(&mut schema)?;
            self.lenses.push(step.clone());
        }
        for row in self.rows.values_mut() {
            for step in &steps {
                step.transform_value(&mut row.data);
            }
        }
        self.migrations.push(migration);
        tracing::info!(table = %self.name, version = self.version(), "schema migration applied");
        Ok(true)
    }

    /// Validates `row` against the current schema and upserts it keyed by
    /// the primary key column's value, alongside the `created_at` /
    /// `causal_parent` system columns (§3). `created_at` is assigned once,
    /// on the row's first write, and carried forward unchanged on every
    /// later upsert of the same key; `causal_parent` is replaced like any
    /// other column on each write. Returns the primary key value the row
    /// was keyed by.
    pub fn upsert(&mut self, row: Value, causal_parent: Option<String>) -> Result<String> {
        let schema = self.schema()?;
        if !schema.validate(&row) {
            return Err(Error::RowSchemaMismatch {
                table: self.name.clone(),
                reason: "row does not conform to current column schema".into(),
            });
        }
        let fields = row.as_object().ok_or_else(|| Error::RowSchemaMismatch {
            table: self.name.clone(),
            reason: "row is not an object".into(),
        })?;
        let pk_value = fields
            .get(&self.primary_key)
            .ok_or_else(|| Error::MissingPrimaryKey(self.primary_key.clone()))?;
        let key = primary_key_string(pk_value).ok_or_else(|| Error::MissingPrimaryKey(self.primary_key.clone()))?;
        let created_at = self
            .rows
            .get(&key)
            .map(|existing| existing.created_at)
            .unwrap_or_else(|| self.clock.next());
        self.rows.insert(
            key.clone(),
            Row {
                data: row,
                created_at,
                causal_parent,
            },
        );
        tracing::debug!(table = %self.name, key = %key, "row upserted");
        Ok(key)
    }

    pub fn get(&self, primary_key: &str) -> Option<&Row> {
        self.rows.get(primary_key)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&String, &Row)> {
        self.rows.iter()
    }

    /// A finite, in-primary-key-order sequence of rows matching `predicate`
    /// (§4.C `query`).
    pub fn query(&self, predicate: impl Fn(&Value) -> bool) -> Vec<Value> {
        self.rows
            .values()
            .map(|row| &row.data)
            .filter(|data| predicate(data))
            .cloned()
            .collect()
    }

    pub fn indexes(&self) -> &BTreeMap<String, Prop> {
        &self.indexes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_lens::PrimitiveKind;

    fn sample_row(id: &str, email: &str) -> Value {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("id".to_string(), Value::text(id));
        fields.insert("email".to_string(), Value::text(email));
        Value::Object(fields)
    }

    #[test]
    fn registers_table_and_upserts_rows() {
        let mut table = Table::register("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        table
            .apply_migration(Migration::AddColumn {
                name: "email".into(),
                kind: Kind::Primitive(PrimitiveKind::Text),
            })
            .unwrap();
        table.upsert(sample_row("u1", "a@example.com"), None).unwrap();
        assert_eq!(
            table.get("u1").unwrap().data.as_object().unwrap().get("email").unwrap().as_text(),
            Some("a@example.com")
        );
    }

    #[test]
    fn created_at_is_assigned_once_and_survives_rewrites() {
        let mut table = Table::register("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        table
            .apply_migration(Migration::AddColumn {
                name: "email".into(),
                kind: Kind::Primitive(PrimitiveKind::Text),
            })
            .unwrap();
        table.upsert(sample_row("u1", "a@example.com"), None).unwrap();
        let first_created_at = table.get("u1").unwrap().created_at;

        table.upsert(sample_row("u1", "b@example.com"), Some("parent-1".into())).unwrap();
        let row = table.get("u1").unwrap();
        assert_eq!(row.created_at, first_created_at);
        assert_eq!(row.causal_parent.as_deref(), Some("parent-1"));
        assert_eq!(row.data.as_object().unwrap().get("email").unwrap().as_text(), Some("b@example.com"));
    }

    #[test]
    fn query_filters_rows_by_predicate() {
        let mut table = Table::register("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        table
            .apply_migration(Migration::AddColumn {
                name: "email".into(),
                kind: Kind::Primitive(PrimitiveKind::Text),
            })
            .unwrap();
        table.upsert(sample_row("u1", "a@example.com"), None).unwrap();
        table.upsert(sample_row("u2", "b@other.example"), None).unwrap();

        let matches = table.query(|row| {
            row.as_object()
                .and_then(|m| m.get("email"))
                .and_then(|v| v.as_text())
                .map(|email| email.ends_with("@example.com"))
                .unwrap_or(false)
        });
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn reapplying_same_migration_is_idempotent() {
        let mut table = Table::register("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        let add_email = Migration::AddColumn {
            name: "email".into(),
            kind: Kind::Primitive(PrimitiveKind::Text),
        };
        assert!(table.apply_migration(add_email.clone()).unwrap());
        assert!(!table.apply_migration(add_email).unwrap());
        assert_eq!(table.version(), 2);
    }

    #[test]
    fn rename_is_expressed_as_add_copy_drop_across_two_migrations() {
        let mut table = Table::register("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        table
            .apply_migration(Migration::AddColumn {
                name: "email".into(),
                kind: Kind::Primitive(PrimitiveKind::Text),
            })
            .unwrap();
        table.upsert(sample_row("u1", "a@example.com"), None).unwrap();

        // step 1: add the new column
        table
            .apply_migration(Migration::AddColumn {
                name: "email_address".into(),
                kind: Kind::Primitive(PrimitiveKind::Text),
            })
            .unwrap();
        // application-level copy
        let mut row = table.get("u1").unwrap().data.clone();
        if let Value::Object(fields) = &mut row {
            let email = fields.get("email").cloned().unwrap();
            fields.insert("email_address".to_string(), email);
        }
        table.upsert(row, None).unwrap();
        // step 2: drop the old column
        table.apply_migration(Migration::DropColumn { name: "email".into() }).unwrap();

        let row = table.get("u1").unwrap().data.as_object().unwrap();
        assert!(!row.contains_key("email"));
        assert_eq!(row.get("email_address").unwrap().as_text(), Some("a@example.com"));
    }

    #[test]
    fn add_index_requires_existing_column() {
        let mut table = Table::register("users", "id", Kind::Primitive(PrimitiveKind::Text)).unwrap();
        let err = table.apply_migration(Migration::AddIndex {
            name: "by_email".into(),
            column: "email".into(),
        });
        assert!(err.is_err());
    }
}
