use crate::error::{Error, Result};
use substrate_lens::{Kind, Lens, PrimitiveKind, Prop, Schema};

/// The Schema Track's narrow migration vocabulary (§4.C). Deliberately a
/// strict subset of [`substrate_lens::Lens`]: a table may only grow or
/// shrink one column at a time, or register a secondary index. There is no
/// `RenameColumn` -- a rename is expressed as an `AddColumn` of the new
/// name, an application-level copy of the data, and a `DropColumn` of the
/// old name, across at least two migrations, matching the "forward-only"
/// invariant (a migration is never rewritten in place once applied).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Migration {
    AddColumn { name: Prop, kind: Kind },
    DropColumn { name: Prop },
    AddIndex { name: String, column: Prop },
}

impl Migration {
    pub fn name(&self) -> Option<&Prop> {
        match self {
            Migration::AddColumn { name, .. } | Migration::DropColumn { name } => Some(name),
            Migration::AddIndex { .. } => None,
        }
    }

    /// Lowers this migration to the `substrate_lens::Lens` steps that apply
    /// it against `current`. `DropColumn` needs to know the column's current
    /// kind to destroy it cleanly before removing the now-null property
    /// (`RemoveProperty` only accepts an empty slot); `AddIndex` carries no
    /// schema/value effect and lowers to nothing.
    pub(crate) fn lens_steps(&self, current: &Schema) -> Result<Vec<Lens>> {
        match self {
            Migration::AddColumn { name, kind } => Ok(vec![
                Lens::AddProperty(name.clone()),
                Lens::Make(*kind).lens_in(name.clone()),
            ]),
            Migration::DropColumn { name } => {
                let Schema::Object(columns) = current else {
                    return Err(Error::RowSchemaMismatch {
                        table: String::new(),
                        reason: "table schema is not an object".into(),
                    });
                };
                let column = columns
                    .get(name)
                    .ok_or_else(|| Error::RowSchemaMismatch {
                        table: String::new(),
                        reason: format!("column {} doesn't exist", name),
                    })?;
                let kind = schema_to_kind(column);
                let mut steps = Vec::new();
                if let Some(kind) = kind {
                    steps.push(Lens::Destroy(kind).lens_in(name.clone()));
                }
                steps.push(Lens::RemoveProperty(name.clone()));
                Ok(steps)
            }
            Migration::AddIndex { .. } => Ok(Vec::new()),
        }
    }
}

fn schema_to_kind(schema: &Schema) -> Option<Kind> {
    match schema {
        Schema::Null => None,
        Schema::Boolean => Some(Kind::Primitive(PrimitiveKind::Boolean)),
        Schema::Number => Some(Kind::Primitive(PrimitiveKind::Number)),
        Schema::Text => Some(Kind::Primitive(PrimitiveKind::Text)),
        Schema::Array(..) => Some(Kind::Array),
        Schema::Object(_) => Some(Kind::Object),
    }
}
