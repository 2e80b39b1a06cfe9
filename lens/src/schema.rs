use crate::value::{Prop, Value};
use std::collections::BTreeMap;

/// The declared shape of a [`Value`] tree. A table's `column_spec` (§4.C) and
/// a document's payload shape (§4.B) are both expressed as a `Schema`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Schema {
    Null,
    Boolean,
    Number,
    Text,
    /// `allow_empty` tracks whether an empty array satisfies this schema even
    /// before an element schema has been established by a `Make` lens.
    Array(bool, Box<Schema>),
    Object(BTreeMap<Prop, Schema>),
}

impl Schema {
    /// An object schema with no declared properties.
    pub fn empty_object() -> Self {
        Self::Object(BTreeMap::new())
    }

    /// Checks that `v` has exactly the shape this schema declares: every
    /// declared property must be present, and (for `Object`) no undeclared
    /// property may appear. `Null` only validates `Value::Null`.
    pub fn validate(&self, v: &Value) -> bool {
        match (self, v) {
            (Self::Null, Value::Null) => true,
            (Self::Boolean, Value::Primitive(p)) => p.kind_of() == crate::value::PrimitiveKind::Boolean,
            (Self::Number, Value::Primitive(p)) => p.kind_of() == crate::value::PrimitiveKind::Number,
            (Self::Text, Value::Primitive(p)) => p.kind_of() == crate::value::PrimitiveKind::Text,
            (Self::Array(allow_empty, s), Value::Array(vs)) => {
                if vs.is_empty() {
                    *allow_empty
                } else {
                    vs.iter().all(|v| s.validate(v))
                }
            }
            (Self::Object(sm), Value::Object(vm)) => {
                sm.keys().all(|k| vm.contains_key(k))
                    && vm.iter().all(|(k, v)| sm.get(k).map_or(false, |s| s.validate(v)))
            }
            _ => false,
        }
    }
}
