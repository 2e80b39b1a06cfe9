use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property name within an [`Value::Object`] or [`Schema::Object`].
pub type Prop = String;

/// The kind of a [`PrimitiveValue`], used by [`crate::migration::Lens::Convert`]
/// to describe a primitive-to-primitive conversion.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Number,
    Text,
}

/// The shape of a [`Value`], ignoring its contents. Used to validate the
/// argument of `Lens::Make`/`Lens::Destroy`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Null,
    Primitive(PrimitiveKind),
    Array,
    Object,
}

/// A leaf scalar: boolean, number, or text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl PrimitiveValue {
    pub fn kind_of(&self) -> PrimitiveKind {
        match self {
            Self::Boolean(_) => PrimitiveKind::Boolean,
            Self::Number(_) => PrimitiveKind::Number,
            Self::Text(_) => PrimitiveKind::Text,
        }
    }
}

/// The schema-free value tree that datum payloads, typed-row columns, and
/// lens foci all share. Deliberately a small JSON-shaped algebra rather than
/// a dynamically-typed free-for-all: [`Schema`] validates against exactly
/// these four shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Primitive(PrimitiveValue),
    Array(Vec<Value>),
    Object(BTreeMap<Prop, Value>),
}

impl Value {
    pub fn boolean(b: bool) -> Self {
        Self::Primitive(PrimitiveValue::Boolean(b))
    }

    pub fn number(n: f64) -> Self {
        Self::Primitive(PrimitiveValue::Number(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Primitive(PrimitiveValue::Text(s.into()))
    }

    pub fn object() -> Self {
        Self::Object(BTreeMap::new())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Primitive(p) => Kind::Primitive(p.kind_of()),
            Self::Array(_) => Kind::Array,
            Self::Object(_) => Kind::Object,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<Prop, Value>> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Primitive(PrimitiveValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Converts to a canonical `serde_json::Value`, the wire form used when a
    /// `Value` is interpreted as raw [`substrate_datum`] content bytes.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Primitive(PrimitiveValue::Boolean(b)) => serde_json::Value::Bool(*b),
            Self::Primitive(PrimitiveValue::Number(n)) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Primitive(PrimitiveValue::Text(s)) => serde_json::Value::String(s.clone()),
            Self::Array(vs) => serde_json::Value::Array(vs.iter().map(Value::to_json).collect()),
            Self::Object(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Parses from a `serde_json::Value`. Numbers that do not fit an `f64`
    /// (should not occur for `serde_json`'s own number type) fall back to 0.
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::boolean(*b),
            serde_json::Value::Number(n) => Self::number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Self::text(s.clone()),
            serde_json::Value::Array(vs) => Self::Array(vs.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(m) => {
                Self::Object(m.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect())
            }
        }
    }
}
