use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A "small scalar" metadata value (§3: "mapping from string keys to small
/// scalar values"). Deliberately narrower than [`substrate_lens::Value`]:
/// metadata is always flat tags (source, layer, loss, ...), never nested
/// structure, so it gets its own small enum rather than the full value tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// Merges `incoming` into `existing` in place, respecting §3 invariant 3:
/// metadata may be extended, but never contradict a prior value for the same
/// key. Existing values always win on conflict; only absent keys are added.
/// Returns the keys that were actually added.
pub fn merge_non_conflicting(existing: &mut Metadata, incoming: Metadata) -> Vec<String> {
    let mut added = Vec::new();
    for (k, v) in incoming {
        existing.entry(k.clone()).or_insert_with(|| {
            added.push(k);
            v
        });
    }
    added
}
