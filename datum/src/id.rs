use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A content-derived identifier: `DatumId::of(content) == DatumId::of(content)`
/// for any two processes, anywhere, by construction (§8 invariant 2).
///
/// A thin newtype over `blake3::Hash` rather than a raw `[u8; 32]`, so
/// construction always goes through content hashing.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct DatumId(blake3::Hash);

impl DatumId {
    /// Computes the id of a datum as the hash of its content only, per §3:
    /// "id: derived deterministically from content".
    pub fn of(content: &[u8]) -> Self {
        Self(blake3::hash(content))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<[u8; 32]> for DatumId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from(bytes))
    }
}

impl std::fmt::Debug for DatumId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_hex()[..16])
    }
}

impl std::fmt::Display for DatumId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for DatumId {
    type Err = blake3::HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hash = blake3::Hash::from_hex(s)?;
        Ok(Self(hash))
    }
}

impl Serialize for DatumId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for DatumId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
