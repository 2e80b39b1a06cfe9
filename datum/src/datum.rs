use crate::id::DatumId;
use crate::meta::Metadata;

/// An immutable, content-addressed record (§3). Created by `put`, never
/// mutated, never deleted by the core.
#[derive(Clone, Debug, PartialEq)]
pub struct Datum {
    id: DatumId,
    namespace: String,
    content: Vec<u8>,
    /// Monotonic nanoseconds since a fixed epoch, assigned on first write.
    created_at: u64,
    causal_parent: Option<DatumId>,
    metadata: Metadata,
}

impl Datum {
    pub(crate) fn new(
        namespace: String,
        content: Vec<u8>,
        created_at: u64,
        causal_parent: Option<DatumId>,
        metadata: Metadata,
    ) -> Self {
        let id = DatumId::of(&content);
        Self {
            id,
            namespace,
            content,
            created_at,
            causal_parent,
            metadata,
        }
    }

    pub fn id(&self) -> DatumId {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn causal_parent(&self) -> Option<DatumId> {
        self.causal_parent
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Verifies the datum has not been corrupted at rest: `id ==
    /// DatumId::of(content)`. Backends call this on read and surface
    /// [`crate::Error::IntegrityViolation`] on mismatch (§7).
    pub fn verify(&self) -> bool {
        self.id == DatumId::of(&self.content)
    }
}
