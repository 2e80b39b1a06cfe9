use substrate_datum::{DatumId, Metadata};

/// Which track a [`RecordDescriptor`] is routed to (§6). `Auto` inspects
/// whether `namespace_or_table` names a registered schema-track table and
/// routes there; otherwise it falls back to the Datum Store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Track {
    /// Resolve at ingestion time based on whether a table of that name is
    /// registered.
    Auto,
    /// Force routing to the schema-free Datum Store (Track A).
    Datum,
    /// Force routing to a registered Schema Track table (Track C).
    Schema,
}

impl Default for Track {
    fn default() -> Self {
        Self::Auto
    }
}

/// The ingestion input accepted by [`crate::Coordinator::ingest`] (§6).
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDescriptor {
    /// Which track to route this record to.
    pub track: Track,
    /// The Datum Store namespace, or the Schema Track table name.
    pub namespace_or_table: String,
    /// A byte sequence for the Datum Track, or the JSON encoding of a typed
    /// row for the Schema Track -- both tracks ultimately store bytes (§4.D:
    /// the Bridge decodes Schema Track content as a row).
    pub content: Vec<u8>,
    /// The prior datum this record causally follows, if any.
    pub causal_parent: Option<DatumId>,
    /// Caller-supplied tags merged into the persisted datum's metadata.
    pub metadata: Metadata,
    /// An advisory layer tag the caller believes applies; never trusted over
    /// the Loss Engine's own classification, only recorded alongside it.
    pub declared_layer: Option<String>,
}

impl RecordDescriptor {
    /// Builds a descriptor with `Track::Auto` routing and no causal parent,
    /// metadata, or declared layer -- the common case.
    pub fn new(namespace_or_table: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            track: Track::Auto,
            namespace_or_table: namespace_or_table.into(),
            content,
            causal_parent: None,
            metadata: Metadata::new(),
            declared_layer: None,
        }
    }

    /// Overrides the auto-routing decision.
    pub fn with_track(mut self, track: Track) -> Self {
        self.track = track;
        self
    }

    /// Declares the datum this record causally follows.
    pub fn with_causal_parent(mut self, parent: DatumId) -> Self {
        self.causal_parent = Some(parent);
        self
    }

    /// Attaches metadata tags to merge into the persisted datum.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches an advisory layer tag.
    pub fn with_declared_layer(mut self, layer: impl Into<String>) -> Self {
        self.declared_layer = Some(layer.into());
        self
    }
}
