use crate::config::SubstrateConfig;
use crate::descriptor::{RecordDescriptor, Track};
use crate::error::{Error, Result};
use crate::events::{Edge, Event};
use crate::limiter::OracleLimiter;
use async_std::sync::Mutex as AsyncMutex;
use futures::channel::mpsc;
use futures::SinkExt;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use substrate_bridge::RowBridge;
use substrate_datum::{DatumId, DatumStore, Metadata};
use substrate_lens::{Kind, Value};
use substrate_loss::{Classification, ClassificationCache, Layer, LossMeasurement};
use substrate_oracle::SemanticOracle;
use substrate_schema_track::SchemaStore;

/// The outcome of one [`Coordinator::ingest`] call (§4.G, §6).
#[derive(Clone, Debug, PartialEq)]
pub struct IngestOutcome {
    /// The id assigned to the ingested content.
    pub id: DatumId,
    /// Whether this call actually persisted a new record, or found an
    /// identical one already present (§3 invariant 1).
    pub inserted: bool,
    /// The corpus-calibrated layer this record was classified into.
    pub layer: Layer,
    /// The record's total loss, or `None` if the oracle was unavailable.
    pub loss: Option<f64>,
    /// Confidence in `loss`, in `[0, 1]`, derived from the primary-loss
    /// sample spread.
    pub confidence: f64,
}

fn layer_name(layer: Layer) -> &'static str {
    match layer {
        Layer::L1 => "L1",
        Layer::L2 => "L2",
        Layer::L3 => "L3",
        Layer::L4 => "L4",
        Layer::L5 => "L5",
        Layer::L6 => "L6",
        Layer::L7 => "L7",
        Layer::Unknown => "unknown",
    }
}

fn complexity_name(classification: Classification) -> &'static str {
    match classification {
        Classification::Deterministic => "deterministic",
        Classification::Probabilistic => "probabilistic",
        Classification::Chaotic => "chaotic",
    }
}

/// Decodes a datum's raw content back into the value tree the Loss Engine
/// operates on. Content written by the Bridge is always JSON-encoded, so it
/// round-trips through [`Value::from_json`] exactly; content written
/// directly to the Datum Track has no declared shape, so it falls back to a
/// single text leaf.
fn decode_any(content: &[u8]) -> Value {
    match serde_json::from_slice::<serde_json::Value>(content) {
        Ok(json) => Value::from_json(&json),
        Err(_) => Value::text(String::from_utf8_lossy(content).into_owned()),
    }
}

fn confidence_of(measurement: &LossMeasurement) -> f64 {
    (1.0 - measurement.primary_loss_stddev).clamp(0.0, 1.0)
}

/// The synthetic target of every `violation` edge (§4.F, §8 Scenario 6):
/// a well-known id, not a persisted datum, standing in for "the ethical
/// floor itself" so violations can be traversed like any other edge.
fn ethical_floor_sentinel() -> DatumId {
    DatumId::of(b"ethical_floor")
}

/// Ties every track together (§4.G). Auto-routes a [`RecordDescriptor`] to
/// the Datum Store or the Schema Track (through the Bridge), classifies the
/// result with the Galois Loss Engine, scans the namespace's recent tail for
/// super-additive contradictions, and publishes events for all of it.
///
/// Writes to a single namespace/table are serialized end to end -- persist,
/// classify, contradiction scan, event emission -- by a per-namespace async
/// lock, so two concurrent `ingest` calls into different namespaces never
/// wait on each other (§5 "per-namespace write lock, shared read lock
/// across namespaces").
pub struct Coordinator {
    datum_store: Arc<dyn DatumStore>,
    schema: Arc<Mutex<SchemaStore>>,
    bridges: RwLock<BTreeMap<String, Arc<RowBridge>>>,
    oracle: Arc<dyn SemanticOracle>,
    config: SubstrateConfig,
    cache: ClassificationCache,
    limiter: OracleLimiter,
    namespace_locks: Mutex<BTreeMap<String, Arc<AsyncMutex<()>>>>,
    axioms: RwLock<BTreeSet<DatumId>>,
    events_tx: mpsc::Sender<Event>,
}

impl Coordinator {
    /// Wires a Coordinator around `datum_store` and `oracle`, returning the
    /// receiving end of its bounded event channel (§5, §6).
    pub fn new(
        datum_store: Arc<dyn DatumStore>,
        oracle: Arc<dyn SemanticOracle>,
        config: SubstrateConfig,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let limiter = OracleLimiter::new(config.oracle_concurrency);
        let coordinator = Self {
            datum_store,
            schema: Arc::new(Mutex::new(SchemaStore::new())),
            bridges: RwLock::new(BTreeMap::new()),
            oracle,
            config,
            cache: ClassificationCache::new(),
            limiter,
            namespace_locks: Mutex::new(BTreeMap::new()),
            axioms: RwLock::new(BTreeSet::new()),
            events_tx: tx,
        };
        (coordinator, rx)
    }

    /// Registers a Schema Track table and wires a [`RowBridge`] for it, so
    /// `ingest` can auto-route records by table name (§4.C, §4.D, §6 `auto`).
    pub fn register_table(
        &self,
        name: impl Into<String>,
        primary_key: impl Into<String>,
        primary_key_kind: Kind,
    ) -> Result<()> {
        let name = name.into();
        self.schema
            .lock()
            .register_table(name.clone(), primary_key, primary_key_kind)?;
        let bridge = Arc::new(RowBridge::new(self.schema.clone(), self.datum_store.clone(), name.clone()));
        self.bridges.write().insert(name, bridge);
        Ok(())
    }

    /// Applies a schema migration to `table` (§4.C, §6 CLI `migrate`).
    pub fn apply_migration(&self, table: &str, migration: substrate_schema_track::Migration) -> Result<bool> {
        Ok(self.schema.lock().apply_migration(table, migration)?)
    }

    fn namespace_lock(&self, namespace: &str) -> Arc<AsyncMutex<()>> {
        self.namespace_locks
            .lock()
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn emit(&self, event: Event) {
        if self.events_tx.clone().send(event).await.is_err() {
            tracing::warn!("event channel has no live receiver; dropping event");
        }
    }

    /// Persists, classifies, and contradiction-scans one record (§4.G).
    /// Idempotent: re-ingesting identical content returns the same id and
    /// the cached classification, with no new edges or events beyond the
    /// metadata merge the underlying `put` already performs (§3 invariant 1,
    /// §8 "Idempotence of re-ingestion").
    pub async fn ingest(&self, descriptor: RecordDescriptor) -> Result<IngestOutcome> {
        let namespace = descriptor.namespace_or_table.clone();
        let guard = self.namespace_lock(&namespace);
        let _lock = guard.lock().await;

        let track = match descriptor.track {
            Track::Auto if self.bridges.read().contains_key(&namespace) => Track::Schema,
            Track::Auto => Track::Datum,
            other => other,
        };

        let (id, inserted, value) = match track {
            Track::Schema => {
                let bridge = self
                    .bridges
                    .read()
                    .get(&namespace)
                    .cloned()
                    .ok_or_else(|| Error::SchemaConflict(format!("no table registered: {namespace}")))?;
                let put = bridge.put(&descriptor.content)?;
                if put.inserted {
                    self.emit(Event::RowUpserted {
                        table: namespace.clone(),
                        primary_key: put.primary_key.clone(),
                        version: put.version,
                    })
                    .await;
                }
                let value = bridge.get(&put.id)?.unwrap_or(Value::Null);
                (put.id, put.inserted, value)
            }
            Track::Datum => {
                let outcome = self.datum_store.put(
                    &namespace,
                    descriptor.content.clone(),
                    descriptor.causal_parent,
                    descriptor.metadata.clone(),
                )?;
                if outcome.inserted {
                    let created_at = self
                        .datum_store
                        .get(&outcome.id)?
                        .map(|d| d.created_at())
                        .unwrap_or(0);
                    self.emit(Event::DatumInserted {
                        id: outcome.id,
                        namespace: namespace.clone(),
                        created_at,
                    })
                    .await;
                }
                let value = decode_any(&descriptor.content);
                (outcome.id, outcome.inserted, value)
            }
            Track::Auto => unreachable!("auto is resolved to Datum or Schema above"),
        };

        if !inserted {
            let cached = self.cache.get(&id);
            let (layer, loss, confidence) = cached
                .map(|c| {
                    let loss = c.measurement.as_ref().map(|m| m.total_loss);
                    let confidence = c.measurement.as_ref().map(confidence_of).unwrap_or(0.0);
                    (c.layer, loss, confidence)
                })
                .unwrap_or((Layer::Unknown, None, 0.0));
            return Ok(IngestOutcome {
                id,
                inserted: false,
                layer,
                loss,
                confidence,
            });
        }

        self.classify_and_scan(id, &namespace, &value, descriptor.declared_layer).await
    }

    async fn classify_and_scan(
        &self,
        id: DatumId,
        namespace: &str,
        value: &Value,
        declared_layer: Option<String>,
    ) -> Result<IngestOutcome> {
        let permit = self.limiter.acquire().await;
        let measured = async_std::future::timeout(
            self.config.oracle_timeout(),
            substrate_loss::measure(value, self.oracle.as_ref(), &self.config.loss),
        )
        .await;
        drop(permit);

        let measurement = match measured {
            Ok(Ok(measurement)) => measurement,
            _ => {
                self.cache.record_unavailable(id);
                let mut metadata = Metadata::new();
                metadata.insert("layer".into(), "unknown".into());
                metadata.insert("confidence".into(), 0.0.into());
                metadata.insert("timeout".into(), true.into());
                // A later reclassification pass must be able to overturn
                // this placeholder, so it's written through replace_metadata
                // rather than the usual non-conflicting merge (§4.F, §8
                // Scenario 5).
                self.datum_store.replace_metadata(&id, metadata)?;
                self.emit(Event::ClassificationAssigned {
                    id,
                    layer: "unknown".to_string(),
                    loss: None,
                    confidence: 0.0,
                })
                .await;
                return Ok(IngestOutcome {
                    id,
                    inserted: true,
                    layer: Layer::Unknown,
                    loss: None,
                    confidence: 0.0,
                });
            }
        };

        let layer = measurement.layer;
        let confidence = confidence_of(&measurement);
        let total_loss = measurement.total_loss;

        // L1 is "axiom candidate" territory (§4.F); only there is the
        // extra fixed-point cost worth paying.
        let mut axiom_candidate = false;
        if layer == Layer::L1 {
            let fp = substrate_loss::iterate_to_fixed_point(value, self.oracle.as_ref(), &self.config.loss).await?;
            if fp.converged {
                axiom_candidate = true;
                self.axioms.write().insert(id);
            }
        }

        // No dedicated ethical-principle oracle method exists in §4.E; a
        // record that round-trips with very low semantic loss is treated
        // as its own ethical-floor proxy score (documented in DESIGN.md).
        let ethics = substrate_loss::assess(1.0 - total_loss, &self.config.loss);

        self.cache.record_measurement(id, measurement.clone());

        // layer/loss/confidence/timeout are exactly the placeholder keys a
        // prior timeout may have set; a real classification always wins over
        // that degraded state, so these go through replace_metadata rather
        // than merge (§4.F, §8 Scenario 5). Everything else is append-only.
        let mut resolved = Metadata::new();
        resolved.insert("layer".into(), layer_name(layer).into());
        resolved.insert("loss".into(), total_loss.into());
        resolved.insert("confidence".into(), confidence.into());
        resolved.insert("timeout".into(), false.into());
        self.datum_store.replace_metadata(&id, resolved)?;

        let mut metadata = Metadata::new();
        metadata.insert("complexity".into(), complexity_name(measurement.classification).into());
        metadata.insert("axiom_candidate".into(), axiom_candidate.into());
        metadata.insert("ethical_floor_violated".into(), ethics.violates.into());
        if let Some(declared) = &declared_layer {
            metadata.insert("declared_layer".into(), declared.clone().into());
        }
        self.datum_store.merge_metadata(&id, metadata)?;

        self.emit(Event::ClassificationAssigned {
            id,
            layer: layer_name(layer).to_string(),
            loss: Some(total_loss),
            confidence,
        })
        .await;

        if ethics.violates {
            self.record_violation(id, namespace).await?;
        }

        self.scan_for_contradictions(id, namespace, value, &measurement).await?;

        Ok(IngestOutcome {
            id,
            inserted: true,
            layer,
            loss: Some(total_loss),
            confidence,
        })
    }

    /// Pairs the new record against every already-classified record in the
    /// namespace's recent tail (default window 128, §4.G) and flags a
    /// super-additive contradiction as a first-class `contradicts` edge
    /// (§3, §4.F).
    async fn scan_for_contradictions(
        &self,
        id: DatumId,
        namespace: &str,
        value: &Value,
        measurement: &LossMeasurement,
    ) -> Result<()> {
        let tail = self.datum_store.tail(namespace, self.config.contradiction_window);
        for prior in tail {
            if prior.id() == id {
                continue;
            }
            let Some(cached) = self.cache.get(&prior.id()) else {
                continue;
            };
            let Some(prior_measurement) = cached.measurement else {
                continue;
            };
            let prior_value = decode_any(prior.content());
            let combined = substrate_loss::combine(value, &prior_value);

            let permit = self.limiter.acquire().await;
            let combined_measurement = async_std::future::timeout(
                self.config.oracle_timeout(),
                substrate_loss::measure(&combined, self.oracle.as_ref(), &self.config.loss),
            )
            .await;
            drop(permit);

            let Ok(Ok(combined_measurement)) = combined_measurement else {
                continue;
            };

            if substrate_loss::is_super_additive(
                prior_measurement.total_loss,
                measurement.total_loss,
                combined_measurement.total_loss,
                self.config.loss.contradiction_margin,
            ) {
                self.record_contradiction(id, prior.id(), namespace).await?;
            }
        }
        Ok(())
    }

    /// Persists `kind` as a first-class datum in `<namespace>::edges` and
    /// publishes the resulting [`Edge`], returning it for callers that need
    /// to raise a follow-up event (e.g. `ContradictionDetected`).
    async fn record_edge(&self, source_id: DatumId, target_id: DatumId, namespace: &str, kind: &str) -> Result<Edge> {
        let mut metadata = Metadata::new();
        metadata.insert("kind".into(), kind.into());

        let payload = serde_json::json!({
            "source_id": source_id.to_string(),
            "target_id": target_id.to_string(),
            "kind": kind,
        });
        let edge_content = serde_json::to_vec(&payload).map_err(substrate_datum::Error::from)?;
        let edge_namespace = format!("{namespace}::edges");
        let outcome = self.datum_store.put(&edge_namespace, edge_content, None, metadata.clone())?;
        let created_at = self
            .datum_store
            .get(&outcome.id)?
            .map(|d| d.created_at())
            .unwrap_or(0);

        let edge = Edge {
            id: outcome.id,
            source_id,
            target_id,
            kind: kind.to_string(),
            metadata,
            created_at,
        };
        self.emit(Event::EdgeAdded { edge: edge.clone() }).await;
        Ok(edge)
    }

    async fn record_contradiction(&self, source_id: DatumId, target_id: DatumId, namespace: &str) -> Result<()> {
        let margin = self.config.loss.contradiction_margin;
        self.record_edge(source_id, target_id, namespace, "contradicts").await?;
        self.emit(Event::ContradictionDetected {
            source_id,
            target_id,
            margin,
        })
        .await;
        Ok(())
    }

    /// Records a `violation` edge from `source_id` to the synthetic
    /// `ethical_floor` sentinel id when a record's ethical assessment falls
    /// below the configured floor (§4.F, §8 Scenario 6).
    async fn record_violation(&self, source_id: DatumId, namespace: &str) -> Result<()> {
        self.record_edge(source_id, ethical_floor_sentinel(), namespace, "violation")
            .await?;
        Ok(())
    }

    /// Re-classifies every record still tagged `layer=unknown` (§4.F
    /// background reclassification pass, §8 Scenario 5). Returns how many
    /// records were successfully recovered.
    pub async fn reclassify_pending(&self) -> Result<usize> {
        let ids = self.cache.pending_reclassification();
        let mut recovered = 0;
        for id in ids {
            let Some(datum) = self.datum_store.get(&id)? else {
                continue;
            };
            let value = decode_any(datum.content());
            let namespace = datum.namespace().to_string();
            if self.classify_and_scan(id, &namespace, &value, None).await.is_ok() {
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    /// Explicitly restructures a record through the oracle. Rejected with
    /// [`Error::AxiomTampered`] if the record has been frozen as an axiom
    /// candidate (§4.F, §7).
    pub async fn restructure(&self, id: DatumId) -> Result<Value> {
        if self.axioms.read().contains(&id) {
            return Err(Error::AxiomTampered(id));
        }
        let datum = self
            .datum_store
            .get(&id)?
            .ok_or(Error::Datum(substrate_datum::Error::CausalMissing(id)))?;
        let value = decode_any(datum.content());
        let permit = self.limiter.acquire().await;
        let restructured = async_std::future::timeout(self.config.oracle_timeout(), self.oracle.restructure(&value))
            .await
            .map_err(|_| Error::Oracle(substrate_oracle::Error::Timeout))??;
        Ok(restructured)
    }

    /// Dumps every `contradicts`/derived edge recorded for `namespace`, read
    /// back from its `<namespace>::edges` shadow partition (§6 CLI
    /// `dump-edges`).
    pub fn edges(&self, namespace: &str) -> Result<Vec<Edge>> {
        let edge_namespace = format!("{namespace}::edges");
        let datums = self.datum_store.list(&edge_namespace, 0, None);
        let mut edges = Vec::with_capacity(datums.len());
        for datum in datums {
            let payload: serde_json::Value = serde_json::from_slice(datum.content()).map_err(substrate_datum::Error::from)?;
            let source_id: DatumId = payload["source_id"]
                .as_str()
                .unwrap_or_default()
                .parse()
                .map_err(|_| Error::SchemaConflict("corrupt edge payload".into()))?;
            let target_id: DatumId = payload["target_id"]
                .as_str()
                .unwrap_or_default()
                .parse()
                .map_err(|_| Error::SchemaConflict("corrupt edge payload".into()))?;
            edges.push(Edge {
                id: datum.id(),
                source_id,
                target_id,
                kind: payload["kind"].as_str().unwrap_or("contradicts").to_string(),
                metadata: datum.metadata().clone(),
                created_at: datum.created_at(),
            });
        }
        Ok(edges)
    }

    /// The underlying Datum Store, for callers (e.g. the admin CLI) that
    /// need direct read access beyond `ingest`/`edges`.
    pub fn datum_store(&self) -> &Arc<dyn DatumStore> {
        &self.datum_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use substrate_datum::MemoryDatumStore;
    use substrate_lens::PrimitiveKind;
    use substrate_oracle::{FlakyOracle, MockOracle};

    fn coordinator(oracle: Arc<dyn SemanticOracle>) -> (Coordinator, mpsc::Receiver<Event>) {
        let store: Arc<dyn DatumStore> = Arc::new(MemoryDatumStore::new());
        Coordinator::new(store, oracle, SubstrateConfig::default())
    }

    #[async_std::test]
    async fn ingesting_into_the_datum_track_classifies_and_emits() {
        let (coordinator, mut events) = coordinator(Arc::new(MockOracle::new()));
        let descriptor = RecordDescriptor::new("notes", b"stable fact".to_vec());
        let outcome = coordinator.ingest(descriptor).await.unwrap();
        assert!(outcome.inserted);
        assert_eq!(outcome.layer, Layer::L1);

        let mut saw_inserted = false;
        let mut saw_classified = false;
        while let Ok(Some(event)) = events.try_next() {
            match event {
                Event::DatumInserted { .. } => saw_inserted = true,
                Event::ClassificationAssigned { layer, .. } => {
                    saw_classified = true;
                    assert_eq!(layer, "L1");
                }
                _ => {}
            }
        }
        assert!(saw_inserted && saw_classified);
    }

    #[async_std::test]
    async fn reingesting_identical_content_is_idempotent() {
        let (coordinator, _events) = coordinator(Arc::new(MockOracle::new()));
        let descriptor = RecordDescriptor::new("notes", b"stable fact".to_vec());
        let first = coordinator.ingest(descriptor.clone()).await.unwrap();
        let second = coordinator.ingest(descriptor).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.inserted);
        assert_eq!(first.layer, second.layer);
    }

    #[async_std::test]
    async fn schema_track_ingestion_emits_row_upserted() {
        let (coordinator, mut events) = coordinator(Arc::new(MockOracle::new()));
        coordinator
            .register_table("users", "id", Kind::Primitive(PrimitiveKind::Text))
            .unwrap();
        let row = serde_json::json!({"id": "u1"});
        let descriptor = RecordDescriptor::new("users", serde_json::to_vec(&row).unwrap());
        let outcome = coordinator.ingest(descriptor).await.unwrap();
        assert!(outcome.inserted);

        let mut saw_row_upserted = false;
        while let Ok(Some(event)) = events.try_next() {
            if let Event::RowUpserted { table, primary_key, version } = event {
                assert_eq!(table, "users");
                assert_eq!(primary_key, "u1");
                assert_eq!(version, 1);
                saw_row_upserted = true;
            }
        }
        assert!(saw_row_upserted);
    }

    #[async_std::test]
    async fn axiom_candidates_reject_restructure() {
        let (coordinator, _events) = coordinator(Arc::new(MockOracle::new()));
        let descriptor = RecordDescriptor::new("axioms", b"immutable truth".to_vec());
        let outcome = coordinator.ingest(descriptor).await.unwrap();
        assert_eq!(outcome.layer, Layer::L1);

        let err = coordinator.restructure(outcome.id).await.unwrap_err();
        assert!(matches!(err, Error::AxiomTampered(id) if id == outcome.id));
    }

    struct ContradictingOracle;

    #[async_trait]
    impl SemanticOracle for ContradictingOracle {
        async fn restructure(&self, value: &Value) -> substrate_oracle::Result<Value> {
            Ok(value.clone())
        }

        async fn reconstitute(&self, value: &Value) -> substrate_oracle::Result<Value> {
            Ok(value.clone())
        }

        async fn distance(&self, a: &Value, b: &Value) -> substrate_oracle::Result<f64> {
            if matches!(a, Value::Array(items) if items.len() == 2) {
                return Ok(1.0);
            }
            Ok(if a == b { 0.0 } else { 0.3 })
        }
    }

    #[async_std::test]
    async fn combining_two_records_that_do_not_round_trip_together_flags_a_contradiction() {
        let (coordinator, mut events) = coordinator(Arc::new(ContradictingOracle));
        let first = coordinator
            .ingest(RecordDescriptor::new("claims", b"the sky is blue".to_vec()))
            .await
            .unwrap();
        let _second = coordinator
            .ingest(RecordDescriptor::new("claims", b"the sky is green".to_vec()))
            .await
            .unwrap();

        let mut saw_contradiction = false;
        while let Ok(Some(event)) = events.try_next() {
            if let Event::ContradictionDetected { target_id, .. } = event {
                assert_eq!(target_id, first.id);
                saw_contradiction = true;
            }
        }
        assert!(saw_contradiction);

        let edges = coordinator.edges("claims").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, "contradicts");
    }

    #[async_std::test]
    async fn background_reclassification_overwrites_the_unknown_placeholder() {
        let (coordinator, _events) = coordinator(Arc::new(FlakyOracle::new(1)));
        let descriptor = RecordDescriptor::new("notes", b"degraded on arrival".to_vec());
        let outcome = coordinator.ingest(descriptor).await.unwrap();
        assert_eq!(outcome.layer, Layer::Unknown);

        let before = coordinator.datum_store().get(&outcome.id).unwrap().unwrap();
        assert_eq!(before.metadata().get("layer").and_then(|v| v.as_text()), Some("unknown"));
        assert_eq!(before.metadata().get("timeout").and_then(|v| v.as_bool()), Some(true));

        let recovered = coordinator.reclassify_pending().await.unwrap();
        assert_eq!(recovered, 1);

        let after = coordinator.datum_store().get(&outcome.id).unwrap().unwrap();
        assert_eq!(after.metadata().get("layer").and_then(|v| v.as_text()), Some("L1"));
        assert_eq!(after.metadata().get("timeout").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(after.metadata().get("confidence").and_then(|v| v.as_float()), Some(1.0));
    }

    struct UnreliableOracle;

    #[async_trait]
    impl SemanticOracle for UnreliableOracle {
        async fn restructure(&self, value: &Value) -> substrate_oracle::Result<Value> {
            Ok(value.clone())
        }

        async fn reconstitute(&self, value: &Value) -> substrate_oracle::Result<Value> {
            Ok(value.clone())
        }

        async fn distance(&self, _a: &Value, _b: &Value) -> substrate_oracle::Result<f64> {
            Ok(1.0)
        }
    }

    #[async_std::test]
    async fn ingesting_a_record_below_the_ethical_floor_flags_a_violation() {
        let (coordinator, mut events) = coordinator(Arc::new(UnreliableOracle));
        let descriptor = RecordDescriptor::new("claims", b"untrustworthy record".to_vec());
        let outcome = coordinator.ingest(descriptor).await.unwrap();
        assert!(outcome.inserted);

        let mut saw_violation = false;
        while let Ok(Some(event)) = events.try_next() {
            if let Event::EdgeAdded { edge } = event {
                if edge.kind == "violation" {
                    assert_eq!(edge.source_id, outcome.id);
                    assert_eq!(edge.target_id, ethical_floor_sentinel());
                    saw_violation = true;
                }
            }
        }
        assert!(saw_violation);

        let edges = coordinator.edges("claims").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, "violation");
        assert_eq!(edges[0].target_id, ethical_floor_sentinel());
    }
}
