use crate::datum::Datum;
use crate::error::{Error, Result};
use crate::id::DatumId;
use crate::meta::{merge_non_conflicting, Metadata};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// The outcome of a `put`: whether this call actually inserted a new datum
/// or found an existing one (§3 invariant 1, §8 invariant 1: idempotence).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PutOutcome {
    pub id: DatumId,
    pub inserted: bool,
}

/// Strictly increasing nanosecond timestamps, even under duplicate
/// `SystemTime::now()` reads or clock regressions -- "created_at: assigned
/// on first write" (§3) must be monotonic across the namespace write lock.
#[derive(Default)]
pub struct MonotonicClock(AtomicU64);

impl MonotonicClock {
    pub fn next(&self) -> u64 {
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

/// A backend in the projection lattice described in §4.A: in-memory through
/// durable replicated log, all preserving the same idempotence and
/// parent-existence invariants. Lens operations, id computation, and
/// in-memory store operations never suspend (§5), so this trait is
/// deliberately synchronous; the Coordinator is responsible for treating
/// durable-backend calls as the "bounded but I/O-dependent" suspension
/// points §5 describes.
pub trait DatumStore: Send + Sync {
    /// Computes `id = DatumId::of(content)`. If it already exists, merges
    /// non-conflicting metadata and returns it unchanged (idempotent);
    /// otherwise verifies `causal_parent` resolves, persists, and returns
    /// `inserted: true`.
    fn put(
        &self,
        namespace: &str,
        content: Vec<u8>,
        causal_parent: Option<DatumId>,
        metadata: Metadata,
    ) -> Result<PutOutcome>;

    fn get(&self, id: &DatumId) -> Result<Option<Datum>>;

    /// Merges additional metadata into an existing datum, non-conflicting
    /// keys only (§3 invariant 3). Used by the Loss Engine/background
    /// reclassification pass to attach `layer`/`loss`/`confidence` after the
    /// fact without re-running `put`.
    fn merge_metadata(&self, id: &DatumId, metadata: Metadata) -> Result<()>;

    /// Unconditionally overwrites the given metadata keys, bypassing the
    /// non-conflicting rule. Reserved for the one documented exception to
    /// §3 invariant 3: replacing a degenerate `layer=unknown`/`loss=null`
    /// placeholder once a background reclassification pass succeeds (§8
    /// Scenario 5). Not used by ordinary ingestion.
    fn replace_metadata(&self, id: &DatumId, updates: Metadata) -> Result<()>;

    /// Insertion-ordered, restartable via `since` (an ordinal cursor within
    /// the namespace, §9 "Lazy sequences"), optionally bounded by `until`.
    fn list<'a>(&'a self, namespace: &str, since: u64, until: Option<u64>) -> Vec<Datum>;

    /// The path from `id` back to its root, inclusive of `id`. Finite and
    /// acyclic by construction: ids are content-derived so a parent chain
    /// cannot cycle back to a descendant (§8 invariant 3).
    fn parents(&self, id: &DatumId) -> Result<Vec<DatumId>>;

    /// Bounded tail of the most recent datums in a namespace, used by the
    /// Coordinator's contradiction check (§4.G, default window 128).
    fn tail(&self, namespace: &str, window: usize) -> Vec<Datum>;
}

#[derive(Default)]
struct Namespace {
    order: Vec<DatumId>,
}

/// The lowest rung of the projection lattice: everything lives in memory,
/// guarded by a per-namespace write lock and wait-free shared reads across
/// namespaces (§5), using the same `parking_lot::RwLock` idiom as every
/// other in-process lock in this crate.
pub struct MemoryDatumStore {
    data: RwLock<BTreeMap<DatumId, Datum>>,
    namespaces: RwLock<BTreeMap<String, Namespace>>,
    clock: MonotonicClock,
}

impl Default for MemoryDatumStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatumStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            namespaces: RwLock::new(BTreeMap::new()),
            clock: MonotonicClock::default(),
        }
    }
}

impl DatumStore for MemoryDatumStore {
    fn put(
        &self,
        namespace: &str,
        content: Vec<u8>,
        causal_parent: Option<DatumId>,
        metadata: Metadata,
    ) -> Result<PutOutcome> {
        let id = DatumId::of(&content);
        {
            let mut data = self.data.write();
            if let Some(existing) = data.get_mut(&id) {
                merge_non_conflicting(existing.metadata_mut(), metadata);
                return Ok(PutOutcome { id, inserted: false });
            }
            if let Some(parent) = causal_parent {
                if !data.contains_key(&parent) {
                    return Err(Error::CausalMissing(parent));
                }
            }
            let created_at = self.clock.next();
            let datum = Datum::new(namespace.to_string(), content, created_at, causal_parent, metadata);
            data.insert(id, datum);
        }
        self.namespaces
            .write()
            .entry(namespace.to_string())
            .or_default()
            .order
            .push(id);
        tracing::debug!(namespace, %id, "datum inserted");
        Ok(PutOutcome { id, inserted: true })
    }

    fn get(&self, id: &DatumId) -> Result<Option<Datum>> {
        match self.data.read().get(id).cloned() {
            Some(datum) => {
                if !datum.verify() {
                    return Err(Error::IntegrityViolation(*id));
                }
                Ok(Some(datum))
            }
            None => Ok(None),
        }
    }

    fn merge_metadata(&self, id: &DatumId, metadata: Metadata) -> Result<()> {
        let mut data = self.data.write();
        match data.get_mut(id) {
            Some(datum) => {
                merge_non_conflicting(datum.metadata_mut(), metadata);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn replace_metadata(&self, id: &DatumId, updates: Metadata) -> Result<()> {
        let mut data = self.data.write();
        if let Some(datum) = data.get_mut(id) {
            datum.metadata_mut().extend(updates);
        }
        Ok(())
    }

    fn list<'a>(&'a self, namespace: &str, since: u64, until: Option<u64>) -> Vec<Datum> {
        let namespaces = self.namespaces.read();
        let data = self.data.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Vec::new();
        };
        let end = until.map(|u| u as usize).unwrap_or(ns.order.len());
        ns.order
            .iter()
            .enumerate()
            .skip(since as usize)
            .take(end.saturating_sub(since as usize))
            .filter_map(|(_, id)| data.get(id).cloned())
            .collect()
    }

    fn parents(&self, id: &DatumId) -> Result<Vec<DatumId>> {
        let data = self.data.read();
        let mut path = Vec::new();
        let mut cursor = Some(*id);
        let total = data.len();
        while let Some(current) = cursor {
            path.push(current);
            if path.len() > total {
                // ids are content-derived and cannot cycle; this can only
                // indicate a bug in a backend's parent bookkeeping.
                break;
            }
            cursor = data.get(&current).and_then(|d| d.causal_parent());
        }
        Ok(path)
    }

    fn tail(&self, namespace: &str, window: usize) -> Vec<Datum> {
        let namespaces = self.namespaces.read();
        let data = self.data.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Vec::new();
        };
        let start = ns.order.len().saturating_sub(window);
        ns.order[start..].iter().filter_map(|id| data.get(id).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_put_returns_same_id_once() {
        let store = MemoryDatumStore::new();
        let a = store.put("marks", b"hello world".to_vec(), None, Metadata::new()).unwrap();
        let b = store.put("marks", b"hello world".to_vec(), None, Metadata::new()).unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.inserted);
        assert!(!b.inserted);
        assert_eq!(store.list("marks", 0, None).len(), 1);
    }

    #[test]
    fn causal_chain_of_three() {
        let store = MemoryDatumStore::new();
        let a = store.put("trace", b"A".to_vec(), None, Metadata::new()).unwrap();
        let b = store.put("trace", b"B".to_vec(), Some(a.id), Metadata::new()).unwrap();
        let c = store.put("trace", b"C".to_vec(), Some(b.id), Metadata::new()).unwrap();

        let path = store.parents(&c.id).unwrap();
        assert_eq!(path, vec![c.id, b.id, a.id]);

        let missing = DatumId::of(b"phantom-parent");
        let err = store.put("trace", b"D".to_vec(), Some(missing), Metadata::new());
        assert!(matches!(err, Err(Error::CausalMissing(id)) if id == missing));
    }

    #[test]
    fn metadata_merge_never_overwrites_existing_values() {
        let store = MemoryDatumStore::new();
        let mut meta = Metadata::new();
        meta.insert("layer".into(), "L1".into());
        let put = store.put("claims", b"x".to_vec(), None, meta).unwrap();

        let mut conflicting = Metadata::new();
        conflicting.insert("layer".into(), "L7".into());
        conflicting.insert("source".into(), "import".into());
        store.put("claims", b"x".to_vec(), None, conflicting).unwrap();

        let datum = store.get(&put.id).unwrap().unwrap();
        assert_eq!(datum.metadata().get("layer").unwrap().as_text(), Some("L1"));
        assert_eq!(datum.metadata().get("source").unwrap().as_text(), Some("import"));
    }
}
