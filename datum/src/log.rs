use crate::datum::Datum;
use crate::error::{Error, Result};
use crate::id::DatumId;
use crate::meta::{merge_non_conflicting, Metadata};
use crate::store::{DatumStore, MonotonicClock, PutOutcome};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// The on-disk framing for one appended record: a little-endian u32 length
/// prefix followed by the JSON encoding of [`Record`]. Plain manual framing
/// rather than a zero-copy archive format, so the encoding needs nothing
/// beyond `serde_json`.
#[derive(Serialize, Deserialize)]
struct Record {
    namespace: String,
    content: Vec<u8>,
    created_at: u64,
    causal_parent: Option<DatumId>,
    metadata: Metadata,
}

struct Namespace {
    order: Vec<DatumId>,
}

/// A durable backend that replays its append log on open and fsyncs each
/// write before returning. Second rung of the projection lattice described
/// in §4.A: same trait, same invariants, different durability guarantee.
pub struct LogDatumStore {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
    data: parking_lot::RwLock<BTreeMap<DatumId, Datum>>,
    namespaces: parking_lot::RwLock<BTreeMap<String, Namespace>>,
    clock: MonotonicClock,
}

impl LogDatumStore {
    /// Opens (creating if absent) the append log at `path` and replays it
    /// into memory. Corrupt trailing records are rejected as
    /// [`Error::IntegrityViolation`] rather than silently dropped, since a
    /// truncated write can never be distinguished from tampering.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut data = BTreeMap::new();
        let mut namespaces: BTreeMap<String, Namespace> = BTreeMap::new();

        if path.exists() {
            let mut reader = BufReader::new(File::open(&path)?);
            loop {
                let mut len_buf = [0u8; 4];
                match reader.read_exact(&mut len_buf) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                    Err(e) => return Err(Error::Io(e)),
                }
                let len = u32::from_le_bytes(len_buf) as usize;
                let mut buf = vec![0u8; len];
                reader.read_exact(&mut buf)?;
                let record: Record = serde_json::from_slice(&buf)?;
                let datum = Datum::new(
                    record.namespace.clone(),
                    record.content,
                    record.created_at,
                    record.causal_parent,
                    record.metadata,
                );
                if !datum.verify() {
                    return Err(Error::IntegrityViolation(datum.id()));
                }
                namespaces
                    .entry(record.namespace)
                    .or_insert_with(|| Namespace { order: Vec::new() })
                    .order
                    .push(datum.id());
                data.insert(datum.id(), datum);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
            data: parking_lot::RwLock::new(data),
            namespaces: parking_lot::RwLock::new(namespaces),
            clock: MonotonicClock::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &Record) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        let mut file = self.file.lock();
        file.write_all(&(bytes.len() as u32).to_le_bytes())?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.get_ref().sync_data()?;
        Ok(())
    }
}

impl DatumStore for LogDatumStore {
    fn put(
        &self,
        namespace: &str,
        content: Vec<u8>,
        causal_parent: Option<DatumId>,
        metadata: Metadata,
    ) -> Result<PutOutcome> {
        let id = DatumId::of(&content);
        {
            let data = self.data.read();
            if data.contains_key(&id) {
                drop(data);
                let mut data = self.data.write();
                if let Some(existing) = data.get_mut(&id) {
                    merge_non_conflicting(existing.metadata_mut(), metadata);
                }
                return Ok(PutOutcome { id, inserted: false });
            }
            if let Some(parent) = causal_parent {
                if !data.contains_key(&parent) {
                    return Err(Error::CausalMissing(parent));
                }
            }
        }

        let created_at = self.clock.next();
        let record = Record {
            namespace: namespace.to_string(),
            content: content.clone(),
            created_at,
            causal_parent,
            metadata: metadata.clone(),
        };
        self.append(&record)?;

        let datum = Datum::new(namespace.to_string(), content, created_at, causal_parent, metadata);
        self.data.write().insert(id, datum);
        self.namespaces
            .write()
            .entry(namespace.to_string())
            .or_insert_with(|| Namespace { order: Vec::new() })
            .order
            .push(id);
        tracing::debug!(namespace, %id, path = %self.path.display(), "datum appended");
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
        if let Some(datum) = data.get_mut(id) {
            merge_non_conflicting(datum.metadata_mut(), metadata);
        }
        Ok(())
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
    use tempfile::tempdir;

    #[test]
    fn replays_log_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datums.log");

        let a_id = {
            let store = LogDatumStore::open(&path).unwrap();
            let a = store.put("notes", b"first".to_vec(), None, Metadata::new()).unwrap();
            store.put("notes", b"second".to_vec(), Some(a.id), Metadata::new()).unwrap();
            a.id
        };

        let reopened = LogDatumStore::open(&path).unwrap();
        assert_eq!(reopened.list("notes", 0, None).len(), 2);
        assert!(reopened.get(&a_id).unwrap().is_some());
    }

    #[test]
    fn idempotent_put_does_not_duplicate_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datums.log");
        let store = LogDatumStore::open(&path).unwrap();
        store.put("notes", b"dup".to_vec(), None, Metadata::new()).unwrap();
        store.put("notes", b"dup".to_vec(), None, Metadata::new()).unwrap();
        assert_eq!(store.list("notes", 0, None).len(), 1);
    }
}
