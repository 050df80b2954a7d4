//! Self-hosted persistence: location records are stored as plain JSON
//! objects under the reserved `.buckets-registry` bucket, using the same
//! content-addressed path derivation and atomic write primitive the rest
//! of the engine uses for user data.

use objectio_common::{BucketName, Error, LocationRecord, Result};
use objectio_storage::{object_dir, write_chunk};
use std::path::{Path, PathBuf};

const RECORD_FILE: &str = "record.json";

/// Persists registry records to one or more disk roots via C4's atomic
/// write/read/delete primitives. Replicated to every root for
/// durability; reads try roots in order until one succeeds.
pub struct RegistryStore {
    disk_roots: Vec<PathBuf>,
}

impl RegistryStore {
    #[must_use]
    pub fn new(disk_roots: Vec<PathBuf>) -> Self {
        assert!(!disk_roots.is_empty(), "registry needs at least one disk root");
        Self { disk_roots }
    }

    fn record_path(&self, root: &Path, storage_key: &str) -> PathBuf {
        let op = objectio_common::ObjectPath::derive(BucketName::REGISTRY_BUCKET, storage_key);
        object_dir(root, &op).join(RECORD_FILE)
    }

    pub fn put(&self, record: &LocationRecord) -> Result<()> {
        let json = serde_json::to_vec(record)
            .map_err(|e| Error::internal(format!("failed to serialize location record: {e}")))?;
        let storage_key = record.storage_key();
        for root in &self.disk_roots {
            write_chunk(&self.record_path(root, &storage_key), &json)?;
        }
        Ok(())
    }

    pub fn get(&self, storage_key: &str) -> Result<LocationRecord> {
        for root in &self.disk_roots {
            let path = self.record_path(root, storage_key);
            if path.is_file() {
                let bytes = objectio_storage::read_chunk(&path)?;
                return serde_json::from_slice(&bytes)
                    .map_err(|e| Error::internal(format!("corrupt registry record: {e}")));
            }
        }
        Err(Error::not_found(format!("no registry record for {storage_key}")))
    }

    pub fn delete(&self, storage_key: &str) -> Result<()> {
        for root in &self.disk_roots {
            objectio_storage::delete_chunk(&self.record_path(root, storage_key))?;
        }
        Ok(())
    }

    /// Walks every object directory on the primary disk root and returns
    /// every parsed record. Used by `list`; O(objects in the registry
    /// bucket), which is acceptable for the reserved bucket's own scale.
    pub fn scan_all(&self) -> Result<Vec<LocationRecord>> {
        let root = &self.disk_roots[0];
        let mut out = Vec::new();
        if !root.is_dir() {
            return Ok(out);
        }
        for prefix_entry in std::fs::read_dir(root)? {
            let prefix_entry = prefix_entry?;
            if !prefix_entry.file_type()?.is_dir() {
                continue;
            }
            for hash_entry in std::fs::read_dir(prefix_entry.path())? {
                let hash_entry = hash_entry?;
                if !hash_entry.file_type()?.is_dir() {
                    continue;
                }
                let record_path = hash_entry.path().join(RECORD_FILE);
                if record_path.is_file() {
                    let bytes = objectio_storage::read_chunk(&record_path)?;
                    if let Ok(record) = serde_json::from_slice::<LocationRecord>(&bytes) {
                        out.push(record);
                    }
                }
            }
        }
        Ok(out)
    }
}
