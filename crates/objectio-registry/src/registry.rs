//! The location registry: the authoritative (bucket, object, version) →
//! placement mapping, cached in memory and persisted through
//! [`RegistryStore`].

use crate::cache::RegistryCache;
use crate::store::RegistryStore;
use objectio_common::{Error, LocationRecord, RegistryKey, Result};
use std::time::Duration;
use tracing::{debug, instrument};

pub struct Registry {
    store: RegistryStore,
    cache: RegistryCache,
}

/// One page of a `list` scan.
pub struct ListPage {
    pub records: Vec<LocationRecord>,
    pub next_marker: Option<String>,
}

impl Registry {
    #[must_use]
    pub fn new(disk_roots: Vec<std::path::PathBuf>, max_entries: usize, ttl: Duration) -> Self {
        Self {
            store: RegistryStore::new(disk_roots),
            cache: RegistryCache::new(max_entries, ttl),
        }
    }

    #[must_use]
    pub fn cache_stats(&self) -> &crate::cache::CacheStats {
        self.cache.stats()
    }

    /// Persists `location`, then inserts/updates the cache. Rejects a
    /// write whose `generation` is not strictly greater than the
    /// currently stored record's, enforcing last-writer-wins ordering
    /// against concurrent PUTs of the same key.
    #[instrument(skip(self, location), fields(bucket = %location.bucket, object = %location.object))]
    pub fn record(&self, location: LocationRecord) -> Result<()> {
        let key = RegistryKey::new(
            location.bucket.clone(),
            location.object.clone(),
            Some(location.version_id.as_str()),
        );
        let storage_key = key.build() + ".json";
        if let Ok(existing) = self.store.get(&storage_key) {
            if location.generation <= existing.generation {
                return Err(Error::StaleGeneration {
                    expected: existing.generation,
                    actual: location.generation,
                });
            }
        }
        self.store.put(&location)?;
        self.cache.insert(key, location);
        debug!("recorded location");
        Ok(())
    }

    /// Cache-first lookup; `version_id = None` means `"latest"`.
    #[instrument(skip(self))]
    pub fn lookup(
        &self,
        bucket: &str,
        object: &str,
        version_id: Option<&str>,
    ) -> Result<LocationRecord> {
        let key = RegistryKey::new(bucket, object, version_id);
        if let Some(location) = self.cache.lookup(&key) {
            return Ok(location);
        }
        let storage_key = key.build() + ".json";
        let location = self.store.get(&storage_key).map_err(|e| {
            if e.is_not_found() {
                Error::not_found(format!("no such key: {bucket}/{object}"))
            } else {
                e
            }
        })?;
        self.cache.insert(key, location.clone());
        Ok(location)
    }

    /// Removes the storage record and invalidates the cache. Tolerates
    /// an already-absent entry.
    #[instrument(skip(self))]
    pub fn delete(&self, bucket: &str, object: &str, version_id: Option<&str>) -> Result<()> {
        let key = RegistryKey::new(bucket, object, version_id);
        let storage_key = key.build() + ".json";
        self.store.delete(&storage_key)?;
        self.cache.invalidate(&key);
        Ok(())
    }

    /// Invalidate-then-record, for atomicity with respect to cache
    /// observers (no window where a stale cached entry outlives the
    /// write that superseded it).
    pub fn update(&self, location: LocationRecord) -> Result<()> {
        let key = RegistryKey::new(
            location.bucket.clone(),
            location.object.clone(),
            Some(location.version_id.as_str()),
        );
        self.cache.invalidate(&key);
        self.record(location)
    }

    /// Scans the reserved bucket for records whose `bucket` matches and
    /// `object` starts with `prefix`, skipping delete markers, ordered
    /// lexicographically by object key. `next_marker` carries the last
    /// returned key when more results exist, beyond what the spec's
    /// literal text describes, to make repeated calls paginate instead
    /// of silently truncating.
    pub fn list(&self, bucket: &str, prefix: &str, max_keys: usize) -> Result<ListPage> {
        let mut matches: Vec<LocationRecord> = self
            .store
            .scan_all()?
            .into_iter()
            .filter(|r| r.bucket == bucket && r.object.starts_with(prefix))
            .filter(|r| !r.version_id.starts_with("delete-"))
            .collect();
        matches.sort_by(|a, b| a.object.cmp(&b.object));

        let next_marker = if matches.len() > max_keys {
            matches.truncate(max_keys);
            matches.last().map(|r| r.object.clone())
        } else {
            None
        };
        Ok(ListPage {
            records: matches,
            next_marker,
        })
    }

    /// Sequential fan-out; returns the count of successful records.
    pub fn record_batch(&self, locations: Vec<LocationRecord>) -> usize {
        locations
            .into_iter()
            .filter(|loc| self.record(loc.clone()).is_ok())
            .count()
    }

    /// Sequential fan-out lookup; returns one result per input key, in
    /// order, `None` for misses.
    pub fn lookup_batch(
        &self,
        keys: &[(String, String, Option<String>)],
    ) -> Vec<Option<LocationRecord>> {
        keys.iter()
            .map(|(bucket, object, version)| {
                self.lookup(bucket, object, version.as_deref()).ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rec(bucket: &str, object: &str, generation: u64) -> LocationRecord {
        LocationRecord {
            bucket: bucket.to_string(),
            object: object.to_string(),
            version_id: "latest".to_string(),
            pool_idx: 0,
            set_idx: 0,
            disk_count: 6,
            disk_idxs: vec![0, 1, 2, 3, 4, 5],
            generation,
            mod_time: 0,
            size: 10,
        }
    }

    fn registry() -> (tempfile::TempDir, Registry) {
        let dir = tempdir().unwrap();
        let reg = Registry::new(vec![dir.path().to_path_buf()], 10, Duration::from_secs(60));
        (dir, reg)
    }

    #[test]
    fn record_then_lookup_round_trips() {
        let (_dir, reg) = registry();
        reg.record(rec("b", "o", 1)).unwrap();
        let found = reg.lookup("b", "o", None).unwrap();
        assert_eq!(found.generation, 1);
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let (_dir, reg) = registry();
        let err = reg.lookup("b", "missing", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_then_lookup_is_not_found_and_delete_is_idempotent() {
        let (_dir, reg) = registry();
        reg.record(rec("b", "o", 1)).unwrap();
        reg.delete("b", "o", None).unwrap();
        reg.delete("b", "o", None).unwrap();
        assert!(reg.lookup("b", "o", None).is_err());
    }

    #[test]
    fn record_rejects_non_increasing_generation() {
        let (_dir, reg) = registry();
        reg.record(rec("b", "o", 5)).unwrap();
        let err = reg.record(rec("b", "o", 5)).unwrap_err();
        assert!(matches!(err, Error::StaleGeneration { expected: 5, actual: 5 }));
        let err = reg.record(rec("b", "o", 4)).unwrap_err();
        assert!(matches!(err, Error::StaleGeneration { expected: 5, actual: 4 }));
        // A strictly greater generation still succeeds.
        reg.record(rec("b", "o", 6)).unwrap();
        assert_eq!(reg.lookup("b", "o", None).unwrap().generation, 6);
    }

    #[test]
    fn update_is_invalidate_then_record() {
        let (_dir, reg) = registry();
        reg.record(rec("b", "o", 1)).unwrap();
        reg.update(rec("b", "o", 2)).unwrap();
        assert_eq!(reg.lookup("b", "o", None).unwrap().generation, 2);
    }

    #[test]
    fn list_filters_by_bucket_and_prefix_and_skips_delete_markers() {
        let (_dir, reg) = registry();
        reg.record(rec("b", "photos/1.jpg", 1)).unwrap();
        reg.record(rec("b", "photos/2.jpg", 1)).unwrap();
        reg.record(rec("b", "docs/readme.txt", 1)).unwrap();
        let mut tombstone = rec("b", "photos/3.jpg", 1);
        tombstone.version_id = "delete-abc".to_string();
        reg.store.put(&tombstone).unwrap();

        let page = reg.list("b", "photos/", 10).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].object, "photos/1.jpg");
        assert!(page.next_marker.is_none());
    }

    #[test]
    fn list_paginates_when_more_than_max_keys() {
        let (_dir, reg) = registry();
        for i in 0..5 {
            reg.record(rec("b", &format!("k{i}"), 1)).unwrap();
        }
        let page = reg.list("b", "", 3).unwrap();
        assert_eq!(page.records.len(), 3);
        assert!(page.next_marker.is_some());
    }

    #[test]
    fn record_batch_and_lookup_batch_fan_out() {
        let (_dir, reg) = registry();
        let count = reg.record_batch(vec![rec("b", "a", 1), rec("b", "b", 1)]);
        assert_eq!(count, 2);
        let results = reg.lookup_batch(&[
            ("b".to_string(), "a".to_string(), None),
            ("b".to_string(), "missing".to_string(), None),
        ]);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
    }
}
