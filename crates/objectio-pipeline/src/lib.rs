//! Object pipeline: PUT/GET/DELETE orchestration across placement,
//! erasure coding, chunk storage, and the location registry. This is
//! the glue that proves the lower layers' contracts end to end.

use objectio_common::{
    hash::md5,
    BucketName, Checksum, DeploymentId, Error, ErasureConfig, LocationRecord, ObjectKey,
    ObjectPath, Result,
};
use objectio_erasure::ErasureCodec;
use objectio_placement::object_to_set;
use objectio_registry::Registry;
use objectio_storage::{meta_path, object_dir, shard_path, IoPool, ObjectMeta, ShardDescriptor, XlMeta, INLINE_THRESHOLD};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, instrument, warn};

/// Outcome of a successful PUT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutResult {
    pub etag: String,
    pub size: u64,
}

/// Outcome of a successful GET.
#[derive(Clone, Debug)]
pub struct GetResult {
    pub data: Vec<u8>,
    pub etag: String,
    pub content_type: Option<String>,
}

/// Owns every component a request needs: placement inputs, the erasure
/// context, the disk roots, the async I/O pool, and the registry. No
/// global state — every operation is a method call on this object.
pub struct Service {
    deployment_id: DeploymentId,
    disk_roots: Vec<PathBuf>,
    codec: ErasureCodec,
    erasure_config: ErasureConfig,
    registry: Registry,
    io_pool: IoPool,
    inline_threshold: u64,
}

impl Service {
    pub fn new(
        deployment_id: DeploymentId,
        disk_roots: Vec<PathBuf>,
        registry: Registry,
    ) -> Result<Self> {
        let erasure_config = ErasureConfig::for_disk_count(disk_roots.len());
        let codec = ErasureCodec::new(erasure_config)
            .map_err(|e| Error::internal(format!("failed to init erasure codec: {e}")))?;
        let worker_count = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(4);
        Ok(Self {
            deployment_id,
            disk_roots,
            codec,
            erasure_config,
            registry,
            io_pool: IoPool::new(worker_count),
            inline_threshold: INLINE_THRESHOLD,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn set_count(&self) -> usize {
        (self.disk_roots.len() / self.erasure_config.n()).max(1)
    }

    /// Chooses the `n` disk indices for a set, given `set_idx`: sets own
    /// contiguous, non-overlapping slices of the disk pool.
    fn disk_indices_for_set(&self, set_idx: usize) -> Vec<usize> {
        let n = self.erasure_config.n();
        (0..n).map(|i| (set_idx * n + i) % self.disk_roots.len()).collect()
    }

    #[instrument(skip(self, payload), fields(bucket, key))]
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
        content_type: Option<String>,
    ) -> Result<PutResult> {
        let bucket_name = BucketName::new(bucket).map_err(|e| Error::invalid_argument(e.to_string()))?;
        if bucket_name.is_reserved() {
            return Err(Error::invalid_argument("cannot write to reserved bucket"));
        }
        let object_key = ObjectKey::new(key).map_err(|e| Error::invalid_argument(e.to_string()))?;

        let name_bytes = format!("{}/{}", bucket_name.as_str(), object_key.as_str()).into_bytes();
        let set_idx = object_to_set(&name_bytes, &self.deployment_id, self.set_count())?;
        let disk_idxs = self.disk_indices_for_set(set_idx);
        let object_path = ObjectPath::derive(bucket_name.as_str(), object_key.as_str());

        let etag = hex::encode(md5(payload));
        let size = payload.len() as u64;
        let meta = ObjectMeta {
            content_type,
            user_metadata: Default::default(),
        };

        if size < self.inline_threshold {
            let xl = XlMeta::inline(meta, "latest".to_string(), payload);
            self.write_meta_everywhere(&object_path, &disk_idxs, &xl).await?;
        } else {
            let shards = self
                .codec
                .encode(payload)
                .map_err(|e| Error::internal(format!("encode failed: {e}")))?;
            let chunk_size = shards.first().map(objectio_erasure::Shard::size).unwrap_or(0);

            let writes: Vec<(PathBuf, Vec<u8>)> = shards
                .iter()
                .zip(disk_idxs.iter())
                .map(|(shard, &disk_idx)| {
                    let root = &self.disk_roots[disk_idx];
                    (shard_path(root, &object_path, shard.index), shard.data.to_vec())
                })
                .collect();

            let batch = self.io_pool.batch_write(writes).await;
            let required = self.erasure_config.n();
            if !batch.meets_quorum(required) {
                warn!(succeeded = batch.succeeded, required, "put quorum not reached, cleaning up");
                self.best_effort_delete(&object_path, &disk_idxs).await;
                return Err(Error::QuorumNotReached {
                    achieved: batch.succeeded,
                    required,
                });
            }

            let descriptors: Vec<ShardDescriptor> = shards
                .iter()
                .map(|s| ShardDescriptor {
                    index: s.index,
                    algo: s.checksum.algo.clone(),
                    digest: s.checksum.digest_hex(),
                })
                .collect();
            let xl = XlMeta::erasure_coded(
                meta,
                "latest".to_string(),
                self.erasure_config.k,
                self.erasure_config.m,
                chunk_size,
                size,
                descriptors,
            );
            self.write_meta_everywhere(&object_path, &disk_idxs, &xl).await?;
        }

        let mod_time = now_secs();
        // generation must strictly increase even when two PUTs of the
        // same key land within the same wall-clock second.
        let generation = match self.registry.lookup(bucket, key, None) {
            Ok(existing) => mod_time.max(existing.generation + 1),
            Err(_) => mod_time,
        };
        self.registry.record(LocationRecord {
            bucket: bucket_name.as_str().to_string(),
            object: object_key.as_str().to_string(),
            version_id: "latest".to_string(),
            pool_idx: 0,
            set_idx: set_idx as u32,
            disk_count: disk_idxs.len() as u32,
            disk_idxs: disk_idxs.iter().map(|&i| i as u32).collect(),
            generation,
            mod_time,
            size,
        })?;

        info!(bucket, key, size, "put_object complete");
        Ok(PutResult { etag, size })
    }

    async fn write_meta_everywhere(
        &self,
        object_path: &ObjectPath,
        disk_idxs: &[usize],
        xl: &XlMeta,
    ) -> Result<()> {
        let json = xl.to_json().into_bytes();
        let writes: Vec<(PathBuf, Vec<u8>)> = disk_idxs
            .iter()
            .map(|&disk_idx| {
                let root = &self.disk_roots[disk_idx];
                (meta_path(root, object_path), json.clone())
            })
            .collect();
        let batch = self.io_pool.batch_write(writes).await;
        if batch.succeeded == 0 {
            return Err(Error::internal("failed to write xl.meta to any disk"));
        }
        Ok(())
    }

    async fn best_effort_delete(&self, object_path: &ObjectPath, disk_idxs: &[usize]) {
        for &disk_idx in disk_idxs {
            let root = &self.disk_roots[disk_idx];
            let dir = object_dir(root, object_path);
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[instrument(skip(self), fields(bucket, key))]
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<GetResult> {
        let record = self.registry.lookup(bucket, key, None)?;
        let object_path = ObjectPath::derive(bucket, key);
        let disk_idxs: Vec<usize> = record.disk_idxs.iter().map(|&i| i as usize).collect();

        // Any disk carries the same xl.meta (replicated); read the first
        // that responds.
        let mut xl_meta = None;
        for &disk_idx in &disk_idxs {
            let root = &self.disk_roots[disk_idx];
            if let Ok(bytes) = self.io_pool.read_chunk(meta_path(root, &object_path)).await {
                if let Ok(parsed) = XlMeta::from_json(&bytes) {
                    xl_meta = Some(parsed);
                    break;
                }
            }
        }
        let xl = xl_meta.ok_or_else(|| Error::not_found(format!("no such key: {bucket}/{key}")))?;

        let data = if let Some(result) = xl.inline_payload() {
            result?
        } else {
            self.read_and_decode(&object_path, &disk_idxs, &xl).await?
        };

        let etag = hex::encode(md5(&data));
        Ok(GetResult {
            data,
            etag,
            content_type: xl.meta.content_type.clone(),
        })
    }

    /// Issues concurrent shard reads to the `n` disks and stops polling
    /// as soon as `k` verified-valid shards have arrived, rather than
    /// waiting on every read — the in-flight reads still standing are
    /// simply dropped unpolled (the I/O pool itself runs each submitted
    /// read to completion regardless; this only saves the caller's wait).
    async fn read_and_decode(
        &self,
        object_path: &ObjectPath,
        disk_idxs: &[usize],
        xl: &XlMeta,
    ) -> Result<Vec<u8>> {
        let k = xl.erasure.k as usize;
        let mut shards: Vec<Option<objectio_erasure::Shard>> = vec![None; disk_idxs.len()];

        let mut reads: FuturesUnordered<_> = disk_idxs
            .iter()
            .enumerate()
            .map(|(i, &disk_idx)| {
                let root = self.disk_roots[disk_idx].clone();
                let path = shard_path(&root, object_path, i);
                async move { (i, self.io_pool.read_chunk(path).await) }
            })
            .collect();

        let mut valid = 0usize;
        while valid < k {
            let Some((i, result)) = reads.next().await else {
                break;
            };
            let Ok(data) = result else {
                continue;
            };
            let descriptor = xl.shards.iter().find(|d| d.index == i);
            let checksum = descriptor.and_then(|d| {
                hex::decode(&d.digest).ok().and_then(|digest_bytes| {
                    <[u8; 32]>::try_from(digest_bytes.as_slice())
                        .ok()
                        .map(|digest| Checksum {
                            algo: d.algo.clone(),
                            digest,
                        })
                })
            });
            let checksum_ok = checksum.as_ref().is_none_or(|c| c.verify(&data));
            if checksum_ok {
                shards[i] = Some(objectio_erasure::Shard::new(i, k, bytes::Bytes::from(data)));
                valid += 1;
            }
        }

        self.codec
            .decode(shards, xl.chunk_size, xl.size as usize)
            .map_err(Error::from)
    }

    #[instrument(skip(self), fields(bucket, key))]
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        if let Ok(record) = self.registry.lookup(bucket, key, None) {
            let object_path = ObjectPath::derive(bucket, key);
            let disk_idxs: Vec<usize> = record.disk_idxs.iter().map(|&i| i as usize).collect();
            self.best_effort_delete(&object_path, &disk_idxs).await;
        }
        let _ = self.registry.delete(bucket, key, None);
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn service(n_disks: usize) -> (Vec<tempfile::TempDir>, Service) {
        let dirs: Vec<_> = (0..n_disks).map(|_| tempdir().unwrap()).collect();
        let roots: Vec<PathBuf> = dirs.iter().map(|d| d.path().to_path_buf()).collect();
        let registry_root = tempdir().unwrap();
        let registry = Registry::new(
            vec![registry_root.path().to_path_buf()],
            100,
            Duration::from_secs(60),
        );
        let svc = Service::new(DeploymentId::from_bytes([1u8; 16]), roots, registry).unwrap();
        let mut all = dirs;
        all.push(registry_root);
        (all, svc)
    }

    #[tokio::test]
    async fn small_object_round_trips_inline() {
        let (_dirs, svc) = service(6).await;
        let put = svc
            .put_object("bucket", "hello.txt", b"Hello, World!", Some("text/plain".into()))
            .await
            .unwrap();
        let got = svc.get_object("bucket", "hello.txt").await.unwrap();
        assert_eq!(got.data, b"Hello, World!");
        assert_eq!(got.etag, put.etag);
    }

    #[tokio::test]
    async fn large_object_round_trips_through_erasure_coding() {
        let (_dirs, svc) = service(6).await;
        let payload = vec![7u8; 200 * 1024];
        let put = svc.put_object("bucket", "big.bin", &payload, None).await.unwrap();
        let got = svc.get_object("bucket", "big.bin").await.unwrap();
        assert_eq!(got.data, payload);
        assert_eq!(got.etag, put.etag);
    }

    #[tokio::test]
    async fn put_object_overwrite_advances_generation() {
        let (_dirs, svc) = service(6).await;
        svc.put_object("bucket", "obj", b"first", None).await.unwrap();
        let gen1 = svc.registry().lookup("bucket", "obj", None).unwrap().generation;
        // Overwriting immediately (possibly within the same wall-clock
        // second) must still succeed with a strictly greater generation.
        svc.put_object("bucket", "obj", b"second", None).await.unwrap();
        let record2 = svc.registry().lookup("bucket", "obj", None).unwrap();
        assert!(record2.generation > gen1);
        let got = svc.get_object("bucket", "obj").await.unwrap();
        assert_eq!(got.data, b"second");
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let (_dirs, svc) = service(6).await;
        let err = svc.get_object("bucket", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found_and_delete_is_idempotent() {
        let (_dirs, svc) = service(6).await;
        svc.put_object("bucket", "obj", b"data", None).await.unwrap();
        svc.delete_object("bucket", "obj").await.unwrap();
        svc.delete_object("bucket", "obj").await.unwrap();
        assert!(svc.get_object("bucket", "obj").await.is_err());
    }

    #[tokio::test]
    async fn rejects_writes_to_reserved_bucket() {
        let (_dirs, svc) = service(6).await;
        let err = svc
            .put_object(".buckets-registry", "x", b"data", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn put_then_get_survives_one_missing_shard() {
        let (dirs, svc) = service(6).await;
        let payload = vec![9u8; 300 * 1024];
        svc.put_object("bucket", "resilient.bin", &payload, None)
            .await
            .unwrap();

        // Knock out the first disk root entirely, simulating a lost
        // shard; decode must still succeed from the remaining 5.
        let _ = std::fs::remove_dir_all(dirs[0].path());

        let got = svc.get_object("bucket", "resilient.bin").await.unwrap();
        assert_eq!(got.data, payload);
    }
}
