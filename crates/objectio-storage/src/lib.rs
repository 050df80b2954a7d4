//! ObjectIO Storage - content-addressed chunk I/O
//!
//! This crate implements the on-disk storage layer:
//! - Deterministic path derivation from `(bucket, key)`
//! - Atomic chunk writes (temp file → fsync → rename)
//! - The `xl.meta` JSON descriptor, including small-object inlining
//! - An async worker pool that offloads blocking disk calls

pub mod chunk;
pub mod meta;
pub mod path;
pub mod pool;

pub use chunk::{compute_checksum, delete_chunk, exists, read_chunk, verify, write_chunk};
pub use meta::{ErasureMeta, ObjectMeta, ShardDescriptor, XlMeta, INLINE_THRESHOLD};
pub use path::{meta_path, object_dir, shard_path};
pub use pool::{BatchResult, IoPool, PoolStats};
