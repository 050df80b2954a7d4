//! The `Shard` type: one of the `n = k+m` fixed-size buffers an object is
//! split into, plus the checksum the storage layer persists alongside it.

use bytes::Bytes;
use objectio_common::Checksum;

/// A single shard of erasure-coded data, indexed `0..n-1` (data shards
/// `0..k-1`, parity shards `k..n-1`).
#[derive(Clone, Debug)]
pub struct Shard {
    pub index: usize,
    pub is_parity: bool,
    pub data: Bytes,
    pub checksum: Checksum,
}

impl Shard {
    #[must_use]
    pub fn new(index: usize, k: usize, data: Bytes) -> Self {
        let checksum = Checksum::of(&data);
        Self {
            index,
            is_parity: index >= k,
            data,
            checksum,
        }
    }

    #[must_use]
    pub fn verify(&self) -> bool {
        self.checksum.verify(&self.data)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// `part.<1-based-index>`, the on-disk shard file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("part.{}", self.index + 1)
    }
}
