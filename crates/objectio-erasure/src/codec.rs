//! High-level `ErasureCodec`: the façade the storage and pipeline layers
//! call, wrapping an `ErasureContext` with shard/error types that speak
//! the rest of the engine's vocabulary.

use crate::context::ErasureContext;
use crate::shard::Shard;
use bytes::Bytes;
use objectio_common::{Error as CommonError, ErasureConfig};
use thiserror::Error;

/// Errors specific to erasure coding operations.
#[derive(Debug, Error)]
pub enum ErasureError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("decoding failed: {0}")]
    DecodingFailed(String),

    #[error("insufficient shards: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    #[error("shard size mismatch")]
    ShardSizeMismatch,
}

impl From<ErasureError> for CommonError {
    fn from(e: ErasureError) -> Self {
        match e {
            ErasureError::InsufficientShards { available, required } => {
                CommonError::ReconstructionFailure { available, required }
            }
            other => CommonError::Internal(other.to_string()),
        }
    }
}

impl From<CommonError> for ErasureError {
    fn from(e: CommonError) -> Self {
        match e {
            CommonError::ReconstructionFailure { available, required } => {
                Self::InsufficientShards { available, required }
            }
            CommonError::InvalidArgument(msg) => Self::InvalidConfig(msg),
            other => Self::EncodingFailed(other.to_string()),
        }
    }
}

/// Erasure codec over the Cauchy-matrix `ErasureContext`: any `k` shards
/// reconstruct the original payload.
pub struct ErasureCodec {
    config: ErasureConfig,
    ctx: ErasureContext,
}

impl ErasureCodec {
    pub fn new(config: ErasureConfig) -> Result<Self, ErasureError> {
        let ctx = ErasureContext::init(config.k, config.m)
            .map_err(|e| ErasureError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, ctx })
    }

    #[must_use]
    pub const fn config(&self) -> ErasureConfig {
        self.config
    }

    #[must_use]
    pub fn chunk_size(&self, payload_len: usize) -> usize {
        ErasureContext::calc_chunk_size(payload_len, self.config.k)
    }

    /// Encodes `data` into `n = k + m` shards.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Shard>, ErasureError> {
        let chunk_size = self.chunk_size(data.len());
        let raw = self
            .ctx
            .encode(data, chunk_size)
            .map_err(|e| ErasureError::EncodingFailed(e.to_string()))?;
        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(i, buf)| Shard::new(i, self.ctx.k(), Bytes::from(buf)))
            .collect())
    }

    /// Decodes `shards` (by index, `None` for absent/failed-checksum
    /// shards) back into a payload of `out_size` bytes.
    pub fn decode(
        &self,
        shards: Vec<Option<Shard>>,
        chunk_size: usize,
        out_size: usize,
    ) -> Result<Vec<u8>, ErasureError> {
        let available = shards.iter().filter(|s| s.is_some()).count();
        if available < self.ctx.k() {
            return Err(ErasureError::InsufficientShards {
                available,
                required: self.ctx.k(),
            });
        }
        let raw: Vec<Option<Vec<u8>>> = shards
            .into_iter()
            .map(|s| s.map(|shard| shard.data.to_vec()))
            .collect();
        self.ctx
            .decode(raw, chunk_size, out_size)
            .map_err(|e| ErasureError::DecodingFailed(e.to_string()))
    }

    /// Verifies every present shard's checksum, remapping a checksum
    /// mismatch to an absence (treated as missing for decode purposes).
    #[must_use]
    pub fn verify_shards(&self, shards: Vec<Option<Shard>>) -> Vec<Option<Shard>> {
        shards
            .into_iter()
            .map(|s| s.filter(Shard::verify))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let codec = ErasureCodec::new(ErasureConfig::new(4, 2).unwrap()).unwrap();
        let data = b"Hello, World!";
        let shards = codec.encode(data).unwrap();
        assert_eq!(shards.len(), 6);

        let chunk_size = shards[0].size();
        let wrapped: Vec<Option<Shard>> = shards.into_iter().map(Some).collect();
        let decoded = codec.decode(wrapped, chunk_size, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn decode_with_missing_shards_still_succeeds() {
        let codec = ErasureCodec::new(ErasureConfig::new(4, 2).unwrap()).unwrap();
        let data = b"missing shard recovery";
        let shards = codec.encode(data).unwrap();
        let chunk_size = shards[0].size();

        let mut wrapped: Vec<Option<Shard>> = shards.into_iter().map(Some).collect();
        wrapped[1] = None;
        let decoded = codec.decode(wrapped, chunk_size, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn decode_fails_below_k_shards() {
        let codec = ErasureCodec::new(ErasureConfig::new(4, 2).unwrap()).unwrap();
        let data = b"not enough shards to recover";
        let shards = codec.encode(data).unwrap();
        let chunk_size = shards[0].size();

        let mut wrapped: Vec<Option<Shard>> = shards.into_iter().map(Some).collect();
        wrapped[0] = None;
        wrapped[1] = None;
        wrapped[2] = None;
        let err = codec.decode(wrapped, chunk_size, data.len()).unwrap_err();
        assert!(matches!(err, ErasureError::InsufficientShards { .. }));
    }

    #[test]
    fn verify_shards_drops_corrupted_entries() {
        let codec = ErasureCodec::new(ErasureConfig::new(4, 2).unwrap()).unwrap();
        let shards = codec.encode(b"checksum verification").unwrap();
        let mut wrapped: Vec<Option<Shard>> = shards.into_iter().map(Some).collect();
        if let Some(shard) = wrapped[0].as_mut() {
            shard.data = Bytes::from_static(b"corrupted!!!!!!!");
        }
        let verified = codec.verify_shards(wrapped);
        assert!(verified[0].is_none());
        assert!(verified[1].is_some());
    }
}
