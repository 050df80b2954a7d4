//! `xl.meta`: the JSON descriptor stored alongside (or, for inline
//! objects, instead of) an object's shard files.

use base64::Engine;
use objectio_common::Error;
use serde::{Deserialize, Serialize};

/// `INLINE_THRESHOLD` below which a payload may be stored entirely
/// inside `xl.meta` rather than as separate `part.*` files.
pub const INLINE_THRESHOLD: u64 = 128 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ObjectMeta {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub user_metadata: std::collections::BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ErasureMeta {
    pub k: u8,
    pub m: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShardDescriptor {
    pub index: usize,
    pub algo: String,
    pub digest: String,
}

/// The `xl.meta` document, field names matching the wire format exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XlMeta {
    pub meta: ObjectMeta,
    pub erasure: ErasureMeta,
    pub chunk_size: usize,
    pub size: u64,
    pub version_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
    #[serde(default)]
    pub shards: Vec<ShardDescriptor>,
}

impl XlMeta {
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.inline.is_some()
    }

    /// Builds the descriptor for an inline object: payload below
    /// `INLINE_THRESHOLD`, stored as base64 directly in `xl.meta`.
    #[must_use]
    pub fn inline(meta: ObjectMeta, version_id: String, payload: &[u8]) -> Self {
        Self {
            meta,
            erasure: ErasureMeta { k: 0, m: 0 },
            chunk_size: 0,
            size: payload.len() as u64,
            version_id,
            inline: Some(base64::engine::general_purpose::STANDARD.encode(payload)),
            shards: Vec::new(),
        }
    }

    /// Builds the descriptor for an erasure-coded object.
    #[must_use]
    pub fn erasure_coded(
        meta: ObjectMeta,
        version_id: String,
        k: u8,
        m: u8,
        chunk_size: usize,
        size: u64,
        shards: Vec<ShardDescriptor>,
    ) -> Self {
        Self {
            meta,
            erasure: ErasureMeta { k, m },
            chunk_size,
            size,
            version_id,
            inline: None,
            shards,
        }
    }

    /// Decodes the inline payload, if present.
    pub fn inline_payload(&self) -> Option<Result<Vec<u8>, Error>> {
        self.inline.as_ref().map(|encoded| {
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| Error::invalid_argument(format!("corrupt inline payload: {e}")))
        })
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("XlMeta always serializes")
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::invalid_argument(format!("corrupt xl.meta: {e}")))
    }
}
