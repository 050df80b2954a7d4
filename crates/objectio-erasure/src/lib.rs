//! ObjectIO Erasure Coding - Reed-Solomon MDS codes over GF(2^8)
//!
//! A systematic Cauchy-matrix construction splits an object into `k` data
//! shards plus `m` parity shards; any `k` of the resulting `n = k + m`
//! shards reconstruct the original payload.
//!
//! # Example
//!
//! ```
//! use objectio_erasure::ErasureCodec;
//! use objectio_common::ErasureConfig;
//!
//! let codec = ErasureCodec::new(ErasureConfig::new(4, 2).unwrap()).unwrap();
//! let data = b"Hello, World!";
//! let shards = codec.encode(data).unwrap();
//! assert_eq!(shards.len(), 6);
//! ```

pub mod cauchy;
pub mod codec;
pub mod context;
pub mod gf;
pub mod shard;

pub use codec::{ErasureCodec, ErasureError};
pub use context::ErasureContext;
pub use shard::Shard;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{ErasureCodec, ErasureContext, ErasureError, Shard};
}
