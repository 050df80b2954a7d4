//! Error taxonomy shared by every layer of the engine.
//!
//! Each layer returns one of these variants rather than a boxed or stringly
//! typed error; the pipeline is the only place that translates a variant
//! into an S3-facing status.

use std::io;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Abstract error kinds per the engine's error handling design.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed inputs: bad UUID, bad name, out-of-range argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Registry miss, shard absent, object directory missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Registry insert collision under strict-create semantics.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Filesystem failure (open/read/write/rename).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Hash primitive init failure; fatal for the operation.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Shard content disagrees with its stored digest.
    #[error("checksum mismatch for {0}")]
    ChecksumMismatch(String),

    /// Fewer than `k` shards were available to decode.
    #[error("reconstruction failed: {available} of {required} shards available")]
    ReconstructionFailure { available: usize, required: usize },

    /// Allocator refusal; no partial state is left behind.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// A write that observed fewer than the configured quorum of
    /// successful shard writes.
    #[error("quorum not reached: {achieved} of {required} shards written")]
    QuorumNotReached { achieved: usize, required: usize },

    /// A write to a location record whose generation was not strictly
    /// greater than the currently stored generation.
    #[error("stale write: generation {actual} is not greater than stored generation {expected}")]
    StaleGeneration { expected: u64, actual: u64 },

    /// Internal invariant violated in a way callers cannot act on.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a caller may retry the operation as-is (e.g. another shard
    /// read attempt), per the shard-read fan-out retry policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::ChecksumMismatch(_) | Self::NotFound(_)
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status an S3-facing collaborator should map this error to.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) => 409,
            Self::QuorumNotReached { .. } | Self::ReconstructionFailure { .. } => 500,
            Self::StaleGeneration { .. } => 409,
            Self::ChecksumMismatch(_) => 500,
            Self::Io(_) | Self::Crypto(_) | Self::OutOfMemory(_) | Self::Internal(_) => 500,
        }
    }

    /// S3-style error code for the object pipeline boundary.
    #[must_use]
    pub const fn s3_error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::NotFound(_) => "NoSuchKey",
            Self::AlreadyExists(_) => "BucketAlreadyExists",
            Self::Io(_) => "InternalError",
            Self::Crypto(_) => "InternalError",
            Self::ChecksumMismatch(_) => "InternalError",
            Self::ReconstructionFailure { .. } => "InternalError",
            Self::OutOfMemory(_) => "InternalError",
            Self::QuorumNotReached { .. } => "InternalError",
            Self::StaleGeneration { .. } => "PreconditionFailed",
            Self::Internal(_) => "InternalError",
        }
    }
}
