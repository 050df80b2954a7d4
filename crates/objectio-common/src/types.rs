//! Core data model: object naming, deployment identity, erasure
//! configuration, checksums, object paths, and location records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket name, 3-63 lowercase alphanumerics plus `-` and `.`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketName(String);

impl BucketName {
    pub fn new(name: impl Into<String>) -> Result<Self, BucketNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    #[must_use]
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), BucketNameError> {
        if name.len() < 3 {
            return Err(BucketNameError::TooShort);
        }
        if name.len() > 63 {
            return Err(BucketNameError::TooLong);
        }

        let first = name.chars().next().unwrap();
        if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
            return Err(BucketNameError::InvalidStartChar);
        }

        let last = name.chars().last().unwrap();
        if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
            return Err(BucketNameError::InvalidEndChar);
        }

        for c in name.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.' {
                return Err(BucketNameError::InvalidChar(c));
            }
        }

        if name.contains("..") {
            return Err(BucketNameError::ConsecutivePeriods);
        }

        if name.parse::<std::net::Ipv4Addr>().is_ok() {
            return Err(BucketNameError::LooksLikeIpAddress);
        }

        Ok(())
    }

    /// The reserved bucket the registry self-hosts location records in.
    /// Not creatable through the normal bucket-creation path.
    pub const REGISTRY_BUCKET: &'static str = ".buckets-registry";

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0 == Self::REGISTRY_BUCKET
    }
}

impl fmt::Debug for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketName({:?})", self.0)
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BucketNameError {
    #[error("bucket name must be at least 3 characters")]
    TooShort,
    #[error("bucket name must be at most 63 characters")]
    TooLong,
    #[error("bucket name must start with a lowercase letter or number")]
    InvalidStartChar,
    #[error("bucket name must end with a lowercase letter or number")]
    InvalidEndChar,
    #[error("bucket name contains invalid character: {0}")]
    InvalidChar(char),
    #[error("bucket name cannot contain consecutive periods")]
    ConsecutivePeriods,
    #[error("bucket name cannot be formatted as an IP address")]
    LooksLikeIpAddress,
}

/// Object key: 1-1024 bytes, no leading `/`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ObjectKeyError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    #[must_use]
    pub fn new_unchecked(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(key: &str) -> Result<(), ObjectKeyError> {
        if key.is_empty() {
            return Err(ObjectKeyError::Empty);
        }
        if key.len() > 1024 {
            return Err(ObjectKeyError::TooLong);
        }
        if key.starts_with('/') {
            return Err(ObjectKeyError::LeadingSlash);
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:?})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ObjectKeyError {
    #[error("object key cannot be empty")]
    Empty,
    #[error("object key cannot exceed 1024 bytes")]
    TooLong,
    #[error("object key cannot have a leading '/'")]
    LeadingSlash,
}

/// A validated (bucket, key) pair identifying an object.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ObjectName {
    pub bucket: BucketName,
    pub key: ObjectKey,
}

impl ObjectName {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, ObjectNameError> {
        Ok(Self {
            bucket: BucketName::new(bucket)?,
            key: ObjectKey::new(key)?,
        })
    }

    /// `bucket/key`, the byte string hashed for placement and path derivation.
    #[must_use]
    pub fn path_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.bucket.as_str().len() + 1 + self.key.as_str().len());
        v.extend_from_slice(self.bucket.as_str().as_bytes());
        v.push(b'/');
        v.extend_from_slice(self.key.as_str().as_bytes());
        v
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ObjectNameError {
    #[error(transparent)]
    Bucket(#[from] BucketNameError),
    #[error(transparent)]
    Key(#[from] ObjectKeyError),
}

/// 16 random bytes chosen once per cluster; the `SipHash` key for placement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId([u8; 16]);

impl DeploymentId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// `(k0, k1)` little-endian halves used as the `SipHash` key.
    #[must_use]
    pub fn siphash_key(&self) -> (u64, u64) {
        (
            u64::from_le_bytes(self.0[0..8].try_into().unwrap()),
            u64::from_le_bytes(self.0[8..16].try_into().unwrap()),
        )
    }
}

impl fmt::Debug for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeploymentId({})", hex::encode(self.0))
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &h[0..8],
            &h[8..12],
            &h[12..16],
            &h[16..20],
            &h[20..32]
        )
    }
}

/// Reed-Solomon (k, m): k data shards, m parity shards.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ErasureConfig {
    pub k: u8,
    pub m: u8,
}

impl ErasureConfig {
    pub fn new(k: u8, m: u8) -> Result<Self, ErasureConfigError> {
        if k == 0 || m == 0 {
            return Err(ErasureConfigError::OutOfRange);
        }
        if k > 16 || m > 16 {
            return Err(ErasureConfigError::OutOfRange);
        }
        if u16::from(k) + u16::from(m) > 32 {
            return Err(ErasureConfigError::TotalTooLarge);
        }
        Ok(Self { k, m })
    }

    #[must_use]
    pub const fn n(&self) -> usize {
        self.k as usize + self.m as usize
    }

    /// Select (k, m) by cluster disk count, per the deployment sizing
    /// table: bigger clusters get lower relative parity overhead.
    #[must_use]
    pub fn for_disk_count(disks: usize) -> Self {
        let (k, m) = if disks >= 20 {
            (16, 4)
        } else if disks >= 16 {
            (12, 4)
        } else if disks >= 12 {
            (8, 4)
        } else if disks >= 6 {
            (4, 2)
        } else {
            (2, 1)
        };
        Self { k, m }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ErasureConfigError {
    #[error("k and m must each be in 1..=16")]
    OutOfRange,
    #[error("k + m must not exceed 32")]
    TotalTooLarge,
}

/// A (algo_name, 32-byte digest) pair. Algorithm is always `BLAKE2b-256`
/// for shard integrity; MD5 ETags are represented separately since they
/// are not interchangeable with this type (see module docs on hash.rs).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub algo: String,
    pub digest: [u8; 32],
}

impl Checksum {
    pub const ALGO: &'static str = "BLAKE2b-256";

    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self {
            algo: Self::ALGO.to_string(),
            digest: crate::hash::blake2b256(data),
        }
    }

    #[must_use]
    pub fn verify(&self, data: &[u8]) -> bool {
        if self.algo != Self::ALGO {
            return false;
        }
        let actual = crate::hash::blake2b256(data);
        crate::hash::constant_time_eq(&actual, &self.digest)
    }

    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({}:{})", self.algo, self.digest_hex())
    }
}

/// Deterministic content-addressed directory for an object:
/// `<first two hex chars>/<16 hex chars>/`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ObjectPath {
    hash_hex: String,
}

impl ObjectPath {
    pub const FIXED_SEED: u64 = 0x0123_4567_89AB_CDEF;

    #[must_use]
    pub fn derive(bucket: &str, key: &str) -> Self {
        let mut joined = Vec::with_capacity(bucket.len() + 1 + key.len());
        joined.extend_from_slice(bucket.as_bytes());
        joined.push(b'/');
        joined.extend_from_slice(key.as_bytes());
        let hash = crate::hash::xxhash64(Self::FIXED_SEED, &joined);
        Self {
            hash_hex: format!("{hash:016x}"),
        }
    }

    /// `<first two hex chars>/<16 hex chars>`
    #[must_use]
    pub fn relative_dir(&self) -> String {
        format!("{}/{}", &self.hash_hex[0..2], self.hash_hex)
    }

    #[must_use]
    pub fn hash_hex(&self) -> &str {
        &self.hash_hex
    }
}

/// Authoritative mapping from (bucket, object, version) to physical
/// placement, persisted by the location registry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LocationRecord {
    pub bucket: String,
    pub object: String,
    pub version_id: String,
    pub pool_idx: u32,
    pub set_idx: u32,
    pub disk_count: u32,
    pub disk_idxs: Vec<u32>,
    pub generation: u64,
    pub mod_time: u64,
    pub size: u64,
}

impl LocationRecord {
    /// `bucket/object/version_id.json`, the storage key under the
    /// reserved registry bucket.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}.json", self.bucket, self.object, self.version_id)
    }
}

/// `bucket/object/version_id`; a registry cache/storage lookup key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RegistryKey {
    pub bucket: String,
    pub object: String,
    pub version_id: String,
}

impl RegistryKey {
    pub const LATEST: &'static str = "latest";

    #[must_use]
    pub fn new(bucket: impl Into<String>, object: impl Into<String>, version_id: Option<&str>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            version_id: version_id.unwrap_or(Self::LATEST).to_string(),
        }
    }

    #[must_use]
    pub fn build(&self) -> String {
        format!("{}/{}/{}", self.bucket, self.object, self.version_id)
    }

    /// Locates the first two `/` from the left; everything between them
    /// belongs to the object segment even if it itself contains `/`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let first = key.find('/')?;
        let last = key.rfind('/')?;
        if first == last {
            return None;
        }
        let bucket = &key[..first];
        let object = &key[first + 1..last];
        let version_id = &key[last + 1..];
        if bucket.is_empty() || version_id.is_empty() {
            return None;
        }
        Some(Self {
            bucket: bucket.to_string(),
            object: object.to_string(),
            version_id: version_id.to_string(),
        })
    }

    /// Whether this key denotes a tombstone left by a delete.
    #[must_use]
    pub fn is_delete_marker(&self) -> bool {
        self.version_id.starts_with("delete-")
    }
}

/// One virtual-node position on the consistent-hash ring.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RingVNode {
    pub hash: u64,
    pub node_id: String,
    pub node_name: String,
}
