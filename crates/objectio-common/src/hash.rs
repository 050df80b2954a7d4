//! Hash primitives: keyed `SipHash`-2-4, seeded xxHash-64, `BLAKE2b`-256 for
//! shard integrity, and MD5 for S3 ETag compatibility only.
//!
//! `SipHash` is reimplemented directly (exact reference construction)
//! rather than taken from a crate, because the placement layer's security
//! property — independent-looking indices across deployment ids — depends
//! on bit-for-bit reference behavior, and the 16 official test vectors are
//! load-bearing for this engine's correctness, not just a sanity check.
//! xxHash-64 delegates to `xxhash-rust`.

use blake2::Blake2b;
use blake2::digest::consts::U32;
use blake2::digest::{Digest, FixedOutput, Update};
use md5::Md5;
use xxhash_rust::xxh64::{xxh64, Xxh64};

// ---- SipHash-2-4 ----

const C_ROUNDS: usize = 2;
const D_ROUNDS: usize = 4;

#[inline]
const fn rotl(x: u64, b: u32) -> u64 {
    x.rotate_left(b)
}

#[inline]
const fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = rotl(*v1, 13);
    *v1 ^= *v0;
    *v0 = rotl(*v0, 32);
    *v2 = v2.wrapping_add(*v3);
    *v3 = rotl(*v3, 16);
    *v3 ^= *v2;
    *v0 = v0.wrapping_add(*v3);
    *v3 = rotl(*v3, 21);
    *v3 ^= *v0;
    *v2 = v2.wrapping_add(*v1);
    *v1 = rotl(*v1, 17);
    *v1 ^= *v2;
    *v2 = rotl(*v2, 32);
}

/// One-shot `SipHash`-2-4, keyed by `(k0, k1)`.
#[must_use]
pub fn siphash64(k0: u64, k1: u64, data: &[u8]) -> u64 {
    let mut v0 = 0x736f_6d65_7073_6575_u64 ^ k0;
    let mut v1 = 0x646f_7261_6e64_6f6d_u64 ^ k1;
    let mut v2 = 0x6c79_6765_6e65_7261_u64 ^ k0;
    let mut v3 = 0x7465_6462_7974_6573_u64 ^ k1;

    let len = data.len();
    let blocks = len / 8;

    for i in 0..blocks {
        let off = i * 8;
        let m = u64::from_le_bytes(data[off..off + 8].try_into().unwrap());
        v3 ^= m;
        for _ in 0..C_ROUNDS {
            sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
        }
        v0 ^= m;
    }

    let tail = &data[blocks * 8..];
    let mut last_block = [0u8; 8];
    last_block[..tail.len()].copy_from_slice(tail);
    last_block[7] = (len & 0xff) as u8;
    let m = u64::from_le_bytes(last_block);

    v3 ^= m;
    for _ in 0..C_ROUNDS {
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    }
    v0 ^= m;

    v2 ^= 0xff;
    for _ in 0..D_ROUNDS {
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    }

    v0 ^ v1 ^ v2 ^ v3
}

/// `SipHash`-2-4-128: the same construction with two finalization outputs,
/// per the reference 128-bit variant.
#[must_use]
pub fn siphash128(k0: u64, k1: u64, data: &[u8]) -> u128 {
    let mut v0 = 0x736f_6d65_7073_6575_u64 ^ k0;
    let mut v1 = 0x646f_7261_6e64_6f6d_u64 ^ k1;
    let mut v2 = 0x6c79_6765_6e65_7261_u64 ^ k0;
    let mut v3 = 0x7465_6462_7974_6573_u64 ^ k1 ^ 0xee;

    let len = data.len();
    let blocks = len / 8;

    for i in 0..blocks {
        let off = i * 8;
        let m = u64::from_le_bytes(data[off..off + 8].try_into().unwrap());
        v3 ^= m;
        for _ in 0..C_ROUNDS {
            sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
        }
        v0 ^= m;
    }

    let tail = &data[blocks * 8..];
    let mut last_block = [0u8; 8];
    last_block[..tail.len()].copy_from_slice(tail);
    last_block[7] = (len & 0xff) as u8;
    let m = u64::from_le_bytes(last_block);

    v3 ^= m;
    for _ in 0..C_ROUNDS {
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    }
    v0 ^= m;

    v2 ^= 0xee;
    for _ in 0..D_ROUNDS {
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    }
    let first = v0 ^ v1 ^ v2 ^ v3;

    v1 ^= 0xdd;
    for _ in 0..D_ROUNDS {
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    }
    let second = v0 ^ v1 ^ v2 ^ v3;

    (u128::from(first) << 64) | u128::from(second)
}

/// Incremental `SipHash`-2-4 state for streaming callers.
#[derive(Clone)]
pub struct SipHasher {
    k0: u64,
    k1: u64,
    buf: Vec<u8>,
}

impl SipHasher {
    #[must_use]
    pub fn new(k0: u64, k1: u64) -> Self {
        Self {
            k0,
            k1,
            buf: Vec::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    #[must_use]
    pub fn finalize(self) -> u64 {
        siphash64(self.k0, self.k1, &self.buf)
    }
}

// ---- xxHash-64 ----

/// Seeded xxHash-64.
#[must_use]
pub fn xxhash64(seed: u64, data: &[u8]) -> u64 {
    xxh64(data, seed)
}

/// Incremental xxHash-64 state for streaming callers.
pub struct Xxh64Hasher(Xxh64);

impl Xxh64Hasher {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(Xxh64::new(seed))
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    #[must_use]
    pub fn finalize(self) -> u64 {
        self.0.digest()
    }
}

// ---- BLAKE2b-256 (shard integrity) ----

type Blake2b256 = Blake2b<U32>;

/// Digest used for all shard integrity checks: `BLAKE2b` truncated to a
/// 256-bit output per RFC 7693.
#[must_use]
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    Update::update(&mut hasher, data);
    let out = FixedOutput::finalize_fixed(hasher);
    out.into()
}

/// Incremental `BLAKE2b`-256 state for streaming shard writes.
pub struct Blake2b256Hasher(Blake2b256);

impl Blake2b256Hasher {
    #[must_use]
    pub fn new() -> Self {
        Self(Blake2b256::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        Update::update(&mut self.0, data);
    }

    #[must_use]
    pub fn finalize(self) -> [u8; 32] {
        FixedOutput::finalize_fixed(self.0).into()
    }
}

impl Default for Blake2b256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Constant-time comparison of two digests. Used by
/// `storage::chunk::verify` so a checksum check never leaks timing
/// information about where a mismatch occurs.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ---- MD5 (S3 ETag compatibility only — never used for shard integrity) ----

/// Real MD5, used exclusively to compute S3-compatible ETags. Do not use
/// this for any integrity-sensitive purpose; `blake2b256` is the only hash
/// this engine trusts for that.
#[must_use]
pub fn md5(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    Digest::update(&mut hasher, data);
    hasher.finalize().into()
}

/// Format a digest as lowercase hex, e.g. for an ETag header value.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The 16 official SipHash-2-4 test vectors: key = 00 01 .. 0f, message
    // i is the byte sequence 00 01 .. (i-1) of length i, outputs per the
    // reference implementation's `vectors_sip64` table.
    const VECTORS: [u64; 16] = [
        0x726f_db47_dd0e_0e31,
        0x74f8_39c5_93dc_67fd,
        0x0d6c_8009_d9a9_4f5a,
        0x8567_6696_d7fb_7e2d,
        0xcf27_94e0_2771_87b7,
        0x1876_5564_cd99_a68d,
        0xcbc9_466e_58fe_e3ce,
        0xab02_00f5_8b01_d137,
        0x93f5_f579_9a93_2462,
        0x9e00_82df_0ba9_e4b0,
        0x7a5d_bbc5_94dd_b9f3,
        0xf4b3_2f46_226b_ada7,
        0x751e_8fbc_860e_e5fb,
        0x14ea_5627_c084_3d90,
        0xf723_ca90_8e7a_f2ee,
        0xa129_ca61_49be_45e5,
    ];

    fn vector_key() -> (u64, u64) {
        let key: [u8; 16] = core::array::from_fn(|i| i as u8);
        (
            u64::from_le_bytes(key[0..8].try_into().unwrap()),
            u64::from_le_bytes(key[8..16].try_into().unwrap()),
        )
    }

    #[test]
    fn siphash_matches_all_16_official_vectors() {
        let (k0, k1) = vector_key();
        for (i, expected) in VECTORS.iter().enumerate() {
            let message: Vec<u8> = (0..i as u8).collect();
            assert_eq!(
                siphash64(k0, k1, &message),
                *expected,
                "vector {i} mismatched"
            );
        }
    }

    #[test]
    fn siphash_is_deterministic() {
        let (k0, k1) = vector_key();
        let data = b"the quick brown fox";
        assert_eq!(siphash64(k0, k1, data), siphash64(k0, k1, data));
    }

    #[test]
    fn siphash_differs_across_keys() {
        let data = b"same message, different cluster";
        let a = siphash64(1, 2, data);
        let b = siphash64(3, 4, data);
        assert_ne!(a, b);
    }

    #[test]
    fn siphash_incremental_matches_one_shot() {
        let (k0, k1) = vector_key();
        let data = b"incremental hashing must match one-shot";
        let mut hasher = SipHasher::new(k0, k1);
        hasher.update(&data[..10]);
        hasher.update(&data[10..]);
        assert_eq!(hasher.finalize(), siphash64(k0, k1, data));
    }

    #[test]
    fn xxhash64_empty_input_matches_known_digest() {
        // Published reference digest for xxh64(seed=0, "").
        assert_eq!(xxhash64(0, b""), 0xEF46_DB37_51D8_E999);
    }

    #[test]
    fn xxhash64_is_deterministic_across_lengths() {
        for len in [0usize, 1, 4, 8, 16, 31, 32, 33, 64, 200] {
            let data = vec![0xab_u8; len];
            assert_eq!(xxhash64(0x1234, &data), xxhash64(0x1234, &data));
        }
    }

    #[test]
    fn xxhash64_incremental_matches_one_shot() {
        let data: Vec<u8> = (0..100u16).map(|x| x as u8).collect();
        let mut hasher = Xxh64Hasher::new(42);
        hasher.update(&data[..37]);
        hasher.update(&data[37..]);
        assert_eq!(hasher.finalize(), xxhash64(42, &data));
    }

    #[test]
    fn blake2b256_is_32_bytes_and_deterministic() {
        let digest = blake2b256(b"shard contents");
        assert_eq!(digest.len(), 32);
        assert_eq!(digest, blake2b256(b"shard contents"));
        assert_ne!(digest, blake2b256(b"different shard contents"));
    }

    #[test]
    fn blake2b256_incremental_matches_one_shot() {
        let mut hasher = Blake2b256Hasher::new();
        hasher.update(b"part one ");
        hasher.update(b"part two");
        assert_eq!(hasher.finalize(), blake2b256(b"part one part two"));
    }

    #[test]
    fn md5_matches_well_known_digest() {
        assert_eq!(hex_encode(&md5(b"")), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            hex_encode(&md5(b"abc")),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn constant_time_eq_rejects_mismatched_digests() {
        let a = blake2b256(b"one");
        let b = blake2b256(b"two");
        assert!(constant_time_eq(&a, &a));
        assert!(!constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a[..10], &a[..11]));
    }
}
