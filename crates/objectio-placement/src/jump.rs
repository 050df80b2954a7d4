//! Jump-consistent hash (Lamping & Veach): maps a pre-hashed 64-bit key
//! into `[0, num_buckets)` for dense, contiguous bucket ranges without
//! the memory overhead of a vnode ring.

const MULTIPLIER: u64 = 2_862_933_555_777_941_757;

/// Google's jump-hash recurrence. `num_buckets` must be positive.
#[must_use]
pub fn jump_hash(mut key: u64, num_buckets: i32) -> i32 {
    assert!(num_buckets > 0, "num_buckets must be positive");
    let mut b: i64 = -1;
    let mut j: i64 = 0;
    while j < i64::from(num_buckets) {
        b = j;
        key = key.wrapping_mul(MULTIPLIER).wrapping_add(1);
        j = ((b.wrapping_add(1) as f64) * (f64::from(1i32 << 31) / (((key >> 33) + 1) as f64)))
            as i64;
    }
    b as i32
}
