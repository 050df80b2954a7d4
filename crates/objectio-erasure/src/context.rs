//! Reed-Solomon encode/decode/reconstruct over the Cauchy matrix built in
//! `cauchy`. An `ErasureContext` is immutable after `init` and therefore
//! safely shareable across concurrent requests (the concurrency model
//! requires this: the erasure context never suspends and is read-only).

use crate::cauchy::build_encode_matrix;
use crate::gf::Matrix;
use objectio_common::error::{Error, Result};

/// A reusable `(k, m)` encoding context: the full `(k+m) x k` Cauchy
/// matrix plus `k` and `m` themselves.
#[derive(Clone, Debug)]
pub struct ErasureContext {
    k: usize,
    m: usize,
    /// `gftbls` in spec terms: the precomputed encode matrix every
    /// encode/reconstruct call multiplies against.
    encode_matrix: Matrix,
}

impl ErasureContext {
    /// Builds a reusable context for the given `(k, m)`. `k` and `m` must
    /// each be in `1..=16` and `k + m` must not exceed 32, matching
    /// `ErasureConfig`'s validation.
    pub fn init(k: u8, m: u8) -> Result<Self> {
        let cfg = objectio_common::ErasureConfig::new(k, m)
            .map_err(|e| Error::invalid_argument(e.to_string()))?;
        Ok(Self {
            k: cfg.k as usize,
            m: cfg.m as usize,
            encode_matrix: build_encode_matrix(cfg.k as usize, cfg.m as usize),
        })
    }

    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    #[must_use]
    pub const fn m(&self) -> usize {
        self.m
    }

    #[must_use]
    pub const fn n(&self) -> usize {
        self.k + self.m
    }

    /// `((size + k - 1) / k + 15) & !15`: the per-shard size, rounded up
    /// to a multiple of 16 bytes for SIMD alignment.
    #[must_use]
    pub fn calc_chunk_size(size: usize, k: u8) -> usize {
        let k = k as usize;
        let bytes_per_chunk = size.div_ceil(k);
        (bytes_per_chunk + 15) & !15
    }

    /// Splits `payload` into `k` zero-padded data shards of `chunk_size`
    /// bytes each, then computes `m` parity shards as GF(2^8) linear
    /// combinations. Returns the `n` shards in order (data then parity).
    pub fn encode(&self, payload: &[u8], chunk_size: usize) -> Result<Vec<Vec<u8>>> {
        let bytes_per_chunk = payload.len().div_ceil(self.k);
        if chunk_size < Self::calc_chunk_size(payload.len(), self.k as u8) {
            return Err(Error::invalid_argument(format!(
                "chunk_size {chunk_size} is smaller than required for payload of {} bytes over k={}",
                payload.len(),
                self.k
            )));
        }

        let mut data_shards = Vec::with_capacity(self.k);
        for i in 0..self.k {
            let start = i * bytes_per_chunk;
            let mut shard = vec![0u8; chunk_size];
            if start < payload.len() {
                let end = (start + bytes_per_chunk).min(payload.len());
                shard[..end - start].copy_from_slice(&payload[start..end]);
            }
            data_shards.push(shard);
        }

        let data_refs: Vec<&[u8]> = data_shards.iter().map(Vec::as_slice).collect();
        let mut parity_shards = Vec::with_capacity(self.m);
        for parity_row in self.k..self.k + self.m {
            parity_shards.push(self.encode_matrix.combine_row(parity_row, &data_refs, chunk_size));
        }
        drop(data_refs);

        let mut shards = data_shards;
        shards.extend(parity_shards);

        Ok(shards)
    }

    /// Rebuilds every index in `missing` from any `k` present shards in
    /// `shards`. Fails when fewer than `k` shards are present.
    pub fn reconstruct(
        &self,
        shards: &mut [Option<Vec<u8>>],
        chunk_size: usize,
        missing: &[usize],
    ) -> Result<()> {
        if shards.len() != self.n() {
            return Err(Error::invalid_argument(format!(
                "expected {} shards, got {}",
                self.n(),
                shards.len()
            )));
        }

        let present: Vec<usize> = (0..self.n())
            .filter(|i| shards[*i].is_some() && !missing.contains(i))
            .collect();

        if present.len() < self.k {
            return Err(Error::ReconstructionFailure {
                available: present.len(),
                required: self.k,
            });
        }
        if missing.len() > self.m {
            return Err(Error::ReconstructionFailure {
                available: self.n() - missing.len(),
                required: self.k,
            });
        }

        // Use exactly k present shards as the decoding basis.
        let basis: Vec<usize> = present.into_iter().take(self.k).collect();
        let sub = self.encode_matrix.select_rows(&basis);
        let inverse = sub.invert().ok_or_else(|| {
            Error::Internal("selected Cauchy submatrix was not invertible".to_string())
        })?;

        let basis_refs: Vec<&[u8]> = basis
            .iter()
            .map(|&i| shards[i].as_deref().expect("basis index is present"))
            .collect();

        let mut rebuilt_shards = Vec::with_capacity(missing.len());
        for &target in missing {
            // Row `target` of `encode_matrix` expressed in terms of the
            // `k` basis shards: target_row * encode_matrix^-1(basis) maps
            // basis coefficients to the coefficients for `target`.
            let target_row = self.encode_matrix.select_rows(&[target]);
            let mut coeffs = vec![0u8; self.k];
            for j in 0..self.k {
                let mut acc = 0u8;
                for t in 0..self.k {
                    acc = crate::gf::add(acc, crate::gf::mul(target_row.get(0, t), inverse.get(t, j)));
                }
                coeffs[j] = acc;
            }

            let mut coeff_matrix = Matrix::zeros(1, self.k);
            for (j, c) in coeffs.into_iter().enumerate() {
                coeff_matrix.set(0, j, c);
            }
            let rebuilt = coeff_matrix.combine_row(0, &basis_refs, chunk_size);
            rebuilt_shards.push((target, rebuilt));
        }
        drop(basis_refs);

        for (target, rebuilt) in rebuilt_shards {
            shards[target] = Some(rebuilt);
        }

        Ok(())
    }

    /// Decodes `shards` back into a payload of `out_size` bytes.
    ///
    /// If every data shard (indices `0..k`) is present, this is a plain
    /// splice respecting the original per-chunk partition. Otherwise
    /// missing data indices are reconstructed first.
    pub fn decode(
        &self,
        mut shards: Vec<Option<Vec<u8>>>,
        chunk_size: usize,
        out_size: usize,
    ) -> Result<Vec<u8>> {
        if shards.len() != self.n() {
            return Err(Error::invalid_argument(format!(
                "expected {} shards, got {}",
                self.n(),
                shards.len()
            )));
        }

        let missing_data: Vec<usize> = (0..self.k).filter(|&i| shards[i].is_none()).collect();
        if !missing_data.is_empty() {
            self.reconstruct(&mut shards, chunk_size, &missing_data)?;
        }

        let bytes_per_chunk = out_size.div_ceil(self.k.max(1));
        let mut out = Vec::with_capacity(out_size);
        for i in 0..self.k {
            let shard = shards[i]
                .as_ref()
                .expect("data shard reconstructed above if missing");
            let take = bytes_per_chunk.min(out_size - out.len());
            out.extend_from_slice(&shard[..take]);
            if out.len() >= out_size {
                break;
            }
        }
        out.truncate(out_size);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calc_chunk_size_is_16_aligned_and_covers_payload() {
        for size in [0usize, 1, 15, 16, 17, 1000, 4096] {
            for k in [1u8, 2, 4, 8, 16] {
                let cs = ErasureContext::calc_chunk_size(size, k);
                assert_eq!(cs % 16, 0);
                assert!(cs * k as usize >= size);
            }
        }
    }

    #[test]
    fn round_trip_all_present() {
        let ctx = ErasureContext::init(4, 2).unwrap();
        let payload = b"Hello, World!";
        let chunk_size = ErasureContext::calc_chunk_size(payload.len(), 4);
        let shards = ctx.encode(payload, chunk_size).unwrap();
        assert_eq!(shards.len(), 6);

        let wrapped: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        let out = ctx.decode(wrapped, chunk_size, payload.len()).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn decode_recovers_from_two_missing_shards() {
        let ctx = ErasureContext::init(4, 2).unwrap();
        let payload = b"Hello, World!";
        let chunk_size = ErasureContext::calc_chunk_size(payload.len(), 4);
        let shards = ctx.encode(payload, chunk_size).unwrap();

        let mut wrapped: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        wrapped[0] = None;
        wrapped[2] = None;

        let out = ctx.decode(wrapped, chunk_size, payload.len()).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn decode_fails_with_three_missing_shards() {
        let ctx = ErasureContext::init(4, 2).unwrap();
        let payload = b"Hello, World!";
        let chunk_size = ErasureContext::calc_chunk_size(payload.len(), 4);
        let shards = ctx.encode(payload, chunk_size).unwrap();

        let mut wrapped: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        wrapped[0] = None;
        wrapped[1] = None;
        wrapped[2] = None;

        let err = ctx.decode(wrapped, chunk_size, payload.len()).unwrap_err();
        assert!(matches!(err, Error::ReconstructionFailure { .. }));
    }

    #[test]
    fn round_trip_empty_payload_produces_valid_shards() {
        let ctx = ErasureContext::init(4, 2).unwrap();
        let chunk_size = ErasureContext::calc_chunk_size(0, 4);
        let shards = ctx.encode(b"", chunk_size).unwrap();
        assert_eq!(shards.len(), 6);
        for shard in &shards {
            assert_eq!(shard.len(), chunk_size);
        }

        let wrapped: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        let out = ctx.decode(wrapped, chunk_size, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn round_trip_payload_not_divisible_by_k() {
        let ctx = ErasureContext::init(4, 2).unwrap();
        let payload: Vec<u8> = (0..77u16).map(|x| x as u8).collect();
        let chunk_size = ErasureContext::calc_chunk_size(payload.len(), 4);
        let shards = ctx.encode(&payload, chunk_size).unwrap();

        let mut wrapped: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        wrapped[3] = None; // last data shard, the zero-padded one
        wrapped[5] = None;

        let out = ctx.decode(wrapped, chunk_size, payload.len()).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn round_trip_across_payload_size_spread() {
        let ctx = ErasureContext::init(6, 3).unwrap();
        for size in [0usize, 1, 5, 6, 7, 100, 4095, 4096, 4097, 1_000_000] {
            let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
            let chunk_size = ErasureContext::calc_chunk_size(size, 6);
            let shards = ctx.encode(&payload, chunk_size).unwrap();
            let wrapped: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
            let out = ctx.decode(wrapped, chunk_size, size).unwrap();
            assert_eq!(out, payload, "mismatch at size {size}");
        }
    }

    #[test]
    fn reconstruct_equals_original_shards_for_every_surviving_k_subset() {
        let ctx = ErasureContext::init(3, 2).unwrap();
        let payload = b"reconstruction must equal the original shard set";
        let chunk_size = ErasureContext::calc_chunk_size(payload.len(), 3);
        let original = ctx.encode(payload, chunk_size).unwrap();

        let n = ctx.n();
        for mask in 0u32..(1 << n) {
            let present_count = mask.count_ones() as usize;
            if present_count < ctx.k() {
                continue;
            }
            let mut shards: Vec<Option<Vec<u8>>> = (0..n)
                .map(|i| {
                    if mask & (1 << i) != 0 {
                        Some(original[i].clone())
                    } else {
                        None
                    }
                })
                .collect();
            let missing: Vec<usize> = (0..n).filter(|i| mask & (1 << i) == 0).collect();
            if missing.is_empty() {
                continue;
            }
            ctx.reconstruct(&mut shards, chunk_size, &missing).unwrap();
            for &i in &missing {
                assert_eq!(shards[i].as_deref().unwrap(), original[i].as_slice());
            }
        }
    }

    #[test]
    fn init_rejects_out_of_range_k_or_m() {
        assert!(ErasureContext::init(0, 2).is_err());
        assert!(ErasureContext::init(20, 20).is_err());
    }
}
