//! GF(2^8) arithmetic: log/antilog tables and the primitives built on top
//! of them (multiply, inverse, matrix operations). This is the `gftbls`
//! referenced by the erasure context — the same log-table trick ISA-L's
//! SIMD kernels use, just scalar here.

use std::sync::OnceLock;

/// The primitive polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D), the same
/// field used by most production Reed-Solomon implementations.
const POLY: u16 = 0x11D;

struct Tables {
    exp: [u8; 256],
    log: [u8; 256],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 256];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255usize {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= POLY;
            }
        }
        exp[255] = exp[0];
        Tables { exp, log }
    })
}

/// Addition and subtraction in GF(2^8) are both XOR.
#[inline]
#[must_use]
pub const fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline]
#[must_use]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let sum = usize::from(t.log[a as usize]) + usize::from(t.log[b as usize]);
    t.exp[sum % 255]
}

#[inline]
#[must_use]
pub fn inv(a: u8) -> u8 {
    debug_assert!(a != 0, "GF(2^8) inverse of zero is undefined");
    let t = tables();
    let e = 255 - usize::from(t.log[a as usize]);
    t.exp[e % 255]
}

#[inline]
#[must_use]
pub fn div(a: u8, b: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    mul(a, inv(b))
}

/// A dense matrix over GF(2^8), row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0u8; rows * cols],
        }
    }

    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: u8) {
        self.data[r * self.cols + c] = v;
    }

    /// Returns a new matrix containing only the given rows, in order.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut m = Self::zeros(rows.len(), self.cols);
        for (dst, &src) in rows.iter().enumerate() {
            for c in 0..self.cols {
                m.set(dst, c, self.get(src, c));
            }
        }
        m
    }

    /// Gauss-Jordan inversion over GF(2^8). Returns `None` if singular.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        assert_eq!(self.rows, self.cols, "only square matrices can be inverted");
        let n = self.rows;
        let mut work = self.clone();
        let mut inv = Self::identity(n);

        for col in 0..n {
            // Find a pivot row with a nonzero entry in this column.
            let mut pivot = None;
            for r in col..n {
                if work.get(r, col) != 0 {
                    pivot = Some(r);
                    break;
                }
            }
            let pivot = pivot?;
            if pivot != col {
                work.swap_rows(pivot, col);
                inv.swap_rows(pivot, col);
            }

            let pivot_val = work.get(col, col);
            let pivot_inv = self::inv(pivot_val);
            work.scale_row(col, pivot_inv);
            inv.scale_row(col, pivot_inv);

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work.get(r, col);
                if factor == 0 {
                    continue;
                }
                work.add_scaled_row(r, col, factor);
                inv.add_scaled_row(r, col, factor);
            }
        }

        Some(inv)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn scale_row(&mut self, row: usize, factor: u8) {
        for c in 0..self.cols {
            let v = self.get(row, c);
            self.set(row, c, mul(v, factor));
        }
    }

    /// `dst_row += factor * src_row` (GF(2^8) addition is XOR).
    fn add_scaled_row(&mut self, dst_row: usize, src_row: usize, factor: u8) {
        for c in 0..self.cols {
            let s = mul(self.get(src_row, c), factor);
            let d = self.get(dst_row, c);
            self.set(dst_row, c, add(d, s));
        }
    }

    /// Multiply this matrix (as a row vector of coefficients, `1 x cols`)
    /// against `k` input buffers, producing one output buffer: the linear
    /// combination `sum_j coeff[j] * inputs[j]` over GF(2^8).
    #[must_use]
    pub fn combine_row(&self, row: usize, inputs: &[&[u8]], len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (j, input) in inputs.iter().enumerate() {
            let coeff = self.get(row, j);
            if coeff == 0 {
                continue;
            }
            for i in 0..len {
                out[i] = add(out[i], mul(coeff, input[i]));
            }
        }
        out
    }
}
