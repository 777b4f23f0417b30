//! Naive `O(N^3)` multiply kernels.
//!
//! All arithmetic is `i32` multiply-accumulate with wrapping semantics, the
//! same as the fixed-width integer arithmetic of the cluster cores.

use crate::matrix::{Matrix, RowBand};

#[inline]
fn dot(a_row: &[i32], b: &Matrix, col: usize) -> i32 {
    let mut sum = 0i32;
    for (k, &a) in a_row.iter().enumerate() {
        sum = sum.wrapping_add(a.wrapping_mul(b.get(k, col)));
    }
    sum
}

#[inline]
fn fill_row(a: &Matrix, b: &Matrix, row: usize, out: &mut [i32]) {
    let a_row = a.row(row);
    for (col, cell) in out.iter_mut().enumerate() {
        *cell = dot(a_row, b, col);
    }
}

/// Standard matrix multiplication: `C = A * B`.
pub fn multiply(a: &Matrix, b: &Matrix, c: &mut Matrix) {
    multiply_rows(a, b, c, 0, a.dim());
}

/// Compute rows `[start_row, end_row)` of `C = A * B`.
///
/// Only the cells of those rows are written. An empty range is a no-op.
pub fn multiply_rows(a: &Matrix, b: &Matrix, c: &mut Matrix, start_row: usize, end_row: usize) {
    debug_assert_eq!(a.dim(), b.dim());
    debug_assert_eq!(a.dim(), c.dim());

    let n = c.dim();
    let end = core::cmp::min(end_row, n);
    let out = c.as_mut_slice();
    for i in start_row..end {
        fill_row(a, b, i, &mut out[i * n..(i + 1) * n]);
    }
}

/// Compute every row owned by `band`.
///
/// This is the per-worker job: it reads `a` and `b` and writes nothing but
/// the band, so bands of one matrix can run concurrently.
pub fn multiply_band(a: &Matrix, b: &Matrix, band: &mut RowBand<'_>) {
    debug_assert_eq!(a.dim(), band.dim());

    log::trace!(
        "worker {} computing rows {:?}",
        band.worker(),
        band.plan().rows()
    );
    for i in band.plan().rows() {
        fill_row(a, b, i, band.row_mut(i));
    }
}
