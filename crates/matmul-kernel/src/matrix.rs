//! Square row-major integer matrices and their row bands.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::partition::PartitionPlan;

/// `dim x dim` matrix of `i32`, element `(i, j)` at `i * dim + j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    dim: usize,
    data: Vec<i32>,
}

impl Matrix {
    /// Zero-filled matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0; dim * dim],
        }
    }

    /// Matrix whose element at flat index `idx` is `f(idx)`.
    pub fn from_fn(dim: usize, f: impl FnMut(usize) -> i32) -> Self {
        Self {
            dim,
            data: (0..dim * dim).map(f).collect(),
        }
    }

    /// Wraps an existing row-major buffer. Returns `None` unless
    /// `data.len() == dim * dim`.
    pub fn from_vec(dim: usize, data: Vec<i32>) -> Option<Self> {
        (data.len() == dim * dim).then_some(Self { dim, data })
    }

    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim);
        for i in 0..dim {
            m.set(i, i, 1);
        }
        m
    }

    /// The `A` operand of the cluster test: `A[i] = i mod 10`.
    pub fn pattern_a(dim: usize) -> Self {
        Self::from_fn(dim, |idx| (idx % 10) as i32)
    }

    /// The `B` operand of the cluster test: `B[i] = (i + 1) mod 10`.
    pub fn pattern_b(dim: usize) -> Self {
        Self::from_fn(dim, |idx| ((idx + 1) % 10) as i32)
    }

    /// Deterministic pseudo-random values in `0..100`.
    pub fn lcg(dim: usize, seed: u32) -> Self {
        let mut s = seed;
        Self::from_fn(dim, |_| {
            // Simple LCG for deterministic values
            s = s.wrapping_mul(1103515245).wrapping_add(12345);
            ((s >> 16) % 100) as i32
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.dim + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[self.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: i32) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[i32] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.data
    }

    /// Wrapping sum of all elements.
    pub fn checksum(&self) -> i64 {
        self.data
            .iter()
            .fold(0i64, |sum, &v| sum.wrapping_add(v as i64))
    }

    /// Top-left `min(size, dim)` square.
    pub fn corner(&self, size: usize) -> Corner {
        let size = core::cmp::min(size, self.dim);
        let mut cells = Vec::with_capacity(size * size);
        for i in 0..size {
            cells.extend_from_slice(&self.row(i)[..size]);
        }
        Corner { size, cells }
    }

    /// Splits the matrix into one exclusive band per plan.
    ///
    /// `plans` must be contiguous and cover `[0, dim)` in order, which is what
    /// [`crate::partition::plan`] produces. Empty plans yield empty bands.
    pub fn split_bands(&mut self, plans: &[PartitionPlan]) -> Vec<RowBand<'_>> {
        let dim = self.dim;
        let mut rest: &mut [i32] = &mut self.data;
        let mut next_row = 0;
        let mut bands = Vec::with_capacity(plans.len());

        for plan in plans {
            assert_eq!(
                plan.start_row, next_row,
                "partition plans must be contiguous"
            );
            let (head, tail) = core::mem::take(&mut rest).split_at_mut(plan.len() * dim);
            bands.push(RowBand {
                plan: *plan,
                dim,
                data: head,
            });
            rest = tail;
            next_row = plan.end_row;
        }
        assert!(rest.is_empty(), "partition plans must cover every row");

        bands
    }
}

/// Exclusive view of the output rows owned by one worker.
#[derive(Debug)]
pub struct RowBand<'c> {
    plan: PartitionPlan,
    dim: usize,
    data: &'c mut [i32],
}

impl<'c> RowBand<'c> {
    #[inline]
    pub fn plan(&self) -> PartitionPlan {
        self.plan
    }

    #[inline]
    pub fn worker(&self) -> usize {
        self.plan.worker
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Mutable row `row` of the full matrix; must lie inside the band.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [i32] {
        debug_assert!(self.plan.rows().contains(&row));
        let local = row - self.plan.start_row;
        &mut self.data[local * self.dim..(local + 1) * self.dim]
    }

    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        &self.data[..]
    }
}

/// Diagnostic top-left square of a matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Corner {
    pub size: usize,
    pub cells: Vec<i32>,
}

impl Corner {
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        // `max(1)` keeps `chunks` happy for the empty corner of a 0x0 matrix.
        self.cells.chunks(self.size.max(1))
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for v in row {
                write!(f, "{v:5} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
