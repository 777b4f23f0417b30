//! Static row partitioning.
//!
//! A [`PartitionPlan`] assigns a half-open row range of the output matrix to
//! one worker. For workers `0..W` the ranges produced by either strategy are
//! contiguous, disjoint and cover `[0, N)` exactly.

use alloc::vec::Vec;
use core::ops::Range;

/// How remainder rows are distributed when `N` is not a multiple of `W`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Partition {
    /// Every worker gets `N / W` rows; the last worker also takes the
    /// remaining `N % W` rows.
    #[default]
    RemainderLast,
    /// The first `N % W` workers get one extra row each.
    Balanced,
}

/// Rows `[start_row, end_row)` of the output owned by `worker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionPlan {
    pub worker: usize,
    pub start_row: usize,
    pub end_row: usize,
}

impl PartitionPlan {
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.start_row..self.end_row
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end_row - self.start_row
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start_row == self.end_row
    }
}

/// Row range for `worker` out of `workers` over an `n`-row matrix.
///
/// `rows_per_worker = n / workers`; the last worker runs to `n`, absorbing
/// the remainder. With `workers > n` every worker but the last gets an empty
/// range.
pub fn partition(n: usize, workers: usize, worker: usize) -> PartitionPlan {
    debug_assert!(n > 0, "matrix dimension must be positive");
    debug_assert!(workers > 0, "worker count must be positive");
    debug_assert!(worker < workers, "worker {worker} out of range 0..{workers}");

    let rows_per_worker = n / workers;
    let start_row = worker * rows_per_worker;
    let end_row = if worker == workers - 1 {
        n
    } else {
        start_row + rows_per_worker
    };

    PartitionPlan {
        worker,
        start_row,
        end_row,
    }
}

/// Row range for `worker` with the remainder spread over the first workers.
pub fn partition_balanced(n: usize, workers: usize, worker: usize) -> PartitionPlan {
    debug_assert!(n > 0, "matrix dimension must be positive");
    debug_assert!(workers > 0, "worker count must be positive");
    debug_assert!(worker < workers, "worker {worker} out of range 0..{workers}");

    let base = n / workers;
    let extra = n % workers;
    let start_row = worker * base + core::cmp::min(worker, extra);
    let len = base + usize::from(worker < extra);

    PartitionPlan {
        worker,
        start_row,
        end_row: start_row + len,
    }
}

impl Partition {
    pub fn plan_for(self, n: usize, workers: usize, worker: usize) -> PartitionPlan {
        match self {
            Partition::RemainderLast => partition(n, workers, worker),
            Partition::Balanced => partition_balanced(n, workers, worker),
        }
    }
}

/// Plans for every worker `0..workers`, in worker order.
pub fn plan(n: usize, workers: usize, strategy: Partition) -> Vec<PartitionPlan> {
    (0..workers)
        .map(|worker| strategy.plan_for(n, workers, worker))
        .collect()
}
