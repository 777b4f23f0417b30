//! Row-partitioned dense matrix multiplication.
//!
//! Matrices are stored in row-major order. The output matrix is split into
//! contiguous row bands, one per worker, so that every band can be computed
//! independently: workers share `A` and `B` read-only and each owns exactly
//! one disjoint slice of `C`. Fork/join and performance counters are injected
//! through the [`Dispatch`] and [`PerfCounters`] traits.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod dispatch;
pub mod harness;
pub mod kernel;
pub mod matrix;
pub mod partition;
pub mod perf;
pub mod verify;

pub use dispatch::{available_workers, Dispatch, Serial};
pub use harness::{run_test, ConfigError, Fill, TestConfig, TestReport};
pub use kernel::{multiply, multiply_band, multiply_rows};
pub use matrix::{Corner, Matrix, RowBand};
pub use partition::{partition, plan, Partition, PartitionPlan};
pub use perf::{NoCounters, PerfCounters, PerfSample};
pub use verify::{VerificationMismatch, VerifyMode};

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        pub use dispatch::ScopedThreads;
        pub use perf::WallClock;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        pub use dispatch::RayonPool;
    }
}

/// Canonical matrix dimension used by the cluster test.
pub const DEFAULT_DIM: usize = 128;
