//! The cluster test: Init -> Dispatch -> Join -> Verify -> Report.

use alloc::vec::Vec;
use core::fmt;

use crate::dispatch::Dispatch;
use crate::kernel::multiply_band;
use crate::matrix::{Corner, Matrix};
use crate::partition::{plan, Partition, PartitionPlan};
use crate::perf::{PerfCounters, PerfSample};
use crate::verify::{verify, VerificationMismatch, VerifyMode};

/// Side of the diagnostic corner printed after every run.
pub const CORNER_SIZE: usize = 4;

/// How the `A` and `B` operands are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Fill {
    /// `A[i] = i mod 10`, `B[i] = (i + 1) mod 10`.
    #[default]
    Pattern,
    /// LCG values in `0..100`; `B` uses `seed ^ 0xDEADBEEF`.
    Lcg { seed: u32 },
}

impl Fill {
    pub fn operands(self, dim: usize) -> (Matrix, Matrix) {
        match self {
            Fill::Pattern => (Matrix::pattern_a(dim), Matrix::pattern_b(dim)),
            Fill::Lcg { seed } => (Matrix::lcg(dim, seed), Matrix::lcg(dim, seed ^ 0xDEADBEEF)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroDimension,
    ZeroWorkers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDimension => f.write_str("matrix dimension must be at least 1"),
            ConfigError::ZeroWorkers => f.write_str("worker count must be at least 1"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// A validated test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TestConfig {
    dim: usize,
    workers: usize,
    pub partition: Partition,
    pub fill: Fill,
    pub verify: VerifyMode,
}

impl TestConfig {
    pub fn new(dim: usize, workers: usize) -> Result<Self, ConfigError> {
        if dim == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(Self {
            dim,
            workers,
            partition: Partition::default(),
            fill: Fill::default(),
            verify: VerifyMode::default(),
        })
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

/// Everything a run produced. `errors == 0` means the test passed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TestReport {
    pub config: TestConfig,
    pub dispatcher: &'static str,
    pub plans: Vec<PartitionPlan>,
    pub checked: usize,
    pub errors: usize,
    pub mismatches: Vec<VerificationMismatch>,
    pub corner: Corner,
    pub checksum: i64,
    pub perf: PerfSample,
}

impl TestReport {
    #[inline]
    pub fn error_count(&self) -> usize {
        self.errors
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

/// Run the whole test once.
///
/// The dispatcher receives one band per worker and must return only after
/// every band has been computed. `counters` bracket that dispatch step.
pub fn run_test<D, P>(config: &TestConfig, dispatcher: &D, counters: &mut P) -> TestReport
where
    D: Dispatch,
    P: PerfCounters + ?Sized,
{
    let dim = config.dim();
    let workers = config.workers();

    // Init
    let (a, b) = config.fill.operands(dim);
    let mut c = Matrix::zeros(dim);
    log::debug!("initialized {dim}x{dim} operands ({:?})", config.fill);

    // Dispatch + join
    let plans = plan(dim, workers, config.partition);
    log::debug!(
        "dispatching {workers} workers via {} ({:?})",
        dispatcher.name(),
        config.partition
    );
    counters.reset();
    counters.start();
    {
        let (a, b) = (&a, &b);
        let bands = c.split_bands(&plans);
        dispatcher.fork_join(bands, move |mut band| multiply_band(a, b, &mut band));
    }
    counters.stop();
    let perf = counters.read();
    log::debug!("all workers joined");

    // Verify
    let verification = verify(config.verify, &a, &b, &c);
    log::debug!(
        "verified {} cells, {} errors",
        verification.checked,
        verification.errors
    );

    // Report
    TestReport {
        config: *config,
        dispatcher: dispatcher.name(),
        plans,
        checked: verification.checked,
        errors: verification.errors,
        mismatches: verification.mismatches,
        corner: c.corner(CORNER_SIZE),
        checksum: c.checksum(),
        perf,
    }
}
