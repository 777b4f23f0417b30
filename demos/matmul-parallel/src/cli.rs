use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{DispatchKind, FillKind};

#[derive(Parser, Debug)]
#[command(
    name = "matmul-parallel",
    version,
    about = "Parallel matrix multiplication test: row bands forked across workers, joined, verified"
)]
pub struct Cli {
    /// YAML file with default settings; flags override it
    #[arg(long, value_name = "FILE", env = "MATMUL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Matrix dimension N (matrices are NxN)
    #[arg(short = 'n', long, env = "MATMUL_DIM")]
    pub dim: Option<usize>,

    /// Number of workers W (defaults to available parallelism)
    #[arg(short = 'w', long, env = "MATMUL_WORKERS")]
    pub workers: Option<usize>,

    /// How worker jobs are forked and joined
    #[arg(long, value_enum)]
    pub dispatch: Option<DispatchKind>,

    /// How remainder rows are assigned
    #[arg(long, value_enum)]
    pub partition: Option<PartitionArg>,

    /// How the A and B operands are filled
    #[arg(long, value_enum)]
    pub fill: Option<FillKind>,

    /// Seed for `--fill lcg`
    #[arg(long)]
    pub seed: Option<u32>,

    /// Which cells of C are checked
    #[arg(long, value_enum)]
    pub verify: Option<VerifyArg>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionArg {
    RemainderLast,
    Balanced,
}

impl From<PartitionArg> for kernel::Partition {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::RemainderLast => kernel::Partition::RemainderLast,
            PartitionArg::Balanced => kernel::Partition::Balanced,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyArg {
    Origin,
    Full,
}

impl From<VerifyArg> for kernel::VerifyMode {
    fn from(arg: VerifyArg) -> Self {
        match arg {
            VerifyArg::Origin => kernel::VerifyMode::Origin,
            VerifyArg::Full => kernel::VerifyMode::Full,
        }
    }
}
