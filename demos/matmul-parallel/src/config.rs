//! Run settings: CLI flags over an optional YAML file over defaults.

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use kernel::{available_workers, ConfigError, Fill, Partition, TestConfig, VerifyMode, DEFAULT_DIM};
use serde::Deserialize;

use crate::cli::Cli;

/// Seed used by `--fill lcg` when none is given.
pub const DEFAULT_SEED: u32 = 0x12345678;

#[derive(ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchKind {
    /// Every worker on the calling thread
    Serial,
    /// One scoped OS thread per worker
    #[default]
    Threads,
    /// A rayon pool with one thread per worker
    Rayon,
}

#[derive(ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FillKind {
    /// A[i] = i mod 10, B[i] = (i + 1) mod 10
    #[default]
    Pattern,
    /// Seeded LCG values in 0..100
    Lcg,
}

/// Contents of a `--config` file. Every key is optional.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub dim: Option<usize>,
    pub workers: Option<usize>,
    pub dispatch: Option<DispatchKind>,
    pub partition: Option<Partition>,
    pub fill: Option<FillKind>,
    pub seed: Option<u32>,
    pub verify: Option<VerifyMode>,
    pub json: Option<bool>,
}

pub fn load(path: &Path) -> anyhow::Result<FileConfig> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub dim: usize,
    pub workers: usize,
    pub dispatch: DispatchKind,
    pub partition: Partition,
    pub fill: Fill,
    pub verify: VerifyMode,
    pub json: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        let fill = match cli.fill.or(file.fill).unwrap_or_default() {
            FillKind::Pattern => Fill::Pattern,
            FillKind::Lcg => Fill::Lcg {
                seed: cli.seed.or(file.seed).unwrap_or(DEFAULT_SEED),
            },
        };

        Self {
            dim: cli.dim.or(file.dim).unwrap_or(DEFAULT_DIM),
            workers: cli.workers.or(file.workers).unwrap_or_else(available_workers),
            dispatch: cli.dispatch.or(file.dispatch).unwrap_or_default(),
            partition: cli
                .partition
                .map(Partition::from)
                .or(file.partition)
                .unwrap_or_default(),
            fill,
            verify: cli
                .verify
                .map(VerifyMode::from)
                .or(file.verify)
                .unwrap_or_default(),
            json: cli.json || file.json.unwrap_or(false),
        }
    }

    pub fn test_config(&self) -> Result<TestConfig, ConfigError> {
        Ok(TestConfig::new(self.dim, self.workers)?
            .with_partition(self.partition)
            .with_fill(self.fill)
            .with_verify(self.verify))
    }
}
