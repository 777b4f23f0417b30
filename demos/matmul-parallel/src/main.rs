//! Parallel matrix multiplication test.
//!
//! Forks one row band of `C = A * B` per worker, joins, checks the result and
//! exits with the number of failed checks (0 on success).

mod cli;
mod config;
mod report;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use kernel::{run_test, RayonPool, ScopedThreads, Serial, WallClock};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{DispatchKind, Settings};

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<usize> {
    let file = match cli.config.as_deref() {
        Some(path) => config::load(path)?,
        None => Default::default(),
    };
    let settings = Settings::resolve(&cli, file);
    let test = settings
        .test_config()
        .context("invalid test configuration")?;

    let _span = tracing::info_span!(
        "matmul",
        dim = test.dim(),
        workers = test.workers(),
        dispatch = ?settings.dispatch
    )
    .entered();
    tracing::info!(?settings, "starting run");

    let mut clock = WallClock::default();
    let report = match settings.dispatch {
        DispatchKind::Serial => run_test(&test, &Serial, &mut clock),
        DispatchKind::Threads => run_test(&test, &ScopedThreads, &mut clock),
        DispatchKind::Rayon => {
            let pool = RayonPool::new(test.workers()).context("failed to build rayon pool")?;
            run_test(&test, &pool, &mut clock)
        }
    };
    tracing::info!(
        errors = report.errors,
        checksum = report.checksum,
        elapsed = ?report.perf.elapsed,
        "run finished"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if settings.json {
        serde_json::to_writer_pretty(&mut out, &report).context("failed to write report")?;
        writeln!(out)?;
    } else {
        report::render(&report, &mut out).context("failed to write report")?;
    }
    out.flush()?;

    Ok(report.error_count())
}

/// Failed-check count as a process exit status; never wraps to 0.
fn exit_code(errors: usize) -> i32 {
    errors.min(u8::MAX as usize) as i32
}

/// Exit status for a command line clap rejected. Bad flags are setup errors
/// (1); `--help` and `--version` are not errors at all.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            eprint!("Error: {e}");
            std::process::exit(usage_exit_code(&e));
        }
        Err(e) => e.exit(),
    };
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(errors) => std::process::exit(exit_code(errors)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_saturates() {
        assert_eq!(exit_code(0), 0);
        assert_eq!(exit_code(3), 3);
        assert_eq!(exit_code(256), 255);
        assert_eq!(exit_code(usize::MAX), 255);
    }

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("matmul-parallel").chain(args.iter().copied()))
    }

    #[test]
    fn test_bad_flags_exit_one() {
        for args in [&["--bogus"][..], &["--dim", "many"], &["--dispatch", "gpu"]] {
            let err = parse(args).unwrap_err();
            assert_eq!(usage_exit_code(&err), 1, "{args:?}");
        }
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        for flag in ["--help", "--version"] {
            let err = parse(&[flag]).unwrap_err();
            assert_eq!(usage_exit_code(&err), 0, "{flag}");
        }
    }

    #[test]
    fn test_invalid_dimension_is_a_setup_error() {
        let cli = parse(&["--dim", "0", "--workers", "2"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid test configuration"));
    }

    #[test]
    fn test_missing_config_file_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let cli = parse(&["--config", missing.to_str().unwrap()]).unwrap();
        assert!(run(cli).is_err());
    }
}
