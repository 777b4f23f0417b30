use std::io::{self, Write};

use kernel::{TestReport, VerifyMode};

pub fn render(report: &TestReport, out: &mut impl Write) -> io::Result<()> {
    let dim = report.config.dim();

    writeln!(out, "\n=== Parallel Matrix Multiplication Test ===")?;
    writeln!(out, "Matrix size: {dim}x{dim}")?;
    writeln!(out, "Matrices initialized")?;

    writeln!(
        out,
        "[Cluster] Starting parallel matmul with {} workers ({})",
        report.config.workers(),
        report.dispatcher
    )?;
    writeln!(out, "[Cluster] Computing {dim}x{dim} matrix multiplication")?;
    writeln!(out, "[Cluster] Computation complete")?;
    render_perf(report, out)?;

    writeln!(out, "\nVerifying results...")?;
    match report.config.verify {
        VerifyMode::Origin => match report.mismatches.first() {
            None => writeln!(out, "✓ C[0,0] = {} (correct)", report.corner.cells[0])?,
            Some(m) => writeln!(out, "✗ {m}")?,
        },
        VerifyMode::Full => {
            if report.passed() {
                writeln!(out, "✓ {} cells checked (correct)", report.checked)?;
            } else {
                for m in &report.mismatches {
                    writeln!(out, "✗ {m}")?;
                }
                let hidden = report.errors.saturating_sub(report.mismatches.len());
                if hidden > 0 {
                    writeln!(out, "✗ ... and {hidden} more")?;
                }
            }
        }
    }

    writeln!(
        out,
        "\nSample results (first {0}x{0} submatrix of C):",
        report.corner.size
    )?;
    write!(out, "{}", report.corner)?;
    writeln!(out, "Checksum: {}", report.checksum)?;

    if report.passed() {
        writeln!(out, "\n✓ Test PASSED")?;
    } else {
        writeln!(out, "\n✗ Test FAILED with {} errors", report.errors)?;
    }
    Ok(())
}

fn render_perf(report: &TestReport, out: &mut impl Write) -> io::Result<()> {
    let perf = &report.perf;
    if let (Some(cycles), Some(instr), Some(cpi)) = (perf.cycles, perf.instructions, perf.cpi()) {
        writeln!(
            out,
            "[Cluster] Cycles: {cycles}, Instructions: {instr}, CPI: {cpi:.2}"
        )?;
    }
    if let Some(elapsed) = perf.elapsed {
        writeln!(out, "[Cluster] Elapsed: {elapsed:?}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::{run_test, NoCounters, PerfSample, Serial, TestConfig, VerificationMismatch};

    fn rendered(report: &TestReport) -> String {
        let mut buf = Vec::new();
        render(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_passing_report() {
        let config = TestConfig::new(128, 4).unwrap();
        let report = run_test(&config, &Serial, &mut NoCounters);
        let text = rendered(&report);
        assert!(text.contains("Matrix size: 128x128"));
        assert!(text.contains("with 4 workers (serial)"));
        assert!(text.contains("✓ C[0,0] = 2858 (correct)"));
        assert!(text.contains(" 2858  2516  3084  2482 \n"));
        assert!(text.ends_with("✓ Test PASSED\n"));
        assert!(!text.contains("Elapsed"));
    }

    #[test]
    fn test_failing_full_report_lists_mismatches() {
        let config = TestConfig::new(4, 1)
            .unwrap()
            .with_verify(VerifyMode::Full);
        let mut report = run_test(&config, &Serial, &mut NoCounters);
        report.errors = 20;
        report.mismatches = (0..16)
            .map(|i| VerificationMismatch {
                row: i / 4,
                col: i % 4,
                expected: 1,
                actual: 0,
            })
            .collect();
        let text = rendered(&report);
        assert!(text.contains("✗ C[3,3] = 0 (expected 1)"));
        assert!(text.contains("✗ ... and 4 more"));
        assert!(text.ends_with("✗ Test FAILED with 20 errors\n"));
    }

    #[test]
    fn test_perf_line_with_counters() {
        let mut report = run_test(&TestConfig::new(2, 1).unwrap(), &Serial, &mut NoCounters);
        report.perf = PerfSample {
            cycles: Some(1000),
            instructions: Some(800),
            elapsed: None,
        };
        let text = rendered(&report);
        assert!(text.contains("[Cluster] Cycles: 1000, Instructions: 800, CPI: 1.25"));
    }
}
