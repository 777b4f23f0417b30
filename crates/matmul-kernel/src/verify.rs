//! Result verification.
//!
//! Every check recomputes its expected value independently of the workers.
//! A differing cell is one [`VerificationMismatch`]; mismatches are counted
//! and never stop the remaining checks.

use alloc::vec::Vec;
use core::fmt;

use crate::kernel::multiply;
use crate::matrix::Matrix;

/// Mismatch details kept per run; the count stays exact past this.
pub const MAX_REPORTED_MISMATCHES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum VerifyMode {
    /// Check `C[0,0]` only.
    #[default]
    Origin,
    /// Check every cell against a serial reference product.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerificationMismatch {
    pub row: usize,
    pub col: usize,
    pub expected: i32,
    pub actual: i32,
}

impl fmt::Display for VerificationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C[{},{}] = {} (expected {})",
            self.row, self.col, self.actual, self.expected
        )
    }
}

/// Outcome of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub checked: usize,
    pub errors: usize,
    pub mismatches: Vec<VerificationMismatch>,
}

impl Verification {
    fn record(&mut self, mismatch: Option<VerificationMismatch>) {
        self.checked += 1;
        if let Some(m) = mismatch {
            log::warn!("verification mismatch: {m}");
            self.errors += 1;
            if self.mismatches.len() < MAX_REPORTED_MISMATCHES {
                self.mismatches.push(m);
            }
        }
    }
}

/// `C[0,0] = sum_k A[0,k] * B[k,0]`, which is `sum_k A[k] * B[k*N]` in flat
/// indices.
pub fn expected_origin(a: &Matrix, b: &Matrix) -> i32 {
    let n = a.dim();
    let (a, b) = (a.as_slice(), b.as_slice());
    let mut expected = 0i32;
    for k in 0..n {
        expected = expected.wrapping_add(a[k].wrapping_mul(b[k * n]));
    }
    expected
}

fn compare(row: usize, col: usize, expected: i32, actual: i32) -> Option<VerificationMismatch> {
    (expected != actual).then_some(VerificationMismatch {
        row,
        col,
        expected,
        actual,
    })
}

pub fn verify(mode: VerifyMode, a: &Matrix, b: &Matrix, c: &Matrix) -> Verification {
    let mut result = Verification::default();
    match mode {
        VerifyMode::Origin => {
            result.record(compare(0, 0, expected_origin(a, b), c.get(0, 0)));
        }
        VerifyMode::Full => {
            let mut reference = Matrix::zeros(c.dim());
            multiply(a, b, &mut reference);
            for i in 0..c.dim() {
                for j in 0..c.dim() {
                    result.record(compare(i, j, reference.get(i, j), c.get(i, j)));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(a: &Matrix, b: &Matrix) -> Matrix {
        let mut c = Matrix::zeros(a.dim());
        multiply(a, b, &mut c);
        c
    }

    #[test]
    fn test_expected_origin_matches_closed_form() {
        let n = 128;
        let a = Matrix::pattern_a(n);
        let b = Matrix::pattern_b(n);
        let closed: i32 = (0..n)
            .map(|k| ((k % 10) * ((k * n + 1) % 10)) as i32)
            .sum();
        assert_eq!(expected_origin(&a, &b), closed);
        assert_eq!(product(&a, &b).get(0, 0), closed);
    }

    #[test]
    fn test_origin_pass_and_fail() {
        let a = Matrix::pattern_a(8);
        let b = Matrix::pattern_b(8);
        let mut c = product(&a, &b);

        let ok = verify(VerifyMode::Origin, &a, &b, &c);
        assert_eq!((ok.checked, ok.errors), (1, 0));

        let good = c.get(0, 0);
        c.set(0, 0, good + 1);
        let bad = verify(VerifyMode::Origin, &a, &b, &c);
        assert_eq!(bad.errors, 1);
        assert_eq!(
            bad.mismatches,
            [VerificationMismatch {
                row: 0,
                col: 0,
                expected: good,
                actual: good + 1
            }]
        );
    }

    #[test]
    fn test_origin_ignores_other_cells() {
        let a = Matrix::pattern_a(4);
        let b = Matrix::pattern_b(4);
        let mut c = product(&a, &b);
        c.set(3, 3, -1);
        assert_eq!(verify(VerifyMode::Origin, &a, &b, &c).errors, 0);
        assert_eq!(verify(VerifyMode::Full, &a, &b, &c).errors, 1);
    }

    #[test]
    fn test_full_counts_every_cell_but_caps_details() {
        let a = Matrix::pattern_a(6);
        let b = Matrix::pattern_b(6);
        let c = Matrix::from_fn(6, |_| i32::MIN);
        let v = verify(VerifyMode::Full, &a, &b, &c);
        assert_eq!(v.checked, 36);
        assert_eq!(v.errors, 36);
        assert_eq!(v.mismatches.len(), MAX_REPORTED_MISMATCHES);
        assert_eq!((v.mismatches[1].row, v.mismatches[1].col), (0, 1));
    }

    #[test]
    fn test_mismatch_display() {
        let m = VerificationMismatch {
            row: 0,
            col: 0,
            expected: 5,
            actual: 7,
        };
        assert_eq!(alloc::format!("{m}"), "C[0,0] = 7 (expected 5)");
    }
}
