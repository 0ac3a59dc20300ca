//! Wald-Wolfowitz runs test under the asymptotic normal approximation.
//!
//! All functions are stateless in the success/failure counts. Degenerate
//! inputs surface as [`StreakError::InsufficientData`] so a z-score is never
//! computed against a zero or undefined variance.
use serde::{Deserialize, Serialize};
use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;

use crate::error::StreakError;
use crate::numbers::u64_to_f64;
use crate::runs::{RunCounts, RunSequence};

/// Expected number of runs, `2*s*f/(s+f) + 1`.
///
/// # Errors
///
/// Returns `InsufficientData` when there are no trials.
pub fn expected_runs(successes: u64, failures: u64) -> Result<f64, StreakError> {
    let total = successes.saturating_add(failures);
    if total == 0 {
        return Err(StreakError::insufficient("expected runs need at least one trial"));
    }
    let s = u64_to_f64(successes);
    let f = u64_to_f64(failures);
    Ok(2.0 * s * f / u64_to_f64(total) + 1.0)
}

/// Variance of the run count, `(E-1)(E-2)/(s+f-1)`.
///
/// The raw value is returned whenever the denominator is defined; it may be
/// zero for uniform or near-uniform totals. Use [`z_score`] or
/// [`RunsTestStatistic::compute`] to enforce the strictly positive guard.
///
/// # Errors
///
/// Returns `InsufficientData` when `s + f <= 1`.
pub fn variance(successes: u64, failures: u64, expected_runs: f64) -> Result<f64, StreakError> {
    let total = successes.saturating_add(failures);
    if total <= 1 {
        return Err(StreakError::insufficient("variance needs at least two trials"));
    }
    Ok((expected_runs - 1.0) * (expected_runs - 2.0) / u64_to_f64(total - 1))
}

/// Standardized deviation of the observed run count.
///
/// # Errors
///
/// Returns `InsufficientData` unless `variance` is finite and strictly positive.
pub fn z_score(observed_runs: u64, expected_runs: f64, variance: f64) -> Result<f64, StreakError> {
    if !variance.is_finite() || variance <= 0.0 {
        return Err(StreakError::insufficient("variance is not strictly positive"));
    }
    Ok((u64_to_f64(observed_runs) - expected_runs) / variance.sqrt())
}

/// Standard normal CDF at `z`, scaled to a percentage in [0, 100].
#[must_use]
pub fn normal_percentile(z_score: f64) -> f64 {
    (50.0 * erfc(-z_score / SQRT_2)).clamp(0.0, 100.0)
}

/// Inverse of [`normal_percentile`]: the z-score at a percentile.
///
/// Percentiles of exactly 0 or 100 map to infinities.
#[must_use]
pub fn z_from_percentile(percentile: f64) -> f64 {
    let p = (percentile / 100.0).clamp(0.0, 1.0);
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Asymptotic runs-test summary for one observed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunsTestStatistic {
    pub observed_runs: u64,
    pub expected_runs: f64,
    pub variance: f64,
    pub z_score: f64,
    pub normal_percentile: f64,
}

impl RunsTestStatistic {
    /// Compute the full statistic, applying the validity guard
    /// (`s + f > 1` and expected runs above 2).
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` when the normal approximation is undefined.
    pub fn compute(counts: RunCounts, observed_runs: u64) -> Result<Self, StreakError> {
        let expected = expected_runs(counts.successes, counts.failures)?;
        if expected <= 2.0 {
            return Err(StreakError::insufficient("expected runs must exceed 2"));
        }
        let var = variance(counts.successes, counts.failures, expected)?;
        let z = z_score(observed_runs, expected, var)?;
        Ok(Self {
            observed_runs,
            expected_runs: expected,
            variance: var,
            z_score: z,
            normal_percentile: normal_percentile(z),
        })
    }

    /// # Errors
    ///
    /// Returns `InsufficientData` when the normal approximation is undefined.
    pub fn from_sequence(sequence: &RunSequence) -> Result<Self, StreakError> {
        Self::compute(sequence.counts(), sequence.run_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_split_expects_n_plus_one() {
        for n in 1..20_u64 {
            let expected = expected_runs(n, n).unwrap();
            assert!((expected - u64_to_f64(n + 1)).abs() < 1e-12);
        }
        assert!((expected_runs(5, 5).unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn reference_counts_match_published_values() {
        let expected = expected_runs(7, 4).unwrap();
        assert!((expected - 6.090_909).abs() < 1e-6);
        let var = variance(7, 4, expected).unwrap();
        assert!((var - 2.082_645).abs() < 1e-4);
    }

    #[test]
    fn zero_trials_are_insufficient() {
        assert!(expected_runs(0, 0).unwrap_err().is_insufficient_data());
        assert!(variance(1, 0, 1.0).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn z_score_requires_positive_variance() {
        assert!(z_score(3, 2.0, 0.0).unwrap_err().is_insufficient_data());
        assert!(z_score(3, 2.0, f64::NAN).is_err());
        let z = z_score(8, 6.0, 4.0).unwrap();
        assert!((z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normal_percentile_tracks_cdf() {
        assert!((normal_percentile(0.0) - 50.0).abs() < 1e-9);
        assert!((normal_percentile(1.96) - 97.5).abs() < 0.01);
        assert!((normal_percentile(-1.96) - 2.5).abs() < 0.01);
        assert!(normal_percentile(-40.0) >= 0.0);
        assert!(normal_percentile(40.0) <= 100.0);
    }

    #[test]
    fn percentile_inverse_roundtrips() {
        for z in [-2.5, -1.0, 0.0, 0.3, 1.7] {
            let back = z_from_percentile(normal_percentile(z));
            assert!((back - z).abs() < 1e-6, "z {z} came back as {back}");
        }
        assert!(z_from_percentile(0.0).is_infinite());
        assert!(z_from_percentile(100.0).is_infinite());
    }

    #[test]
    fn compute_guards_degenerate_counts() {
        // one success and one failure: E = 2, variance 0
        assert!(
            RunsTestStatistic::compute(RunCounts::new(1, 1), 2)
                .unwrap_err()
                .is_insufficient_data()
        );
        assert!(RunsTestStatistic::compute(RunCounts::new(0, 6), 1).is_err());
        let stat = RunsTestStatistic::compute(RunCounts::new(7, 4), 7).unwrap();
        assert!((stat.z_score - (7.0 - 6.090_909) / 2.082_645_f64.sqrt()).abs() < 1e-4);
        assert!(stat.normal_percentile > 50.0);
    }
}
