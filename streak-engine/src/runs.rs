//! Run-length decomposition of binary sequences.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StreakError;
use crate::outcome::{Outcome, encode_outcomes};

/// Success/failure totals that every run statistic is a function of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub successes: u64,
    pub failures: u64,
}

impl RunCounts {
    #[must_use]
    pub const fn new(successes: u64, failures: u64) -> Self {
        Self {
            successes,
            failures,
        }
    }

    /// Build counts from signed totals held by an external collaborator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when either total is negative.
    pub fn from_signed(successes: i64, failures: i64) -> Result<Self, StreakError> {
        let successes = u64::try_from(successes)
            .map_err(|_| StreakError::invalid(format!("negative success count {successes}")))?;
        let failures = u64::try_from(failures)
            .map_err(|_| StreakError::invalid(format!("negative failure count {failures}")))?;
        Ok(Self::new(successes, failures))
    }

    #[must_use]
    pub const fn total(self) -> u64 {
        self.successes.saturating_add(self.failures)
    }

    /// Largest run count any arrangement of these totals can produce.
    #[must_use]
    pub fn max_runs(self) -> u64 {
        match (self.successes, self.failures) {
            (0, 0) => 0,
            (0, _) | (_, 0) => 1,
            (s, f) if s == f => s * 2,
            (s, f) => s.min(f) * 2 + 1,
        }
    }

    /// Smallest run count any arrangement of these totals can produce.
    #[must_use]
    pub const fn min_runs(self) -> u64 {
        match (self.successes, self.failures) {
            (0, 0) => 0,
            (0, _) | (_, 0) => 1,
            _ => 2,
        }
    }
}

/// Immutable run-length encoding of one outcome sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSequence {
    outcomes: Vec<Outcome>,
    counts: RunCounts,
    success_runs: Vec<u64>,
    failure_runs: Vec<u64>,
}

impl RunSequence {
    #[must_use]
    pub const fn counts(&self) -> RunCounts {
        self.counts
    }

    #[must_use]
    pub const fn success_count(&self) -> u64 {
        self.counts.successes
    }

    #[must_use]
    pub const fn failure_count(&self) -> u64 {
        self.counts.failures
    }

    #[must_use]
    pub fn run_count(&self) -> u64 {
        (self.success_runs.len() + self.failure_runs.len()) as u64
    }

    /// Lengths of success runs in sequence order.
    #[must_use]
    pub fn success_runs(&self) -> &[u64] {
        &self.success_runs
    }

    /// Lengths of failure runs in sequence order.
    #[must_use]
    pub fn failure_runs(&self) -> &[u64] {
        &self.failure_runs
    }

    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Raw W/L encoding of the underlying sequence.
    #[must_use]
    pub fn encoded(&self) -> String {
        encode_outcomes(&self.outcomes)
    }

    #[must_use]
    pub fn longest_success_run(&self) -> u64 {
        self.success_runs.iter().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn longest_failure_run(&self) -> u64 {
        self.failure_runs.iter().copied().max().unwrap_or(0)
    }
}

/// Run-length histogram: run length -> number of runs with that length.
pub type RunLengthHistogram = BTreeMap<u64, u64>;

/// Counts plus run-length histograms, for diagnostics and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub successes: u64,
    pub failures: u64,
    pub runs: u64,
    pub success_histogram: RunLengthHistogram,
    pub failure_histogram: RunLengthHistogram,
}

/// Decompose a sequence into maximal same-valued runs in a single scan.
///
/// An empty sequence yields zero counts; callers must treat that as
/// insufficient data.
#[must_use]
pub fn decompose(outcomes: &[Outcome]) -> RunSequence {
    let mut counts = RunCounts::default();
    let mut success_runs = Vec::new();
    let mut failure_runs = Vec::new();

    let mut current: Option<(Outcome, u64)> = None;
    for &outcome in outcomes {
        if outcome.is_success() {
            counts.successes += 1;
        } else {
            counts.failures += 1;
        }
        current = match current {
            Some((value, len)) if value == outcome => Some((value, len + 1)),
            Some((value, len)) => {
                push_run(value, len, &mut success_runs, &mut failure_runs);
                Some((outcome, 1))
            }
            None => Some((outcome, 1)),
        };
    }
    if let Some((value, len)) = current {
        push_run(value, len, &mut success_runs, &mut failure_runs);
    }

    RunSequence {
        outcomes: outcomes.to_vec(),
        counts,
        success_runs,
        failure_runs,
    }
}

fn push_run(value: Outcome, len: u64, success_runs: &mut Vec<u64>, failure_runs: &mut Vec<u64>) {
    match value {
        Outcome::Success => success_runs.push(len),
        Outcome::Failure => failure_runs.push(len),
    }
}

/// Counts and run-length histograms for a sequence.
#[must_use]
pub fn decompose_counts(outcomes: &[Outcome]) -> RunSummary {
    let sequence = decompose(outcomes);
    RunSummary {
        successes: sequence.success_count(),
        failures: sequence.failure_count(),
        runs: sequence.run_count(),
        success_histogram: histogram(sequence.success_runs()),
        failure_histogram: histogram(sequence.failure_runs()),
    }
}

fn histogram(lengths: &[u64]) -> RunLengthHistogram {
    let mut hist = RunLengthHistogram::new();
    for &len in lengths {
        *hist.entry(len).or_default() += 1;
    }
    hist
}
