//! Exact distribution of the run count for fixed success/failure totals.
//!
//! Arrangement counts are built from binomial coefficients in arbitrary
//! precision and only divided down to `f64` at the end, so moderately large
//! totals never overflow.
//!
//! Two cache layers are provided. [`RunDistributionCache`] is an owned cache
//! that callers thread through their own code; it is unbounded by default and
//! can be capped with least-recently-used eviction. The free functions
//! [`exact_distribution`] and [`exact_percentile_rank`] use a process-wide
//! cache that grows for the life of the process: entries are immutable and
//! shared behind `Arc`, and two threads missing the same key may both build
//! it, which is harmless because the result is identical.
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use crate::error::StreakError;
use crate::numbers::biguint_ratio;
use crate::runs::RunCounts;

/// Memo table of exact binomial coefficients keyed by `(n, k)`.
#[derive(Debug, Clone, Default)]
pub struct BinomialCache {
    table: HashMap<(u64, u64), BigUint>,
}

impl BinomialCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `C(n, k)`, zero when `k > n`.
    pub fn choose(&mut self, n: u64, k: u64) -> BigUint {
        if k > n {
            return BigUint::zero();
        }
        let k = k.min(n - k);
        if k == 0 {
            return BigUint::one();
        }
        if let Some(hit) = self.table.get(&(n, k)) {
            return hit.clone();
        }
        let mut value = BigUint::one();
        for i in 1..=k {
            // exact at every step: the running product is C(n-k+i, i)
            value *= n - k + i;
            value /= i;
        }
        self.table.insert((n, k), value.clone());
        value
    }

    /// `C(n, 0..=k_max)`, stepping `C(n, k) = C(n, k - 1) * (n - k + 1) / k`
    /// from whatever the memo already holds for row `n`.
    pub fn row(&mut self, n: u64, k_max: u64) -> Vec<BigUint> {
        let mut row = Vec::with_capacity(usize::try_from(k_max).map_or(0, |k| k + 1));
        let mut value = BigUint::one();
        row.push(value.clone());
        for k in 1..=k_max {
            if k > n {
                row.push(BigUint::zero());
                continue;
            }
            value = if k <= n - k {
                if let Some(hit) = self.table.get(&(n, k)) {
                    hit.clone()
                } else {
                    let next = value * (n - k + 1) / k;
                    self.table.insert((n, k), next.clone());
                    next
                }
            } else {
                value * (n - k + 1) / k
            };
            row.push(value.clone());
        }
        row
    }

    /// Drop every memoized row whose `n` fails `keep`.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(u64) -> bool) {
        self.table.retain(|&(n, _), _| keep(n));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Probability mass function of the run count for one `(successes, failures)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactRunDistribution {
    counts: RunCounts,
    first_runs: u64,
    probabilities: Vec<f64>,
}

impl ExactRunDistribution {
    /// Build the distribution, drawing binomials from `binomials`.
    ///
    /// Uniform totals (either count zero) put all mass on a single run.
    pub fn build(counts: RunCounts, binomials: &mut BinomialCache) -> Self {
        let RunCounts {
            successes: s,
            failures: f,
        } = counts;
        if s == 0 || f == 0 {
            return Self {
                counts,
                first_runs: 1,
                probabilities: vec![1.0],
            };
        }

        let total = binomials.choose(s + f, s);
        let shorter = s.min(f);
        let success_row = binomials.row(s - 1, shorter);
        let failure_row = binomials.row(f - 1, shorter);
        let probabilities = (2..=2 * shorter + 1)
            .map(|runs| {
                let arrangements = arrangements_with_runs(&success_row, &failure_row, runs);
                biguint_ratio(&arrangements, &total)
            })
            .collect();

        Self {
            counts,
            first_runs: 2,
            probabilities,
        }
    }

    #[must_use]
    pub const fn counts(&self) -> RunCounts {
        self.counts
    }

    /// Smallest run count in the support table.
    #[must_use]
    pub const fn first_runs(&self) -> u64 {
        self.first_runs
    }

    /// Largest run count in the support table.
    #[must_use]
    pub fn last_runs(&self) -> u64 {
        self.first_runs + self.probabilities.len() as u64 - 1
    }

    /// `P(R = runs)`; zero outside the table.
    #[must_use]
    pub fn probability(&self, runs: u64) -> f64 {
        runs.checked_sub(self.first_runs)
            .and_then(|offset| usize::try_from(offset).ok())
            .and_then(|idx| self.probabilities.get(idx))
            .copied()
            .unwrap_or(0.0)
    }

    /// `(runs, probability)` pairs in increasing run order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        (self.first_runs..).zip(self.probabilities.iter().copied())
    }

    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// `P(R <= runs)`.
    #[must_use]
    pub fn cdf(&self, runs: u64) -> f64 {
        self.iter()
            .take_while(|&(r, _)| r <= runs)
            .map(|(_, p)| p)
            .sum::<f64>()
            .min(1.0)
    }

    /// Mean of the exact distribution.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.iter()
            .map(|(r, p)| crate::numbers::u64_to_f64(r) * p)
            .sum()
    }

    /// Mid-rank percentile of `observed_runs`:
    /// `100 * (P(R <= x) - P(R = x) / 2)`.
    #[must_use]
    pub fn percentile_rank(&self, observed_runs: u64) -> f64 {
        let at = self.probability(observed_runs);
        (100.0 * (self.cdf(observed_runs) - 0.5 * at)).clamp(0.0, 100.0)
    }
}

/// Number of arrangements with exactly `runs` runs, given the binomial rows
/// `C(s - 1, ·)` and `C(f - 1, ·)`.
fn arrangements_with_runs(
    success_row: &[BigUint],
    failure_row: &[BigUint],
    runs: u64,
) -> BigUint {
    let k = runs / 2;
    if k == 0 {
        return BigUint::zero();
    }
    let s = |j: u64| row_entry(success_row, j);
    let f = |j: u64| row_entry(failure_row, j);
    if runs % 2 == 0 {
        // k runs of each kind, either kind may lead
        s(k - 1) * f(k - 1) * 2_u32
    } else {
        // k+1 runs of one kind around k runs of the other
        s(k) * f(k - 1) + f(k) * s(k - 1)
    }
}

fn row_entry(row: &[BigUint], k: u64) -> BigUint {
    usize::try_from(k)
        .ok()
        .and_then(|idx| row.get(idx))
        .cloned()
        .unwrap_or_default()
}

/// Binomial rows `n` that building `counts` draws on.
fn rows_for(counts: RunCounts) -> [Option<u64>; 3] {
    let RunCounts {
        successes: s,
        failures: f,
    } = counts;
    if s == 0 || f == 0 {
        return [None; 3];
    }
    [Some(s - 1), Some(f - 1), Some(s + f)]
}

fn check_observed(counts: RunCounts, observed_runs: u64) -> Result<(), StreakError> {
    if counts.total() == 0 {
        return Err(StreakError::insufficient("percentile rank needs at least one trial"));
    }
    let (lo, hi) = (counts.min_runs(), counts.max_runs());
    if observed_runs < lo || observed_runs > hi {
        return Err(StreakError::invalid(format!(
            "{observed_runs} runs is infeasible for {} successes and {} failures (expected {lo}..={hi})",
            counts.successes, counts.failures
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CachedDistribution {
    distribution: Arc<ExactRunDistribution>,
    last_used: u64,
}

/// Owned cache of exact distributions keyed by `(successes, failures)`.
///
/// Unbounded unless built with [`RunDistributionCache::with_capacity`], in
/// which case the least recently used pair is evicted once the cap is hit and
/// the binomial memo is pruned to the rows the surviving pairs use.
#[derive(Debug, Clone, Default)]
pub struct RunDistributionCache {
    binomials: BinomialCache,
    entries: HashMap<RunCounts, CachedDistribution>,
    capacity: Option<NonZeroUsize>,
    clock: u64,
}

impl RunDistributionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Fetch or build the distribution for `counts`.
    pub fn distribution(&mut self, counts: RunCounts) -> Arc<ExactRunDistribution> {
        self.clock += 1;
        let now = self.clock;
        if let Some(entry) = self.entries.get_mut(&counts) {
            entry.last_used = now;
            log::trace!("exact distribution cache hit for {counts:?}");
            return entry.distribution.clone();
        }

        log::trace!("exact distribution cache miss for {counts:?}");
        let distribution = Arc::new(ExactRunDistribution::build(counts, &mut self.binomials));
        if self.evict_for_insert() {
            let live: HashSet<u64> = self
                .entries
                .keys()
                .copied()
                .chain(std::iter::once(counts))
                .flat_map(rows_for)
                .flatten()
                .collect();
            self.binomials.retain_rows(|n| live.contains(&n));
        }
        self.entries.insert(
            counts,
            CachedDistribution {
                distribution: distribution.clone(),
                last_used: now,
            },
        );
        distribution
    }

    /// Mid-rank percentile of `observed_runs` under the exact distribution.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` for zero trials and `InvalidInput` when the
    /// observed run count is infeasible for the totals.
    pub fn percentile_rank(
        &mut self,
        counts: RunCounts,
        observed_runs: u64,
    ) -> Result<f64, StreakError> {
        check_observed(counts, observed_runs)?;
        Ok(self.distribution(counts).percentile_rank(observed_runs))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, counts: RunCounts) -> bool {
        self.entries.contains_key(&counts)
    }

    /// Memoized binomials backing the cached distributions.
    #[must_use]
    pub const fn binomials(&self) -> &BinomialCache {
        &self.binomials
    }

    /// Make room for one more entry; `true` when anything was evicted.
    fn evict_for_insert(&mut self) -> bool {
        let Some(capacity) = self.capacity else {
            return false;
        };
        let mut evicted = false;
        while self.entries.len() >= capacity.get() {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| *key);
            let Some(key) = oldest else {
                break;
            };
            log::debug!("evicting exact distribution for {key:?}");
            self.entries.remove(&key);
            evicted = true;
        }
        evicted
    }
}

type SharedDistributions = RwLock<HashMap<RunCounts, Arc<ExactRunDistribution>>>;

fn shared_distributions() -> &'static SharedDistributions {
    static DISTRIBUTIONS: OnceLock<SharedDistributions> = OnceLock::new();
    DISTRIBUTIONS.get_or_init(|| RwLock::new(HashMap::new()))
}

fn shared_binomials() -> &'static Mutex<BinomialCache> {
    static BINOMIALS: OnceLock<Mutex<BinomialCache>> = OnceLock::new();
    BINOMIALS.get_or_init(|| Mutex::new(BinomialCache::new()))
}

/// Exact run-count distribution from the process-wide cache.
pub fn exact_distribution(successes: u64, failures: u64) -> Arc<ExactRunDistribution> {
    let counts = RunCounts::new(successes, failures);
    if let Some(hit) = shared_distributions()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&counts)
    {
        return hit.clone();
    }

    let built = {
        let mut binomials = shared_binomials()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::new(ExactRunDistribution::build(counts, &mut binomials))
    };
    shared_distributions()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(counts)
        .or_insert(built)
        .clone()
}

/// Mid-rank exact percentile from the process-wide cache.
///
/// # Errors
///
/// Returns `InsufficientData` for zero trials and `InvalidInput` when the
/// observed run count is infeasible for the totals.
pub fn exact_percentile_rank(
    successes: u64,
    failures: u64,
    observed_runs: u64,
) -> Result<f64, StreakError> {
    let counts = RunCounts::new(successes, failures);
    check_observed(counts, observed_runs)?;
    Ok(exact_distribution(successes, failures).percentile_rank(observed_runs))
}
