//! Streak statistics for observed game and career sequences.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StreakError;
use crate::exact::exact_percentile_rank;
use crate::outcome::Outcome;
use crate::runs::decompose;
use crate::runs_test::{RunsTestStatistic, z_from_percentile};

/// One player's outcomes for one game, in shot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub player_id: u64,
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub outcomes: Vec<Outcome>,
}

/// All of a player's games concatenated in record order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRecord {
    pub player_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub games: usize,
    pub outcomes: Vec<Outcome>,
}

/// Run statistics for one observed sequence.
///
/// Asymptotic fields are `None` unless `s + f > 1` and expected runs exceed 2.
/// Exact fields are `None` when exact analysis was not requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakReport {
    pub successes: u64,
    pub failures: u64,
    pub runs: u64,
    pub longest_success_run: u64,
    pub longest_failure_run: u64,
    pub encoded: String,
    pub expected_runs: Option<f64>,
    pub variance: Option<f64>,
    pub z_score: Option<f64>,
    pub normal_percentile: Option<f64>,
    pub exact_percentile: Option<f64>,
    pub z_from_exact_percentile: Option<f64>,
}

impl StreakReport {
    #[must_use]
    pub const fn trials(&self) -> u64 {
        self.successes + self.failures
    }
}

/// Decompose `outcomes` and compute every statistic that is defined for it.
///
/// # Errors
///
/// Returns `InsufficientData` for an empty sequence.
pub fn analyze_sequence(
    outcomes: &[Outcome],
    include_exact: bool,
) -> Result<StreakReport, StreakError> {
    let sequence = decompose(outcomes);
    if sequence.is_empty() {
        return Err(StreakError::insufficient("cannot analyze an empty sequence"));
    }
    let counts = sequence.counts();
    let asymptotic = match RunsTestStatistic::from_sequence(&sequence) {
        Ok(stat) => Some(stat),
        Err(err) if err.is_insufficient_data() => None,
        Err(err) => return Err(err),
    };
    let exact_percentile = if include_exact {
        Some(exact_percentile_rank(
            counts.successes,
            counts.failures,
            sequence.run_count(),
        )?)
    } else {
        None
    };

    Ok(StreakReport {
        successes: counts.successes,
        failures: counts.failures,
        runs: sequence.run_count(),
        longest_success_run: sequence.longest_success_run(),
        longest_failure_run: sequence.longest_failure_run(),
        encoded: sequence.encoded(),
        expected_runs: asymptotic.map(|stat| stat.expected_runs),
        variance: asymptotic.map(|stat| stat.variance),
        z_score: asymptotic.map(|stat| stat.z_score),
        normal_percentile: asymptotic.map(|stat| stat.normal_percentile),
        exact_percentile,
        z_from_exact_percentile: exact_percentile
            .map(z_from_percentile)
            .filter(|z| z.is_finite()),
    })
}

/// Group game records by player (first-seen order) and concatenate outcomes.
#[must_use]
pub fn career_records(records: &[GameRecord]) -> Vec<CareerRecord> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut careers: Vec<CareerRecord> = Vec::new();
    for record in records {
        let slot = *index.entry(record.player_id).or_insert_with(|| {
            careers.push(CareerRecord {
                player_id: record.player_id,
                player_name: None,
                games: 0,
                outcomes: Vec::new(),
            });
            careers.len() - 1
        });
        let career = &mut careers[slot];
        if career.player_name.is_none() {
            career.player_name.clone_from(&record.player_name);
        }
        career.games += 1;
        career.outcomes.extend_from_slice(&record.outcomes);
    }
    careers
}
