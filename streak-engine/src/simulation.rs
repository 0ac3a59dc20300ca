//! Season replay: run synthetic shooters through an observed schedule and
//! score each player's season with the runs test.
//!
//! Each player keeps one model instance for the whole season. In-game memory
//! is cleared after every game; season outcomes accumulate here, outside the
//! model.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;

use crate::catalog::ModelCatalog;
use crate::constants::MIN_SEASON_TRIALS_EXCLUSIVE;
use crate::error::{ModelConfigError, StreakError};
use crate::outcome::Outcome;
use crate::player::{PlayerModel, ProbabilityModel};
use crate::rng::TrialRng;
use crate::runs::decompose;
use crate::runs_test::RunsTestStatistic;
use crate::schedule::SimulationSchedule;

/// Runs-test outcome for one synthetic player-season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub player_id: u64,
    pub successes: u64,
    pub failures: u64,
    pub observed_runs: u64,
    pub expected_runs: f64,
    pub variance: f64,
    pub z_score: f64,
}

/// Why a player-season was left out of the calibration output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    TooFewTrials,
    DegenerateVariance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedPlayer {
    pub player_id: u64,
    pub trials: u64,
    pub reason: ExclusionReason,
}

/// Synthetic outcomes for one player's season, in game order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSeason {
    pub player_id: u64,
    pub outcomes: Vec<Outcome>,
}

/// Everything a season replay produced, players in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeasonReport {
    pub results: Vec<CalibrationResult>,
    pub excluded: Vec<ExcludedPlayer>,
    pub seasons: Vec<SyntheticSeason>,
    pub draws: u64,
}

/// How random draws are sourced during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamLayout {
    /// One stream consumed in schedule order.
    #[default]
    Shared,
    /// One stream per player derived from the caller's stream, so results do
    /// not depend on how games are interleaved.
    PerPlayer,
}

struct PlayerSlot<M> {
    player_id: u64,
    model: M,
    stream: Option<TrialRng>,
    outcomes: Vec<Outcome>,
}

/// Replays schedules against a model factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonSimulator {
    layout: StreamLayout,
}

impl SeasonSimulator {
    #[must_use]
    pub const fn new(layout: StreamLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub const fn layout(&self) -> StreamLayout {
        self.layout
    }

    /// Replay `schedule`, creating one model per player on first appearance.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `factory`.
    pub fn run<M, F, E>(
        &self,
        schedule: &SimulationSchedule,
        mut factory: F,
        rng: &mut TrialRng,
    ) -> Result<SeasonReport, E>
    where
        M: ProbabilityModel,
        F: FnMut(u64) -> Result<M, E>,
    {
        let draws_before = rng.draws();
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut slots: Vec<PlayerSlot<M>> = Vec::new();
        let mut per_player_draws = 0_u64;

        for entry in schedule.entries() {
            let slot_idx = if let Some(&idx) = index.get(&entry.player_id) {
                idx
            } else {
                let stream = match self.layout {
                    StreamLayout::Shared => None,
                    StreamLayout::PerPlayer => {
                        Some(rng.substream(format!("player-{}", entry.player_id).as_bytes()))
                    }
                };
                slots.push(PlayerSlot {
                    player_id: entry.player_id,
                    model: factory(entry.player_id)?,
                    stream,
                    outcomes: Vec::new(),
                });
                index.insert(entry.player_id, slots.len() - 1);
                slots.len() - 1
            };
            let slot = &mut slots[slot_idx];
            let stream = slot.stream.as_mut().unwrap_or(&mut *rng);
            for _ in 0..entry.shot_count() {
                let outcome = slot.model.take_trial(stream);
                slot.outcomes.push(outcome);
            }
            slot.model.end_game();
        }

        let mut report = SeasonReport::default();
        for slot in slots {
            if let Some(stream) = &slot.stream {
                per_player_draws += stream.draws();
            }
            match score_season(slot.player_id, &slot.outcomes) {
                Ok(result) => report.results.push(result),
                Err(excluded) => {
                    log::debug!(
                        "excluding player {} ({} trials): {:?}",
                        excluded.player_id,
                        excluded.trials,
                        excluded.reason
                    );
                    report.excluded.push(excluded);
                }
            }
            report.seasons.push(SyntheticSeason {
                player_id: slot.player_id,
                outcomes: slot.outcomes,
            });
        }
        report.draws = rng.draws() - draws_before + per_player_draws;
        log::debug!(
            "season replay: {} scored, {} excluded, {} draws",
            report.results.len(),
            report.excluded.len(),
            report.draws
        );
        Ok(report)
    }
}

fn score_season(
    player_id: u64,
    outcomes: &[Outcome],
) -> Result<CalibrationResult, ExcludedPlayer> {
    let sequence = decompose(outcomes);
    let counts = sequence.counts();
    let trials = counts.total();
    let exclude = |reason| ExcludedPlayer {
        player_id,
        trials,
        reason,
    };
    if trials <= MIN_SEASON_TRIALS_EXCLUSIVE {
        return Err(exclude(ExclusionReason::TooFewTrials));
    }
    let stat = RunsTestStatistic::from_sequence(&sequence)
        .map_err(|_: StreakError| exclude(ExclusionReason::DegenerateVariance))?;
    Ok(CalibrationResult {
        player_id,
        successes: counts.successes,
        failures: counts.failures,
        observed_runs: stat.observed_runs,
        expected_runs: stat.expected_runs,
        variance: stat.variance,
        z_score: stat.z_score,
    })
}

/// Replay `schedule` on the shared stream and keep only the scored players.
pub fn simulate_season<M, F>(
    schedule: &SimulationSchedule,
    mut factory: F,
    rng: &mut TrialRng,
) -> Vec<CalibrationResult>
where
    M: ProbabilityModel,
    F: FnMut(u64) -> M,
{
    let replay = SeasonSimulator::new(StreamLayout::Shared)
        .run(schedule, |id| Ok::<M, Infallible>(factory(id)), rng);
    match replay {
        Ok(report) => report.results,
        Err(never) => match never {},
    }
}

/// Factory building the named preset for each player at that player's
/// scheduled season make rate.
///
/// # Errors
///
/// Returns `UnknownPreset` when `preset` is not in `catalog`.
pub fn preset_factory<'a>(
    catalog: &'a ModelCatalog,
    preset: &'a str,
    schedule: &SimulationSchedule,
) -> Result<impl FnMut(u64) -> Result<PlayerModel, ModelConfigError> + use<'a>, ModelConfigError>
{
    if catalog.get(preset).is_none() {
        return Err(ModelConfigError::UnknownPreset {
            name: preset.to_string(),
        });
    }
    let rates = schedule.shooting_percentages();
    Ok(move |player_id: u64| {
        let base = rates.get(&player_id).copied().unwrap_or(0.0);
        catalog.build(preset, base)
    })
}
