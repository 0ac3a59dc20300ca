//! Per-game shot schedules that drive season simulation.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::analysis::GameRecord;
use crate::error::StreakError;
use crate::numbers::u64_to_f64;

/// Shots one player took in one game, split into makes and misses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub player_id: u64,
    pub game_id: String,
    #[serde(default)]
    pub makes: u32,
    #[serde(default)]
    pub misses: u32,
}

impl ScheduleEntry {
    /// Number of trials the simulated player must take in this game.
    #[must_use]
    pub fn shot_count(&self) -> u64 {
        u64::from(self.makes) + u64::from(self.misses)
    }
}

/// Season shooting totals for one scheduled player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTotals {
    pub player_id: u64,
    pub makes: u64,
    pub attempts: u64,
}

impl PlayerTotals {
    /// Season make rate, zero for a player with no attempts.
    #[must_use]
    pub fn shooting_percentage(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            u64_to_f64(self.makes) / u64_to_f64(self.attempts)
        }
    }
}

/// Read-only list of `(player, game)` entries, unique per key, kept in
/// supplied order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "Vec<ScheduleEntry>", into = "Vec<ScheduleEntry>")]
pub struct SimulationSchedule {
    entries: Vec<ScheduleEntry>,
}

impl SimulationSchedule {
    /// # Errors
    ///
    /// Returns `InvalidInput` when a `(player_id, game_id)` pair repeats.
    pub fn new(entries: Vec<ScheduleEntry>) -> Result<Self, StreakError> {
        let mut seen: HashSet<(u64, &str)> = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert((entry.player_id, entry.game_id.as_str())) {
                return Err(StreakError::invalid(format!(
                    "duplicate schedule entry for player {} in game {}",
                    entry.player_id, entry.game_id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of schedule entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed JSON or duplicate keys.
    pub fn from_json(json: &str) -> Result<Self, StreakError> {
        serde_json::from_str(json)
            .map_err(|err| StreakError::invalid(format!("schedule JSON: {err}")))
    }

    /// Build a schedule from observed games, one entry per record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a `(player_id, game_id)` pair repeats or a
    /// game holds more shots than a schedule entry can count.
    pub fn from_records(records: &[GameRecord]) -> Result<Self, StreakError> {
        let entries = records
            .iter()
            .map(|record| {
                let makes = record.outcomes.iter().filter(|o| o.is_success()).count();
                let misses = record.outcomes.len() - makes;
                let to_count = |value: usize| {
                    u32::try_from(value).map_err(|_| {
                        StreakError::invalid(format!(
                            "game {} for player {} has too many shots",
                            record.game_id, record.player_id
                        ))
                    })
                };
                Ok(ScheduleEntry {
                    player_id: record.player_id,
                    game_id: record.game_id.clone(),
                    makes: to_count(makes)?,
                    misses: to_count(misses)?,
                })
            })
            .collect::<Result<Vec<_>, StreakError>>()?;
        Self::new(entries)
    }

    #[must_use]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct player ids in first-seen order.
    #[must_use]
    pub fn players(&self) -> Vec<u64> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|entry| entry.player_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Season totals per player, in first-seen order.
    #[must_use]
    pub fn player_totals(&self) -> Vec<PlayerTotals> {
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut totals: Vec<PlayerTotals> = Vec::new();
        for entry in &self.entries {
            let slot = *index.entry(entry.player_id).or_insert_with(|| {
                totals.push(PlayerTotals {
                    player_id: entry.player_id,
                    makes: 0,
                    attempts: 0,
                });
                totals.len() - 1
            });
            totals[slot].makes += u64::from(entry.makes);
            totals[slot].attempts += entry.shot_count();
        }
        totals
    }

    /// Each player's season make rate, used as the simulated base probability.
    #[must_use]
    pub fn shooting_percentages(&self) -> HashMap<u64, f64> {
        self.player_totals()
            .into_iter()
            .map(|totals| (totals.player_id, totals.shooting_percentage()))
            .collect()
    }
}

impl TryFrom<Vec<ScheduleEntry>> for SimulationSchedule {
    type Error = StreakError;

    fn try_from(entries: Vec<ScheduleEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<SimulationSchedule> for Vec<ScheduleEntry> {
    fn from(schedule: SimulationSchedule) -> Self {
        schedule.entries
    }
}
