use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use streak_engine::{
    GameRecord, ShotContext, SimulationSchedule, StreakReport, analyze_sequence, annotate_game,
    career_records,
};

/// How observed records are grouped before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// One report per player per game
    Game,
    /// One report per player across all games
    Career,
}

/// One analyzed sequence, ready for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ObservedRow {
    pub player_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub games: usize,
    #[serde(flatten)]
    pub report: StreakReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shots: Option<Vec<ShotContext>>,
}

impl ObservedRow {
    pub fn label(&self) -> String {
        let who = self
            .player_name
            .clone()
            .unwrap_or_else(|| format!("player {}", self.player_id));
        match &self.game_id {
            Some(game) => format!("{who} / game {game}"),
            None => format!("{who} ({} games)", self.games),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    pub include_exact: bool,
    pub shot_context: bool,
}

/// Parse a JSON array of per-game records.
pub fn parse_game_records(json: &str) -> Result<Vec<GameRecord>> {
    serde_json::from_str(json).context("input is not a list of game records")
}

/// Load a schedule from either schedule entries or observed game records.
///
/// Any element carrying `outcomes` marks the input as game records, and a
/// record that fails to parse is reported as such.
pub fn parse_schedule(json: &str) -> Result<SimulationSchedule> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("schedule input is not JSON")?;
    let has_outcomes = value
        .as_array()
        .is_some_and(|items| items.iter().any(|item| item.get("outcomes").is_some()));
    if has_outcomes {
        let records: Vec<GameRecord> =
            serde_json::from_value(value).context("input holds invalid game records")?;
        log::debug!("deriving schedule from {} game records", records.len());
        return Ok(SimulationSchedule::from_records(&records)?);
    }
    Ok(SimulationSchedule::from_json(json)?)
}

/// Analyze records by game or by career. Empty sequences are skipped and
/// counted in the second tuple element.
pub fn analyze_records(
    records: &[GameRecord],
    grouping: Grouping,
    options: AnalysisOptions,
) -> Result<(Vec<ObservedRow>, usize)> {
    let mut rows = Vec::new();
    let mut skipped = 0_usize;
    match grouping {
        Grouping::Game => {
            for record in records {
                let Some(report) = analyze_or_skip(&record.outcomes, options)? else {
                    log::debug!(
                        "skipping empty game {} for player {}",
                        record.game_id,
                        record.player_id
                    );
                    skipped += 1;
                    continue;
                };
                rows.push(ObservedRow {
                    player_id: record.player_id,
                    player_name: record.player_name.clone(),
                    game_id: Some(record.game_id.clone()),
                    games: 1,
                    report,
                    shots: options
                        .shot_context
                        .then(|| annotate_game(&record.outcomes)),
                });
            }
        }
        Grouping::Career => {
            for career in career_records(records) {
                let Some(report) = analyze_or_skip(&career.outcomes, options)? else {
                    log::debug!("skipping empty career for player {}", career.player_id);
                    skipped += 1;
                    continue;
                };
                rows.push(ObservedRow {
                    player_id: career.player_id,
                    player_name: career.player_name,
                    game_id: None,
                    games: career.games,
                    report,
                    shots: None,
                });
            }
        }
    }
    Ok((rows, skipped))
}

fn analyze_or_skip(
    outcomes: &[streak_engine::Outcome],
    options: AnalysisOptions,
) -> Result<Option<StreakReport>> {
    match analyze_sequence(outcomes, options.include_exact) {
        Ok(report) => Ok(Some(report)),
        Err(err) if err.is_insufficient_data() => Ok(None),
        Err(err) => Err(err.into()),
    }
}
