use anyhow::{Result, ensure};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use streak_engine::{ScheduleEntry, SimulationSchedule};

/// Sizing for a synthetic league schedule used when no input file is given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeagueShape {
    pub players: u64,
    pub games: u32,
    pub shots_per_game: u32,
    pub min_skill: f64,
    pub max_skill: f64,
}

impl LeagueShape {
    pub const fn new(players: u64, games: u32, shots_per_game: u32) -> Self {
        Self {
            players,
            games,
            shots_per_game,
            min_skill: 0.35,
            max_skill: 0.55,
        }
    }
}

/// Draw a reproducible schedule: each player gets a fixed make rate and a
/// varying number of attempts per game around `shots_per_game`.
pub fn synthetic_schedule(shape: LeagueShape, seed: u64) -> Result<SimulationSchedule> {
    ensure!(shape.players > 0, "synthetic schedule needs at least one player");
    ensure!(shape.games > 0, "synthetic schedule needs at least one game");
    ensure!(
        shape.shots_per_game > 0,
        "synthetic schedule needs at least one shot per game"
    );

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let skills: Vec<f64> = (0..shape.players)
        .map(|_| rng.gen_range(shape.min_skill..=shape.max_skill))
        .collect();
    let low = (shape.shots_per_game / 2).max(1);
    let high = shape.shots_per_game + shape.shots_per_game / 2;

    let mut entries = Vec::new();
    for game in 0..shape.games {
        let game_id = format!("G{game:05}");
        for (player_id, &skill) in (1..).zip(&skills) {
            let attempts = rng.gen_range(low..=high);
            let makes = (0..attempts)
                .filter(|_| rng.gen_bool(skill))
                .count();
            let makes = u32::try_from(makes)?;
            entries.push(ScheduleEntry {
                player_id,
                game_id: game_id.clone(),
                makes,
                misses: attempts - makes,
            });
        }
    }
    log::debug!(
        "synthetic schedule: {} players x {} games ({} entries)",
        shape.players,
        shape.games,
        entries.len()
    );
    Ok(SimulationSchedule::new(entries)?)
}
