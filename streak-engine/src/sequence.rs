//! Per-shot in-game context for a single game's sequence.
use serde::{Deserialize, Serialize};

use crate::constants::RECENT_SHOTS_WINDOW;
use crate::numbers::usize_to_f64;
use crate::outcome::Outcome;

/// State of the game immediately before a shot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotContext {
    /// 1-indexed position of the shot within the game.
    pub shot_seq: usize,
    pub outcome: Outcome,
    pub makes_before: usize,
    pub misses_before: usize,
    /// In-game make rate before this shot; zero for the opening shot.
    pub pct_before: f64,
    /// Make rate over the previous five shots, once five have been taken.
    pub last_five_rate: Option<f64>,
}

/// Annotate each shot of one game with the context it was taken in.
#[must_use]
pub fn annotate_game(outcomes: &[Outcome]) -> Vec<ShotContext> {
    let mut makes = 0_usize;
    let mut contexts = Vec::with_capacity(outcomes.len());
    for (idx, &outcome) in outcomes.iter().enumerate() {
        let pct_before = if idx == 0 {
            0.0
        } else {
            usize_to_f64(makes) / usize_to_f64(idx)
        };
        let last_five_rate = (idx >= RECENT_SHOTS_WINDOW).then(|| {
            let recent = outcomes[idx - RECENT_SHOTS_WINDOW..idx]
                .iter()
                .filter(|o| o.is_success())
                .count();
            usize_to_f64(recent) / usize_to_f64(RECENT_SHOTS_WINDOW)
        });
        contexts.push(ShotContext {
            shot_seq: idx + 1,
            outcome,
            makes_before: makes,
            misses_before: idx - makes,
            pct_before,
            last_five_rate,
        });
        if outcome.is_success() {
            makes += 1;
        }
    }
    contexts
}
