use streak_engine::{
    CalibrationResult, PlayerModel, ScheduleEntry, SeasonSimulator, SimulationSchedule,
    StreamLayout, ThresholdParams, TrialRng, model_catalog, preset_factory, simulate_season,
};

const PLAYERS: u64 = 200;
const GAMES: u32 = 60;

fn league_schedule() -> SimulationSchedule {
    let mut entries = Vec::new();
    for game in 0..GAMES {
        for player in 0..PLAYERS {
            let makes = 4 + u32::try_from(player % 5).expect("small id");
            entries.push(ScheduleEntry {
                player_id: player,
                game_id: format!("{game:04}"),
                makes,
                misses: 15 - makes,
            });
        }
    }
    entries.push(ScheduleEntry {
        player_id: 9_999,
        game_id: "0000".to_string(),
        makes: 1,
        misses: 2,
    });
    SimulationSchedule::new(entries).expect("unique keys")
}

fn mean_z(results: &[CalibrationResult]) -> f64 {
    let total: f64 = results.iter().map(|r| r.z_score).sum();
    total / f64::from(u32::try_from(results.len()).expect("count fits"))
}

fn std_z(results: &[CalibrationResult]) -> f64 {
    let mean = mean_z(results);
    let n = f64::from(u32::try_from(results.len()).expect("count fits"));
    let ss: f64 = results.iter().map(|r| (r.z_score - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

fn run_preset(name: &str, seed: u64) -> Vec<CalibrationResult> {
    let schedule = league_schedule();
    let factory = preset_factory(model_catalog(), name, &schedule).expect("preset exists");
    SeasonSimulator::new(StreamLayout::Shared)
        .run(&schedule, factory, &mut TrialRng::from_user_seed(seed))
        .expect("valid models")
        .results
}

#[test]
fn neutral_players_calibrate_near_zero() {
    let results = run_preset("normal", 2718);
    assert_eq!(results.len(), usize::try_from(PLAYERS).expect("fits"));
    let mean = mean_z(&results);
    let spread = std_z(&results);
    assert!(mean.abs() < 0.3, "neutral mean z drifted: {mean:.3}");
    assert!((spread - 1.0).abs() < 0.25, "neutral z spread drifted: {spread:.3}");
}

#[test]
fn streaky_and_lukewarm_pull_in_opposite_directions() {
    let lukewarm = mean_z(&run_preset("lukewarm", 2718));
    let streaky = mean_z(&run_preset("truly_streaky", 2718));
    assert!(
        lukewarm > streaky,
        "lukewarm {lukewarm:.3} should alternate more than streaky {streaky:.3}"
    );
    assert!(streaky < 0.0, "streaky shooters should produce fewer runs: {streaky:.3}");
}

#[test]
fn seasons_replay_bit_for_bit() {
    let schedule = league_schedule();
    let rates = schedule.shooting_percentages();
    let factory = |id: u64| {
        PlayerModel::threshold_adaptive(rates[&id], ThresholdParams::lukewarm())
            .expect("valid params")
    };
    let first = simulate_season(&schedule, factory, &mut TrialRng::from_user_seed(77));
    let second = simulate_season(&schedule, factory, &mut TrialRng::from_user_seed(77));
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.player_id, b.player_id);
        assert_eq!(a.observed_runs, b.observed_runs);
        assert_eq!(a.z_score.to_bits(), b.z_score.to_bits());
    }
    let other = simulate_season(&schedule, factory, &mut TrialRng::from_user_seed(78));
    assert_ne!(first, other);
}

#[test]
fn short_seasons_never_reach_output() {
    let results = run_preset("normal", 1);
    assert!(results.iter().all(|r| r.player_id != 9_999));
    assert!(results.iter().all(|r| r.successes + r.failures > 3));
    assert!(results.iter().all(|r| r.variance > 0.0));
}
