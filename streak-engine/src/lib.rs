//! Streak Engine
//!
//! Run-length decomposition, the Wald-Wolfowitz runs test (asymptotic and
//! exact), and a seeded season simulator for synthetic shooters. The crate
//! performs no I/O; callers hand it outcome sequences or shot schedules.

pub mod analysis;
pub mod catalog;
pub mod constants;
pub mod error;
pub mod exact;
pub mod numbers;
pub mod outcome;
pub mod player;
pub mod rng;
pub mod runs;
pub mod runs_test;
pub mod schedule;
pub mod sequence;
pub mod simulation;

// Re-export commonly used types
pub use analysis::{CareerRecord, GameRecord, StreakReport, analyze_sequence, career_records};
pub use catalog::{ModelCatalog, ModelPreset, model_catalog};
pub use error::{ModelConfigError, StreakError};
pub use exact::{
    BinomialCache, ExactRunDistribution, RunDistributionCache, exact_distribution,
    exact_percentile_rank,
};
pub use outcome::{Outcome, encode_outcomes, parse_outcomes};
pub use player::{
    PlayerModel, ProbabilityModel, ShootingPolicy, ShotType, ThresholdParams, WindowTable,
};
pub use rng::TrialRng;
pub use runs::{
    RunCounts, RunLengthHistogram, RunSequence, RunSummary, decompose, decompose_counts,
};
pub use runs_test::{
    RunsTestStatistic, expected_runs, normal_percentile, variance, z_from_percentile, z_score,
};
pub use schedule::{PlayerTotals, ScheduleEntry, SimulationSchedule};
pub use sequence::{ShotContext, annotate_game};
pub use simulation::{
    CalibrationResult, ExcludedPlayer, ExclusionReason, SeasonReport, SeasonSimulator,
    StreamLayout, SyntheticSeason, preset_factory, simulate_season,
};
