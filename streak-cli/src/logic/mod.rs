pub mod calibration;
pub mod observed;
pub mod reports;
pub mod schedule_gen;
pub mod seeds;

pub use calibration::{CalibrationPlan, aggregate_by_model, expand_models, run_calibration};
pub use observed::{AnalysisOptions, Grouping, analyze_records, parse_game_records, parse_schedule};
pub use reports::{ReportFormat, write_calibration_report, write_observed_report};
pub use schedule_gen::{LeagueShape, synthetic_schedule};
pub use seeds::resolve_seeds;
