//! Centralized tuning constants for the statistics and simulation core.
//!
//! Keeping these together means calibration behavior can only change
//! through reviewed code, not through edited preset files.

// Simulation --------------------------------------------------------------
/// Seasons with this many trials or fewer are excluded from calibration output.
pub const MIN_SEASON_TRIALS_EXCLUSIVE: u64 = 3;
/// Seed used when a caller does not supply one.
pub const DEFAULT_SEED: u64 = 2718;

// Threshold-adaptive shooters --------------------------------------------
pub(crate) const LUKEWARM_LOWER_THRESHOLD: f64 = 0.2;
pub(crate) const LUKEWARM_UPPER_THRESHOLD: f64 = 0.8;
pub(crate) const LUKEWARM_COLD_ADJUSTMENT: f64 = 0.2;
pub(crate) const LUKEWARM_HOT_ADJUSTMENT: f64 = -0.2;
pub(crate) const LUKEWARM_MIN_ATTEMPTS: usize = 4;
/// Magnitude used by the one-sided heat-check and get-a-bucket shooters.
pub(crate) const STRONG_ADJUSTMENT: f64 = 0.3;

// Shot context -----------------------------------------------------------
/// Lookback used for the rolling recent-shots rate.
pub const RECENT_SHOTS_WINDOW: usize = 5;
