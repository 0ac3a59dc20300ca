//! Synthetic shooters whose make probability depends on in-game history.
//!
//! Every behavior shares one state type, [`PlayerModel`], and differs only
//! in its [`ShootingPolicy`]. The five named threshold behaviors (normal,
//! heat check, get-a-bucket, lukewarm, truly streaky) are parameterizations
//! of [`ThresholdParams`].
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::constants::{
    LUKEWARM_COLD_ADJUSTMENT, LUKEWARM_HOT_ADJUSTMENT, LUKEWARM_LOWER_THRESHOLD,
    LUKEWARM_MIN_ATTEMPTS, LUKEWARM_UPPER_THRESHOLD, STRONG_ADJUSTMENT,
};
use crate::error::ModelConfigError;
use crate::numbers::usize_to_f64;
use crate::outcome::Outcome;
use crate::rng::TrialRng;

/// Capability shared by all synthetic shooters.
pub trait ProbabilityModel {
    /// Success probability for the next trial given the current game state.
    ///
    /// Does not touch model state; policies that sample (shot mixtures)
    /// only advance `rng`.
    fn next_success_probability(&self, rng: &mut TrialRng) -> f64;

    /// Append a completed trial to the in-game logs.
    fn record_trial(&mut self, outcome: Outcome, probability: f64);

    /// Clear in-game memory at a game boundary.
    fn end_game(&mut self);

    /// Run one trial: pick the probability, draw, record, return the outcome.
    fn take_trial(&mut self, rng: &mut TrialRng) -> Outcome {
        let probability = self.next_success_probability(rng);
        let outcome = Outcome::from_bool(rng.uniform() < probability);
        self.record_trial(outcome, probability);
        outcome
    }
}

/// One shot type in a mixture: how often it is taken and how often it goes in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotType {
    pub weight: f64,
    pub probability: f64,
}

/// How a recent-window table is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowTable {
    /// Table entries are the probability itself.
    #[default]
    Absolute,
    /// Table entries are added to the base probability and clamped to [0, 1].
    Offset,
}

/// Threshold-adaptive parameters; defaults describe the lukewarm shooter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParams {
    #[serde(default = "ThresholdParams::default_lower")]
    pub lower_threshold: f64,
    #[serde(default = "ThresholdParams::default_upper")]
    pub upper_threshold: f64,
    /// Added to the base rate while the in-game rate is below `lower_threshold`.
    #[serde(default = "ThresholdParams::default_cold")]
    pub cold_adjustment: f64,
    /// Added to the base rate while the in-game rate is above `upper_threshold`.
    #[serde(default = "ThresholdParams::default_hot")]
    pub hot_adjustment: f64,
    #[serde(default = "ThresholdParams::default_min_attempts")]
    pub min_attempts: usize,
}

impl ThresholdParams {
    const fn default_lower() -> f64 {
        LUKEWARM_LOWER_THRESHOLD
    }

    const fn default_upper() -> f64 {
        LUKEWARM_UPPER_THRESHOLD
    }

    const fn default_cold() -> f64 {
        LUKEWARM_COLD_ADJUSTMENT
    }

    const fn default_hot() -> f64 {
        LUKEWARM_HOT_ADJUSTMENT
    }

    const fn default_min_attempts() -> usize {
        LUKEWARM_MIN_ATTEMPTS
    }

    /// Boosted when cold, penalized when hot.
    #[must_use]
    pub const fn lukewarm() -> Self {
        Self {
            lower_threshold: LUKEWARM_LOWER_THRESHOLD,
            upper_threshold: LUKEWARM_UPPER_THRESHOLD,
            cold_adjustment: LUKEWARM_COLD_ADJUSTMENT,
            hot_adjustment: LUKEWARM_HOT_ADJUSTMENT,
            min_attempts: LUKEWARM_MIN_ATTEMPTS,
        }
    }

    /// Never adjusts: always the base rate.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            lower_threshold: 0.0,
            upper_threshold: 1.0,
            cold_adjustment: 0.0,
            hot_adjustment: 0.0,
            ..Self::lukewarm()
        }
    }

    /// Only penalized when hot.
    #[must_use]
    pub const fn heat_check() -> Self {
        Self {
            lower_threshold: 0.0,
            hot_adjustment: -STRONG_ADJUSTMENT,
            ..Self::lukewarm()
        }
    }

    /// Only boosted when cold.
    #[must_use]
    pub const fn get_a_bucket() -> Self {
        Self {
            upper_threshold: 1.0,
            cold_adjustment: STRONG_ADJUSTMENT,
            ..Self::lukewarm()
        }
    }

    /// Penalized when cold, boosted when hot.
    #[must_use]
    pub const fn truly_streaky() -> Self {
        Self {
            cold_adjustment: LUKEWARM_HOT_ADJUSTMENT,
            hot_adjustment: LUKEWARM_COLD_ADJUSTMENT,
            ..Self::lukewarm()
        }
    }

    fn validate(&self) -> Result<(), ModelConfigError> {
        check_range("threshold.lower_threshold", self.lower_threshold, 0.0, 1.0)?;
        check_range("threshold.upper_threshold", self.upper_threshold, 0.0, 1.0)?;
        if self.lower_threshold > self.upper_threshold {
            return Err(ModelConfigError::ThresholdOrder {
                lower: self.lower_threshold,
                upper: self.upper_threshold,
            });
        }
        check_range("threshold.cold_adjustment", self.cold_adjustment, -1.0, 1.0)?;
        check_range("threshold.hot_adjustment", self.hot_adjustment, -1.0, 1.0)?;
        Ok(())
    }

    fn apply(&self, base: f64, history: &[Outcome]) -> f64 {
        let attempts = history.len();
        if attempts == 0 || attempts < self.min_attempts {
            return base;
        }
        let makes = history.iter().filter(|o| o.is_success()).count();
        let game_rate = usize_to_f64(makes) / usize_to_f64(attempts);
        if game_rate < self.lower_threshold {
            (base + self.cold_adjustment).clamp(0.0, 1.0)
        } else if game_rate > self.upper_threshold {
            (base + self.hot_adjustment).clamp(0.0, 1.0)
        } else {
            base
        }
    }
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self::lukewarm()
    }
}

/// Policy deciding the next-trial probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ShootingPolicy {
    /// Always the base probability.
    Constant,
    /// Each trial independently samples a shot type by weight.
    WeightedMixture { shots: Vec<ShotType> },
    /// Keyed by the number of makes in the last `window` trials of the game;
    /// the base probability applies until `window` trials are recorded.
    RecentWindow {
        window: usize,
        table: Vec<f64>,
        #[serde(default)]
        mode: WindowTable,
    },
    /// In-game rate thresholds with fixed adjustments.
    ThresholdAdaptive(ThresholdParams),
}

impl ShootingPolicy {
    /// Check the policy's own parameters.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ModelConfigError> {
        match self {
            Self::Constant => Ok(()),
            Self::WeightedMixture { shots } => {
                mixture_sampler(shots)?;
                Ok(())
            }
            Self::RecentWindow {
                window,
                table,
                mode,
            } => {
                if *window == 0 {
                    return Err(ModelConfigError::EmptyWindow);
                }
                if table.len() != window + 1 {
                    return Err(ModelConfigError::WindowTableLength {
                        window: *window,
                        expected: window + 1,
                        actual: table.len(),
                    });
                }
                let (min, max) = match mode {
                    WindowTable::Absolute => (0.0, 1.0),
                    WindowTable::Offset => (-1.0, 1.0),
                };
                for &value in table {
                    check_range("recent_window.table", value, min, max)?;
                }
                Ok(())
            }
            Self::ThresholdAdaptive(params) => params.validate(),
        }
    }
}

fn mixture_sampler(shots: &[ShotType]) -> Result<WeightedIndex<f64>, ModelConfigError> {
    if shots.is_empty() {
        return Err(ModelConfigError::Mixture {
            reason: "no shot types".to_string(),
        });
    }
    for shot in shots {
        check_range("mixture.probability", shot.probability, 0.0, 1.0)?;
    }
    WeightedIndex::new(shots.iter().map(|shot| shot.weight)).map_err(|err| {
        ModelConfigError::Mixture {
            reason: err.to_string(),
        }
    })
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ModelConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ModelConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

/// One synthetic shooter: base rate, policy, and the current game's logs.
#[derive(Debug, Clone)]
pub struct PlayerModel {
    base_probability: f64,
    policy: ShootingPolicy,
    sampler: Option<WeightedIndex<f64>>,
    game_history: Vec<Outcome>,
    probability_history: Vec<f64>,
}

impl PlayerModel {
    /// Build a model after validating the base rate and policy.
    ///
    /// For a weighted mixture the base probability is replaced by the
    /// mixture's weighted mean make rate.
    ///
    /// # Errors
    ///
    /// Returns the first violated parameter invariant.
    pub fn new(base_probability: f64, policy: ShootingPolicy) -> Result<Self, ModelConfigError> {
        check_range("base_probability", base_probability, 0.0, 1.0)?;
        policy.validate()?;
        let (base_probability, sampler) = match &policy {
            ShootingPolicy::WeightedMixture { shots } => {
                let sampler = mixture_sampler(shots)?;
                (mixture_mean(shots), Some(sampler))
            }
            _ => (base_probability, None),
        };
        Ok(Self {
            base_probability,
            policy,
            sampler,
            game_history: Vec::new(),
            probability_history: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Returns an error when `base_probability` is outside [0, 1].
    pub fn constant(base_probability: f64) -> Result<Self, ModelConfigError> {
        Self::new(base_probability, ShootingPolicy::Constant)
    }

    /// # Errors
    ///
    /// Returns an error when the mixture is empty, has invalid weights, or
    /// contains a probability outside [0, 1].
    pub fn weighted_mixture(shots: Vec<ShotType>) -> Result<Self, ModelConfigError> {
        Self::new(0.0, ShootingPolicy::WeightedMixture { shots })
    }

    /// # Errors
    ///
    /// Returns an error when the table does not hold `window + 1` valid rates.
    pub fn recent_window(
        base_probability: f64,
        window: usize,
        table: Vec<f64>,
    ) -> Result<Self, ModelConfigError> {
        Self::new(
            base_probability,
            ShootingPolicy::RecentWindow {
                window,
                table,
                mode: WindowTable::Absolute,
            },
        )
    }

    /// # Errors
    ///
    /// Returns an error when thresholds or adjustments are out of range.
    pub fn threshold_adaptive(
        base_probability: f64,
        params: ThresholdParams,
    ) -> Result<Self, ModelConfigError> {
        Self::new(base_probability, ShootingPolicy::ThresholdAdaptive(params))
    }

    #[must_use]
    pub const fn base_probability(&self) -> f64 {
        self.base_probability
    }

    #[must_use]
    pub const fn policy(&self) -> &ShootingPolicy {
        &self.policy
    }

    /// Outcomes recorded so far in the current game.
    #[must_use]
    pub fn game_history(&self) -> &[Outcome] {
        &self.game_history
    }

    /// Probability used for each trial of the current game.
    #[must_use]
    pub fn probability_history(&self) -> &[f64] {
        &self.probability_history
    }
}

impl ProbabilityModel for PlayerModel {
    fn next_success_probability(&self, rng: &mut TrialRng) -> f64 {
        let base = self.base_probability;
        match &self.policy {
            ShootingPolicy::Constant => base,
            ShootingPolicy::WeightedMixture { shots } => self
                .sampler
                .as_ref()
                .and_then(|sampler| shots.get(sampler.sample(rng)))
                .map_or(base, |shot| shot.probability),
            ShootingPolicy::RecentWindow {
                window,
                table,
                mode,
            } => {
                let len = self.game_history.len();
                if len < *window {
                    return base;
                }
                let makes = self.game_history[len - window..]
                    .iter()
                    .filter(|o| o.is_success())
                    .count();
                let entry = table.get(makes).copied().unwrap_or(0.0);
                match mode {
                    WindowTable::Absolute => entry,
                    WindowTable::Offset => (base + entry).clamp(0.0, 1.0),
                }
            }
            ShootingPolicy::ThresholdAdaptive(params) => params.apply(base, &self.game_history),
        }
    }

    fn record_trial(&mut self, outcome: Outcome, probability: f64) {
        self.game_history.push(outcome);
        self.probability_history.push(probability);
    }

    fn end_game(&mut self) {
        self.game_history.clear();
        self.probability_history.clear();
    }
}

fn mixture_mean(shots: &[ShotType]) -> f64 {
    let total: f64 = shots.iter().map(|shot| shot.weight).sum();
    if total <= 0.0 {
        return 0.0;
    }
    shots
        .iter()
        .map(|shot| shot.weight * shot.probability)
        .sum::<f64>()
        / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::parse_outcomes;

    fn with_history(mut model: PlayerModel, encoded: &str) -> PlayerModel {
        for outcome in parse_outcomes(encoded).unwrap() {
            model.record_trial(outcome, model.base_probability());
        }
        model
    }

    fn threshold(base: f64, params: ThresholdParams, encoded: &str) -> PlayerModel {
        with_history(
            PlayerModel::threshold_adaptive(base, params).unwrap(),
            encoded,
        )
    }

    #[test]
    fn neutral_threshold_always_returns_base() {
        let mut rng = TrialRng::from_user_seed(1);
        for encoded in ["", "W", "LLLLLL", "WWWWWWW", "WLWLWLWL", "LLLLW"] {
            let model = with_history(
                PlayerModel::threshold_adaptive(0.47, ThresholdParams::neutral()).unwrap(),
                encoded,
            );
            let p = model.next_success_probability(&mut rng);
            assert!((p - 0.47).abs() < f64::EPSILON, "history {encoded}");
        }
    }

    #[test]
    fn lukewarm_boosts_cold_and_penalizes_hot() {
        let mut rng = TrialRng::from_user_seed(1);
        let cold = threshold(0.45, ThresholdParams::lukewarm(), "LLLLL");
        assert!((cold.next_success_probability(&mut rng) - 0.65).abs() < 1e-12);
        let hot = threshold(0.45, ThresholdParams::lukewarm(), "WWWWW");
        assert!((hot.next_success_probability(&mut rng) - 0.25).abs() < 1e-12);
        let mixed = threshold(0.45, ThresholdParams::lukewarm(), "WLWL");
        assert!((mixed.next_success_probability(&mut rng) - 0.45).abs() < 1e-12);
    }

    #[test]
    fn threshold_waits_for_min_attempts() {
        let mut rng = TrialRng::from_user_seed(1);
        let model = threshold(0.5, ThresholdParams::lukewarm(), "LLL");
        assert!((model.next_success_probability(&mut rng) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn truly_streaky_inverts_adjustments_and_clamps() {
        let mut rng = TrialRng::from_user_seed(1);
        let hot = threshold(0.9, ThresholdParams::truly_streaky(), "WWWW");
        assert!((hot.next_success_probability(&mut rng) - 1.0).abs() < f64::EPSILON);
        let cold = threshold(0.1, ThresholdParams::truly_streaky(), "LLLL");
        assert!(cold.next_success_probability(&mut rng).abs() < f64::EPSILON);
    }

    #[test]
    fn one_sided_variants_ignore_other_side() {
        let mut rng = TrialRng::from_user_seed(1);
        let heat_cold = threshold(0.4, ThresholdParams::heat_check(), "LLLL");
        assert!((heat_cold.next_success_probability(&mut rng) - 0.4).abs() < 1e-12);
        let heat_hot = threshold(0.4, ThresholdParams::heat_check(), "WWWW");
        assert!((heat_hot.next_success_probability(&mut rng) - 0.1).abs() < 1e-12);
        let bucket_hot = threshold(0.4, ThresholdParams::get_a_bucket(), "WWWW");
        assert!((bucket_hot.next_success_probability(&mut rng) - 0.4).abs() < 1e-12);
        let bucket_cold = threshold(0.4, ThresholdParams::get_a_bucket(), "LLLL");
        assert!((bucket_cold.next_success_probability(&mut rng) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn recent_window_uses_last_trials_only() {
        let mut rng = TrialRng::from_user_seed(1);
        let table = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let early = with_history(
            PlayerModel::recent_window(0.45, 5, table.clone()).unwrap(),
            "WWWW",
        );
        assert!((early.next_success_probability(&mut rng) - 0.45).abs() < f64::EPSILON);
        let full = with_history(
            PlayerModel::recent_window(0.45, 5, table).unwrap(),
            "LLWWLWW",
        );
        // last five are WWLWW: four makes
        assert!((full.next_success_probability(&mut rng) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn recent_window_offsets_clamp() {
        let mut rng = TrialRng::from_user_seed(1);
        let policy = ShootingPolicy::RecentWindow {
            window: 2,
            table: vec![-0.5, 0.0, 0.5],
            mode: WindowTable::Offset,
        };
        let model = with_history(PlayerModel::new(0.8, policy).unwrap(), "WW");
        assert!((model.next_success_probability(&mut rng) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mixture_samples_only_configured_rates() {
        let mut rng = TrialRng::from_user_seed(5);
        let model = PlayerModel::weighted_mixture(vec![
            ShotType {
                weight: 0.6,
                probability: 0.55,
            },
            ShotType {
                weight: 0.4,
                probability: 0.35,
            },
        ])
        .unwrap();
        assert!((model.base_probability() - 0.47).abs() < 1e-12);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..200 {
            let p = model.next_success_probability(&mut rng);
            seen_low |= (p - 0.35).abs() < f64::EPSILON;
            seen_high |= (p - 0.55).abs() < f64::EPSILON;
            assert!((p - 0.35).abs() < f64::EPSILON || (p - 0.55).abs() < f64::EPSILON);
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn take_trial_records_and_end_game_clears() {
        let mut rng = TrialRng::from_user_seed(3);
        let mut model = PlayerModel::constant(1.0).unwrap();
        for _ in 0..4 {
            assert_eq!(model.take_trial(&mut rng), Outcome::Success);
        }
        assert_eq!(model.game_history().len(), 4);
        assert_eq!(model.probability_history(), &[1.0, 1.0, 1.0, 1.0]);
        model.end_game();
        assert!(model.game_history().is_empty());
        assert!(model.probability_history().is_empty());

        let mut never = PlayerModel::constant(0.0).unwrap();
        assert_eq!(never.take_trial(&mut rng), Outcome::Failure);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            PlayerModel::constant(1.2),
            Err(ModelConfigError::RangeViolation { .. })
        ));
        assert!(matches!(
            PlayerModel::recent_window(0.5, 5, vec![0.5; 3]),
            Err(ModelConfigError::WindowTableLength { expected: 6, actual: 3, .. })
        ));
        let inverted = ThresholdParams {
            lower_threshold: 0.9,
            upper_threshold: 0.1,
            ..ThresholdParams::lukewarm()
        };
        assert!(matches!(
            PlayerModel::threshold_adaptive(0.5, inverted),
            Err(ModelConfigError::ThresholdOrder { .. })
        ));
        assert!(matches!(
            PlayerModel::weighted_mixture(Vec::new()),
            Err(ModelConfigError::Mixture { .. })
        ));
        assert!(matches!(
            PlayerModel::weighted_mixture(vec![ShotType {
                weight: 0.0,
                probability: 0.5,
            }]),
            Err(ModelConfigError::Mixture { .. })
        ));
    }

    #[test]
    fn policy_serde_is_internally_tagged() {
        let json = r#"{
            "policy": "threshold_adaptive",
            "lower_threshold": 0.0,
            "upper_threshold": 1.0,
            "cold_adjustment": 0.0,
            "hot_adjustment": 0.0
        }"#;
        let policy: ShootingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy, ShootingPolicy::ThresholdAdaptive(ThresholdParams::neutral()));
        let constant: ShootingPolicy = serde_json::from_str(r#"{"policy":"constant"}"#).unwrap();
        assert_eq!(constant, ShootingPolicy::Constant);
    }
}
