use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use streak_engine::{
    CalibrationResult, ExcludedPlayer, ModelCatalog, SeasonReport, SeasonSimulator,
    SimulationSchedule, StreamLayout, TrialRng, preset_factory,
};

/// Two-sided 5% critical value of the standard normal.
const CRITICAL_Z: f64 = 1.96;

/// Which presets to replay, under which seeds.
#[derive(Debug, Clone)]
pub struct CalibrationPlan {
    pub models: Vec<String>,
    pub seeds: Vec<u64>,
    pub layout: StreamLayout,
}

/// Summary of the calibration z-scores for one model and seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationSummary {
    pub model: String,
    pub seed: u64,
    pub players: usize,
    pub excluded: usize,
    pub mean_z: f64,
    pub std_z: f64,
    pub beyond_critical_pct: f64,
    pub mean_observed_runs: f64,
    pub mean_expected_runs: f64,
}

/// One model replayed under one seed.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationRun {
    pub summary: CalibrationSummary,
    pub results: Vec<CalibrationResult>,
    pub excluded: Vec<ExcludedPlayer>,
    pub draws: u64,
}

/// Per-model z-score summary pooled over every seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAggregate {
    pub model: String,
    pub seeds: usize,
    pub players: usize,
    pub mean_z: f64,
    pub std_z: f64,
    pub beyond_critical_pct: f64,
}

/// Expand a comma-separated model list, honoring the `all` keyword and
/// preserving order without duplicates.
pub fn expand_models(tokens: &[String], catalog: &ModelCatalog) -> Result<Vec<String>> {
    let mut models: Vec<String> = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for name in catalog.names() {
                if !models.iter().any(|m| m == name) {
                    models.push(name.to_string());
                }
            }
            continue;
        }
        if catalog.get(token).is_none() {
            bail!("Unknown model preset: {token} (try --list-models)");
        }
        if !models.contains(token) {
            models.push(token.clone());
        }
    }
    if models.is_empty() {
        bail!("no model presets selected");
    }
    Ok(models)
}

/// Replay `schedule` for every model and seed in `plan`.
pub fn run_calibration(
    schedule: &SimulationSchedule,
    plan: &CalibrationPlan,
    catalog: &ModelCatalog,
) -> Result<Vec<CalibrationRun>> {
    let simulator = SeasonSimulator::new(plan.layout);
    let mut runs = Vec::with_capacity(plan.models.len() * plan.seeds.len());
    for model in &plan.models {
        for &seed in &plan.seeds {
            let factory = preset_factory(catalog, model, schedule)?;
            let mut rng = TrialRng::from_user_seed(seed);
            let report = simulator.run(schedule, factory, &mut rng)?;
            log::info!(
                "{model} seed {seed}: {} players scored, {} excluded",
                report.results.len(),
                report.excluded.len()
            );
            runs.push(into_run(model, seed, report));
        }
    }
    Ok(runs)
}

fn into_run(model: &str, seed: u64, report: SeasonReport) -> CalibrationRun {
    let summary = summarize(model, seed, &report.results, report.excluded.len());
    CalibrationRun {
        summary,
        results: report.results,
        excluded: report.excluded,
        draws: report.draws,
    }
}

pub fn summarize(
    model: &str,
    seed: u64,
    results: &[CalibrationResult],
    excluded: usize,
) -> CalibrationSummary {
    let mut z = RunningStats::default();
    let mut observed = RunningStats::default();
    let mut expected = RunningStats::default();
    let mut beyond = 0_u32;
    for result in results {
        z.add(result.z_score);
        observed.add(f64::from(u32::try_from(result.observed_runs).unwrap_or(u32::MAX)));
        expected.add(result.expected_runs);
        if result.z_score.abs() > CRITICAL_Z {
            beyond += 1;
        }
    }
    CalibrationSummary {
        model: model.to_string(),
        seed,
        players: results.len(),
        excluded,
        mean_z: z.mean(),
        std_z: z.std_dev(),
        beyond_critical_pct: z.share(beyond),
        mean_observed_runs: observed.mean(),
        mean_expected_runs: expected.mean(),
    }
}

/// Pool every seed's z-scores per model, sorted by model name.
pub fn aggregate_by_model(runs: &[CalibrationRun]) -> Vec<ModelAggregate> {
    let mut builders: BTreeMap<&str, AggregateBuilder> = BTreeMap::new();
    for run in runs {
        builders
            .entry(run.summary.model.as_str())
            .or_default()
            .ingest(run);
    }
    builders
        .into_iter()
        .map(|(model, builder)| builder.finish(model))
        .collect()
}

#[derive(Debug, Default)]
struct AggregateBuilder {
    seeds: usize,
    z: RunningStats,
    beyond: u32,
}

impl AggregateBuilder {
    fn ingest(&mut self, run: &CalibrationRun) {
        self.seeds += 1;
        for result in &run.results {
            self.z.add(result.z_score);
            if result.z_score.abs() > CRITICAL_Z {
                self.beyond += 1;
            }
        }
    }

    fn finish(self, model: &str) -> ModelAggregate {
        ModelAggregate {
            model: model.to_string(),
            seeds: self.seeds,
            players: usize::try_from(self.z.count).unwrap_or(usize::MAX),
            mean_z: self.z.mean(),
            std_z: self.z.std_dev(),
            beyond_critical_pct: self.z.share(self.beyond),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Percentage of the observed values that `hits` represents.
    fn share(&self, hits: u32) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            100.0 * f64::from(hits) / f64::from(self.count)
        }
    }
}
