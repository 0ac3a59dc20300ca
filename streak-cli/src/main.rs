mod common;
mod logic;

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::{read_input, split_csv};
use logic::{
    AnalysisOptions, CalibrationPlan, Grouping, LeagueShape, ReportFormat, aggregate_by_model,
    analyze_records, expand_models, parse_game_records, parse_schedule, resolve_seeds,
    run_calibration, synthetic_schedule, write_calibration_report, write_observed_report,
};
use streak_engine::constants::DEFAULT_SEED;
use streak_engine::{SimulationSchedule, StreamLayout, model_catalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Runs-test statistics for observed game records
    Analyze,
    /// Replay a schedule with synthetic shooters and summarize z-scores
    Simulate,
}

#[derive(Debug, Parser)]
#[command(name = "streak-cli", version)]
#[command(about = "Runs-test streak analysis and calibration simulations for make/miss sequences")]
struct Args {
    /// What to run: analyze observed sequences or simulate calibration seasons
    #[arg(long, value_enum, default_value_t = RunMode::Simulate)]
    mode: RunMode,

    /// JSON input: game records (analyze), or schedule entries / game records (simulate)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Model presets to simulate (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    models: String,

    /// List all available model presets and exit
    #[arg(long)]
    list_models: bool,

    /// Seeds to run (comma-separated; `start..end` ranges allowed)
    #[arg(long, default_value_t = DEFAULT_SEED.to_string())]
    seeds: String,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output (per-player detail)
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Group observed records per game or per career (analyze mode)
    #[arg(long, value_enum, default_value_t = Grouping::Career)]
    group: Grouping,

    /// Skip the exact percentile computation (analyze mode)
    #[arg(long)]
    skip_exact: bool,

    /// Include per-shot context for per-game analysis
    #[arg(long)]
    shot_context: bool,

    /// Give every player an independent random stream (simulate mode)
    #[arg(long)]
    per_player_streams: bool,

    /// Synthetic schedule: number of players when no input is given
    #[arg(long, default_value_t = 50)]
    players: u64,

    /// Synthetic schedule: games per player when no input is given
    #[arg(long, default_value_t = 82)]
    games: u32,

    /// Synthetic schedule: typical attempts per game when no input is given
    #[arg(long, default_value_t = 12)]
    shots_per_game: u32,

    /// Seed for drawing the synthetic schedule
    #[arg(long, default_value_t = DEFAULT_SEED)]
    schedule_seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_models(&args)? {
        return Ok(());
    }

    if matches!(args.report, ReportFormat::Console) {
        announce_banner();
    }

    let start_time = Instant::now();
    match args.mode {
        RunMode::Analyze => run_analyze(&args, start_time),
        RunMode::Simulate => run_simulate(&args, start_time),
    }
}

fn maybe_list_models(args: &Args) -> Result<bool> {
    if !args.list_models {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available models:")?;
    for preset in &model_catalog().presets {
        writeln!(
            output_target.writer(),
            "  {:20} - {}",
            preset.name,
            preset.description
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏀 Streak Runs-Test Toolkit".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn run_analyze(args: &Args, start_time: Instant) -> Result<()> {
    let Some(path) = args.input.as_ref() else {
        anyhow::bail!("--input is required in analyze mode");
    };
    let records = parse_game_records(&read_input(path)?)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let options = AnalysisOptions {
        include_exact: !args.skip_exact,
        shot_context: args.shot_context,
    };
    let (rows, skipped) = analyze_records(&records, args.group, options)?;
    log::info!("analyzed {} sequences ({skipped} skipped)", rows.len());

    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_observed_report(&mut output_target, args.report, &rows, skipped, args.verbose)?;
    finish_report(&mut output_target, args.report, start_time)
}

fn run_simulate(args: &Args, start_time: Instant) -> Result<()> {
    let catalog = model_catalog();
    let models = expand_models(&split_csv(&args.models), catalog)?;
    let seeds = resolve_seeds(&split_csv(&args.seeds))?;
    let schedule = load_schedule(args)?;
    ensure!(!schedule.is_empty(), "schedule has no entries");

    let plan = CalibrationPlan {
        models,
        seeds,
        layout: if args.per_player_streams {
            StreamLayout::PerPlayer
        } else {
            StreamLayout::Shared
        },
    };
    if matches!(args.report, ReportFormat::Console) {
        println!(
            "🎲 {} models x {} seeds over {} players / {} schedule entries",
            plan.models.len(),
            plan.seeds.len(),
            schedule.players().len(),
            schedule.len()
        );
    }

    let runs = run_calibration(&schedule, &plan, catalog)?;
    let aggregates = aggregate_by_model(&runs);

    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_calibration_report(
        &mut output_target,
        args.report,
        &runs,
        &aggregates,
        args.verbose,
    )?;
    finish_report(&mut output_target, args.report, start_time)
}

fn load_schedule(args: &Args) -> Result<SimulationSchedule> {
    if let Some(path) = &args.input {
        return parse_schedule(&read_input(path)?)
            .with_context(|| format!("failed to parse schedule {}", path.display()));
    }
    let shape = LeagueShape::new(args.players, args.games, args.shots_per_game);
    synthetic_schedule(shape, args.schedule_seed)
}

fn finish_report(
    output_target: &mut OutputTarget,
    format: ReportFormat,
    start_time: Instant,
) -> Result<()> {
    if matches!(format, ReportFormat::Console) {
        let duration = start_time.elapsed();
        writeln!(output_target)?;
        writeln!(output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
