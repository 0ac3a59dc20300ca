use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use super::calibration::{CalibrationRun, ModelAggregate};
use super::observed::ObservedRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Pretty-printed JSON
    Json,
    /// Markdown tables
    Markdown,
    /// Comma-separated rows
    Csv,
}

#[derive(Serialize)]
struct CalibrationDocument<'a> {
    models: &'a [ModelAggregate],
    runs: &'a [CalibrationRun],
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn csv_opt(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{v:.6}"))
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

pub fn write_observed_report(
    out: &mut dyn Write,
    format: ReportFormat,
    rows: &[ObservedRow],
    skipped: usize,
    verbose: bool,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, rows)?;
            writeln!(out)?;
        }
        ReportFormat::Markdown => observed_markdown(out, rows, skipped)?,
        ReportFormat::Csv => observed_csv(out, rows)?,
        ReportFormat::Console => observed_console(out, rows, skipped, verbose)?,
    }
    Ok(())
}

fn observed_console(
    out: &mut dyn Write,
    rows: &[ObservedRow],
    skipped: usize,
    verbose: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Streak Analysis Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;
    writeln!(out, "Sequences analyzed: {}", rows.len())?;
    writeln!(out, "Skipped (empty): {}", skipped.to_string().yellow())?;
    let defined = rows.iter().filter(|r| r.report.z_score.is_some()).count();
    writeln!(out, "With asymptotic z-score: {defined}")?;
    writeln!(out)?;

    for row in rows {
        let report = &row.report;
        let marker = match report.z_score {
            Some(z) if z < -1.96 => "🔥 STREAKY".red(),
            Some(z) if z > 1.96 => "🧊 ALTERNATING".blue(),
            Some(_) => "✅ TYPICAL".green(),
            None => "… SPARSE".dimmed(),
        };
        writeln!(out, "{marker} {}", row.label().bold())?;
        writeln!(
            out,
            "   Makes/misses: {}/{}  runs: {}  expected: {}",
            report.successes,
            report.failures,
            report.runs,
            opt(report.expected_runs, 3)
        )?;
        writeln!(
            out,
            "   z: {}  normal pct: {}  exact pct: {}  z(exact): {}",
            opt(report.z_score, 3),
            opt(report.normal_percentile, 2),
            opt(report.exact_percentile, 2),
            opt(report.z_from_exact_percentile, 3)
        )?;
        if verbose {
            writeln!(
                out,
                "   Longest make run: {}  longest miss run: {}",
                report.longest_success_run, report.longest_failure_run
            )?;
            writeln!(out, "   Sequence: {}", report.encoded.dimmed())?;
            if let Some(shots) = &row.shots {
                for shot in shots {
                    writeln!(
                        out,
                        "     #{:<3} {}  before {}-{} ({:.3})  last five: {}",
                        shot.shot_seq,
                        shot.outcome,
                        shot.makes_before,
                        shot.misses_before,
                        shot.pct_before,
                        opt(shot.last_five_rate, 2)
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn observed_markdown(out: &mut dyn Write, rows: &[ObservedRow], skipped: usize) -> Result<()> {
    writeln!(out, "# Streak Analysis\n")?;
    if rows.is_empty() {
        writeln!(out, "_No sequences analyzed._")?;
        return Ok(());
    }
    writeln!(out, "- **Sequences**: {}", rows.len())?;
    writeln!(out, "- **Skipped (empty)**: {skipped}\n")?;
    writeln!(
        out,
        "| Sequence | Makes | Misses | Runs | Expected | z | Normal % | Exact % |"
    )?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|")?;
    for row in rows {
        let r = &row.report;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            row.label(),
            r.successes,
            r.failures,
            r.runs,
            opt(r.expected_runs, 3),
            opt(r.z_score, 3),
            opt(r.normal_percentile, 2),
            opt(r.exact_percentile, 2)
        )?;
    }
    Ok(())
}

fn observed_csv(out: &mut dyn Write, rows: &[ObservedRow]) -> Result<()> {
    writeln!(
        out,
        "player_id,player_name,game_id,games,makes,misses,runs,expected_runs,variance,z_score,normal_percentile,exact_percentile,z_from_exact_percentile"
    )?;
    for row in rows {
        let r = &row.report;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            row.player_id,
            csv_field(row.player_name.as_deref().unwrap_or_default()),
            csv_field(row.game_id.as_deref().unwrap_or_default()),
            row.games,
            r.successes,
            r.failures,
            r.runs,
            csv_opt(r.expected_runs),
            csv_opt(r.variance),
            csv_opt(r.z_score),
            csv_opt(r.normal_percentile),
            csv_opt(r.exact_percentile),
            csv_opt(r.z_from_exact_percentile)
        )?;
    }
    Ok(())
}

pub fn write_calibration_report(
    out: &mut dyn Write,
    format: ReportFormat,
    runs: &[CalibrationRun],
    aggregates: &[ModelAggregate],
    verbose: bool,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            let doc = CalibrationDocument {
                models: aggregates,
                runs,
            };
            serde_json::to_writer_pretty(&mut *out, &doc)?;
            writeln!(out)?;
        }
        ReportFormat::Markdown => calibration_markdown(out, runs, aggregates)?,
        ReportFormat::Csv => calibration_csv(out, runs)?,
        ReportFormat::Console => calibration_console(out, runs, aggregates, verbose)?,
    }
    Ok(())
}

fn calibration_console(
    out: &mut dyn Write,
    runs: &[CalibrationRun],
    aggregates: &[ModelAggregate],
    verbose: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Calibration Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;
    if runs.is_empty() {
        writeln!(out, "No calibration runs executed.")?;
        return Ok(());
    }

    for run in runs {
        let s = &run.summary;
        writeln!(
            out,
            "{} seed {}",
            s.model.bold(),
            s.seed.to_string().dimmed()
        )?;
        writeln!(
            out,
            "   Players: {} scored, {} excluded",
            s.players.to_string().green(),
            s.excluded.to_string().yellow()
        )?;
        writeln!(
            out,
            "   z mean {:+.3}  sd {:.3}  |z|>1.96: {:.1}%",
            s.mean_z, s.std_z, s.beyond_critical_pct
        )?;
        writeln!(
            out,
            "   runs observed {:.2} vs expected {:.2}",
            s.mean_observed_runs, s.mean_expected_runs
        )?;
        if verbose {
            for result in &run.results {
                writeln!(
                    out,
                    "     player {:>8}: {}/{} runs {} (E {:.2}) z {:+.3}",
                    result.player_id,
                    result.successes,
                    result.failures,
                    result.observed_runs,
                    result.expected_runs,
                    result.z_score
                )?;
            }
            for excluded in &run.excluded {
                writeln!(
                    out,
                    "     player {:>8}: excluded ({:?}, {} trials)",
                    excluded.player_id, excluded.reason, excluded.trials
                )?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "⚖️  Pooled by Model".bright_yellow().bold())?;
    writeln!(out, "{}", "==================".yellow())?;
    for agg in aggregates {
        let mean = format!("{:+.3}", agg.mean_z);
        let mean = if agg.mean_z.abs() > 0.5 {
            mean.red()
        } else {
            mean.green()
        };
        writeln!(
            out,
            "{:<18} seeds {:>3}  players {:>6}  z mean {mean}  sd {:.3}  |z|>1.96: {:.1}%",
            agg.model, agg.seeds, agg.players, agg.std_z, agg.beyond_critical_pct
        )?;
    }
    Ok(())
}

fn calibration_markdown(
    out: &mut dyn Write,
    runs: &[CalibrationRun],
    aggregates: &[ModelAggregate],
) -> Result<()> {
    writeln!(out, "# Streak Calibration Results\n")?;
    if runs.is_empty() {
        writeln!(out, "_No calibration runs executed._")?;
        return Ok(());
    }
    writeln!(out, "## Pooled by Model\n")?;
    writeln!(out, "| Model | Seeds | Players | Mean z | SD z | abs(z) > 1.96 |")?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|")?;
    for agg in aggregates {
        writeln!(
            out,
            "| {} | {} | {} | {:.3} | {:.3} | {:.1}% |",
            agg.model, agg.seeds, agg.players, agg.mean_z, agg.std_z, agg.beyond_critical_pct
        )?;
    }
    writeln!(out, "\n## Runs\n")?;
    writeln!(
        out,
        "| Model | Seed | Players | Excluded | Mean z | SD z | abs(z) > 1.96 | Runs (obs) | Runs (exp) |"
    )?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|---:|")?;
    for run in runs {
        let s = &run.summary;
        writeln!(
            out,
            "| {} | {} | {} | {} | {:.3} | {:.3} | {:.1}% | {:.2} | {:.2} |",
            s.model,
            s.seed,
            s.players,
            s.excluded,
            s.mean_z,
            s.std_z,
            s.beyond_critical_pct,
            s.mean_observed_runs,
            s.mean_expected_runs
        )?;
    }
    Ok(())
}

fn calibration_csv(out: &mut dyn Write, runs: &[CalibrationRun]) -> Result<()> {
    writeln!(
        out,
        "model,seed,player_id,makes,misses,observed_runs,expected_runs,variance,z_score"
    )?;
    for run in runs {
        for result in &run.results {
            writeln!(
                out,
                "{},{},{},{},{},{},{:.6},{:.6},{:.6}",
                csv_field(&run.summary.model),
                run.summary.seed,
                result.player_id,
                result.successes,
                result.failures,
                result.observed_runs,
                result.expected_runs,
                result.variance,
                result.z_score
            )?;
        }
    }
    Ok(())
}
