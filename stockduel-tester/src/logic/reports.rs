use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use crate::logic::calibration::{CalibrationAggregate, CalibrationRecord};

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

fn accuracy_label(accuracy: Option<f64>) -> String {
    accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{:.1}%", a * 100.0))
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[CalibrationAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    // Overall stats
    writeln!(writer, "Total scenarios: {total_tests}")?;
    writeln!(writer, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(writer, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(writer, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    // Individual results
    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            writer,
            "{} {} [{} seed {}]",
            status,
            result.scenario_name.bold(),
            result.strategy,
            result.seed
        )?;
        writeln!(
            writer,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            writer,
            "   Rounds: {} | Accuracy: {}",
            result.rounds_played,
            accuracy_label(result.accuracy)
        )?;
        writeln!(writer, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    // Performance summary
    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(writer, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(writer, "{}", "=====================".yellow())?;
        writeln!(
            writer,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            writer,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "🎯 Calibration Summary".bright_magenta().bold())?;
    writeln!(writer, "{}", "=====================".magenta())?;
    if aggregates.is_empty() {
        writeln!(writer, "No rounds sampled.")?;
        return Ok(());
    }
    writeln!(
        writer,
        "{:<8} {:>7} {:>9} {:>9} {:>10} {:>9} {:>9} {:>9}",
        "tier", "rounds", "in-band", "fallback", "mean diff", "std", "min", "max"
    )?;
    for aggregate in aggregates {
        writeln!(
            writer,
            "{:<8} {:>7} {:>8.1}% {:>9} {:>10.4} {:>9.4} {:>9.4} {:>9.4}",
            aggregate.tier.label(),
            aggregate.rounds,
            aggregate.in_band_rate * 100.0,
            aggregate.fallback_count,
            aggregate.mean_relative_difference,
            aggregate.std_relative_difference,
            aggregate.min_relative_difference,
            aggregate.max_relative_difference
        )?;
    }

    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(
    writer: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: Option<&[CalibrationAggregate]>,
) -> Result<()> {
    writeln!(writer, "# Stock Duel Logic Test Results\n")?;
    writeln!(writer, "_Generated {}_\n", Utc::now().to_rfc3339())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total scenarios**: {total_tests}")?;
    writeln!(writer, "- **Passed**: {passed_tests}")?;
    writeln!(writer, "- **Failed**: {failed_tests}")?;
    writeln!(writer, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(writer, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(
            writer,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(writer, "- **Strategy**: {}", result.strategy)?;
        writeln!(
            writer,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            writer,
            "- **Accuracy**: {} over {} rounds",
            accuracy_label(result.accuracy),
            result.rounds_played
        )?;
        writeln!(writer, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(writer, "  - {failure}")?;
            }
        }
        writeln!(writer)?;
    }

    if let Some(aggregates) = aggregates.filter(|a| !a.is_empty()) {
        writeln!(writer, "## Calibration\n")?;
        writeln!(
            writer,
            "| Tier | Rounds | In-band | Fallback | Mean diff | Std |"
        )?;
        writeln!(writer, "|---|---:|---:|---:|---:|---:|")?;
        for aggregate in aggregates {
            writeln!(
                writer,
                "| {} | {} | {:.1}% | {} | {:.4} | {:.4} |",
                aggregate.tier.label(),
                aggregate.rounds,
                aggregate.in_band_rate * 100.0,
                aggregate.fallback_count,
                aggregate.mean_relative_difference,
                aggregate.std_relative_difference
            )?;
        }
    }

    Ok(())
}

pub fn generate_csv_report(writer: &mut dyn Write, records: &[CalibrationRecord]) -> Result<()> {
    writeln!(
        writer,
        "seed_code,seed,round,tier,metric,calibration,relative_difference,distractors"
    )?;
    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{},{},{:.6},{}",
            record.seed_code,
            record.seed_value,
            record.number,
            record.tier.label().to_lowercase(),
            record.metric.key(),
            match record.calibration {
                stockduel_game::Calibration::InBand => "in_band",
                stockduel_game::Calibration::Fallback => "fallback",
            },
            record.relative_difference,
            record.distractor_count
        )?;
    }
    Ok(())
}
