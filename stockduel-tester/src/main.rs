mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use common::scenario::{ALL_SCENARIOS, get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    CalibrationAggregate, CalibrationRecord, GameTester, LogicTester, SeedInfo, TesterAssets,
    aggregate_calibration, resolve_seed_inputs, run_calibration_analysis,
    validate_calibration_targets,
};

#[derive(Debug, Parser)]
#[command(name = "stockduel-tester", version = "0.1.0")]
#[command(
    about = "Automated QA for the Stock Duel quiz engine - scripted players and calibration sweeps"
)]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, SD- share codes, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Company dataset JSON to play against instead of the bundled one
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Quiz config JSON overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_tokens = split_csv(&args.seeds);
    let seed_infos = resolve_seed_inputs(&seed_tokens)?;
    let logic_seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let tester_assets = Arc::new(TesterAssets::load(
        args.dataset.clone(),
        args.config.clone(),
    )?);
    let game_tester = GameTester::new(tester_assets, args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &logic_seeds, &game_tester);

    let (calibration_records, calibration_aggregates) =
        gather_calibration(&args, &game_tester, &seed_infos)?;

    write_reports(
        &args,
        &all_results,
        calibration_records.as_deref(),
        calibration_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(records) = calibration_records.as_deref() {
        validate_calibration_targets(records, &game_tester.assets().config().bands)?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "📈 Stock Duel Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for key in ALL_SCENARIOS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    logic_seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            let scenario_results =
                logic_tester.run_scenario(&scenario, logic_seeds, args.iterations);
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type CalibrationSummary = (
    Option<Vec<CalibrationRecord>>,
    Option<Vec<CalibrationAggregate>>,
);

fn gather_calibration(
    args: &Args,
    game_tester: &GameTester,
    seed_infos: &[SeedInfo],
) -> Result<CalibrationSummary> {
    let require_calibration = matches!(args.report.as_str(), "console" | "csv" | "markdown");
    if !require_calibration {
        return Ok((None, None));
    }

    let records = run_calibration_analysis(game_tester, seed_infos, args.iterations)?;
    let aggregates = aggregate_calibration(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    calibration_records: Option<&[CalibrationRecord]>,
    calibration_aggregates: Option<&[CalibrationAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Stock Duel Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(
                    &mut output_target,
                    results,
                    calibration_aggregates,
                )?;
            }
        }
        "csv" => {
            if let Some(records) = calibration_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "No calibration data.")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else if let Some(aggregates) = calibration_aggregates {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    aggregates,
                    duration,
                )?;
            } else {
                writeln!(&mut output_target, "Calibration data unavailable.")?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ScenarioResult;
    use stockduel_game::{Calibration, DifficultyTier, MetricKind};
    use std::io::Write;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            dataset: None,
            config: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "stockduel-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn tester() -> GameTester {
        GameTester::new(Arc::new(TesterAssets::load_default().unwrap()), false)
    }

    fn sample_record() -> CalibrationRecord {
        CalibrationRecord {
            seed_code: "SD-ALPHA21".to_string(),
            seed_value: 42,
            number: 1,
            tier: DifficultyTier::Easy,
            metric: MetricKind::Roe,
            calibration: Calibration::InBand,
            relative_difference: 0.9,
            distractor_count: 1,
        }
    }

    fn sample_aggregate() -> CalibrationAggregate {
        CalibrationAggregate {
            tier: DifficultyTier::Easy,
            rounds: 1,
            in_band_rate: 1.0,
            fallback_count: 0,
            mean_relative_difference: 0.9,
            std_relative_difference: 0.0,
            min_relative_difference: 0.9,
            max_relative_difference: 0.9,
        }
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            strategy: "Oracle".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            rounds_played: 30,
            accuracy: Some(1.0),
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded.len(), ALL_SCENARIOS.len());
        assert_eq!(expanded[0], "smoke");
        assert!(expanded.contains(&"high-score".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("sparse-dataset,smoke");
        assert_eq!(
            expanded,
            vec!["sparse-dataset".to_string(), "smoke".to_string()]
        );
    }

    #[test]
    fn run_logic_scenarios_skips_unknown_names() {
        let args = base_args();
        let results = run_logic_scenarios(
            &args,
            &["smoke".to_string(), "real-game".to_string()],
            &[42],
            &tester(),
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
    }

    #[test]
    fn gather_calibration_returns_none_for_json() {
        let args = base_args();
        let seeds = vec![SeedInfo::from_numeric(42)];
        let (records, aggregates) = gather_calibration(&args, &tester(), &seeds).unwrap();
        assert!(records.is_none());
        assert!(aggregates.is_none());
    }

    #[test]
    fn gather_calibration_samples_for_csv() {
        let args = Args {
            report: "csv".to_string(),
            ..base_args()
        };
        let seeds = vec![SeedInfo::from_numeric(42)];
        let (records, aggregates) = gather_calibration(&args, &tester(), &seeds).unwrap();
        assert_eq!(records.unwrap().len(), 10);
        assert_eq!(aggregates.unwrap().len(), 3);
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_path("report-full.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "Smoke Test");
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("distractor-trap"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        let args = base_args();
        assert!(!maybe_list_scenarios(&args).unwrap());
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_emits_markdown_report() {
        let temp = temp_path("report-full.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let aggregates = [sample_aggregate()];
        write_reports(
            &args,
            &[sample_result(false)],
            None,
            Some(&aggregates),
            Instant::now(),
        )
        .unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("# Stock Duel Logic Test Results"));
        assert!(content.contains("## Calibration"));
        assert!(content.contains("  - failure"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_path("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Some(&[sample_record()]), None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.starts_with("seed_code,seed,round"));
        assert!(content.contains("SD-ALPHA21,42,1,easy,roe,in_band"));
    }

    #[test]
    fn write_reports_emits_console_report_with_calibration() {
        let temp = temp_path("report-console.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(
            &args,
            &[sample_result(true)],
            None,
            Some(&[sample_aggregate()]),
            Instant::now(),
        )
        .unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Calibration Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn write_reports_console_without_calibration() {
        let temp = temp_path("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Calibration data unavailable"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }

    #[test]
    fn output_target_reports_unwritable_path() {
        let err = OutputTarget::new(Some(PathBuf::from("/nonexistent/dir/report.txt")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("failed to create"));
    }
}
