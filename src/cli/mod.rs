//! Command-line interface
//!
//! Commands for generating or collecting launch data, summarizing it and
//! comparing landing classifiers.

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{DatasetLoader, GeneratorConfig, LaunchCollector, LaunchTable, SampleGenerator};
use crate::evaluation::EvaluationResult;
use crate::pipeline::{Pipeline, PipelineConfig, PipelineReport};
use crate::preprocessing::ImputationScope;
use crate::report::DatasetSummary;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_warn(msg: &str) {
    println!("  {} {}", "!".yellow(), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "falcon-landing")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Falcon 9 first-stage landing prediction")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a synthetic launch table
    Generate {
        /// Output CSV file
        #[arg(short, long, default_value = "data/spacex_launches.csv")]
        output: PathBuf,

        /// Number of launches
        #[arg(short = 'n', long, default_value = "100")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Fetch past launches from the launch data API
    Collect {
        /// Output CSV file
        #[arg(short, long, default_value = "data/spacex_launches.csv")]
        output: PathBuf,

        /// API root
        #[arg(long)]
        base_url: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print descriptive statistics of a launch table
    Summary {
        /// Input CSV file
        #[arg(short, long, default_value = "data/spacex_launches.csv")]
        data: PathBuf,

        /// Also write the report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Train and compare the landing classifiers
    Predict {
        /// Input CSV file
        #[arg(short, long, default_value = "data/spacex_launches.csv")]
        data: PathBuf,

        /// Also write the report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Acquire data, summarize it and compare classifiers in one go
    Run {
        /// Where the launch table comes from
        #[arg(long, value_enum, default_value = "generate")]
        source: Source,

        /// Input CSV file when the source is `file`
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Directory for the table and reports
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,

        /// Number of launches when generating
        #[arg(short = 'n', long)]
        samples: Option<usize>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    Generate,
    Collect,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImputationArg {
    /// Column means over the whole table
    Full,
    /// Column means over training rows only
    Training,
}

impl From<ImputationArg> for ImputationScope {
    fn from(arg: ImputationArg) -> Self {
        match arg {
            ImputationArg::Full => ImputationScope::FullDataset,
            ImputationArg::Training => ImputationScope::TrainingOnly,
        }
    }
}

/// Pipeline overrides shared by `predict` and `run`
#[derive(Debug, Clone, Default, Args)]
pub struct PipelineArgs {
    /// JSON pipeline configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed for split, folds and solvers
    #[arg(long)]
    pub seed: Option<u64>,

    /// Held-out fraction
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Which rows imputation means come from
    #[arg(long, value_enum)]
    pub imputation: Option<ImputationArg>,
}

impl PipelineArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn resolve(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(test_size) = self.test_size {
            config = config.with_test_size(test_size);
        }
        if let Some(cv_folds) = self.cv_folds {
            config = config.with_cv_folds(cv_folds);
        }
        if let Some(scope) = self.imputation {
            config = config.with_imputation(scope.into());
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_generate(output: &Path, samples: usize, seed: u64) -> anyhow::Result<()> {
    section("Generate");
    let config = GeneratorConfig::default().with_samples(samples).with_seed(seed);
    let table = generate_table(&config)?;
    save_table(&table, output)?;
    println!();
    Ok(())
}

pub async fn cmd_collect(output: &Path, base_url: Option<&str>, timeout_secs: Option<u64>) -> anyhow::Result<()> {
    section("Collect");
    let mut config = crate::data::CollectorConfig::default();
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = timeout_secs {
        config = config.with_timeout_secs(secs);
    }

    step_run(&format!("Fetching launches from {}", config.base_url));
    let start = Instant::now();
    let collector = LaunchCollector::new(config)?;
    let records = collector.collect().await?;
    let table = LaunchTable::from_records(&records)?;
    step_done(&format!("{} launches in {:.2?}", table.height(), start.elapsed()));

    save_table(&table, output)?;
    println!();
    Ok(())
}

pub fn cmd_summary(data: &Path, report: Option<&Path>) -> anyhow::Result<()> {
    section("Summary");
    let table = load_table(data)?;
    let text = DatasetSummary::from_table(&table)?.render();
    println!();
    println!("{}", text);
    if let Some(path) = report {
        write_report(path, &text)?;
    }
    Ok(())
}

pub fn cmd_predict(data: &Path, report: Option<&Path>, args: &PipelineArgs) -> anyhow::Result<()> {
    section("Predict");
    let config = args.resolve()?;
    let table = load_table(data)?;
    let result = run_pipeline(config, &table)?;
    print_leaderboard(&result);

    let text = result.report.render();
    println!("{}", text);
    if let Some(path) = report {
        write_report(path, &text)?;
    }
    Ok(())
}

pub async fn cmd_run(
    source: Source,
    data: Option<&Path>,
    out_dir: &Path,
    samples: Option<usize>,
    args: &PipelineArgs,
) -> anyhow::Result<()> {
    let mut config = args.resolve()?;
    if let Some(n) = samples {
        config.generator.n_samples = n;
    }

    print_banner(source, &config);

    section("Data");
    let table = match source {
        Source::Generate => generate_table(&config.generator)?,
        Source::Collect => {
            step_run("Fetching launches");
            let start = Instant::now();
            let table = LaunchCollector::new(config.collector.clone())?
                .collect_table_or_empty()
                .await;
            step_done(&format!("{} launches in {:.2?}", table.height(), start.elapsed()));
            if table.is_empty() {
                step_warn("collection returned no launches");
            }
            table
        }
        Source::File => {
            let path = data.ok_or_else(|| anyhow::anyhow!("--data is required when --source is file"))?;
            load_table(path)?
        }
    };

    std::fs::create_dir_all(out_dir)?;
    if source != Source::File && !table.is_empty() {
        save_table(&table, &out_dir.join("spacex_launches.csv"))?;
    }

    section("Summary");
    if !table.is_empty() {
        // Summary needs FlightNumber and Date, prediction does not
        match DatasetSummary::from_table(&table) {
            Ok(summary) => {
                println!("  {:<16} {}", muted("Launches"), summary.total);
                println!("  {:<16} {:.2}%", muted("Success rate"), summary.success_rate() * 100.0);
                write_report(&out_dir.join("summary_report.txt"), &summary.render())?;
            }
            Err(e) => step_warn(&format!("summary skipped: {}", e)),
        }
    }

    section("Predict");
    let result = run_pipeline(config, &table)?;
    print_leaderboard(&result);
    write_report(&out_dir.join("prediction_report.txt"), &result.report.render())?;
    println!();
    Ok(())
}

// ─── Shared steps ──────────────────────────────────────────────────────────────

fn print_banner(source: Source, config: &PipelineConfig) {
    println!();
    line_box_top();
    line_box_center(&format!("{}", "Falcon 9 Landing Prediction".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_sep();
    line_box(&kv("Source    ", &format!("{:?}", source).to_lowercase()));
    line_box(&kv("Test size ", &config.test_size.to_string()));
    line_box(&kv("CV folds  ", &config.cv_folds.to_string()));
    line_box(&kv("Seed      ", &config.seed.to_string()));
    line_box_bottom();
}

fn generate_table(config: &GeneratorConfig) -> anyhow::Result<LaunchTable> {
    step_run(&format!("Generating {} launches", config.n_samples));
    let start = Instant::now();
    let records = SampleGenerator::new(config.clone()).generate()?;
    let table = LaunchTable::from_records(&records)?;
    step_done(&format!("seed {} in {:.2?}", config.seed, start.elapsed()));
    Ok(table)
}

fn load_table(path: &Path) -> anyhow::Result<LaunchTable> {
    step_run("Loading data");
    let start = Instant::now();
    let table = DatasetLoader::new().load(path)?;
    step_done(&format!(
        "{} rows × {} cols in {:.2?}",
        table.height(),
        table.column_names().len(),
        start.elapsed()
    ));
    Ok(table)
}

fn save_table(table: &LaunchTable, path: &Path) -> anyhow::Result<()> {
    let written = DatasetLoader::new().save(table, path)?;
    step_ok(&format!("Saved {} rows → {}", table.height(), written.display()));
    Ok(())
}

fn write_report(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    step_ok(&format!("Report → {}", path.display()));
    Ok(())
}

fn run_pipeline(config: PipelineConfig, table: &LaunchTable) -> anyhow::Result<PipelineReport> {
    step_run(&format!("Training {} algorithms", config.algorithms.len()));
    let start = Instant::now();
    let result = Pipeline::new(config).run(table)?;
    step_done(&format!("{:.2?}", start.elapsed()));
    for warning in result.warnings() {
        step_warn(&warning.to_string());
    }
    Ok(result)
}

fn print_leaderboard(result: &PipelineReport) {
    println!();
    println!(
        "  {:<22} {:>9} {:>9} {:>9}",
        muted("Model"),
        muted("CV"),
        muted("Accuracy"),
        muted("F1")
    );
    println!("  {}", dim(&"─".repeat(52)));
    for r in result.leaderboard() {
        println!("  {}", leaderboard_row(r));
    }
    println!("  {}", dim(&"─".repeat(52)));

    if let Some(best) = result.best() {
        println!();
        println!(
            "  {} {} {} {:.4}",
            ok("best"),
            best.algorithm.name().white().bold(),
            muted("accuracy:"),
            best.accuracy
        );
    }
    println!();
}

fn leaderboard_row(r: &EvaluationResult) -> String {
    let name = if r.degraded {
        format!("{:<22}", format!("{} *", r.algorithm)).yellow().to_string()
    } else {
        format!("{:<22}", r.algorithm.name())
    };
    format!("{} {:>9.4} {:>9.4} {:>9.4}", name, r.cv_accuracy, r.accuracy, r.f1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_predict_overrides() {
        let cli = Cli::try_parse_from([
            "falcon-landing",
            "predict",
            "--data",
            "launches.csv",
            "--seed",
            "7",
            "--test-size",
            "0.3",
            "--imputation",
            "training",
        ])
        .unwrap();

        match cli.command {
            Commands::Predict { data, pipeline, .. } => {
                assert_eq!(data, PathBuf::from("launches.csv"));
                let config = pipeline.resolve().unwrap();
                assert_eq!(config.seed, 7);
                assert_eq!(config.test_size, 0.3);
                assert_eq!(config.cv_folds, 5);
                assert_eq!(config.imputation, ImputationScope::TrainingOnly);
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_cli_run_defaults() {
        let cli = Cli::try_parse_from(["falcon-landing", "run"]).unwrap();
        match cli.command {
            Commands::Run { source, out_dir, samples, .. } => {
                assert_eq!(source, Source::Generate);
                assert_eq!(out_dir, PathBuf::from("output"));
                assert!(samples.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_resolve_rejects_bad_override() {
        let args = PipelineArgs {
            cv_folds: Some(1),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_strip_ansi() {
        let colored = format!("{}", "x".red());
        assert_eq!(strip_ansi(&colored), "x");
    }

    #[test]
    fn test_generate_and_summarize() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("launches.csv");
        let report = dir.path().join("reports/summary.txt");
        cmd_generate(&csv, 30, 1).unwrap();
        cmd_summary(&csv, Some(&report)).unwrap();
        assert!(std::fs::read_to_string(report).unwrap().contains("Total launches:       30"));
    }
}
