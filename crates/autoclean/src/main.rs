//! CLI entry point for missing-value injection and automatic imputation.

use anyhow::{Result, anyhow};
use autoclean::{
    CandidateKind, ColumnStatus, EngineConfig, FeatureMissingPolicy, ImputationEngine,
    ImputationResult, MissingValueInjector, ModelSelection, columns_with_missing, scan_missing,
};
use clap::{Parser, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI-compatible model choice
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliModel {
    /// Evaluate every eligible model and keep the best
    Automatic,
    /// Linear regression (regression targets only)
    Linear,
    /// Logistic regression (classification targets only)
    Logistic,
    /// Random forest (both task types)
    RandomForest,
}

impl From<CliModel> for ModelSelection {
    fn from(cli: CliModel) -> Self {
        match cli {
            CliModel::Automatic => ModelSelection::Automatic,
            CliModel::Linear => ModelSelection::Fixed(CandidateKind::LinearRegression),
            CliModel::Logistic => ModelSelection::Fixed(CandidateKind::LogisticRegression),
            CliModel::RandomForest => ModelSelection::Fixed(CandidateKind::RandomForest),
        }
    }
}

/// Automatic imputation model selection for CSV datasets
#[derive(Parser, Debug)]
#[command(
    author = "Autoclean Team",
    version,
    about = "Fill missing values with the best-scoring model per column",
    long_about = "Scores linear regression, logistic regression and random forest \
candidates on held-out known values of every target column, then fills the \
missing entries with the winner.

EXAMPLES:
    # Show which columns have missing values
    autoclean -i data.csv --scan

    # Impute every column that has missing values
    autoclean -i data.csv -o data_imputed.csv

    # Benchmark: knock out 20% of two columns, then impute them
    autoclean -i iris.csv -t sepal_length -t species --inject 0.2

    # Quick preview on the first 20% of rows
    autoclean -i data.csv --sample 0.2 --json"
)]
struct Args {
    /// Path to input CSV file
    #[arg(short, long)]
    input: String,

    /// Column to impute (repeatable)
    ///
    /// If not specified, every column with missing values is imputed
    #[arg(short, long)]
    target: Vec<String>,

    /// Inject this fraction (0.0 - 1.0) of missing values into the targets first
    #[arg(long)]
    inject: Option<f64>,

    /// Seed for injection, train/test split and random forests
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Share of known rows held out for scoring (0.0 - 1.0, exclusive)
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Model to use
    #[arg(short, long, value_enum, default_value = "automatic")]
    model: CliModel,

    /// Run a performance test on this leading fraction of rows instead
    #[arg(long)]
    sample: Option<f64>,

    /// Fill nulls in feature columns instead of excluding those columns
    #[arg(long)]
    fill_incomplete_features: bool,

    /// Write the imputed table to this CSV file
    #[arg(short, long)]
    output: Option<String>,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Print the missing-value scan and exit
    #[arg(long)]
    scan: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(&args.input)))?
        .finish()?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.scan {
        return run_scan(&args, &data);
    }

    let config = EngineConfig::builder()
        .seed(args.seed)
        .test_size(args.test_size)
        .model_selection(args.model.into())
        .feature_missing_policy(if args.fill_incomplete_features {
            FeatureMissingPolicy::FillWithStatistics
        } else {
            FeatureMissingPolicy::ExcludeIncomplete
        })
        .build()?;
    let engine = ImputationEngine::new(config)?;

    let (data, targets) = match args.inject {
        Some(fraction) => {
            if args.target.is_empty() {
                return Err(anyhow!("--inject needs at least one --target column"));
            }
            let injected =
                MissingValueInjector::new(args.seed).inject(&data, &args.target, fraction)?;
            (injected, args.target.clone())
        }
        None if args.target.is_empty() => {
            let targets = columns_with_missing(&data);
            info!("Imputing columns with missing values: {:?}", targets);
            (data, targets)
        }
        None => (data, args.target.clone()),
    };

    if targets.is_empty() {
        warn!("No columns with missing values; nothing to impute");
    }

    let result = match args.sample {
        Some(fraction) => engine.performance_test(&data, &targets, fraction)?,
        None => engine.select_and_impute(&data, &targets)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(ref output) = args.output {
        let mut table = result.table;
        let mut file = File::create(output)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut table)?;
        info!("Imputed table written to: {}", output);
    }

    Ok(())
}

/// Print the per-column missing-value table.
///
/// Uses `println!` so the table is visible regardless of log level.
fn run_scan(args: &Args, data: &DataFrame) -> Result<()> {
    let summary = scan_missing(data);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(60));
    println!("MISSING VALUES");
    println!("{}", "=".repeat(60));
    println!("{:<24} {:<12} {:<10} {:<10}", "Column", "Type", "Missing", "Missing %");
    println!("{}", "-".repeat(60));
    for col in &summary {
        println!(
            "{:<24} {:<12} {:<10} {:<10.1}",
            truncate_str(&col.column, 23),
            col.dtype,
            col.missing_count,
            col.missing_percentage
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

fn print_summary(result: &ImputationResult) {
    println!("\n{}", "=".repeat(60));
    println!("IMPUTATION COMPLETE");
    println!("{}", "=".repeat(60));

    println!("{:<24} {:<10} {:<10}", "Model", "Score", "Time (s)");
    println!("{}", "-".repeat(60));
    for (candidate, score) in &result.score_by_model {
        let elapsed = result.time_by_model.get(candidate).copied().unwrap_or_default();
        println!(
            "{:<24} {:<10.4} {:<10.4}",
            candidate.display_name(),
            score,
            elapsed
        );
    }
    println!();

    for column in &result.columns {
        match &column.status {
            ColumnStatus::Imputed {
                winner,
                score,
                filled,
            } => println!(
                "  {}: {} filled {} value(s) (score {:.4})",
                column.column, winner, filled, score
            ),
            ColumnStatus::Skipped => println!("  {}: no missing values", column.column),
            ColumnStatus::Failed { error } => println!("  {}: FAILED - {}", column.column, error),
        }
    }

    if let Some(accuracy) = result.overall_accuracy {
        println!("\n  Accuracy: {:.4}", accuracy);
    }
    println!("  Duration: {} ms", result.duration_ms);
    println!("{}", "=".repeat(60));
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
