//! Command-line interface for the fraud detection run

use clap::Parser;
use colored::*;
use std::path::PathBuf;

use crate::anomaly::Contamination;
use crate::pipeline::{run_isolation_forest, PipelineConfig, PipelineResult};

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn section(title: &str) {
    println!();
    println!("{}", title.white().bold());
}

#[derive(Parser, Debug)]
#[command(name = "fraud-iforest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unsupervised credit-card fraud detection with Isolation Forest")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON config file; flags given on the command line override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the dataset [default: data]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// CSV file name inside the data directory [default: creditcard.csv]
    #[arg(short, long)]
    pub file: Option<String>,

    /// Number of isolation trees [default: 100]
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// 'auto' or the expected fraud fraction in (0, 0.5] [default: auto]
    #[arg(long)]
    pub contamination: Option<Contamination>,

    /// Seed for tree construction [default: 13]
    #[arg(long)]
    pub random_state: Option<u64>,

    /// Lowest-scored rows checked for fraud [default: 1000]
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print row counts, the fitted offset and timing
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the run configuration: defaults, then the config file, then flags
    pub fn to_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path).map_err(|e| {
                anyhow::anyhow!("failed to read config {}: {}", path.display(), e)
            })?,
            None => PipelineConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir.clone());
        }
        if let Some(file) = &self.file {
            config = config.with_file_name(file.clone());
        }
        if let Some(n) = self.n_estimators {
            config = config.with_n_estimators(n);
        }
        if let Some(c) = self.contamination {
            config = config.with_contamination(c);
        }
        if let Some(seed) = self.random_state {
            config = config.with_random_state(seed);
        }
        if let Some(n) = self.top_n {
            config = config.with_top_n(n);
        }

        Ok(config)
    }
}

/// Run the pipeline and print its report
pub fn cmd_run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.to_config()?;
    let result = run_isolation_forest(&config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
        if cli.verbose {
            print_summary(&result);
        }
    }
    Ok(())
}

pub fn print_result(result: &PipelineResult) {
    section("Confusion Matrix:");
    println!("{}", result.confusion_matrix);

    section("Classification Report:");
    print!("{}", result.classification_report);

    println!();
    println!(
        "Number of fraud cases in top {} anomalies: {}",
        result.top_n, result.fraud_in_top_n
    );
}

/// Row counts, offset and timing for one run
pub fn print_summary(result: &PipelineResult) {
    let summary = &result.summary;
    println!(
        "{}",
        dim(&format!(
            "{} rows, {} fraud, {} flagged, offset {:.4}, {} ms",
            summary.n_rows, summary.n_fraud, summary.n_flagged, summary.offset, summary.elapsed_ms
        ))
    );
    println!("{} {}", muted("Flagged share"), format_share(summary.n_flagged, summary.n_rows));
}

fn format_share(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "n/a".to_string();
    }
    format!("{:.2}%", 100.0 * part as f64 / whole as f64)
}
