//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// upk - Georgia pre-K eligibility cohorts and high-school completion regressions
#[derive(Parser, Debug)]
#[command(name = "upk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build eligibility cohorts, treatment bands and indicator variables
    Cohorts {
        /// Input extract (Stata .dta, CSV, or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the derived frame (CSV or Parquet, determined by extension).
        /// Defaults to the input directory with a '_cohorts' suffix
        /// (e.g., georgia.dta → georgia_cohorts.parquet).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only).
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },

    /// Fit the high-school completion models on an extract of 18-year-olds
    Regress {
        /// Input extract (Stata .dta, CSV, or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for correlations.csv, marginal_effects.csv and
        /// regression_report.json. Defaults to the input's directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Probability cut-off for the confusion matrix (0.0 to 1.0)
        #[arg(long, default_value = "0.5", value_parser = validate_threshold)]
        threshold: f64,

        /// Maximum Newton-Raphson iterations per probit
        #[arg(long, default_value = "35")]
        max_iter: usize,

        /// Convergence tolerance on the largest parameter step
        #[arg(long, default_value = "1e-8")]
        tolerance: f64,

        /// Print results only, without writing any files
        #[arg(long, default_value = "false")]
        no_export: bool,

        /// Number of rows to use for schema inference (CSV only).
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

/// Default cohort output: `<dir>/<stem>_cohorts.parquet`.
pub fn default_cohort_output(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}_cohorts.parquet", stem))
}

/// Default export directory: the input's own directory.
pub fn default_output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Validator for the confusion-matrix threshold
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
