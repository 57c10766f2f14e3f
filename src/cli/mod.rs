//! CLI module - argument parsing, settings and the two pipeline runners

pub mod args;
pub mod cohorts;
pub mod regress;
pub mod settings;

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use console::style;
use polars::prelude::DataFrame;

use crate::pipeline::{get_column_names, load_dataset_with_progress};
use crate::utils::{print_step_header, print_step_time, print_success};

pub use args::{Cli, Commands};
pub use settings::{CohortSettings, RegressSettings, Settings};

/// Fails before loading when the extract lacks any of `required`.
fn require_columns(input: &Path, required: &[&str]) -> Result<()> {
    let names = get_column_names(input)?;
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !names.iter().any(|n| n == col))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!(
            "Input is missing required column(s): {}",
            missing.join(", ")
        );
    }
    Ok(())
}

/// Step 1 of both pipelines: check the header, load the extract and print
/// its shape.
pub(crate) fn load_step(
    input: &Path,
    infer_schema_length: usize,
    required: &[&str],
) -> Result<DataFrame> {
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    require_columns(input, required)?;
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(input, infer_schema_length)?;
    print_success("Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
    print_step_time(step_start.elapsed());
    Ok(df)
}

/// Dispatch resolved settings to their pipeline.
pub fn run(settings: &Settings) -> Result<()> {
    match settings {
        Settings::Cohorts(cohorts) => cohorts::run_cohorts(cohorts),
        Settings::Regress(regress) => regress::run_regress(regress),
    }
}
