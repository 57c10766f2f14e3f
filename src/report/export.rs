//! Spreadsheet and JSON exports of the regression run

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::describe::CorrelationMatrix;
use crate::pipeline::regression::{MarginalEffects, ModelSuite, ProbitOptions};

pub const CORRELATIONS_FILE: &str = "correlations.csv";
pub const MARGINAL_EFFECTS_FILE: &str = "marginal_effects.csv";
pub const REPORT_FILE: &str = "regression_report.json";

/// Paths written by [`export_all`].
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub correlations: PathBuf,
    pub marginal_effects: PathBuf,
    pub report: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            correlations: dir.join(CORRELATIONS_FILE),
            marginal_effects: dir.join(MARGINAL_EFFECTS_FILE),
            report: dir.join(REPORT_FILE),
        }
    }
}

#[derive(Serialize)]
pub struct ReportMetadata {
    /// ISO 8601
    pub timestamp: String,
    pub upk_version: String,
    pub input_file: String,
    pub observations: usize,
    pub probit_options: ProbitOptions,
    pub threshold: f64,
}

#[derive(Serialize)]
pub struct RegressionReport<'a> {
    pub metadata: ReportMetadata,
    pub models: &'a ModelSuite,
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

/// Correlation matrix as a frame: a `variable` column then one column per
/// variable.
pub fn correlation_frame(corr: &CorrelationMatrix) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(corr.names.len() + 1);
    columns.push(Column::new("variable".into(), corr.names.clone()));
    for (j, name) in corr.names.iter().enumerate() {
        let values: Vec<f64> = (0..corr.names.len()).map(|i| corr.values[(i, j)]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }
    DataFrame::new(columns).context("Failed to build correlation frame")
}

/// Average partial effects, rounded to four decimals like the console table.
pub fn marginal_effects_frame(ape: &MarginalEffects) -> Result<DataFrame> {
    let round = |v: &Vec<f64>| -> Vec<f64> { v.iter().map(|x| (x * 1e4).round() / 1e4).collect() };
    let effects = &ape.effects;
    df!(
        "coef_names" => effects.names.clone(),
        "ape" => round(&effects.estimates),
        "std_err" => round(&effects.std_errors),
        "z" => round(&effects.statistics),
        "p_value" => round(&effects.p_values)
    )
    .context("Failed to build marginal effects frame")
}

pub fn export_correlations(corr: &CorrelationMatrix, path: &Path) -> Result<()> {
    write_csv(&mut correlation_frame(corr)?, path)
}

pub fn export_marginal_effects(ape: &MarginalEffects, path: &Path) -> Result<()> {
    write_csv(&mut marginal_effects_frame(ape)?, path)
}

pub fn export_report(
    suite: &ModelSuite,
    input_file: &Path,
    options: &ProbitOptions,
    path: &Path,
) -> Result<()> {
    let report = RegressionReport {
        metadata: ReportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            upk_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input_file.display().to_string(),
            observations: suite.probit.nobs,
            probit_options: *options,
            threshold: suite.threshold,
        },
        models: suite,
    };

    let json = serde_json::to_string_pretty(&report)
        .context("Failed to serialize regression report to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write regression report to {}", path.display()))?;
    Ok(())
}

/// Write all three artifacts into the directory of `paths`.
pub fn export_all(
    corr: &CorrelationMatrix,
    suite: &ModelSuite,
    input_file: &Path,
    options: &ProbitOptions,
    paths: &ExportPaths,
) -> Result<()> {
    export_correlations(corr, &paths.correlations)?;
    export_marginal_effects(&suite.marginal_effects, &paths.marginal_effects)?;
    export_report(suite, input_file, options, &paths.report)?;
    log::info!(
        "Exported {}, {} and {}",
        paths.correlations.display(),
        paths.marginal_effects.display(),
        paths.report.display()
    );
    Ok(())
}
