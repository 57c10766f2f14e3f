//! Dataset loader for Stata, CSV and Parquet extracts

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::stata::{get_stata_columns, load_stata};
use crate::utils::create_spinner;

/// Supported input formats, resolved from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Stata,
    Csv,
    Parquet,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "dta" => Ok(InputFormat::Stata),
            "csv" => Ok(InputFormat::Csv),
            "parquet" => Ok(InputFormat::Parquet),
            _ => anyhow::bail!(
                "Unsupported file format: {}. Supported formats: dta, csv, parquet",
                extension
            ),
        }
    }
}

/// Load a dataset into memory and report its shape.
///
/// # Returns
/// Tuple of `(DataFrame, rows, columns, memory_mb)`
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let format = InputFormat::from_path(path)?;
    log::info!("Loading {:?} dataset from {}", format, path.display());

    let loaded = match format {
        InputFormat::Stata => load_stata(path)
            .with_context(|| format!("Failed to read Stata file: {}", path.display()))?,
        InputFormat::Csv => {
            let spinner = create_spinner("Reading CSV file...");
            let schema_length = if infer_schema_length == 0 {
                None
            } else {
                Some(infer_schema_length)
            };
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(schema_length)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))
                .and_then(|reader| reader.finish())
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?;
            spinner.finish_and_clear();
            with_stats(df)
        }
        InputFormat::Parquet => {
            let spinner = create_spinner("Reading Parquet file...");
            let file = File::open(path)
                .with_context(|| format!("Failed to open Parquet file: {}", path.display()))?;
            let df = ParquetReader::new(file)
                .finish()
                .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?;
            spinner.finish_and_clear();
            with_stats(df)
        }
    };

    log::debug!("Loaded {} rows x {} columns", loaded.1, loaded.2);
    Ok(loaded)
}

/// Get column names from a dataset without loading all rows.
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    match InputFormat::from_path(path)? {
        InputFormat::Stata => get_stata_columns(path)
            .with_context(|| format!("Failed to read Stata header: {}", path.display())),
        InputFormat::Csv => {
            let schema = LazyCsvReader::new(path)
                .finish()
                .and_then(|mut lf| lf.collect_schema())
                .with_context(|| format!("Failed to read CSV schema: {}", path.display()))?;
            Ok(schema.iter_names().map(|s| s.to_string()).collect())
        }
        InputFormat::Parquet => {
            let schema = LazyFrame::scan_parquet(path, Default::default())
                .and_then(|mut lf| lf.collect_schema())
                .with_context(|| format!("Failed to read Parquet schema: {}", path.display()))?;
            Ok(schema.iter_names().map(|s| s.to_string()).collect())
        }
    }
}

/// Save a frame as CSV or Parquet, chosen by extension.
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

fn with_stats(df: DataFrame) -> (DataFrame, usize, usize, f64) {
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    (df, rows, cols, memory_mb)
}
