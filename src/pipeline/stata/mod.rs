//! Stata `.dta` file format reader (releases 117, 118 and 119).
//!
//! IPUMS distributes extracts as Stata datasets whose categorical variables
//! carry value labels. This reader turns such a file into a Polars DataFrame,
//! applying the labels so that e.g. `educd` arrives as
//! `"regular high school diploma"` rather than code `63`.
//!
//! # Module Structure
//!
//! - `constants` - Section tags, storage type codes, missing-value sentinels
//! - `error` - Error types for parsing failures
//! - `cursor` - Bounds-checked byte cursor with file byte order
//! - `header` - File header and variable descriptors
//! - `data` - Row decoding, strL resolution, column building
//! - `labels` - Value-label tables

pub mod constants;
pub mod cursor;
pub mod data;
pub mod error;
pub mod header;
pub mod labels;

pub use error::StataError;

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;

use self::constants::*;
use self::cursor::ByteCursor;
use self::data::{build_column, read_data_section, read_strls};
use self::header::{parse_descriptors, parse_header};
use self::labels::read_value_labels;

/// Format release of a tagged `.dta` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StataRelease {
    /// Stata 13.
    R117,
    /// Stata 14-18, up to 32,767 variables.
    R118,
    /// Stata 15-18 MP, more than 32,767 variables.
    R119,
}

impl StataRelease {
    pub fn from_number(release: u16) -> Result<Self, StataError> {
        match release {
            117 => Ok(StataRelease::R117),
            118 => Ok(StataRelease::R118),
            119 => Ok(StataRelease::R119),
            other => Err(StataError::UnsupportedRelease { release: other }),
        }
    }

    pub fn widths(self) -> FieldWidths {
        match self {
            StataRelease::R117 => WIDTHS_117,
            StataRelease::R118 | StataRelease::R119 => WIDTHS_118,
        }
    }

    /// Release 119 widens `K` and the sort list to 32 bits.
    pub fn wide_counts(self) -> bool {
        self == StataRelease::R119
    }

    /// Bytes of the `v` half of a strL reference.
    pub fn strl_v_width(self) -> usize {
        match self {
            StataRelease::R117 => 4,
            StataRelease::R118 => 2,
            StataRelease::R119 => 3,
        }
    }

    /// Release 117 stores text in the platform code page; later releases use UTF-8.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            StataRelease::R117 => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
            StataRelease::R118 | StataRelease::R119 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Fixed-width string of 1-2045 bytes.
    Str(u16),
    /// Long string stored in `<strls>`.
    StrL,
    Double,
    Float,
    Long,
    Int,
    Byte,
}

impl StorageType {
    pub fn from_code(code: u16, column: &str) -> Result<Self, StataError> {
        match code {
            1..=TYPE_STR_MAX => Ok(StorageType::Str(code)),
            TYPE_STRL => Ok(StorageType::StrL),
            TYPE_DOUBLE => Ok(StorageType::Double),
            TYPE_FLOAT => Ok(StorageType::Float),
            TYPE_LONG => Ok(StorageType::Long),
            TYPE_INT => Ok(StorageType::Int),
            TYPE_BYTE => Ok(StorageType::Byte),
            _ => Err(StataError::UnknownStorageType {
                column: column.to_string(),
                code,
            }),
        }
    }

    /// Width of one cell in the `<data>` section.
    pub fn width(self) -> usize {
        match self {
            StorageType::Str(n) => n as usize,
            StorageType::StrL => STRL_REF_WIDTH,
            StorageType::Double => 8,
            StorageType::Float | StorageType::Long => 4,
            StorageType::Int => 2,
            StorageType::Byte => 1,
        }
    }
}

/// File-level metadata from `<header>`.
#[derive(Debug, Clone)]
pub struct StataHeader {
    pub release: StataRelease,
    pub little_endian: bool,
    pub nvar: usize,
    pub nobs: u64,
    pub label: String,
    pub timestamp: String,
}

/// Per-variable descriptor.
#[derive(Debug, Clone)]
pub struct StataVariable {
    pub name: String,
    pub storage: StorageType,
    pub format: String,
    /// Name of the attached value-label set, if any.
    pub value_label: Option<String>,
    pub label: String,
}

/// Parses a complete `.dta` buffer into a DataFrame.
pub fn read_stata_bytes(bytes: &[u8]) -> Result<DataFrame, StataError> {
    let mut cursor = ByteCursor::new(bytes);

    let header = parse_header(&mut cursor)?;
    let variables = parse_descriptors(&mut cursor, &header)?;
    log::debug!(
        "Stata release {:?}: {} variables, {} observations",
        header.release,
        header.nvar,
        header.nobs
    );

    let buffers = read_data_section(&mut cursor, &header, &variables)?;
    let strls = read_strls(&mut cursor, header.release)?;
    let label_sets = read_value_labels(&mut cursor, header.release)?;
    cursor.expect_tag(TAG_FILE_CLOSE)?;

    for var in &variables {
        if let Some(lbl) = &var.value_label {
            if !label_sets.contains_key(lbl) {
                log::warn!(
                    "Variable '{}' references undefined value label '{}'; keeping codes",
                    var.name,
                    lbl
                );
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(variables.len());
    for (var, buffer) in variables.iter().zip(buffers) {
        columns.push(build_column(var, buffer, &strls, &label_sets)?);
    }

    Ok(DataFrame::new(columns)?)
}

/// Loads a `.dta` file and returns a DataFrame with statistics.
///
/// # Returns
/// Tuple of `(DataFrame, rows, columns, memory_mb)` matching the loader API
pub fn load_stata(path: &Path) -> Result<(DataFrame, usize, usize, f64), StataError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("   {spinner:.cyan} Reading Stata dataset...")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let bytes = std::fs::read(path)?;
    let result = read_stata_bytes(&bytes);
    spinner.finish_and_clear();

    let df = result?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);

    Ok((df, rows, cols, memory_mb))
}

/// Gets variable names from a `.dta` file without decoding the data section.
pub fn get_stata_columns(path: &Path) -> Result<Vec<String>, StataError> {
    let bytes = std::fs::read(path)?;
    let mut cursor = ByteCursor::new(&bytes);
    let header = parse_header(&mut cursor)?;
    let variables = parse_descriptors(&mut cursor, &header)?;
    Ok(variables.into_iter().map(|v| v.name).collect())
}
