//! Row and column exclusion stages.
//!
//! Each stage takes the frame by reference and returns a new frame. A stage
//! that names a column absent from the frame fails instead of silently
//! matching nothing.

use polars::prelude::*;
use thiserror::Error;

/// Columns the cohort builder discards before derivation.
pub const COHORT_CLEANUP_COLUMNS: [&str; 26] = [
    "multyear",
    "sample",
    "serial",
    "cbserial",
    "hhwt",
    "cluster",
    "stateicp",
    "countyicp",
    "strata",
    "gq",
    "pernum",
    "perwt",
    "birthqtr",
    "educ",
    "occ2010",
    "presgl",
    "race_mom",
    "race_pop",
    "hispan_mom",
    "hispan_pop",
    "educ_mom",
    "educ_pop",
    "empstat_mom",
    "empstat_pop",
    "empstatd_mom",
    "empstatd_pop",
];

/// Second-parent columns; a value in any of them marks a same-sex household.
pub const COHORT_SAME_SEX_COLUMNS: [&str; 16] = [
    "educd_mom2",
    "educ_mom2",
    "educd_pop2",
    "educ_pop2",
    "incwage_mom2",
    "incwage_pop2",
    "poverty_mom2",
    "poverty_pop2",
    "race_mom2",
    "race_pop2",
    "empstat_mom2",
    "empstat_pop2",
    "empstatd_mom2",
    "empstatd_pop2",
    "hispan_mom2",
    "hispan_pop2",
];

/// Survey bookkeeping columns the regression runner discards.
pub const REGRESSION_CLEANUP_COLUMNS: [&str; 11] = [
    "multyear", "sample", "serial", "cbserial", "hhwt", "cluster", "stateicp", "strata", "gq",
    "pernum", "perwt",
];

pub const REGRESSION_SAME_SEX_COLUMNS: [&str; 2] = ["educd_mom2", "educd_pop2"];

/// General education label marking records without attainment data.
pub const NO_EDUCATION_DATA: &str = "n/a or no schooling";

/// Detailed education label excluded from the regression sample.
pub const ASSOCIATE_DEGREE: &str = "associate's degree, type not specified";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

fn require_columns(df: &DataFrame, names: &[&str]) -> Result<(), FilterError> {
    let schema = df.schema();
    match names.iter().find(|name| !schema.contains(name)) {
        Some(missing) => Err(FilterError::MissingColumn {
            column: missing.to_string(),
        }),
        None => Ok(()),
    }
}

/// Remove the named columns.
pub fn drop_columns(df: &DataFrame, names: &[&str]) -> Result<DataFrame, FilterError> {
    require_columns(df, names)?;
    log::debug!("Dropping {} columns", names.len());
    Ok(df.drop_many(names.iter().copied()))
}

/// Remove rows where any of the named columns holds a value.
pub fn drop_rows_with_any_present(df: &DataFrame, names: &[&str]) -> Result<DataFrame, FilterError> {
    require_columns(df, names)?;
    let any_present = names
        .iter()
        .map(|name| col(*name).is_not_null())
        .reduce(|acc, e| acc.or(e));

    let out = match any_present {
        Some(predicate) => df.clone().lazy().filter(predicate.not()).collect()?,
        None => df.clone(),
    };
    log_removed("any-present", df, &out);
    Ok(out)
}

/// Remove rows whose `column` equals `label`. Null cells are kept.
pub fn drop_rows_equal(df: &DataFrame, column: &str, label: &str) -> Result<DataFrame, FilterError> {
    require_columns(df, &[column])?;
    let out = df
        .clone()
        .lazy()
        .filter(col(column).cast(DataType::String).neq_missing(lit(label)))
        .collect()?;
    log_removed(column, df, &out);
    Ok(out)
}

/// Keep only rows whose `column` equals `label`.
pub fn keep_rows_equal(df: &DataFrame, column: &str, label: &str) -> Result<DataFrame, FilterError> {
    require_columns(df, &[column])?;
    let out = df
        .clone()
        .lazy()
        .filter(col(column).cast(DataType::String).eq(lit(label)))
        .collect()?;
    log_removed(column, df, &out);
    Ok(out)
}

/// Convert `column` to Float64; text that is not a number becomes null.
pub fn coerce_numeric(df: &DataFrame, column: &str) -> Result<DataFrame, FilterError> {
    require_columns(df, &[column])?;
    let out = df
        .clone()
        .lazy()
        .with_column(col(column).cast(DataType::Float64))
        .collect()?;
    Ok(out)
}

/// Remove rows where `column` is null.
pub fn drop_null_rows(df: &DataFrame, column: &str) -> Result<DataFrame, FilterError> {
    require_columns(df, &[column])?;
    let out = df
        .clone()
        .lazy()
        .filter(col(column).is_not_null())
        .collect()?;
    log_removed(column, df, &out);
    Ok(out)
}

/// Coerce `age` to a number and drop rows where it is not one.
pub fn numeric_age(df: &DataFrame) -> Result<DataFrame, FilterError> {
    let coerced = coerce_numeric(df, "age")?;
    drop_null_rows(&coerced, "age")
}

/// Keep rows observed at exactly `age` years.
pub fn keep_age(df: &DataFrame, age: u32) -> Result<DataFrame, FilterError> {
    let numeric = numeric_age(df)?;
    let out = numeric
        .clone()
        .lazy()
        .filter(col("age").eq(lit(age as f64)))
        .collect()?;
    log_removed("age", &numeric, &out);
    Ok(out)
}

/// Cleanup sequence applied by the cohort builder.
pub fn cohort_sample(df: &DataFrame) -> Result<DataFrame, FilterError> {
    let df = drop_columns(df, &COHORT_CLEANUP_COLUMNS)?;
    let df = drop_rows_with_any_present(&df, &COHORT_SAME_SEX_COLUMNS)?;
    let df = drop_columns(&df, &COHORT_SAME_SEX_COLUMNS)?;
    numeric_age(&df)
}

/// Cleanup sequence applied by the regression runner.
pub fn regression_sample(df: &DataFrame) -> Result<DataFrame, FilterError> {
    let df = drop_columns(df, &REGRESSION_CLEANUP_COLUMNS)?;
    let df = drop_rows_with_any_present(&df, &REGRESSION_SAME_SEX_COLUMNS)?;
    let df = drop_columns(&df, &REGRESSION_SAME_SEX_COLUMNS)?;
    let df = drop_rows_equal(&df, "educ", NO_EDUCATION_DATA)?;
    let df = keep_age(&df, 18)?;
    drop_rows_equal(&df, "educd", ASSOCIATE_DEGREE)
}

fn log_removed(stage: &str, before: &DataFrame, after: &DataFrame) {
    let removed = before.height().saturating_sub(after.height());
    if removed > 0 {
        log::info!("Filter on '{}' removed {} rows", stage, removed);
    }
}
