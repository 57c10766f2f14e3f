//! Read-only descriptive statistics: frequency tables, cross-tabulations,
//! summary statistics and the correlation matrix.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;

/// Ordering of a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOrder {
    /// Most frequent first.
    ByCount,
    /// Sorted by value.
    ByValue,
}

/// Counts per distinct value of `column`. Nulls are not counted.
pub fn value_counts(df: &DataFrame, column: &str, order: CountOrder) -> Result<Vec<(String, u64)>> {
    let source = df
        .column(column)
        .with_context(|| format!("Column '{}' not found", column))?;

    let mut counts: BTreeMap<SortKey, u64> = BTreeMap::new();
    for value in text_values(source)?.into_iter().flatten() {
        *counts.entry(SortKey::new(value)).or_insert(0) += 1;
    }

    let mut rows: Vec<(String, u64)> = counts.into_iter().map(|(k, n)| (k.text, n)).collect();
    if order == CountOrder::ByCount {
        // Stable sort keeps value order among ties
        rows.sort_by(|a, b| b.1.cmp(&a.1));
    }
    Ok(rows)
}

/// Two-way frequency table with row, column and grand totals.
#[derive(Debug, Clone)]
pub struct CrossTab {
    pub row_name: String,
    pub col_name: String,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `counts[i][j]` for row label `i` and column label `j`.
    pub counts: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.col_labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }

    pub fn grand_total(&self) -> u64 {
        self.row_totals().iter().sum()
    }
}

/// Cross-tabulate two columns; rows where either is null are left out.
pub fn crosstab(df: &DataFrame, row: &str, col: &str) -> Result<CrossTab> {
    let rows = text_values(
        df.column(row)
            .with_context(|| format!("Column '{}' not found", row))?,
    )?;
    let cols = text_values(
        df.column(col)
            .with_context(|| format!("Column '{}' not found", col))?,
    )?;

    let mut cells: BTreeMap<(SortKey, SortKey), u64> = BTreeMap::new();
    let mut row_keys = BTreeMap::new();
    let mut col_keys = BTreeMap::new();
    for (r, c) in rows.into_iter().zip(cols) {
        if let (Some(r), Some(c)) = (r, c) {
            let (rk, ck) = (SortKey::new(r), SortKey::new(c));
            row_keys.insert(rk.clone(), ());
            col_keys.insert(ck.clone(), ());
            *cells.entry((rk, ck)).or_insert(0) += 1;
        }
    }

    let row_keys: Vec<SortKey> = row_keys.into_keys().collect();
    let col_keys: Vec<SortKey> = col_keys.into_keys().collect();
    let counts = row_keys
        .iter()
        .map(|rk| {
            col_keys
                .iter()
                .map(|ck| *cells.get(&(rk.clone(), ck.clone())).unwrap_or(&0))
                .collect()
        })
        .collect();

    Ok(CrossTab {
        row_name: row.to_string(),
        col_name: col.to_string(),
        row_labels: row_keys.into_iter().map(|k| k.text).collect(),
        col_labels: col_keys.into_iter().map(|k| k.text).collect(),
        counts,
    })
}

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Count, mean, std, min, quartiles and max for each column.
pub fn describe(df: &DataFrame, columns: &[&str]) -> Result<Vec<ColumnSummary>> {
    columns
        .iter()
        .map(|name| {
            let mut values = float_values(df, name)?
                .into_iter()
                .flatten()
                .collect::<Vec<f64>>();
            values.sort_by(|a, b| a.total_cmp(b));
            Ok(summarize(name, &values))
        })
        .collect()
}

fn summarize(name: &str, sorted: &[f64]) -> ColumnSummary {
    let count = sorted.len();
    let mean = if count > 0 {
        sorted.iter().sum::<f64>() / count as f64
    } else {
        f64::NAN
    };
    let std = if count > 1 {
        let ss: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    ColumnSummary {
        name: name.to_string(),
        count,
        mean,
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q75: quantile(sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Linear-interpolation quantile of sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Percentage of all rows where the column equals 1.
pub fn indicator_shares(df: &DataFrame, columns: &[&str]) -> Result<Vec<(String, f64)>> {
    let height = df.height();
    columns
        .iter()
        .map(|name| {
            let ones = float_values(df, name)?
                .into_iter()
                .filter(|v| *v == Some(1.0))
                .count();
            let share = if height > 0 {
                ones as f64 / height as f64 * 100.0
            } else {
                f64::NAN
            };
            Ok((name.to_string(), share))
        })
        .collect()
}

/// Pearson correlation matrix of the named columns.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Mat<f64>,
    /// Rows with no nulls in any of the columns.
    pub nobs: usize,
    /// Rows non-null in both columns of each pair.
    pub pair_nobs: Vec<Vec<usize>>,
}

impl CorrelationMatrix {
    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.values[(self.position(a)?, self.position(b)?)])
    }

    pub fn pair_count(&self, a: &str, b: &str) -> Option<usize> {
        Some(self.pair_nobs[self.position(a)?][self.position(b)?])
    }
}

/// Correlation matrix over pairwise-complete observations.
///
/// Each entry uses the rows where both columns are non-null. When no column
/// has nulls the columns are standardized in parallel and the matrix is
/// formed as `ZᵀZ`. An entry whose pair has fewer than two rows, or a
/// constant column over its rows, is NaN.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    let raw: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| float_values(df, name))
        .collect::<Result<_>>()?;

    let height = df.height();
    if height < 2 {
        anyhow::bail!("Correlation needs at least 2 rows, found {}", height);
    }

    let complete = (0..height)
        .filter(|&row| raw.iter().all(|col| col[row].is_some()))
        .count();
    let n_cols = columns.len();

    let (values, pair_nobs) = if complete == height {
        (standardized_product(&raw, height), vec![vec![height; n_cols]; n_cols])
    } else {
        pairwise(&raw)
    };

    Ok(CorrelationMatrix {
        names: columns.iter().map(|s| s.to_string()).collect(),
        values,
        nobs: complete,
        pair_nobs,
    })
}

/// `ZᵀZ` over columns without nulls.
fn standardized_product(raw: &[Vec<Option<f64>>], n_rows: usize) -> Mat<f64> {
    let n_cols = raw.len();

    // Standardize with population moments so that ZᵀZ is the Pearson matrix
    let standardized: Vec<Option<Vec<f64>>> = raw
        .par_iter()
        .map(|col| {
            let values: Vec<f64> = col.iter().flatten().copied().collect();
            let mean = values.iter().sum::<f64>() / n_rows as f64;
            let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n_rows as f64;
            let std = var.sqrt();
            if std == 0.0 {
                return None;
            }
            let scale = std * (n_rows as f64).sqrt();
            Some(values.iter().map(|x| (x - mean) / scale).collect())
        })
        .collect();

    let mut z = Mat::<f64>::zeros(n_rows, n_cols);
    for (col_idx, col) in standardized.iter().enumerate() {
        if let Some(values) = col {
            for (row_idx, &val) in values.iter().enumerate() {
                z[(row_idx, col_idx)] = val;
            }
        }
    }

    let mut values = z.transpose() * &z;
    for (idx, col) in standardized.iter().enumerate() {
        if col.is_none() {
            for k in 0..n_cols {
                values[(idx, k)] = f64::NAN;
                values[(k, idx)] = f64::NAN;
            }
        }
    }
    values
}

fn pairwise(raw: &[Vec<Option<f64>>]) -> (Mat<f64>, Vec<Vec<usize>>) {
    let n_cols = raw.len();
    let pairs: Vec<(usize, usize)> = (0..n_cols)
        .flat_map(|i| (i..n_cols).map(move |j| (i, j)))
        .collect();
    let entries: Vec<(f64, usize)> = pairs
        .par_iter()
        .map(|&(i, j)| pair_correlation(&raw[i], &raw[j], i == j))
        .collect();

    let mut values = Mat::<f64>::zeros(n_cols, n_cols);
    let mut counts = vec![vec![0; n_cols]; n_cols];
    for (&(i, j), &(r, n)) in pairs.iter().zip(&entries) {
        values[(i, j)] = r;
        values[(j, i)] = r;
        counts[i][j] = n;
        counts[j][i] = n;
    }
    (values, counts)
}

fn pair_correlation(a: &[Option<f64>], b: &[Option<f64>], same: bool) -> (f64, usize) {
    let both: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    let n = both.len();
    if n < 2 {
        return (f64::NAN, n);
    }

    let mean_a = both.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_b = both.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let (mut saa, mut sbb, mut sab) = (0.0, 0.0, 0.0);
    for (x, y) in &both {
        let (da, db) = (x - mean_a, y - mean_b);
        saa += da * da;
        sbb += db * db;
        sab += da * db;
    }

    let r = if saa == 0.0 || sbb == 0.0 {
        f64::NAN
    } else if same {
        1.0
    } else {
        (sab / (saa * sbb).sqrt()).clamp(-1.0, 1.0)
    };
    (r, n)
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    Ok(column.f64()?.into_iter().collect())
}

fn text_values(column: &Column) -> Result<Vec<Option<String>>> {
    let text = column.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Orders numeric labels numerically and everything else lexically.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SortKey {
    text: String,
}

impl SortKey {
    fn new(text: String) -> Self {
        Self { text }
    }

    fn number(&self) -> Option<f64> {
        self.text.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.text.cmp(&other.text)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
