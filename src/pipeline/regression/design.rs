//! Design matrix assembly and the small amount of linear algebra the
//! estimators share.

use faer::prelude::SolverCore;
use faer::Mat;
use polars::prelude::*;

use super::error::RegressionError;

pub const INTERCEPT: &str = "Intercept";

/// Outcome vector and regressor matrix (intercept first) over complete rows.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub outcome: String,
    /// Column names, `Intercept` first.
    pub names: Vec<String>,
    pub x: Mat<f64>,
    pub y: Vec<f64>,
    /// Rows removed because a used column was null.
    pub dropped: usize,
}

impl DesignMatrix {
    /// Builds `outcome ~ 1 + regressors` from the frame, dropping any row
    /// with a null in one of the used columns.
    pub fn from_frame(
        df: &DataFrame,
        outcome: &str,
        regressors: &[&str],
    ) -> Result<Self, RegressionError> {
        let y_raw = numeric_column(df, outcome)?;
        let x_raw: Vec<Vec<Option<f64>>> = regressors
            .iter()
            .map(|name| numeric_column(df, name))
            .collect::<Result<_, _>>()?;

        let complete: Vec<usize> = (0..df.height())
            .filter(|&row| y_raw[row].is_some() && x_raw.iter().all(|col| col[row].is_some()))
            .collect();

        let n = complete.len();
        let k = regressors.len() + 1;
        let x = Mat::from_fn(n, k, |i, j| {
            if j == 0 {
                1.0
            } else {
                x_raw[j - 1][complete[i]].unwrap_or(f64::NAN)
            }
        });
        let y: Vec<f64> = complete
            .iter()
            .map(|&row| y_raw[row].unwrap_or(f64::NAN))
            .collect();

        let dropped = df.height() - n;
        if dropped > 0 {
            log::info!(
                "Design for '{}': dropped {} rows with missing values",
                outcome,
                dropped
            );
        }

        let mut names = Vec::with_capacity(k);
        names.push(INTERCEPT.to_string());
        names.extend(regressors.iter().map(|s| s.to_string()));

        let design = Self {
            outcome: outcome.to_string(),
            names,
            x,
            y,
            dropped,
        };
        design.check_rank_condition()?;
        Ok(design)
    }

    /// Builds a design from an existing matrix (intercept column included).
    pub fn from_parts(outcome: &str, names: Vec<String>, x: Mat<f64>, y: Vec<f64>) -> Result<Self, RegressionError> {
        if x.nrows() != y.len() {
            return Err(RegressionError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        let design = Self {
            outcome: outcome.to_string(),
            names,
            x,
            y,
            dropped: 0,
        };
        design.check_rank_condition()?;
        Ok(design)
    }

    fn check_rank_condition(&self) -> Result<(), RegressionError> {
        if self.nobs() <= self.ncols() {
            return Err(RegressionError::InsufficientObservations {
                nobs: self.nobs(),
                ncols: self.ncols(),
            });
        }
        Ok(())
    }

    pub fn nobs(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// Same regressors with a different outcome vector.
    pub fn with_outcome(&self, outcome: &str, y: Vec<f64>) -> Result<Self, RegressionError> {
        Self::from_parts(outcome, self.names.clone(), self.x.clone(), y)
    }

    /// `X β`.
    pub fn linear_predictor(&self, beta: &[f64]) -> Vec<f64> {
        (0..self.nobs())
            .map(|i| (0..self.ncols()).map(|j| self.x[(i, j)] * beta[j]).sum())
            .collect()
    }

    /// `Xᵀ v`.
    pub fn xt_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.ncols())
            .map(|j| (0..self.nobs()).map(|i| self.x[(i, j)] * v[i]).sum())
            .collect()
    }

    /// `Xᵀ diag(w) X`, or `XᵀX` when no weights are given.
    pub fn gram(&self, weights: Option<&[f64]>) -> Mat<f64> {
        let scaled = Mat::from_fn(self.nobs(), self.ncols(), |i, j| {
            let w = weights.map_or(1.0, |w| w[i]);
            self.x[(i, j)] * w.sqrt()
        });
        scaled.transpose() * &scaled
    }

    /// `Σ c_i s_i s_iᵀ` where `s_i = x_i * scores[i]`.
    pub fn outer_product_sum(&self, scores: &[f64], scale: &[f64]) -> Mat<f64> {
        let s = Mat::from_fn(self.nobs(), self.ncols(), |i, j| {
            self.x[(i, j)] * scores[i] * scale[i].sqrt()
        });
        s.transpose() * &s
    }

    /// Diagonal of `diag(√w) X A Xᵀ diag(√w)`: observation leverages for a
    /// weighted fit with `A = (XᵀWX)⁻¹`.
    pub fn leverage(&self, inverse_gram: &Mat<f64>, weights: Option<&[f64]>) -> Vec<f64> {
        let k = self.ncols();
        (0..self.nobs())
            .map(|i| {
                let mut h = 0.0;
                for a in 0..k {
                    let xa = self.x[(i, a)];
                    for b in 0..k {
                        h += xa * inverse_gram[(a, b)] * self.x[(i, b)];
                    }
                }
                h * weights.map_or(1.0, |w| w[i])
            })
            .collect()
    }
}

/// Inverse of a symmetric positive definite matrix via Cholesky.
pub fn invert_spd(m: &Mat<f64>, context: &'static str) -> Result<Mat<f64>, RegressionError> {
    let chol = m
        .cholesky(faer::Side::Lower)
        .map_err(|_| RegressionError::SingularMatrix { context })?;
    let inverse = chol.inverse();
    if (0..inverse.nrows()).any(|i| !inverse[(i, i)].is_finite()) {
        return Err(RegressionError::SingularMatrix { context });
    }
    Ok(inverse)
}

/// `A v` for a square `A`.
pub fn mat_vec(a: &Mat<f64>, v: &[f64]) -> Vec<f64> {
    (0..a.nrows())
        .map(|i| (0..a.ncols()).map(|j| a[(i, j)] * v[j]).sum())
        .collect()
}

/// `A B A` for symmetric `A`: the sandwich form.
pub fn sandwich(bread: &Mat<f64>, meat: &Mat<f64>) -> Mat<f64> {
    let left = bread * meat;
    &left * bread
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, RegressionError> {
    let column = df.column(name).map_err(|_| RegressionError::MissingColumn {
        column: name.to_string(),
    })?;
    if matches!(column.dtype(), DataType::String) {
        return Err(RegressionError::NonNumericColumn {
            column: name.to_string(),
        });
    }
    let values = column.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}
