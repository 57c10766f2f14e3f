//! Ordinary least squares (the linear probability model).

use std::f64::consts::PI;

use faer::Mat;
use serde::Serialize;

use super::covariance::{CoefficientTable, CovarianceType, Inference};
use super::design::{invert_spd, mat_vec, sandwich, DesignMatrix};
use super::error::RegressionError;

#[derive(Debug, Clone, Serialize)]
pub struct OlsResults {
    pub outcome: String,
    pub coefficients: CoefficientTable,
    pub cov_type: CovarianceType,
    pub nobs: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub ssr: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    #[serde(skip)]
    pub params: Vec<f64>,
    #[serde(skip)]
    pub fitted: Vec<f64>,
    #[serde(skip)]
    pub residuals: Vec<f64>,
    #[serde(skip)]
    pub cov: Mat<f64>,
}

/// Fits `y = Xβ + ε` by least squares.
///
/// Non-robust inference uses Student-t with `n - k` degrees of freedom;
/// sandwich estimators use the normal distribution.
pub fn fit_ols(design: &DesignMatrix, cov_type: CovarianceType) -> Result<OlsResults, RegressionError> {
    let n = design.nobs();
    let k = design.ncols();

    let xtx_inv = invert_spd(&design.gram(None), "OLS normal equations")?;
    let params = mat_vec(&xtx_inv, &design.xt_vec(&design.y));
    let fitted = design.linear_predictor(&params);
    let residuals: Vec<f64> = design.y.iter().zip(&fitted).map(|(y, f)| y - f).collect();

    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    let y_mean = design.y.iter().sum::<f64>() / n as f64;
    let sst: f64 = design.y.iter().map(|y| (y - y_mean).powi(2)).sum();
    let df_resid = n - k;
    let df_model = k - 1;

    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_resid as f64;
    let f_statistic = if df_model > 0 {
        (r_squared / df_model as f64) / ((1.0 - r_squared) / df_resid as f64)
    } else {
        f64::NAN
    };

    let cov = match cov_type {
        CovarianceType::NonRobust => {
            let s2 = ssr / df_resid as f64;
            Mat::from_fn(k, k, |i, j| xtx_inv[(i, j)] * s2)
        }
        robust => {
            let leverage = design.leverage(&xtx_inv, None);
            let scale: Vec<f64> = leverage
                .iter()
                .map(|&h| robust.meat_weight(h, n, k))
                .collect();
            let meat = design.outer_product_sum(&residuals, &scale);
            sandwich(&xtx_inv, &meat)
        }
    };

    let inference = if cov_type.is_robust() {
        Inference::Normal
    } else {
        Inference::StudentT {
            df: df_resid as f64,
        }
    };
    let coefficients = CoefficientTable::new(design.names.clone(), params.clone(), &cov, inference)?;

    let nf = n as f64;
    let log_likelihood = -nf / 2.0 * ((2.0 * PI).ln() + (ssr / nf).ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * k as f64;
    let bic = -2.0 * log_likelihood + k as f64 * nf.ln();

    log::debug!(
        "OLS '{}' ({}): n={}, R²={:.4}",
        design.outcome,
        cov_type.label(),
        n,
        r_squared
    );

    Ok(OlsResults {
        outcome: design.outcome.clone(),
        coefficients,
        cov_type,
        nobs: n,
        df_model,
        df_resid,
        r_squared,
        adj_r_squared,
        f_statistic,
        ssr,
        log_likelihood,
        aic,
        bic,
        params,
        fitted,
        residuals,
        cov,
    })
}
