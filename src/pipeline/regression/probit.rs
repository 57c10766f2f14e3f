//! Probit maximum likelihood by Newton-Raphson.

use faer::Mat;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::covariance::{CoefficientTable, CovarianceType, Inference};
use super::design::{invert_spd, mat_vec, sandwich, DesignMatrix};
use super::error::RegressionError;
use super::{norm_cdf, norm_pdf};

/// Smallest probability passed to `ln`.
const PROB_FLOOR: f64 = f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbitOptions {
    pub max_iter: usize,
    /// Converged when every parameter moves less than this in one step.
    pub tolerance: f64,
    pub cov_type: CovarianceType,
}

impl Default for ProbitOptions {
    fn default() -> Self {
        Self {
            max_iter: 35,
            tolerance: 1e-8,
            cov_type: CovarianceType::NonRobust,
        }
    }
}

impl ProbitOptions {
    pub fn with_cov_type(self, cov_type: CovarianceType) -> Self {
        Self { cov_type, ..self }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbitResults {
    pub outcome: String,
    pub coefficients: CoefficientTable,
    pub cov_type: CovarianceType,
    pub nobs: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub log_likelihood: f64,
    pub ll_null: f64,
    pub pseudo_r_squared: f64,
    pub llr: f64,
    pub llr_pvalue: f64,
    pub aic: f64,
    pub bic: f64,
    pub iterations: usize,
    #[serde(skip)]
    pub params: Vec<f64>,
    #[serde(skip)]
    pub cov: Mat<f64>,
    /// `Φ(x_iβ)`.
    #[serde(skip)]
    pub fitted: Vec<f64>,
    /// `x_iβ`.
    #[serde(skip)]
    pub linear_predictor: Vec<f64>,
    #[serde(skip)]
    pub deviance_residuals: Vec<f64>,
    #[serde(skip)]
    pub actual: Vec<f64>,
}

/// `λ_i = q φ(q xb) / Φ(q xb)` with `q = 2y - 1`.
fn generalized_residuals(y: &[f64], xb: &[f64]) -> Vec<f64> {
    y.iter()
        .zip(xb)
        .map(|(&yi, &z)| {
            let q = 2.0 * yi - 1.0;
            let qz = q * z;
            let cdf = norm_cdf(qz);
            // Mills ratio tends to -qz far in the lower tail
            let ratio = if cdf > 1e-300 { norm_pdf(qz) / cdf } else { -qz };
            q * ratio
        })
        .collect()
}

/// Negative Hessian `Σ λ_i(λ_i + x_iβ) x_i x_iᵀ`.
fn information(design: &DesignMatrix, lambda: &[f64], xb: &[f64]) -> Mat<f64> {
    let w: Vec<f64> = lambda.iter().zip(xb).map(|(l, z)| l * (l + z)).collect();
    design.gram(Some(&w))
}

fn log_likelihood(y: &[f64], xb: &[f64]) -> f64 {
    y.iter()
        .zip(xb)
        .map(|(&yi, &z)| {
            let q = 2.0 * yi - 1.0;
            norm_cdf(q * z).clamp(PROB_FLOOR, 1.0).ln()
        })
        .sum()
}

fn check_binary(design: &DesignMatrix) -> Result<(), RegressionError> {
    match design.y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        Some(&value) => Err(RegressionError::NonBinaryOutcome {
            column: design.outcome.clone(),
            value,
        }),
        None => Ok(()),
    }
}

/// Every fitted probability matches its outcome to within rounding.
fn is_separated(y: &[f64], fitted: &[f64]) -> bool {
    y.iter()
        .zip(fitted)
        .all(|(yi, p)| (p - yi).abs() <= 1e-8 + 1e-5 * yi.abs())
}

/// Fits `P(y = 1 | x) = Φ(xβ)`.
///
/// # Errors
/// * `NonBinaryOutcome` - outcome has values other than 0 and 1
/// * `PerfectSeparation` - fitted probabilities reproduce the outcome exactly
/// * `SingularMatrix` - information matrix cannot be inverted
/// * `NoConvergence` - `max_iter` steps without meeting the tolerance
pub fn fit_probit(design: &DesignMatrix, options: &ProbitOptions) -> Result<ProbitResults, RegressionError> {
    check_binary(design)?;

    let n = design.nobs();
    let k = design.ncols();
    let mut beta = vec![0.0; k];
    let mut iterations = 0;
    let mut last_step = f64::INFINITY;

    while iterations < options.max_iter {
        iterations += 1;
        let xb = design.linear_predictor(&beta);
        let lambda = generalized_residuals(&design.y, &xb);
        let score = design.xt_vec(&lambda);
        let info_inv = invert_spd(&information(design, &lambda, &xb), "probit information")?;
        let step = mat_vec(&info_inv, &score);

        for (b, s) in beta.iter_mut().zip(&step) {
            *b += s;
        }
        last_step = step.iter().fold(0.0f64, |m, s| m.max(s.abs()));

        let fitted: Vec<f64> = design
            .linear_predictor(&beta)
            .iter()
            .map(|&z| norm_cdf(z))
            .collect();
        if is_separated(&design.y, &fitted) {
            return Err(RegressionError::PerfectSeparation);
        }
        if last_step < options.tolerance {
            break;
        }
    }

    if last_step >= options.tolerance {
        return Err(RegressionError::NoConvergence {
            iterations,
            step: last_step,
        });
    }
    log::debug!(
        "Probit '{}' converged in {} iterations",
        design.outcome,
        iterations
    );

    let xb = design.linear_predictor(&beta);
    let fitted: Vec<f64> = xb.iter().map(|&z| norm_cdf(z)).collect();
    let lambda = generalized_residuals(&design.y, &xb);
    let info_inv = invert_spd(&information(design, &lambda, &xb), "probit information")?;

    let cov = if options.cov_type.is_robust() {
        score_sandwich(design, &info_inv, &lambda)
    } else {
        info_inv
    };

    let coefficients =
        CoefficientTable::new(design.names.clone(), beta.clone(), &cov, Inference::Normal)?;

    let ll = log_likelihood(&design.y, &xb);
    let ll_null = null_log_likelihood(&design.y);
    let df_model = k - 1;
    let llr = 2.0 * (ll - ll_null);
    let llr_pvalue = if df_model > 0 {
        let chi2 = ChiSquared::new(df_model as f64)
            .map_err(|e| RegressionError::Distribution(e.to_string()))?;
        1.0 - chi2.cdf(llr.max(0.0))
    } else {
        f64::NAN
    };

    let deviance_residuals = design
        .y
        .iter()
        .zip(&fitted)
        .map(|(&y, &p)| deviance_residual(y, p))
        .collect();

    Ok(ProbitResults {
        outcome: design.outcome.clone(),
        coefficients,
        cov_type: options.cov_type,
        nobs: n,
        df_model,
        df_resid: n - k,
        log_likelihood: ll,
        ll_null,
        pseudo_r_squared: 1.0 - ll / ll_null,
        llr,
        llr_pvalue,
        aic: -2.0 * ll + 2.0 * k as f64,
        bic: -2.0 * ll + k as f64 * (n as f64).ln(),
        iterations,
        params: beta,
        cov,
        fitted,
        linear_predictor: xb,
        deviance_residuals,
        actual: design.y.clone(),
    })
}

/// White sandwich `H⁻¹ (Σ λ_i² x_i x_iᵀ) H⁻¹` with no leverage or
/// degrees-of-freedom adjustment. Every robust kind maps here for probit,
/// so an `HC3` request reports the same errors a discrete-choice fit does.
fn score_sandwich(design: &DesignMatrix, info_inv: &Mat<f64>, lambda: &[f64]) -> Mat<f64> {
    let unit = vec![1.0; design.nobs()];
    let meat = design.outer_product_sum(lambda, &unit);
    sandwich(info_inv, &meat)
}

/// Log-likelihood of the intercept-only model, whose MLE reproduces the
/// sample mean.
fn null_log_likelihood(y: &[f64]) -> f64 {
    let n = y.len() as f64;
    let p = (y.iter().sum::<f64>() / n).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
    n * (p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}

/// Signed deviance contribution of one binary observation.
pub fn deviance_residual(y: f64, p: f64) -> f64 {
    if y == 1.0 {
        (2.0 * p.clamp(PROB_FLOOR, 1.0).ln().abs()).sqrt()
    } else {
        -(2.0 * (1.0 - p).clamp(PROB_FLOOR, 1.0).ln().abs()).sqrt()
    }
}
