//! Post-estimation diagnostics: heteroskedasticity, classification and the
//! residual-ratio endogeneity comparison.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

use super::covariance::CovarianceType;
use super::design::DesignMatrix;
use super::error::RegressionError;
use super::ols::fit_ols;

#[derive(Debug, Clone, Serialize)]
pub struct BreuschPagan {
    /// `n · R²` of the auxiliary regression.
    pub lm: f64,
    pub lm_pvalue: f64,
    pub f_statistic: f64,
    pub f_pvalue: f64,
    pub df: usize,
}

/// Studentized (Koenker) Breusch-Pagan test: regress `e²` on the design's
/// regressors and compare `n · R²` against `χ²(k - 1)`.
pub fn breusch_pagan(residuals: &[f64], design: &DesignMatrix) -> Result<BreuschPagan, RegressionError> {
    if residuals.len() != design.nobs() {
        return Err(RegressionError::LengthMismatch {
            left: residuals.len(),
            right: design.nobs(),
        });
    }
    let squared: Vec<f64> = residuals.iter().map(|e| e * e).collect();
    let auxiliary = design.with_outcome("resid_sq", squared)?;
    let fit = fit_ols(&auxiliary, CovarianceType::NonRobust)?;

    let n = design.nobs();
    let df = design.ncols() - 1;
    let df_resid = n - design.ncols();
    let r2 = fit.r_squared;
    let lm = n as f64 * r2;
    let f_statistic = (r2 / df as f64) / ((1.0 - r2) / df_resid as f64);

    let chi2 =
        ChiSquared::new(df as f64).map_err(|e| RegressionError::Distribution(e.to_string()))?;
    let fisher = FisherSnedecor::new(df as f64, df_resid as f64)
        .map_err(|e| RegressionError::Distribution(e.to_string()))?;

    Ok(BreuschPagan {
        lm,
        lm_pvalue: 1.0 - chi2.cdf(lm),
        f_statistic,
        f_pvalue: 1.0 - fisher.cdf(f_statistic),
        df,
    })
}

/// 2×2 table: rows are actual 0/1, columns predicted 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_positive: u64,
}

impl ConfusionMatrix {
    pub fn rows(&self) -> [[u64; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    pub fn total(&self) -> u64 {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        (self.true_negative + self.true_positive) as f64 / self.total() as f64
    }
}

/// Classifies each observation as 1 when its probability exceeds
/// `threshold`.
pub fn confusion_matrix(
    actual: &[f64],
    probabilities: &[f64],
    threshold: f64,
) -> Result<ConfusionMatrix, RegressionError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(RegressionError::InvalidThreshold(threshold));
    }
    if actual.len() != probabilities.len() {
        return Err(RegressionError::LengthMismatch {
            left: actual.len(),
            right: probabilities.len(),
        });
    }

    let mut cm = ConfusionMatrix {
        true_negative: 0,
        false_positive: 0,
        false_negative: 0,
        true_positive: 0,
    };
    for (&y, &p) in actual.iter().zip(probabilities) {
        match (y == 1.0, p > threshold) {
            (false, false) => cm.true_negative += 1,
            (false, true) => cm.false_positive += 1,
            (true, false) => cm.false_negative += 1,
            (true, true) => cm.true_positive += 1,
        }
    }
    Ok(cm)
}

/// Ratio of residual sums of squares between two probits, referred to a
/// chi-squared distribution.
#[derive(Debug, Clone, Serialize)]
pub struct EndogeneityTest {
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
}

/// `(r_with · r_with) / (r_without · r_without)` over the deviance
/// residuals of the models with and without the instrument covariates.
///
/// The two residual vectors may differ in length when listwise deletion
/// dropped different rows; each sum runs over its own model.
pub fn endogeneity_test(
    with_instruments: &[f64],
    without_instruments: &[f64],
    df: usize,
) -> Result<EndogeneityTest, RegressionError> {
    let ss = |r: &[f64]| r.iter().map(|v| v * v).sum::<f64>();
    let denominator = ss(without_instruments);
    if denominator == 0.0 {
        return Err(RegressionError::Distribution(
            "residual sum of squares of the reduced model is zero".to_string(),
        ));
    }
    let statistic = ss(with_instruments) / denominator;
    let chi2 =
        ChiSquared::new(df as f64).map_err(|e| RegressionError::Distribution(e.to_string()))?;

    Ok(EndogeneityTest {
        statistic,
        df,
        p_value: 1.0 - chi2.cdf(statistic),
    })
}
