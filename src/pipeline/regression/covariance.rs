//! Covariance estimators and the coefficient table built from them.

use faer::Mat;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::error::RegressionError;
use super::{norm_cdf, Z_975};

/// Parameter covariance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CovarianceType {
    /// Model-based (inverse information or `s²(XᵀX)⁻¹`).
    NonRobust,
    /// White sandwich.
    HC0,
    /// HC0 scaled by `n / (n - k)`.
    HC1,
    /// Sandwich with each observation weighted by `1 / (1 - h_ii)²`.
    HC3,
}

impl CovarianceType {
    pub fn is_robust(self) -> bool {
        self != CovarianceType::NonRobust
    }

    pub fn label(self) -> &'static str {
        match self {
            CovarianceType::NonRobust => "nonrobust",
            CovarianceType::HC0 => "HC0",
            CovarianceType::HC1 => "HC1",
            CovarianceType::HC3 => "HC3",
        }
    }

    /// Per-observation meat weight given leverage `h`.
    pub fn meat_weight(self, leverage: f64, nobs: usize, ncols: usize) -> f64 {
        match self {
            CovarianceType::NonRobust | CovarianceType::HC0 => 1.0,
            CovarianceType::HC1 => nobs as f64 / (nobs - ncols) as f64,
            CovarianceType::HC3 => 1.0 / (1.0 - leverage).powi(2),
        }
    }
}

/// Reference distribution for the test statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Inference {
    Normal,
    StudentT { df: f64 },
}

/// Estimates with standard errors, test statistics, p-values and 95% intervals.
#[derive(Debug, Clone, Serialize)]
pub struct CoefficientTable {
    pub names: Vec<String>,
    pub estimates: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub statistics: Vec<f64>,
    pub p_values: Vec<f64>,
    pub conf_low: Vec<f64>,
    pub conf_high: Vec<f64>,
    pub inference: Inference,
}

impl CoefficientTable {
    pub fn new(
        names: Vec<String>,
        estimates: Vec<f64>,
        cov: &Mat<f64>,
        inference: Inference,
    ) -> Result<Self, RegressionError> {
        let std_errors: Vec<f64> = (0..estimates.len())
            .map(|i| cov[(i, i)].max(0.0).sqrt())
            .collect();
        Self::from_std_errors(names, estimates, std_errors, inference)
    }

    pub fn from_std_errors(
        names: Vec<String>,
        estimates: Vec<f64>,
        std_errors: Vec<f64>,
        inference: Inference,
    ) -> Result<Self, RegressionError> {
        let statistics: Vec<f64> = estimates
            .iter()
            .zip(&std_errors)
            .map(|(b, se)| b / se)
            .collect();

        let (p_values, critical) = match inference {
            Inference::Normal => (
                statistics
                    .iter()
                    .map(|z| 2.0 * (1.0 - norm_cdf(z.abs())))
                    .collect::<Vec<f64>>(),
                Z_975,
            ),
            Inference::StudentT { df } => {
                let t = StudentsT::new(0.0, 1.0, df)
                    .map_err(|e| RegressionError::Distribution(e.to_string()))?;
                (
                    statistics
                        .iter()
                        .map(|s| 2.0 * (1.0 - t.cdf(s.abs())))
                        .collect(),
                    t.inverse_cdf(0.975),
                )
            }
        };

        let conf_low = estimates
            .iter()
            .zip(&std_errors)
            .map(|(b, se)| b - critical * se)
            .collect();
        let conf_high = estimates
            .iter()
            .zip(&std_errors)
            .map(|(b, se)| b + critical * se)
            .collect();

        Ok(Self {
            names,
            estimates,
            std_errors,
            statistics,
            p_values,
            conf_low,
            conf_high,
            inference,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn estimate(&self, name: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == name)?;
        Some(self.estimates[i])
    }

    pub fn std_error(&self, name: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == name)?;
        Some(self.std_errors[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_table() {
        let cov = Mat::from_fn(2, 2, |i, j| if i == j { 0.25 } else { 0.0 });
        let table = CoefficientTable::new(
            vec!["Intercept".into(), "x".into()],
            vec![1.0, 0.0],
            &cov,
            Inference::Normal,
        )
        .unwrap();

        assert_eq!(table.std_errors, vec![0.5, 0.5]);
        assert!((table.statistics[0] - 2.0).abs() < 1e-12);
        assert!((table.p_values[0] - 0.0455).abs() < 1e-3);
        assert!((table.p_values[1] - 1.0).abs() < 1e-12);
        assert!((table.conf_high[0] - (1.0 + Z_975 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_meat_weights() {
        assert_eq!(CovarianceType::HC0.meat_weight(0.5, 10, 2), 1.0);
        assert_eq!(CovarianceType::HC3.meat_weight(0.5, 10, 2), 4.0);
        assert!((CovarianceType::HC1.meat_weight(0.0, 10, 2) - 1.25).abs() < 1e-12);
    }
}
