//! Average partial effects of a fitted probit.

use faer::Mat;
use serde::Serialize;

use super::covariance::{CoefficientTable, Inference};
use super::design::DesignMatrix;
use super::error::RegressionError;
use super::norm_pdf;
use super::probit::ProbitResults;

/// `dP(y=1)/dx_j` averaged over the sample, one row per non-intercept
/// regressor.
#[derive(Debug, Clone, Serialize)]
pub struct MarginalEffects {
    pub outcome: String,
    pub nobs: usize,
    pub effects: CoefficientTable,
}

/// Mean of `φ(x_iβ) β_j` over observations, with delta-method standard
/// errors from the probit's parameter covariance.
///
/// The design must be the one the probit was fitted on; the intercept
/// (column 0) gets no effect.
pub fn average_partial_effects(
    probit: &ProbitResults,
    design: &DesignMatrix,
) -> Result<MarginalEffects, RegressionError> {
    if design.nobs() != probit.nobs {
        return Err(RegressionError::LengthMismatch {
            left: design.nobs(),
            right: probit.nobs,
        });
    }
    let n = design.nobs();
    let k = design.ncols();
    let nf = n as f64;
    let beta = &probit.params;
    let xb = &probit.linear_predictor;
    let density: Vec<f64> = xb.iter().map(|&z| norm_pdf(z)).collect();
    let mean_density = density.iter().sum::<f64>() / nf;

    let effects: Vec<f64> = (1..k).map(|j| mean_density * beta[j]).collect();

    // ∂APE_j/∂β_l = mean[φ_i δ_jl - β_j x_iβ φ_i x_il]
    let curvature: Vec<f64> = (0..k)
        .map(|l| {
            (0..n)
                .map(|i| xb[i] * density[i] * design.x[(i, l)])
                .sum::<f64>()
                / nf
        })
        .collect();
    let jacobian = Mat::from_fn(k - 1, k, |row, l| {
        let j = row + 1;
        let own = if j == l { mean_density } else { 0.0 };
        own - beta[j] * curvature[l]
    });

    let left = &jacobian * &probit.cov;
    let right = jacobian.transpose().to_owned();
    let cov = &left * &right;

    let names = design.names[1..].to_vec();
    let table = CoefficientTable::new(names, effects, &cov, Inference::Normal)?;

    Ok(MarginalEffects {
        outcome: probit.outcome.clone(),
        nobs: n,
        effects: table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::regression::probit::{fit_probit, ProbitOptions};

    #[test]
    fn test_effect_is_mean_density_times_coefficient() {
        let xs = [-2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5, 2.0, 2.5];
        let ys = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0];
        let x = Mat::from_fn(10, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
        let design =
            DesignMatrix::from_parts("y", vec!["Intercept".into(), "x".into()], x, ys).unwrap();
        let probit = fit_probit(&design, &ProbitOptions::default()).unwrap();
        let ape = average_partial_effects(&probit, &design).unwrap();

        let mean_pdf: f64 = probit
            .linear_predictor
            .iter()
            .map(|&z| norm_pdf(z))
            .sum::<f64>()
            / 10.0;
        assert_eq!(ape.effects.names, vec!["x".to_string()]);
        assert!((ape.effects.estimates[0] - mean_pdf * probit.params[1]).abs() < 1e-12);
        assert!(ape.effects.std_errors[0] > 0.0);
        // Effect on a probability scale is smaller than the index coefficient
        assert!(ape.effects.estimates[0].abs() < probit.params[1].abs());
    }
}
