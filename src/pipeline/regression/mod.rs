//! Regression engine: design matrices, OLS, probit and diagnostics
//!
//! [`fit_suite`] runs the fixed sequence of models reported for the
//! high-school completion outcome.

pub mod covariance;
pub mod design;
pub mod diagnostics;
pub mod error;
pub mod margins;
pub mod ols;
pub mod probit;

pub use covariance::{CoefficientTable, CovarianceType, Inference};
pub use design::{DesignMatrix, INTERCEPT};
pub use diagnostics::{
    breusch_pagan, confusion_matrix, endogeneity_test, BreuschPagan, ConfusionMatrix,
    EndogeneityTest,
};
pub use error::RegressionError;
pub use margins::{average_partial_effects, MarginalEffects};
pub use ols::{fit_ols, OlsResults};
pub use probit::{fit_probit, ProbitOptions, ProbitResults};

use std::f64::consts::{PI, SQRT_2};

use polars::prelude::DataFrame;
use serde::Serialize;
use statrs::function::erf::erfc;

/// Two-sided 95% normal critical value.
pub(crate) const Z_975: f64 = 1.959_963_984_540_054;

/// Standard normal CDF.
pub(crate) fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal density.
pub(crate) fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

pub const OUTCOME: &str = "hs";

/// A named right-hand side for the `hs` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub regressors: &'static [&'static str],
}

pub const FULL_MODEL: ModelSpec = ModelSpec {
    name: "full",
    regressors: &[
        "treatment",
        "nsibs",
        "foodstmp",
        "higher_hs_mom",
        "higher_hs_pop",
        "female",
        "black",
        "hisp",
    ],
};

/// Also the reduced model of the endogeneity comparison.
pub const WITHOUT_PARENTS: ModelSpec = ModelSpec {
    name: "without_parental_education",
    regressors: &["treatment", "nsibs", "foodstmp", "female", "black", "hisp"],
};

pub const WITHOUT_SIBLINGS: ModelSpec = ModelSpec {
    name: "without_siblings",
    regressors: &[
        "treatment",
        "foodstmp",
        "higher_hs_mom",
        "higher_hs_pop",
        "female",
        "black",
        "hisp",
    ],
};

pub const WITHOUT_BOTH: ModelSpec = ModelSpec {
    name: "without_parents_or_siblings",
    regressors: &["treatment", "foodstmp", "female", "black", "hisp"],
};

pub const ROBUSTNESS_MODELS: [ModelSpec; 3] = [WITHOUT_PARENTS, WITHOUT_SIBLINGS, WITHOUT_BOTH];

/// Columns kept in the analysis frame.
pub const ANALYSIS_COLUMNS: [&str; 12] = [
    "year",
    "foodstmp",
    "nsibs",
    "age",
    "birthyr",
    "treatment",
    "hs",
    "higher_hs_mom",
    "higher_hs_pop",
    "female",
    "black",
    "hisp",
];

impl ModelSpec {
    pub fn design(&self, df: &DataFrame) -> Result<DesignMatrix, RegressionError> {
        DesignMatrix::from_frame(df, OUTCOME, self.regressors)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RobustnessFit {
    pub model: &'static str,
    pub probit: ProbitResults,
}

/// Every model and diagnostic of one regression run.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSuite {
    pub probit: ProbitResults,
    pub breusch_pagan: BreuschPagan,
    pub linear_probability: OlsResults,
    pub robust_probit: ProbitResults,
    pub confusion: ConfusionMatrix,
    pub threshold: f64,
    pub marginal_effects: MarginalEffects,
    pub reduced_probit: ProbitResults,
    pub endogeneity: EndogeneityTest,
    pub robustness: Vec<RobustnessFit>,
}

/// Fits the full sequence on the analysis frame.
///
/// `options.cov_type` is ignored. The first probit (and the partial effects
/// taken from it) uses the model-based covariance; every later probit uses
/// HC3.
pub fn fit_suite(
    df: &DataFrame,
    options: &ProbitOptions,
    threshold: f64,
) -> Result<ModelSuite, RegressionError> {
    let plain = options.with_cov_type(CovarianceType::NonRobust);
    let robust = options.with_cov_type(CovarianceType::HC3);
    let full = FULL_MODEL.design(df)?;
    log::info!(
        "Fitting '{}' on {} observations ({} parameters)",
        FULL_MODEL.name,
        full.nobs(),
        full.ncols()
    );

    let probit = fit_probit(&full, &plain)?;
    let breusch_pagan = breusch_pagan(&probit.deviance_residuals, &full)?;
    let linear_probability = fit_ols(&full, CovarianceType::HC3)?;
    let robust_probit = fit_probit(&full, &robust)?;
    let confusion = confusion_matrix(&robust_probit.actual, &robust_probit.fitted, threshold)?;
    let marginal_effects = average_partial_effects(&probit, &full)?;

    let reduced = WITHOUT_PARENTS.design(df)?;
    let reduced_probit = fit_probit(&reduced, &robust)?;
    let endogeneity = endogeneity_test(
        &robust_probit.deviance_residuals,
        &reduced_probit.deviance_residuals,
        full.ncols(),
    )?;

    let robustness = ROBUSTNESS_MODELS
        .iter()
        .map(|spec| {
            let design = spec.design(df)?;
            Ok(RobustnessFit {
                model: spec.name,
                probit: fit_probit(&design, &robust)?,
            })
        })
        .collect::<Result<Vec<_>, RegressionError>>()?;

    Ok(ModelSuite {
        probit,
        breusch_pagan,
        linear_probability,
        robust_probit,
        confusion,
        threshold,
        marginal_effects,
        reduced_probit,
        endogeneity,
        robustness,
    })
}
