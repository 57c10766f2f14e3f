//! Regression runner: clean the 18-year-old extract, describe it and fit the
//! high-school completion models

use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;

use crate::pipeline::cohorts::birth_year_treatment;
use crate::pipeline::describe::{
    correlation_matrix, crosstab, describe, indicator_shares, value_counts, CountOrder,
};
use crate::pipeline::dummies::{
    demographic_dummies, high_school_outcome, parent_high_school_dummies, recode_food_stamp,
    recode_siblings,
};
use crate::pipeline::filter::{coerce_numeric, regression_sample};
use crate::pipeline::regression::{fit_suite, ModelSuite, ANALYSIS_COLUMNS};
use crate::report::{
    breusch_pagan_table, coefficient_table, confusion_table, correlation_table, crosstab_table,
    display, endogeneity_table, export_all, marginal_effects_table, ols_summary_table,
    probit_summary_table, shares_table, summary_table, value_counts_table, ExportPaths,
};
use crate::utils::{
    create_spinner, finish_with_success, print_completion, print_config, print_count, print_info,
    print_section, print_step_header, print_step_time, print_success, print_warning,
};

use super::load_step;
use super::settings::RegressSettings;

/// Indicators whose share of ones is reported.
const SHARE_COLUMNS: [&str; 7] = [
    "black",
    "female",
    "hisp",
    "foodstmp",
    "higher_hs_mom",
    "higher_hs_pop",
    "treatment",
];

/// Raw columns the derivations read.
const REQUIRED_COLUMNS: [&str; 11] = [
    "year", "age", "birthyr", "sex", "race", "hispan", "educd", "educd_mom", "educd_pop",
    "foodstmp", "nsibs",
];

fn show_counts(df: &DataFrame, column: &str, order: CountOrder) -> Result<()> {
    print_section(&format!("{} value counts", column));
    display(&value_counts_table(column, &value_counts(df, column, order)?));
    Ok(())
}

fn show_crosstab(df: &DataFrame, row: &str, col: &str) -> Result<()> {
    print_section(&format!("{} by {}", row, col));
    display(&crosstab_table(&crosstab(df, row, col)?));
    Ok(())
}

/// Clean the extract and add every analysis indicator, printing the check
/// tables along the way.
pub fn prepare_analysis_frame(df: &DataFrame) -> Result<DataFrame> {
    // Step 2: Sample restrictions
    print_step_header(2, "Clean Sample");
    let step_start = Instant::now();
    let before = df.height();
    let df = regression_sample(df).context("Failed to clean the extract")?;
    print_count("row(s) removed", before - df.height(), None);
    print_count("18-year-old(s) retained", df.height(), None);
    print_step_time(step_start.elapsed());

    // Step 3: Treatment
    print_step_header(3, "Treatment Assignment");
    let step_start = Instant::now();
    show_counts(&df, "birthyr", CountOrder::ByValue)?;
    let df = birth_year_treatment(&df)?;
    show_crosstab(&df, "year", "treatment")?;
    print_step_time(step_start.elapsed());

    // Step 4: Outcome and covariates
    print_step_header(4, "Outcome and Covariates");
    let step_start = Instant::now();
    let df = high_school_outcome(&df)?;
    show_crosstab(&df, "educd", "hs")?;
    let df = parent_high_school_dummies(&df)?;
    let df = recode_food_stamp(&df)?;
    show_counts(&df, "foodstmp", CountOrder::ByCount)?;
    let df = demographic_dummies(&df)?;
    show_crosstab(&df, "sex", "female")?;
    show_crosstab(&df, "black", "race")?;
    show_crosstab(&df, "hispan", "hisp")?;
    show_counts(&df, "hispan", CountOrder::ByCount)?;
    let df = recode_siblings(&df)?;
    show_counts(&df, "nsibs", CountOrder::ByCount)?;
    print_step_time(step_start.elapsed());

    let df = coerce_numeric(&df, "year")?;
    let df = coerce_numeric(&df, "birthyr")?;
    Ok(df.select(ANALYSIS_COLUMNS)?)
}

fn show_suite(suite: &ModelSuite) {
    print_section("Probit");
    display(&probit_summary_table(&suite.probit));
    display(&coefficient_table(&suite.probit.coefficients));

    print_section("Breusch-Pagan test on probit deviance residuals");
    display(&breusch_pagan_table(&suite.breusch_pagan));

    print_section("Linear probability model (HC3)");
    display(&ols_summary_table(&suite.linear_probability));
    display(&coefficient_table(&suite.linear_probability.coefficients));

    print_section("Probit (HC3)");
    display(&probit_summary_table(&suite.robust_probit));
    display(&coefficient_table(&suite.robust_probit.coefficients));

    print_section(&format!(
        "Confusion matrix at threshold {:.2} (accuracy {:.1}%)",
        suite.threshold,
        suite.confusion.accuracy() * 100.0
    ));
    display(&confusion_table(&suite.confusion));

    print_section("Average partial effects");
    display(&marginal_effects_table(&suite.marginal_effects));

    print_section("Probit without parental education (HC3)");
    display(&probit_summary_table(&suite.reduced_probit));
    display(&coefficient_table(&suite.reduced_probit.coefficients));

    print_section("Durbin-Wu-Hausman residual ratio");
    display(&endogeneity_table(&suite.endogeneity));

    for fit in &suite.robustness {
        print_section(&format!("Robustness: {} (HC3)", fit.model));
        display(&probit_summary_table(&fit.probit));
        display(&coefficient_table(&fit.probit.coefficients));
    }
}

pub fn run_regress(settings: &RegressSettings) -> Result<()> {
    let output_label = settings
        .output_dir
        .clone()
        .unwrap_or_else(|| "(no export)".into());
    print_config(
        &settings.input,
        &output_label,
        &[
            ("Threshold", format!("{:.2}", settings.threshold)),
            ("Max iterations", settings.probit.max_iter.to_string()),
            ("Tolerance", format!("{:e}", settings.probit.tolerance)),
        ],
    );

    // Step 1: Load
    let df = load_step(&settings.input, settings.infer_schema_length, &REQUIRED_COLUMNS)?;
    let analysis = prepare_analysis_frame(&df)?;

    // Step 5: Descriptives
    print_step_header(5, "Descriptive Statistics");
    let step_start = Instant::now();
    print_section("Summary statistics");
    display(&summary_table(&describe(&analysis, &ANALYSIS_COLUMNS)?));
    print_section("Share of ones");
    display(&shares_table(&indicator_shares(&analysis, &SHARE_COLUMNS)?));
    let corr = correlation_matrix(&analysis, &ANALYSIS_COLUMNS)?;
    print_section(&format!(
        "Correlation coefficients (pairwise complete, {} rows complete in every column)",
        corr.nobs
    ));
    display(&correlation_table(&corr));
    print_step_time(step_start.elapsed());

    // Step 6: Models
    print_step_header(6, "Models");
    let step_start = Instant::now();
    let spinner = create_spinner("Fitting probit, OLS and robustness models...");
    let suite = fit_suite(&analysis, &settings.probit, settings.threshold)
        .context("Model fitting failed")?;
    finish_with_success(&spinner, "All models converged");
    let excluded = analysis.height() - suite.probit.nobs;
    if excluded > 0 {
        print_warning(&format!(
            "{} row(s) with missing values excluded from the full model",
            excluded
        ));
    }
    show_suite(&suite);
    print_step_time(step_start.elapsed());

    // Step 7: Export
    print_step_header(7, "Export");
    match &settings.output_dir {
        Some(dir) => {
            let step_start = Instant::now();
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            let paths = ExportPaths::in_dir(dir);
            export_all(&corr, &suite, &settings.input, &settings.probit, &paths)?;
            print_success(&format!("Correlations: {}", paths.correlations.display()));
            print_success(&format!(
                "Average partial effects: {}",
                paths.marginal_effects.display()
            ));
            print_success(&format!("Report: {}", paths.report.display()));
            print_step_time(step_start.elapsed());
        }
        None => print_info("Export skipped (--no-export)"),
    }

    print_completion("Regression run");
    Ok(())
}
