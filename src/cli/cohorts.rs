//! Cohort builder: clean the raw extract and derive cohort, treatment and
//! indicator variables

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::cohorts::build_cohorts;
use crate::pipeline::describe::{value_counts, CountOrder};
use crate::pipeline::dummies::{
    demographic_dummies, education_detail_dummies, parent_education_dummies,
    socioeconomic_dummies,
};
use crate::pipeline::filter::cohort_sample;
use crate::pipeline::save_dataset;
use crate::report::{display, value_counts_table};
use crate::utils::{
    create_spinner, finish_with_success, print_completion, print_config, print_count,
    print_section, print_step_header, print_step_time, print_success,
};

use super::settings::CohortSettings;
use super::load_step;

/// Raw columns the derivations read.
const REQUIRED_COLUMNS: [&str; 11] = [
    "year", "age", "sex", "race", "hispan", "educd", "educd_mom", "educd_pop", "empstat",
    "poverty", "metro",
];

fn show_counts(df: &polars::prelude::DataFrame, column: &str, order: CountOrder) -> Result<()> {
    print_section(&format!("{} value counts", column));
    let counts = value_counts(df, column, order)?;
    display(&value_counts_table(column, &counts));
    Ok(())
}

pub fn run_cohorts(settings: &CohortSettings) -> Result<()> {
    print_config(
        &settings.input,
        &settings.output,
        &[("Pipeline", "cohort builder".to_string())],
    );

    // Step 1: Load
    let df = load_step(&settings.input, settings.infer_schema_length, &REQUIRED_COLUMNS)?;

    // Step 2: Sample restrictions
    print_step_header(2, "Clean Sample");
    let step_start = Instant::now();
    let before = df.height();
    let df = cohort_sample(&df).context("Failed to clean the extract")?;
    print_count(
        "row(s) removed",
        before - df.height(),
        Some("(same-sex households, non-numeric age)"),
    );
    print_count("row(s) retained", df.height(), None);
    print_step_time(step_start.elapsed());

    // Step 3: Education
    print_step_header(3, "Education Indicators");
    let step_start = Instant::now();
    let df = education_detail_dummies(&df, "educd")?;
    print_success("Detailed attainment dummies created");
    show_counts(&df, "educd_mom", CountOrder::ByCount)?;
    let df = parent_education_dummies(&df, "educd_mom", "mom")?;
    let df = parent_education_dummies(&df, "educd_pop", "pop")?;
    print_success("Parental attainment bands created");
    print_step_time(step_start.elapsed());

    // Step 4: Demographics and socio-economics
    print_step_header(4, "Demographic and Socio-economic Indicators");
    let step_start = Instant::now();
    show_counts(&df, "hispan", CountOrder::ByCount)?;
    let df = demographic_dummies(&df)?;
    show_counts(&df, "empstat", CountOrder::ByCount)?;
    show_counts(&df, "metro", CountOrder::ByCount)?;
    let df = socioeconomic_dummies(&df)?;
    print_success("female, white, black, hisp, unemployed, poor, metro_dummy created");
    print_step_time(step_start.elapsed());

    // Step 5: Cohorts
    print_step_header(5, "Eligibility Cohorts");
    let step_start = Instant::now();
    let spinner = create_spinner("Deriving cohorts and treatment bands...");
    let mut df = build_cohorts(&df).context("Failed to derive cohorts")?;
    finish_with_success(&spinner, "Cohort dummies, upk_year and treatment bands created");
    show_counts(&df, "year", CountOrder::ByCount)?;
    show_counts(&df, "birthyr", CountOrder::ByValue)?;
    print_step_time(step_start.elapsed());

    // Step 6: Save
    print_step_header(6, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output file...");
    save_dataset(&mut df, &settings.output)?;
    finish_with_success(
        &spinner,
        &format!("Saved to {}", settings.output.display()),
    );
    println!(
        "      {} rows × {} columns",
        style(df.height()).yellow().bold(),
        style(df.width()).yellow().bold()
    );
    print_step_time(step_start.elapsed());

    print_completion("Cohort build");
    Ok(())
}
