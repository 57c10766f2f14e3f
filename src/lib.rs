//! upk: Georgia pre-K eligibility cohorts and high-school completion
//! regressions
//!
//! Loads an IPUMS extract (Stata `.dta`, CSV or Parquet), derives indicator
//! and cohort variables through validated category tables, and fits probit
//! and linear probability models with their diagnostics.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
