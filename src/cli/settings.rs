//! Resolved run settings handed to the pipeline runners

use std::path::PathBuf;

use crate::pipeline::regression::ProbitOptions;

use super::args::{default_cohort_output, default_output_dir, Commands};

#[derive(Debug, Clone, PartialEq)]
pub struct CohortSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub infer_schema_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressSettings {
    pub input: PathBuf,
    /// `None` when exports are disabled.
    pub output_dir: Option<PathBuf>,
    pub threshold: f64,
    pub probit: ProbitOptions,
    pub infer_schema_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settings {
    Cohorts(CohortSettings),
    Regress(RegressSettings),
}

impl From<Commands> for Settings {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Cohorts {
                input,
                output,
                infer_schema_length,
            } => {
                let output = output.unwrap_or_else(|| default_cohort_output(&input));
                Settings::Cohorts(CohortSettings {
                    input,
                    output,
                    infer_schema_length,
                })
            }
            Commands::Regress {
                input,
                output_dir,
                threshold,
                max_iter,
                tolerance,
                no_export,
                infer_schema_length,
            } => {
                let output_dir = if no_export {
                    None
                } else {
                    Some(output_dir.unwrap_or_else(|| default_output_dir(&input)))
                };
                Settings::Regress(RegressSettings {
                    input,
                    output_dir,
                    threshold,
                    probit: ProbitOptions {
                        max_iter,
                        tolerance,
                        ..ProbitOptions::default()
                    },
                    infer_schema_length,
                })
            }
        }
    }
}
