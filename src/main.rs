//! upk: Georgia pre-K cohort builder and regression runner
//!
//! `upk cohorts` derives eligibility cohorts and indicators from a raw IPUMS
//! extract; `upk regress` fits the high-school completion models on an
//! extract of 18-year-olds.

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

use upk::cli::{run, Cli, Settings};
use upk::utils::print_banner;

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = Settings::from(cli.command);
    log::debug!("Resolved settings: {:?}", settings);

    print_banner(env!("CARGO_PKG_VERSION"));
    run(&settings)
}
