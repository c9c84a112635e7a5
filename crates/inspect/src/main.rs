use std::process::ExitCode;

use clap::Parser;
use startstop_inspect::runtime::{boot, cli};

fn main() -> anyhow::Result<ExitCode> {
    boot::init_logging();
    let outcome = cli::run(cli::Cli::parse())?;
    Ok(outcome.into())
}
