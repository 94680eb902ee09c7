//! uiml-check: reports diagnostics for uiml markup files.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .init();

    let summary = orchestrator::run(&args)?;
    if summary.failed() {
        std::process::exit(1);
    }
    Ok(())
}
