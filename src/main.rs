use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod filter;
mod lm;
mod lm_response;
mod marketplace;
mod output;
mod profiles;
mod project;
mod staging;
mod store;
mod summary;
mod templates;
mod workflow;

use cli::{Command, RootArgs};

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jobscout={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let root = RootArgs::parse();
    init_tracing(root.verbose);
    let data_dir = root.data_dir.as_deref();

    match root.command {
        Command::Search(args) => workflow::run_search(args, data_dir),
        Command::Analyze(args) => workflow::run_analyze(args, data_dir),
        Command::Draft(args) => workflow::run_draft(args, data_dir),
        Command::Mark(args) => workflow::run_mark(args, data_dir),
        Command::Forget(args) => workflow::run_forget(args, data_dir),
        Command::Status(args) => workflow::run_status(args, data_dir),
    }
}
