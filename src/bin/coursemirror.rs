//! Coursemirror CLI Binary
//!
//! Command-line interface for the course resource mirror.

use clap::Parser;
use coursemirror::tooling::cli::{Cli, CliContext};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.config.clone(), cli.log_level.clone()) {
        Ok(context) => context,
        Err(error) => {
            eprintln!("Error initializing: {error:#}");
            process::exit(1);
        }
    };

    if let Err(error) = context.execute(&cli.command).await {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}
