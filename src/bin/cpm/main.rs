//! cpm CLI - the Chromos package manager

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use cpm::ops::Outcome;

fn main() {
    match run() {
        Ok(outcome) => {
            println!("{}", outcome.message.trim_end());
            std::process::exit(outcome.status_code);
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<Outcome> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("cpm=debug")
    } else {
        EnvFilter::new("cpm=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Create(args) => commands::create::execute(args),
        Commands::Install(args) => commands::install::execute(args),
        Commands::Build(args) => commands::build::execute(args),
        Commands::Test(args) => commands::test::execute(args),
        Commands::Clean(args) => commands::clean::execute(args),
    }
}
