//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// cpm - the Chromos package manager for C and C++ projects
#[derive(Parser)]
#[command(name = "cpm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project in a new directory
    Create(CreateArgs),

    /// Install the project's bits, or a single bit
    Install(InstallArgs),

    /// Build the project
    Build(BuildArgs),

    /// Build and run the project's tests
    Test(TestArgs),

    /// Remove build outputs
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Project name
    pub name: String,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Registry endpoint (defaults to `registry.url` from config)
    #[arg(short = 's', long = "source", env = "CPM_REGISTRY")]
    pub source: Option<String>,

    /// A single bit to install, as name:version
    pub bit: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Target to build for (defaults to `default`)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct TestArgs {
    /// Target to test on (defaults to `default`)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Test files, directories or globs (defaults to `tests/`)
    pub patterns: Vec<String>,
}

#[derive(Args)]
pub struct CleanArgs {}
