//! `cpm create` command

use anyhow::{Context, Result};

use crate::cli::CreateArgs;
use cpm::ops::{self, Outcome};

pub fn execute(args: CreateArgs) -> Result<Outcome> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(Outcome::from_result(ops::create_project(&cwd, &args.name)))
}
