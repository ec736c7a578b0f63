//! `cpm build` command

use anyhow::Result;

use super::Session;
use crate::cli::BuildArgs;
use cpm::ops::{self, Outcome};

pub fn execute(args: BuildArgs) -> Result<Outcome> {
    let session = Session::new()?;
    let opts = session.recipe_options(args.target, args.jobs);

    Ok(Outcome::from_result(ops::build(
        &session.cwd,
        &session.runners(),
        &opts,
    )))
}
