//! `cpm clean` command

use anyhow::Result;

use super::Session;
use crate::cli::CleanArgs;
use cpm::ops::{self, Outcome};

pub fn execute(_args: CleanArgs) -> Result<Outcome> {
    let session = Session::new()?;
    Ok(Outcome::from_result(ops::clean(&session.cwd)))
}
