//! `cpm install` command

use anyhow::Result;

use super::Session;
use crate::cli::InstallArgs;
use cpm::ops::{self, InstallRequest, OpError, Outcome};

pub fn execute(args: InstallArgs) -> Result<Outcome> {
    let session = Session::new()?;

    let result = (|| -> Result<_, OpError> {
        let request = InstallRequest::parse(args.bit.as_deref())?;
        let endpoint = ops::registry_endpoint(args.source.as_deref(), &session.config.registry)?;
        let registry = ops::open_registry(&endpoint)?;
        ops::install(&session.cwd, &registry, &request)
    })();

    Ok(Outcome::from_result(result))
}
