//! Implementation of `cpm install`.

use std::path::Path;

use crate::core::{BitId, PlanName, Project};
use crate::ops::error::OpError;
use crate::ops::outcome::{Outcome, BITS_INSTALLED};
use crate::resolver::BitInstaller;
use crate::sources::{BitStore, HttpRegistry, Registry};
use crate::util::config::RegistryConfig;

/// What `cpm install` was asked to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRequest {
    /// Every bit of the merged `build` and `test` plans.
    Project,
    /// One bit and its dependencies.
    Bit(BitId),
}

impl InstallRequest {
    /// Parse an optional `name:version` argument.
    pub fn parse(bit: Option<&str>) -> Result<InstallRequest, OpError> {
        match bit {
            None => Ok(InstallRequest::Project),
            Some(spec) => spec
                .parse()
                .map(InstallRequest::Bit)
                .map_err(|e| OpError::Configuration(format!("invalid bit `{}`: {}", spec, e))),
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallReport {
    Project { installed: usize, fetched: usize },
    Bit { bit: BitId, fetched: usize },
}

impl From<InstallReport> for Outcome {
    fn from(report: InstallReport) -> Self {
        match report {
            InstallReport::Project { .. } => Outcome::success(BITS_INSTALLED),
            InstallReport::Bit { bit, .. } => Outcome::success(format!("installed bit {}", bit)),
        }
    }
}

/// Registry endpoint from the command line, falling back to configuration.
pub fn registry_endpoint(cli: Option<&str>, config: &RegistryConfig) -> Result<String, OpError> {
    cli.map(str::to_string)
        .or_else(|| config.url.clone())
        .ok_or_else(|| {
            OpError::Configuration(
                "no registry endpoint; pass `-s <url>` or set `registry.url` in config".to_string(),
            )
        })
}

/// Open the HTTP registry at `endpoint`.
pub fn open_registry(endpoint: &str) -> Result<HttpRegistry, OpError> {
    Ok(HttpRegistry::new(endpoint)?)
}

/// Install bits into the project at `root`.
pub fn install(
    root: &Path,
    registry: &dyn Registry,
    request: &InstallRequest,
) -> Result<InstallReport, OpError> {
    let project = Project::load(root)?;
    let store = BitStore::new(project.bits_dir());
    let installer = BitInstaller::new(registry, &store);

    match request {
        InstallRequest::Project => {
            let plan = project.descriptor().merged_plan(&PlanName::ALL);
            tracing::info!(
                "Installing {} bit(s) for {} from {}",
                plan.bits.len(),
                project.name(),
                registry.endpoint()
            );
            let set = installer.install_plan(&plan)?;
            Ok(InstallReport::Project {
                installed: set.len(),
                fetched: set.fetched.len(),
            })
        }
        InstallRequest::Bit(bit) => {
            tracing::info!("Installing bit {} from {}", bit, registry.endpoint());
            let set = installer.install_bit(bit.clone())?;
            Ok(InstallReport::Bit {
                bit: bit.clone(),
                fetched: set.fetched.len(),
            })
        }
    }
}
