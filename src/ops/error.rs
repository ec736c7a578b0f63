//! Operation errors.
//!
//! Every failure an operation can report is one of these kinds. Component
//! errors convert into them with `From`; only [`Outcome`](super::Outcome)
//! turns them into messages and exit statuses.

use thiserror::Error;

use crate::builder::{BuildError, RunError};
use crate::core::{ProjectError, TargetError};
use crate::resolver::InstallError;
use crate::sources::registry::EndpointError;
use crate::sources::StoreError;

/// Failure of a cpm operation.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("not a Chromos project")]
    NotAChromosProject,

    #[error("{0}")]
    DependencyResolution(String),

    #[error("{0}")]
    Configuration(String),

    /// Toolchain diagnostics, verbatim.
    #[error("{0}")]
    Compilation(String),

    #[error("{failed} of {total} test executables failed")]
    TestsFailed { failed: usize, total: usize },

    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl From<ProjectError> for OpError {
    fn from(_: ProjectError) -> Self {
        OpError::NotAChromosProject
    }
}

impl From<InstallError> for OpError {
    fn from(e: InstallError) -> Self {
        OpError::DependencyResolution(e.to_string())
    }
}

impl From<StoreError> for OpError {
    fn from(e: StoreError) -> Self {
        OpError::DependencyResolution(e.to_string())
    }
}

impl From<TargetError> for OpError {
    fn from(e: TargetError) -> Self {
        let mut message = e.to_string();
        if let TargetError::Undeclared { available, .. } = &e {
            if !available.is_empty() {
                message.push_str(&format!(" (declared: {})", available.join(", ")));
            }
        }
        OpError::Configuration(message)
    }
}

impl From<EndpointError> for OpError {
    fn from(e: EndpointError) -> Self {
        OpError::Configuration(e.to_string())
    }
}

impl From<RunError> for OpError {
    fn from(e: RunError) -> Self {
        OpError::Compilation(e.to_string())
    }
}

impl From<BuildError> for OpError {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::Failed { diagnostics } => OpError::Compilation(diagnostics),
            BuildError::Run(e) => e.into(),
            BuildError::Io(e) => OpError::Io(e),
        }
    }
}

impl From<anyhow::Error> for OpError {
    fn from(e: anyhow::Error) -> Self {
        OpError::Io(e)
    }
}
