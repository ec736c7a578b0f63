//! Build targets - the environment a plan is compiled and run in.
//!
//! A target is one of three closed cases: the host toolchain, a named
//! container image, or a container image built from a build context that
//! contains a Dockerfile. The case is decided once, when the descriptor is
//! loaded; `image` and `dockerfile` on the same target are rejected there.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Name of the target used when the caller does not pick one.
pub const DEFAULT_TARGET: &str = "default";

/// Error selecting or constructing a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("target `{0}` declares both `image` and `dockerfile`")]
    Conflicting(String),

    #[error("target `{name}` is not declared in project.yaml")]
    Undeclared { name: String, available: Vec<String> },
}

/// Where the toolchain runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// The host toolchain.
    Native,
    /// A container started from an existing image reference.
    Image(String),
    /// A container image built from this context directory first.
    /// Relative paths are relative to the project root.
    DockerfileBuild(PathBuf),
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Native => write!(f, "native"),
            Environment::Image(reference) => write!(f, "image {}", reference),
            Environment::DockerfileBuild(context) => {
                write!(f, "dockerfile {}", context.display())
            }
        }
    }
}

/// Compiler overrides scoped to one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolchainOverride {
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub cxx: Option<String>,
}

/// A validated target declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub environment: Environment,
    pub toolchain: ToolchainOverride,
}

impl TargetSpec {
    /// The host toolchain with no overrides.
    pub fn native() -> Self {
        TargetSpec {
            environment: Environment::Native,
            toolchain: ToolchainOverride::default(),
        }
    }
}

/// Raw target as it appears in project.yaml.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawTarget {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    dockerfile: Option<PathBuf>,
    #[serde(default)]
    toolchain: Option<ToolchainOverride>,
}

impl RawTarget {
    pub(crate) fn into_spec(self, name: &str) -> Result<TargetSpec, TargetError> {
        let environment = match (self.image, self.dockerfile) {
            (Some(_), Some(_)) => return Err(TargetError::Conflicting(name.to_string())),
            (Some(image), None) => Environment::Image(image),
            (None, Some(context)) => Environment::DockerfileBuild(context),
            (None, None) => Environment::Native,
        };

        Ok(TargetSpec {
            environment,
            toolchain: self.toolchain.unwrap_or_default(),
        })
    }
}

/// A target chosen for one build or test invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub name: String,
    pub environment: Environment,
    pub toolchain: ToolchainOverride,
}

/// Pick the target named `name` (or [`DEFAULT_TARGET`]) from the declared set.
///
/// An undeclared default target means the host toolchain. Any other
/// undeclared name is a configuration error.
pub fn select(
    targets: &BTreeMap<String, TargetSpec>,
    name: Option<&str>,
) -> Result<ResolvedTarget, TargetError> {
    let name = name.unwrap_or(DEFAULT_TARGET);

    let spec = match targets.get(name) {
        Some(spec) => spec.clone(),
        None if name == DEFAULT_TARGET => TargetSpec::native(),
        None => {
            return Err(TargetError::Undeclared {
                name: name.to_string(),
                available: targets.keys().cloned().collect(),
            })
        }
    };

    Ok(ResolvedTarget {
        name: name.to_string(),
        environment: spec.environment,
        toolchain: spec.toolchain,
    })
}
