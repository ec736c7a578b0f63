//! Configuration file support for cpm.
//!
//! cpm reads two configuration files:
//! - Global: `<config dir>/cpm/config.toml` - User-wide defaults
//! - Project: `.cpm/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Missing files mean
//! defaults; a malformed file is reported and ignored.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Name of the per-project configuration directory.
pub const PROJECT_CONFIG_DIR: &str = ".cpm";

/// Name of the configuration file inside either config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default container program.
pub const DEFAULT_CONTAINER_PROGRAM: &str = "docker";

/// cpm configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry settings
    pub registry: RegistryConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Compiler overrides for native builds
    pub toolchain: ToolchainConfig,

    /// Container runtime settings
    pub container: ContainerConfig,
}

/// Registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Default registry endpoint used when `install` is given no `-s`
    pub url: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of parallel compile jobs (None = one per core)
    pub jobs: Option<usize>,
}

/// Compiler program overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// C compiler (e.g., /usr/bin/clang)
    pub cc: Option<PathBuf>,

    /// C++ compiler (e.g., /usr/bin/clang++)
    pub cxx: Option<PathBuf>,
}

/// Container runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container CLI to invoke (docker, podman)
    pub program: Option<String>,
}

impl ContainerConfig {
    /// The container program, falling back to `docker`.
    pub fn program(&self) -> &str {
        self.program.as_deref().unwrap_or(DEFAULT_CONTAINER_PROGRAM)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.registry.url.is_some() {
            self.registry.url = other.registry.url;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.toolchain.cc.is_some() {
            self.toolchain.cc = other.toolchain.cc;
        }
        if other.toolchain.cxx.is_some() {
            self.toolchain.cxx = other.toolchain.cxx;
        }
        if other.container.program.is_some() {
            self.container.program = other.container.program;
        }
    }
}

/// Get the global config directory (e.g. `~/.config/cpm`).
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "chromos", "cpm").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Get the project config file path.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_DIR).join(CONFIG_FILE_NAME)
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.cpm/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Load the configuration that applies to a project rooted at `project_root`.
pub fn load_project_config(project_root: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(project_root))
}
