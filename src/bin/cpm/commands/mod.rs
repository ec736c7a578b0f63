//! Command implementations

pub mod build;
pub mod clean;
pub mod create;
pub mod install;

use std::path::PathBuf;

use anyhow::{Context, Result};

use cpm::builder::DefaultRunnerFactory;
use cpm::ops::RecipeOptions;
use cpm::util::config::load_project_config;
use cpm::util::Config;

/// Working directory and merged configuration for one invocation.
pub struct Session {
    pub cwd: PathBuf,
    pub config: Config,
}

impl Session {
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let config = load_project_config(&cwd);
        Ok(Session { cwd, config })
    }

    pub fn runners(&self) -> DefaultRunnerFactory {
        DefaultRunnerFactory::new(self.config.container.program())
    }

    pub fn recipe_options(&self, target: Option<String>, jobs: Option<usize>) -> RecipeOptions {
        RecipeOptions {
            target,
            jobs: jobs.or(self.config.build.jobs),
            toolchain: self.config.toolchain.clone(),
        }
    }
}
