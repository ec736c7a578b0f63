//! Steps shared by the build and test recipes.
//!
//! Both recipes load the project, resolve the target, gather the installed
//! bit closure of their plans, and then compile through a [`Compiler`]
//! configured from all of the above. The runner's environment is prepared
//! separately, once a recipe knows it has work to do.

use std::path::{Path, PathBuf};

use crate::builder::{Compiler, Object, Runner, RunnerFactory, Toolchain};
use crate::core::{Plan, PlanName, Project, ResolvedTarget};
use crate::ops::error::OpError;
use crate::sources::{BitStore, InstalledBit};
use crate::util::config::ToolchainConfig;

/// Settings common to build and test invocations.
#[derive(Debug, Clone, Default)]
pub struct RecipeOptions {
    /// Target name; `None` means the default target.
    pub target: Option<String>,
    /// Parallel compile jobs (None = one per core).
    pub jobs: Option<usize>,
    /// Configured compiler overrides.
    pub toolchain: ToolchainConfig,
}

/// Everything a recipe needs once its project is loaded.
pub(crate) struct Recipe {
    pub project: Project,
    pub target: ResolvedTarget,
    pub plan: Plan,
    pub bits: Vec<InstalledBit>,
    pub toolchain: Toolchain,
    pub runner: Box<dyn Runner>,
    pub jobs: Option<usize>,
}

impl Recipe {
    /// Load the project at `root` and resolve everything the given plans need.
    pub fn prepare(
        root: &Path,
        plans: &[PlanName],
        runners: &dyn RunnerFactory,
        opts: &RecipeOptions,
    ) -> Result<Recipe, OpError> {
        let project = Project::load(root)?;
        let target = project.descriptor().select_target(opts.target.as_deref())?;
        tracing::debug!("using target `{}` ({})", target.name, target.environment);

        let plan = project.descriptor().merged_plan(plans);
        let store = BitStore::new(project.bits_dir());
        let bits = store.closure(plan.bit_ids())?;

        let toolchain = Toolchain::resolve(&target, &opts.toolchain);
        let runner = runners.runner(&project, &target);

        Ok(Recipe {
            project,
            target,
            plan,
            bits,
            toolchain,
            runner,
            jobs: opts.jobs,
        })
    }

    /// Set up the target environment, e.g. build its container image.
    pub fn prepare_runner(&self) -> Result<(), OpError> {
        self.runner.prepare()?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.project.root()
    }

    /// Include path: the project root, its `sources/`, the bit store, and
    /// each bit's header directory (or the bit itself when it has none).
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.root().to_path_buf()];

        let sources = self.project.sources_dir();
        if sources.is_dir() {
            dirs.push(sources);
        }

        if !self.bits.is_empty() {
            dirs.push(self.project.bits_dir());
        }
        for bit in &self.bits {
            dirs.push(bit.include_dir().unwrap_or_else(|| bit.path.clone()));
        }

        dirs
    }

    pub fn compiler(&self) -> Compiler<'_> {
        Compiler::new(self.root(), self.runner.as_ref(), &self.toolchain)
            .include_dirs(self.include_dirs())
            .cflags(self.plan.cflags.iter().cloned())
            .jobs(self.jobs)
    }

    /// Shared project sources plus the sources of every bit in the closure.
    pub fn library_sources(&self) -> Result<Vec<PathBuf>, OpError> {
        let mut sources = crate::util::fs::find_sources(&self.project.sources_dir())?;
        for bit in &self.bits {
            sources.extend(bit.sources()?);
        }
        Ok(sources)
    }

    /// Compile shared and bit sources.
    pub fn compile_library(&self) -> Result<Vec<Object>, OpError> {
        let sources = self.library_sources()?;
        Ok(self.compiler().compile_all(&sources)?)
    }
}
