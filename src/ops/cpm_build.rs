//! Implementation of `cpm build`.

use std::path::{Path, PathBuf};

use crate::builder::RunnerFactory;
use crate::core::project::BUILD_DIR;
use crate::core::PlanName;
use crate::ops::error::OpError;
use crate::ops::outcome::{Outcome, BUILD_FINISHED};
use crate::ops::recipe::{Recipe, RecipeOptions};

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub target: String,
    /// Linked executable, relative to the project root. `None` when the
    /// project has nothing to compile.
    pub artifact: Option<PathBuf>,
    pub compiled: usize,
}

impl From<BuildReport> for Outcome {
    fn from(_: BuildReport) -> Self {
        Outcome::success(BUILD_FINISHED)
    }
}

/// Build the project at `root`.
///
/// Compiles the entry point, `sources/`, and the sources of every installed
/// bit in the build plan's closure, then links `build/<project_name>`.
pub fn build(
    root: &Path,
    runners: &dyn RunnerFactory,
    opts: &RecipeOptions,
) -> Result<BuildReport, OpError> {
    let recipe = Recipe::prepare(root, &[PlanName::Build], runners, opts)?;
    recipe.prepare_runner()?;
    tracing::info!(
        "Building {} for target `{}` ({})",
        recipe.project.name(),
        recipe.target.name,
        recipe.runner.describe()
    );

    let mut sources: Vec<PathBuf> = recipe.project.main_file().into_iter().collect();
    sources.extend(recipe.library_sources()?);

    let objects = recipe.compiler().compile_all(&sources)?;
    if objects.is_empty() {
        tracing::info!("nothing to compile");
        return Ok(BuildReport {
            target: recipe.target.name,
            artifact: None,
            compiled: 0,
        });
    }

    let output = Path::new(BUILD_DIR).join(recipe.project.name());
    let artifact = recipe.compiler().link(
        &objects,
        &output,
        &recipe.plan.ldflags,
        &recipe.plan.libraries,
    )?;
    tracing::info!("Linked {}", artifact.display());

    Ok(BuildReport {
        target: recipe.target.name.clone(),
        artifact: Some(artifact),
        compiled: objects.len(),
    })
}
