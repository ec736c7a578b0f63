//! Implementation of `cpm clean`.

use std::path::Path;

use crate::core::Project;
use crate::ops::error::OpError;
use crate::ops::outcome::Outcome;
use crate::util::fs::remove_dir_all_if_exists;

/// Whether anything was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: bool,
}

impl From<CleanReport> for Outcome {
    fn from(report: CleanReport) -> Self {
        if report.removed {
            Outcome::success("removed build outputs")
        } else {
            Outcome::success("nothing to clean")
        }
    }
}

/// Remove the build directory of the project at `root`.
///
/// Installed bits are kept.
pub fn clean(root: &Path) -> Result<CleanReport, OpError> {
    let project = Project::load(root)?;
    let build_dir = project.build_dir();

    let removed = build_dir.exists();
    remove_dir_all_if_exists(&build_dir)?;
    if removed {
        tracing::info!("Removed {}", build_dir.display());
    }

    Ok(CleanReport { removed })
}
