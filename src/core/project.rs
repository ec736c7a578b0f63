//! Project loading and on-disk layout.
//!
//! A directory is a Chromos project when it contains a `project.yaml` that
//! parses and passes schema validation. Anything else is reported as the one
//! coarse [`ProjectError::NotAChromosProject`]; the underlying reason is only
//! logged.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::descriptor::Descriptor;

/// Descriptor file name.
pub const PROJECT_FILE: &str = "project.yaml";

/// Directory holding installed bits.
pub const BITS_DIR: &str = "bits";

/// Directory holding build outputs.
pub const BUILD_DIR: &str = "build";

/// Directory holding project sources shared by builds and tests.
pub const SOURCES_DIR: &str = "sources";

/// Conventional location of test sources.
pub const TESTS_DIR: &str = "tests";

/// Entry point candidates compiled into the build artifact only.
pub const MAIN_FILES: &[&str] = &["main.cpp", "main.cc", "main.cxx", "main.c"];

/// Failure to load a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a Chromos project: {}", .root.display())]
    NotAChromosProject { root: PathBuf },
}

/// A loaded project: its root directory and validated descriptor.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    descriptor: Descriptor,
}

impl Project {
    /// Load the project rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let not_a_project = || ProjectError::NotAChromosProject {
            root: root.to_path_buf(),
        };

        let path = root.join(PROJECT_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!("cannot read {}: {}", path.display(), e);
                return Err(not_a_project());
            }
        };

        let descriptor = Descriptor::parse(&contents).map_err(|e| {
            tracing::warn!("{}: {}", path.display(), e);
            not_a_project()
        })?;

        tracing::debug!("loaded project `{}` from {}", descriptor.name(), root.display());

        Ok(Project {
            root: root.to_path_buf(),
            descriptor,
        })
    }

    /// Wrap an already-validated descriptor.
    pub fn new(root: impl Into<PathBuf>, descriptor: Descriptor) -> Self {
        Project {
            root: root.into(),
            descriptor,
        }
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The validated descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The project name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Directory holding installed bits.
    pub fn bits_dir(&self) -> PathBuf {
        self.root.join(BITS_DIR)
    }

    /// Directory holding build outputs.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Directory of shared project sources.
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join(SOURCES_DIR)
    }

    /// The entry point source, if the project has one.
    pub fn main_file(&self) -> Option<PathBuf> {
        MAIN_FILES
            .iter()
            .map(|name| self.root.join(name))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_project() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PROJECT_FILE), "project_name: demo\n").unwrap();

        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.name(), "demo");
        assert_eq!(project.bits_dir(), tmp.path().join("bits"));
        assert!(project.main_file().is_none());
    }

    #[test]
    fn test_missing_descriptor_is_not_a_project() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Project::load(tmp.path()),
            Err(ProjectError::NotAChromosProject { .. })
        ));
    }

    #[test]
    fn test_invalid_descriptor_is_not_a_project() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PROJECT_FILE), "project_name: 12\n").unwrap();
        assert!(matches!(
            Project::load(tmp.path()),
            Err(ProjectError::NotAChromosProject { .. })
        ));

        std::fs::write(tmp.path().join(PROJECT_FILE), "::: not yaml :::\n\t-").unwrap();
        assert!(Project::load(tmp.path()).is_err());
    }

    #[test]
    fn test_main_file_detection() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PROJECT_FILE), "project_name: demo\n").unwrap();
        std::fs::write(tmp.path().join("main.c"), "int main(void) { return 0; }").unwrap();

        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.main_file(), Some(tmp.path().join("main.c")));
    }
}
