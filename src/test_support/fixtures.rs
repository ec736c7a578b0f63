//! Test fixtures for common project layouts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::project::PROJECT_FILE;

/// Fixture for a project directory.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// project.yaml content.
    pub descriptor: String,
    /// Files (path relative to project root -> content).
    pub files: BTreeMap<PathBuf, String>,
}

impl ProjectFixture {
    /// A project with only a name.
    pub fn new(name: &str) -> Self {
        ProjectFixture {
            descriptor: format!("project_name: {}\n", name),
            files: BTreeMap::new(),
        }
    }

    /// A C++ project with a main, one shared source and one passing test.
    pub fn executable(name: &str) -> Self {
        ProjectFixture::new(name)
            .with_file("main.cpp", "int main() { return 0; }\n")
            .with_file("sources/math.cpp", "int add(int a, int b) { return a + b; }\n")
            .with_file(
                "tests/test_math.cpp",
                "int add(int, int);\nint main() { return add(1, 2) == 3 ? 0 : 1; }\n",
            )
    }

    /// Replace project.yaml entirely.
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write the fixture into `root`.
    pub fn write_to(&self, root: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(root)?;
        std::fs::write(root.join(PROJECT_FILE), &self.descriptor)?;

        for (path, content) in &self.files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full, content)?;
        }

        Ok(root.to_path_buf())
    }
}

/// Pre-built project.yaml documents.
pub mod descriptors {
    /// A project whose plans declare the given bits.
    pub fn with_bits(name: &str, build: &[(&str, &str)], test: &[(&str, &str)]) -> String {
        let mut yaml = format!("project_name: {}\n", name);
        for (plan, bits) in [("build", build), ("test", test)] {
            if bits.is_empty() {
                continue;
            }
            yaml.push_str(&format!("{}:\n  bits:\n", plan));
            for (bit, version) in bits {
                yaml.push_str(&format!("    {}: '{}'\n", bit, version));
            }
        }
        yaml
    }

    /// A project with a single target.
    pub fn with_target(name: &str, target: &str, body: &str) -> String {
        format!(
            "project_name: {}\ntargets:\n  {}:\n    {}\n",
            name, target, body
        )
    }
}
