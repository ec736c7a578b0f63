//! Implementation of `cpm create`.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::core::bit::validate_bit_name;
use crate::core::project::{PROJECT_FILE, SOURCES_DIR, TESTS_DIR};
use crate::ops::error::OpError;
use crate::ops::outcome::Outcome;
use crate::util::fs::{ensure_dir, write_string};

/// A freshly scaffolded project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    pub name: String,
    pub path: PathBuf,
}

impl From<CreateReport> for Outcome {
    fn from(report: CreateReport) -> Self {
        Outcome::success(format!("created project {}", report.name))
    }
}

/// Create the project `name` in a new directory under `parent`.
pub fn create_project(parent: &Path, name: &str) -> Result<CreateReport, OpError> {
    validate_bit_name(name)
        .map_err(|e| OpError::Configuration(format!("invalid project name: {}", e)))?;

    let path = parent.join(name);
    if path.exists() {
        return Err(OpError::Configuration(format!(
            "destination `{}` already exists",
            path.display()
        )));
    }

    scaffold(&path, name).with_context(|| format!("failed to create project `{}`", name))?;
    tracing::info!("Created project {} at {}", name, path.display());

    Ok(CreateReport {
        name: name.to_string(),
        path,
    })
}

fn scaffold(path: &Path, name: &str) -> anyhow::Result<()> {
    ensure_dir(&path.join(SOURCES_DIR))?;
    ensure_dir(&path.join(TESTS_DIR))?;

    let descriptor = format!(
        r#"project_name: {name}
version: '0.1.0'
build:
  bits:
  cflags: []
test:
  bits:
"#
    );
    write_string(&path.join(PROJECT_FILE), &descriptor)?;

    let main = format!(
        r#"#include <iostream>

int main() {{
    std::cout << "Hello from {name}!" << std::endl;
    return 0;
}}
"#
    );
    write_string(&path.join("main.cpp"), &main)?;

    let gitignore = r#"# cpm outputs
build/
bits/
"#;
    write_string(&path.join(".gitignore"), gitignore)?;

    Ok(())
}
