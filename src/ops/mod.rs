//! High-level operations.
//!
//! This module contains the implementation of cpm commands. Each operation
//! returns a typed report or an [`OpError`]; [`Outcome`] turns either into
//! the exit status and message printed by the binary.

pub mod cpm_build;
pub mod cpm_clean;
pub mod cpm_install;
pub mod cpm_new;
pub mod error;
pub mod outcome;
pub mod recipe;

pub use cpm_build::{build, BuildReport};
pub use cpm_clean::{clean, CleanReport};
pub use cpm_install::{install, open_registry, registry_endpoint, InstallReport, InstallRequest};
pub use cpm_new::{create_project, CreateReport};
pub use cpm_test::{discover_tests, test, TestOptions, TestReport};
pub use error::OpError;
pub use outcome::Outcome;
pub use recipe::RecipeOptions;
