//! Core data structures for cpm.
//!
//! This module contains the foundational types used throughout cpm:
//! - Bit identifiers (`name:version`)
//! - The project descriptor, its schema and its plans
//! - Targets and target selection
//! - Project loading

pub mod bit;
pub mod descriptor;
pub mod project;
pub mod schema;
pub mod target;

pub use bit::BitId;
pub use descriptor::{Descriptor, DescriptorError, Plan, PlanName};
pub use project::{Project, ProjectError, PROJECT_FILE};
pub use target::{Environment, ResolvedTarget, TargetError, TargetSpec, DEFAULT_TARGET};
