//! cpm - the Chromos package manager for C and C++ projects
//!
//! This crate provides the core library functionality for cpm: loading and
//! validating `project.yaml`, installing bits from a registry, and driving
//! builds and tests on the host or inside containers.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and fakes for cpm unit tests.
///
/// This module is only available when compiling with `--cfg test`.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BitId, Descriptor, Project};
pub use ops::{OpError, Outcome};
