//! Build orchestration.
//!
//! The builder compiles translation units and links executables by
//! handing toolchain commands to a [`Runner`](runner::Runner), which
//! executes them on the host or inside a container.

pub mod compile;
pub mod runner;
pub mod toolchain;

pub use compile::{BuildError, Compiler, Object};
pub use runner::{DefaultRunnerFactory, RunError, RunOutput, Runner, RunnerFactory};
pub use toolchain::{CommandSpec, Language, Toolchain};
