//! Bit installation.
//!
//! Walks the dependency graph of a plan, fetching every bit that the local
//! store does not already hold at the requested version. Bits are identified
//! by exact `name:version`; there is no version range solving.

pub mod errors;
pub mod install;

pub use errors::InstallError;
pub use install::{BitInstaller, InstalledSet};
