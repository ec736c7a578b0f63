//! Bit sources.
//!
//! Bits are fetched from a registry as archives and unpacked into the
//! project's local store.

pub mod registry;
pub mod store;

pub use registry::{FetchError, HttpRegistry, Registry};
pub use store::{BitStore, InstalledBit, StoreError};
