//! Installation error types.

use thiserror::Error;

use crate::sources::{FetchError, StoreError};

/// Error while installing bits.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InstallError {
    /// True when the registry simply does not have the bit.
    pub fn is_not_found(&self) -> bool {
        matches!(self, InstallError::Fetch(FetchError::NotFound { .. }))
    }
}
