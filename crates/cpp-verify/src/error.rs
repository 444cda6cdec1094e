//! Harness errors

use cpp_store::StoreError;
use thiserror::Error;

/// Why a suite's products could not be archived as expectations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("suite '{suite}' is not archived: {reason}")]
    Unavailable { suite: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ArchiveError {
    /// True when a product of the suite could not be found
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::Store(e) if e.is_not_found())
    }
}
