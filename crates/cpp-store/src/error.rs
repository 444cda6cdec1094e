//! Store errors

use cpp_core::DataId;
use std::path::PathBuf;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document for {path}: {source}")]
    SerializeYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize document for {path}: {source}")]
    SerializeJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write non-finite number at {location} as JSON: {path}")]
    NonFiniteJson { path: PathBuf, location: String },

    #[error("unsupported document format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error(
        "product '{product_type}' not found for {data_id} in collections [{}]",
        .collections.join(", ")
    )]
    NotFound {
        product_type: String,
        data_id: DataId,
        collections: Vec<String>,
    },

    #[error("expectation file not found: {path}")]
    ExpectationNotFound { path: PathBuf },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// True for the "input does not exist" errors, as opposed to I/O or
    /// parse failures
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::ExpectationNotFound { .. }
        )
    }
}
