//! Current/legacy pipeline selection

use crate::error::{ConfigError, ConfigResult};
use crate::LEGACY_ENV;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pipeline release the harness verifies against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    #[default]
    Current,
    /// The 2024-09 release, with its own expectation files and suite set
    Legacy,
}

impl PipelineMode {
    /// Parse the `CI_CPP_LEGACY` flag: an integer, `> 0` means legacy
    pub fn from_flag(value: &str) -> ConfigResult<Self> {
        let flag: i64 = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: LEGACY_ENV.to_string(),
                reason: format!("expected an integer, got '{}'", value),
            })?;

        Ok(if flag > 0 {
            PipelineMode::Legacy
        } else {
            PipelineMode::Current
        })
    }

    pub fn is_legacy(self) -> bool {
        self == PipelineMode::Legacy
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Current => write!(f, "current"),
            PipelineMode::Legacy => write!(f, "legacy"),
        }
    }
}
