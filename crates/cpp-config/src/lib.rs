//! Configuration for the verification harness
//!
//! Settings are layered: built-in defaults, then an optional `ci_cpp.yaml`
//! in the package directory, then environment variables.
//!
//! # Environment Variables
//!
//! - `CI_CPP_DIR`: package directory (default: current directory)
//! - `CI_CPP_REPO`: product store root (default: `<package>/DATA`)
//! - `CI_CPP_LEGACY`: integer; `> 0` selects the legacy expectation set and
//!   suite selection (default: `0`)
//!
//! # Example
//!
//! ```ignore
//! use cpp_config::HarnessConfig;
//!
//! let config = HarnessConfig::from_env()?;
//! println!("expectations in {:?}", config.expectation_dir());
//! ```

mod error;
mod harness;
mod mode;

pub use error::{ConfigError, ConfigResult};
pub use harness::{HarnessConfig, HarnessFile, CONFIG_FILE_NAME};
pub use mode::PipelineMode;

/// Environment variable holding the package directory
pub const PACKAGE_DIR_ENV: &str = "CI_CPP_DIR";

/// Environment variable holding the product store root
pub const REPO_DIR_ENV: &str = "CI_CPP_REPO";

/// Environment variable selecting legacy mode
pub const LEGACY_ENV: &str = "CI_CPP_LEGACY";

/// Subdirectory of the expectation directory used in legacy mode
pub const LEGACY_DATA_SUBDIR: &str = "legacy_202409";
