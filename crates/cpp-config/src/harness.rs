//! Harness configuration

use crate::error::{ConfigError, ConfigResult};
use crate::mode::PipelineMode;
use crate::{LEGACY_DATA_SUBDIR, LEGACY_ENV, PACKAGE_DIR_ENV, REPO_DIR_ENV};
use cpp_compare::{CompareStrategy, Tolerance};
use cpp_core::{DataId, DEFAULT_INSTRUMENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the optional configuration file in the package directory
pub const CONFIG_FILE_NAME: &str = "ci_cpp.yaml";

/// Configuration for a verification run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root of the verification package
    pub package_dir: PathBuf,
    /// Root of the product store
    pub repo_dir: PathBuf,
    /// Current or legacy pipeline release
    pub mode: PipelineMode,
    /// Collections searched for products that do not name their own
    pub collections: Vec<String>,
    /// Data id used for products that do not name their own
    pub raw_data_id: DataId,
    /// Fail-fast or fail-all document comparison
    pub strategy: CompareStrategy,
    /// Per-suite tolerance overrides, keyed by suite name
    pub delta_overrides: BTreeMap<String, Tolerance>,
}

/// On-disk form of `ci_cpp.yaml`; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessFile {
    /// Product store root, relative to the package directory
    #[serde(default)]
    pub repo_dir: Option<PathBuf>,
    #[serde(default)]
    pub legacy: Option<bool>,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
    #[serde(default)]
    pub raw_data_id: Option<DataId>,
    #[serde(default)]
    pub strategy: Option<CompareStrategy>,
    #[serde(default)]
    pub deltas: BTreeMap<String, f64>,
}

impl HarnessConfig {
    /// Built-in defaults rooted at `package_dir`
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        let package_dir = package_dir.into();
        Self {
            repo_dir: package_dir.join("DATA"),
            package_dir,
            mode: PipelineMode::Current,
            collections: default_collections(),
            raw_data_id: DataId::new(DEFAULT_INSTRUMENT)
                .with_detector(0)
                .with_exposure(2021052500015),
            strategy: CompareStrategy::FailFast,
            delta_overrides: BTreeMap::new(),
        }
    }

    /// Load configuration from environment variables and, when present,
    /// the package's `ci_cpp.yaml`
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup
    pub fn from_vars<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let package_dir = lookup(PACKAGE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::new(&package_dir);
        let file = package_dir.join(CONFIG_FILE_NAME);
        if file.exists() {
            config.apply_file(&file)?;
        }
        config.apply_vars(lookup)?;
        Ok(config)
    }

    /// Load an explicit configuration file, then apply the environment
    ///
    /// The package directory defaults to the file's directory.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let package_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::new(package_dir);
        config.apply_file(path)?;
        config.apply_vars(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Merge a configuration file into this configuration
    pub fn apply_file(&mut self, path: &Path) -> ConfigResult<()> {
        debug!("Loading harness config: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: HarnessFile = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.apply(file)
    }

    /// Merge parsed file settings into this configuration
    pub fn apply(&mut self, file: HarnessFile) -> ConfigResult<()> {
        if let Some(repo_dir) = file.repo_dir {
            self.repo_dir = if repo_dir.is_absolute() {
                repo_dir
            } else {
                self.package_dir.join(repo_dir)
            };
        }
        if let Some(legacy) = file.legacy {
            self.mode = if legacy {
                PipelineMode::Legacy
            } else {
                PipelineMode::Current
            };
        }
        if let Some(collections) = file.collections {
            if collections.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "collections".to_string(),
                    reason: "at least one collection is required".to_string(),
                });
            }
            self.collections = collections;
        }
        if let Some(raw_data_id) = file.raw_data_id {
            self.raw_data_id = raw_data_id;
        }
        if let Some(strategy) = file.strategy {
            self.strategy = strategy;
        }
        for (suite, delta) in file.deltas {
            let tolerance = Tolerance::new(delta).map_err(|e| ConfigError::InvalidValue {
                key: format!("deltas.{}", suite),
                reason: e.to_string(),
            })?;
            self.delta_overrides.insert(suite, tolerance);
        }
        Ok(())
    }

    /// Apply environment overrides; `CI_CPP_DIR` is only read at construction
    pub fn apply_vars<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(repo) = lookup(REPO_DIR_ENV) {
            self.repo_dir = PathBuf::from(repo);
        }
        if let Some(flag) = lookup(LEGACY_ENV) {
            self.mode = PipelineMode::from_flag(&flag)?;
        }
        Ok(())
    }

    /// Directory holding the archived expectation files for the active mode
    pub fn expectation_dir(&self) -> PathBuf {
        let base = self.package_dir.join("tests").join("data");
        match self.mode {
            PipelineMode::Current => base,
            PipelineMode::Legacy => base.join(LEGACY_DATA_SUBDIR),
        }
    }

    /// Tolerance for a suite: the configured override, else `default`
    pub fn delta_for(&self, suite: &str, default: Tolerance) -> Tolerance {
        self.delta_overrides.get(suite).copied().unwrap_or(default)
    }

    pub fn with_mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: CompareStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

fn default_collections() -> Vec<String> {
    vec![
        "LATISS/raw/all".to_string(),
        "calib/v00".to_string(),
        "LATISS/calib".to_string(),
    ]
}
