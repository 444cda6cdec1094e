//! Absolute numeric tolerance

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid tolerances
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToleranceError {
    #[error("tolerance must be non-negative, got {0}")]
    Negative(f64),

    #[error("tolerance must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("tolerance '{0}' is not a number")]
    Unparseable(String),
}

/// Maximum allowed absolute difference between two numeric leaves
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Exact comparison
    pub const ZERO: Tolerance = Tolerance(0.0);

    /// Delta used for plain document comparisons when the caller has no
    /// artifact-specific value
    pub const DEFAULT_DELTA: f64 = 0.2;

    pub fn new(delta: f64) -> Result<Self, ToleranceError> {
        if delta.is_nan() || delta.is_infinite() {
            return Err(ToleranceError::NotFinite(delta));
        }
        if delta < 0.0 {
            return Err(ToleranceError::Negative(delta));
        }
        Ok(Self(delta))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(Self::DEFAULT_DELTA)
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = ToleranceError;

    fn try_from(delta: f64) -> Result<Self, Self::Error> {
        Self::new(delta)
    }
}

impl FromStr for Tolerance {
    type Err = ToleranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let delta: f64 = s
            .trim()
            .parse()
            .map_err(|_| ToleranceError::Unparseable(s.to_string()))?;
        Self::new(delta)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
