//! Mismatch reporting

use cpp_core::DocPath;
use std::fmt;

/// Why two nodes did not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
    /// The two nodes are of different kinds (e.g. number vs string)
    ShapeMismatch,
    /// Two mappings have different key sets
    KeySetMismatch,
    /// Two sequences have different lengths
    LengthMismatch,
    /// Two numbers differ by more than the tolerance
    ToleranceExceeded,
    /// Two non-numeric scalars differ
    ValueMismatch,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::ShapeMismatch => write!(f, "SHAPE"),
            MismatchKind::KeySetMismatch => write!(f, "KEYS"),
            MismatchKind::LengthMismatch => write!(f, "LENGTH"),
            MismatchKind::ToleranceExceeded => write!(f, "TOLERANCE"),
            MismatchKind::ValueMismatch => write!(f, "VALUE"),
        }
    }
}

/// A divergence between the produced and the expected document
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Path from the document root to the divergent node
    pub path: DocPath,
    pub kind: MismatchKind,
    /// Human-readable description
    pub detail: String,
    /// Absolute numeric difference, for `ToleranceExceeded`
    pub delta: Option<f64>,
}

impl Mismatch {
    pub fn new(path: DocPath, kind: MismatchKind, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            detail: detail.into(),
            delta: None,
        }
    }

    pub(crate) fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path, self.detail)
    }
}

impl std::error::Error for Mismatch {}

/// Outcome of comparing one produced document against its expectation
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub label: String,
    pub passed: bool,
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    pub fn new(label: impl Into<String>, mismatches: Vec<Mismatch>) -> Self {
        Self {
            label: label.into(),
            passed: mismatches.is_empty(),
            mismatches,
        }
    }

    /// Print a summary of the comparison
    pub fn print_summary(&self) {
        if self.passed {
            println!("✅ {} - PASS", self.label);
        } else {
            println!(
                "❌ {} - FAIL ({} mismatches)",
                self.label,
                self.mismatches.len()
            );
            for mismatch in &self.mismatches {
                println!(
                    "   [{:>9}] {} : {}",
                    mismatch.kind, mismatch.path, mismatch.detail
                );
            }
        }
    }
}

/// Assert that two documents match, panicking with the first mismatch
///
/// Intended for test code; `label` names the comparison (e.g. "run level").
#[track_caller]
pub fn assert_documents_close(
    produced: &cpp_core::Document,
    expected: &cpp_core::Document,
    tolerance: crate::Tolerance,
    label: &str,
) {
    if let Err(mismatch) = crate::compare(produced, expected, tolerance) {
        panic!("{} (tolerance {}): {}", label, tolerance, mismatch);
    }
}
