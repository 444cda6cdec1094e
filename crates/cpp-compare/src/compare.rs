//! The comparison walk

use crate::report::{Mismatch, MismatchKind};
use crate::tolerance::Tolerance;
use cpp_core::{DocPath, Document};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Whether a comparison stops at the first mismatch or collects all of them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareStrategy {
    #[default]
    FailFast,
    FailAll,
}

impl CompareStrategy {
    /// Run a comparison under this strategy; an empty vector means success
    pub fn run(
        self,
        produced: &Document,
        expected: &Document,
        tolerance: Tolerance,
    ) -> Vec<Mismatch> {
        match self {
            CompareStrategy::FailFast => compare(produced, expected, tolerance)
                .err()
                .into_iter()
                .collect(),
            CompareStrategy::FailAll => compare_all(produced, expected, tolerance),
        }
    }
}

/// Compare two documents, stopping at the first mismatch
///
/// Mapping keys are visited in the produced document's order, sequences by
/// position, depth first.
pub fn compare(
    produced: &Document,
    expected: &Document,
    tolerance: Tolerance,
) -> Result<(), Mismatch> {
    let mut walker = Walker::new(tolerance, true);
    let _ = walker.walk(&DocPath::root(), produced, expected);
    match walker.mismatches.pop() {
        Some(mismatch) => Err(mismatch),
        None => Ok(()),
    }
}

/// Compare two documents and collect every mismatch
///
/// Shared keys of mappings with differing key sets, and the common prefix of
/// sequences with differing lengths, are still compared.
pub fn compare_all(
    produced: &Document,
    expected: &Document,
    tolerance: Tolerance,
) -> Vec<Mismatch> {
    let mut walker = Walker::new(tolerance, false);
    let _ = walker.walk(&DocPath::root(), produced, expected);
    walker.mismatches
}

/// Numeric leaf rule: exact equality, both NaN, or within the tolerance
pub fn numbers_close(produced: f64, expected: f64, tolerance: Tolerance) -> bool {
    if produced.is_nan() && expected.is_nan() {
        return true;
    }
    produced == expected || (produced - expected).abs() <= tolerance.value()
}

/// Signals the walk to unwind after a fail-fast mismatch
struct Stop;

struct Walker {
    tolerance: Tolerance,
    fail_fast: bool,
    mismatches: Vec<Mismatch>,
}

impl Walker {
    fn new(tolerance: Tolerance, fail_fast: bool) -> Self {
        Self {
            tolerance,
            fail_fast,
            mismatches: Vec::new(),
        }
    }

    fn record(&mut self, mismatch: Mismatch) -> Result<(), Stop> {
        trace!("mismatch: {}", mismatch);
        self.mismatches.push(mismatch);
        if self.fail_fast {
            Err(Stop)
        } else {
            Ok(())
        }
    }

    fn walk(
        &mut self,
        path: &DocPath,
        produced: &Document,
        expected: &Document,
    ) -> Result<(), Stop> {
        if produced.kind() != expected.kind() {
            return self.record(Mismatch::new(
                path.clone(),
                MismatchKind::ShapeMismatch,
                format!("expected {}, found {}", expected.kind(), produced.kind()),
            ));
        }

        match (produced, expected) {
            (Document::Mapping(p_map), Document::Mapping(e_map)) => {
                let missing: Vec<&str> = e_map
                    .keys()
                    .filter(|k| !p_map.contains_key(*k))
                    .map(String::as_str)
                    .collect();
                let unexpected: Vec<&str> = p_map
                    .keys()
                    .filter(|k| !e_map.contains_key(*k))
                    .map(String::as_str)
                    .collect();

                if !missing.is_empty() || !unexpected.is_empty() {
                    self.record(Mismatch::new(
                        path.clone(),
                        MismatchKind::KeySetMismatch,
                        describe_key_sets(&missing, &unexpected),
                    ))?;
                }

                for (key, p_value) in p_map {
                    if let Some(e_value) = e_map.get(key) {
                        self.walk(&path.key(key), p_value, e_value)?;
                    }
                }
                Ok(())
            }
            (Document::Sequence(p_seq), Document::Sequence(e_seq)) => {
                if p_seq.len() != e_seq.len() {
                    self.record(Mismatch::new(
                        path.clone(),
                        MismatchKind::LengthMismatch,
                        format!("expected {} elements, found {}", e_seq.len(), p_seq.len()),
                    ))?;
                }

                for (i, (p_item, e_item)) in p_seq.iter().zip(e_seq.iter()).enumerate() {
                    self.walk(&path.index(i), p_item, e_item)?;
                }
                Ok(())
            }
            (Document::Number(p), Document::Number(e)) => {
                if numbers_close(*p, *e, self.tolerance) {
                    return Ok(());
                }
                let delta = (p - e).abs();
                self.record(
                    Mismatch::new(
                        path.clone(),
                        MismatchKind::ToleranceExceeded,
                        format!(
                            "produced {}, expected {}, delta {} exceeds tolerance {}",
                            p, e, delta, self.tolerance
                        ),
                    )
                    .with_delta(delta),
                )
            }
            _ => {
                if produced == expected {
                    return Ok(());
                }
                self.record(Mismatch::new(
                    path.clone(),
                    MismatchKind::ValueMismatch,
                    format!("expected {}, found {}", expected, produced),
                ))
            }
        }
    }
}

fn describe_key_sets(missing: &[&str], unexpected: &[&str]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing keys [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected keys [{}]", unexpected.join(", ")));
    }
    parts.join("; ")
}
