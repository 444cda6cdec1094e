//! Verification results

use cpp_compare::Mismatch;
use std::fmt;

/// What happened to a single check
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    /// Produced document diverged from its expectation
    Mismatched(Vec<Mismatch>),
    /// Frame statistics outside their limits, one message per failure
    Failed(Vec<String>),
    /// Not applicable in the configured mode
    Skipped(String),
    /// Inputs could not be fetched or parsed
    Error(String),
}

impl Outcome {
    /// Skipped checks count as passing
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Skipped(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "PASS"),
            Outcome::Mismatched(m) => write!(f, "FAIL ({} mismatches)", m.len()),
            Outcome::Failed(msgs) => write!(f, "FAIL ({} checks)", msgs.len()),
            Outcome::Skipped(reason) => write!(f, "SKIP ({})", reason),
            Outcome::Error(err) => write!(f, "ERROR ({})", err),
        }
    }
}

/// Named result of one check, e.g. "bias: run level"
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub outcome: Outcome,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }

    pub fn print_summary(&self) {
        let marker = if self.passed() { "✅" } else { "❌" };
        println!("{} {} - {}", marker, self.name, self.outcome);

        match &self.outcome {
            Outcome::Mismatched(mismatches) => {
                for mismatch in mismatches {
                    println!(
                        "   [{:>9}] {} : {}",
                        mismatch.kind, mismatch.path, mismatch.detail
                    );
                }
            }
            Outcome::Failed(messages) => {
                for message in messages {
                    println!("   {}", message);
                }
            }
            _ => {}
        }
    }
}

/// Aggregated results of a verification run
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub results: Vec<CheckResult>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// Append every result of another report
    pub fn merge(&mut self, other: VerificationReport) {
        self.results.extend(other.results);
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Passed))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(CheckResult::passed)
    }

    pub fn print_summary(&self) {
        println!("\n=== Verification Summary ===");
        for result in &self.results {
            result.print_summary();
        }

        let total = self.results.len();
        println!();
        println!(
            "Results: {}/{} passed, {} skipped",
            self.passed_count(),
            total,
            self.skipped_count()
        );

        if self.all_passed() {
            println!("✅ All checks passed!");
        } else {
            println!("❌ {} checks failed", self.failed_count());
        }
    }
}

impl Extend<CheckResult> for VerificationReport {
    fn extend<T: IntoIterator<Item = CheckResult>>(&mut self, iter: T) {
        self.results.extend(iter);
    }
}

impl FromIterator<CheckResult> for VerificationReport {
    fn from_iter<T: IntoIterator<Item = CheckResult>>(iter: T) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
