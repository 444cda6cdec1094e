//! Verification harness

use crate::error::ArchiveError;
use crate::frame::{FrameSuite, ProcessedExposure};
use crate::outputs::OutputCheck;
use crate::report::{CheckResult, Outcome, VerificationReport};
use crate::suite::{Component, VerificationSuite};
use cpp_compare::Tolerance;
use cpp_config::HarnessConfig;
use cpp_core::{DataId, Document};
use cpp_store::{
    DirectoryExpectationStore, DirectoryProductStore, ExpectationStore, ProductStore, StoreResult,
};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Runs verification suites against a product store and archived expectations
pub struct VerificationHarness<P, E> {
    pub config: HarnessConfig,
    products: P,
    expectations: E,
}

impl VerificationHarness<DirectoryProductStore, DirectoryExpectationStore> {
    /// Harness reading products from `config.repo_dir` and expectations
    /// from the mode's expectation directory
    pub fn from_config(config: HarnessConfig) -> Self {
        let products = DirectoryProductStore::new(&config.repo_dir);
        let expectations = DirectoryExpectationStore::new(config.expectation_dir());
        Self::new(config, products, expectations)
    }
}

impl<P: ProductStore, E: ExpectationStore> VerificationHarness<P, E> {
    pub fn new(config: HarnessConfig, products: P, expectations: E) -> Self {
        Self {
            config,
            products,
            expectations,
        }
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    pub fn expectations(&self) -> &E {
        &self.expectations
    }

    /// Compare one product against its expectation
    pub fn compare_component(
        &self,
        collections: &[String],
        data_id: &DataId,
        component: &Component,
        delta: Tolerance,
    ) -> Outcome {
        let produced = match self.products.get(&component.product_type, data_id, collections) {
            Ok(doc) => doc,
            Err(e) => return Outcome::Error(e.to_string()),
        };
        let expected = match self.expectations.read(&component.expectation) {
            Ok(doc) => doc,
            Err(e) => return Outcome::Error(e.to_string()),
        };

        let mismatches = self.config.strategy.run(&produced, &expected, delta);
        if mismatches.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Mismatched(mismatches)
        }
    }

    /// Compare every component, labelling results `<name>: <level>`
    pub fn generic_comparison(
        &self,
        name: &str,
        collections: &[String],
        data_id: &DataId,
        components: &[Component],
        delta: Tolerance,
    ) -> Vec<CheckResult> {
        components
            .iter()
            .map(|component| {
                let label = format!("{}: {}", name, component.level);
                debug!(
                    "Comparing {} ({} vs {})",
                    label, component.product_type, component.expectation
                );

                let outcome = self.compare_component(collections, data_id, component, delta);
                if !outcome.is_pass() {
                    warn!("{} - {}", label, outcome);
                }
                CheckResult::new(label, outcome)
            })
            .collect()
    }

    pub fn run_suite(&self, suite: &VerificationSuite) -> VerificationReport {
        if let Some(reason) = suite.availability.skip_reason(self.config.mode) {
            info!("Skipping {}: {}", suite.name, reason);
            return std::iter::once(CheckResult::new(suite.name.clone(), Outcome::Skipped(reason)))
                .collect();
        }

        let delta = self.config.delta_for(&suite.name, suite.delta);
        info!("Verifying {} (tolerance {})", suite.name, delta);

        self.generic_comparison(
            &suite.name,
            &[suite.collection.clone()],
            &suite.data_id,
            &suite.components,
            delta,
        )
        .into_iter()
        .collect()
    }

    pub fn run_suites(&self, suites: &[VerificationSuite]) -> VerificationReport {
        let mut report = VerificationReport::new();
        for suite in suites {
            report.merge(self.run_suite(suite));
        }
        report
    }

    /// Run the whole snapshot catalog
    pub fn run_all(&self) -> VerificationReport {
        self.run_suites(&VerificationSuite::catalog())
    }

    /// Check that one product exists and is not empty
    pub fn check_output(&self, check: &OutputCheck) -> CheckResult {
        let name = format!("output: {}", check.name);
        if let Some(reason) = check.availability.skip_reason(self.config.mode) {
            return CheckResult::new(name, Outcome::Skipped(reason));
        }

        let data_id = check.data_id.as_ref().unwrap_or(&self.config.raw_data_id);
        let collections = check
            .collections
            .as_deref()
            .unwrap_or(self.config.collections.as_slice());

        let outcome = match self.products.get(&check.product_type, data_id, collections) {
            Ok(Document::Null) => Outcome::Failed(vec![format!("{} is empty", check.product_type)]),
            Ok(_) => Outcome::Passed,
            Err(e) if e.is_not_found() => Outcome::Failed(vec![e.to_string()]),
            Err(e) => Outcome::Error(e.to_string()),
        };
        CheckResult::new(name, outcome)
    }

    pub fn check_outputs(&self, checks: &[OutputCheck]) -> VerificationReport {
        checks.iter().map(|c| self.check_output(c)).collect()
    }

    /// Fetch the processed exposure and evaluate every frame check
    pub fn run_frame_suite(&self, suite: &FrameSuite) -> CheckResult {
        let name = format!("frame: {}", suite.name);
        if let Some(reason) = suite.availability.skip_reason(self.config.mode) {
            return CheckResult::new(name, Outcome::Skipped(reason));
        }

        let document = match self.products.get(
            &suite.product_type,
            &suite.data_id,
            &[suite.collection.clone()],
        ) {
            Ok(doc) => doc,
            Err(e) => return CheckResult::new(name, Outcome::Error(e.to_string())),
        };
        let exposure = match ProcessedExposure::try_from(&document) {
            Ok(exposure) => exposure,
            Err(e) => return CheckResult::new(name, Outcome::Error(e.to_string())),
        };

        debug!("{}: {} amplifiers", name, exposure.amps.len());
        let failures = suite.evaluate(&exposure);
        let outcome = if failures.is_empty() {
            Outcome::Passed
        } else {
            for failure in &failures {
                warn!("{}", failure);
            }
            Outcome::Failed(failures)
        };
        CheckResult::new(name, outcome)
    }

    pub fn run_frame_suites(&self, suites: &[FrameSuite]) -> VerificationReport {
        suites.iter().map(|s| self.run_frame_suite(s)).collect()
    }

    /// Write the suite's current products as its new expectations
    ///
    /// A suite that would be skipped in the configured mode is refused.
    /// Nothing is written unless every product can be fetched and encoded.
    pub fn archive_suite(
        &self,
        suite: &VerificationSuite,
        target: &DirectoryExpectationStore,
    ) -> Result<Vec<PathBuf>, ArchiveError> {
        if let Some(reason) = suite.availability.skip_reason(self.config.mode) {
            return Err(ArchiveError::Unavailable {
                suite: suite.name.clone(),
                reason,
            });
        }

        let collections = [suite.collection.clone()];
        let documents = suite
            .components
            .iter()
            .map(|c| {
                self.products
                    .get(&c.product_type, &suite.data_id, &collections)
                    .map(|doc| (c.expectation.as_str(), doc))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        info!("Archiving {} into {:?}", suite.name, target.dir());
        let written = target.write_all(documents.iter().map(|(name, doc)| (*name, doc)))?;
        Ok(written)
    }
}
