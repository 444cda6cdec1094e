//! Snapshot verification suites
//!
//! Each suite pairs the statistics products written by a `cp_verify` run
//! with the expectation files they are compared against, one pair per
//! level (run, exposure, detector).

use cpp_compare::Tolerance;
use cpp_config::PipelineMode;
use cpp_core::{DataId, DEFAULT_INSTRUMENT};
use std::fmt;

/// Granularity of a statistics product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Run,
    Exposure,
    Detector,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Run => "run level",
            Level::Exposure => "exposure level",
            Level::Detector => "detector level",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// When a check applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Always,
    CurrentOnly,
    LegacyOnly,
    /// Never run; the reason is reported as the skip message
    Disabled(String),
}

impl Availability {
    /// Why the check is skipped in `mode`, or `None` if it runs
    pub fn skip_reason(&self, mode: PipelineMode) -> Option<String> {
        match (self, mode) {
            (Availability::Always, _) => None,
            (Availability::CurrentOnly, PipelineMode::Current) => None,
            (Availability::CurrentOnly, PipelineMode::Legacy) => {
                Some("not run in legacy mode".to_string())
            }
            (Availability::LegacyOnly, PipelineMode::Legacy) => None,
            (Availability::LegacyOnly, PipelineMode::Current) => {
                Some("only run in legacy mode".to_string())
            }
            (Availability::Disabled(reason), _) => Some(reason.clone()),
        }
    }
}

/// One statistics product and the expectation file it is checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub level: Level,
    pub product_type: String,
    pub expectation: String,
}

impl Component {
    pub fn new(level: Level, product_type: &str, expectation: &str) -> Self {
        Self {
            level,
            product_type: product_type.to_string(),
            expectation: expectation.to_string(),
        }
    }
}

/// A verification suite for one calibration type
#[derive(Debug, Clone)]
pub struct VerificationSuite {
    pub name: String,
    /// Collection the verification run wrote its products to
    pub collection: String,
    pub data_id: DataId,
    pub components: Vec<Component>,
    pub delta: Tolerance,
    pub availability: Availability,
}

impl VerificationSuite {
    /// Suite whose products are named `verify<Kind>Stats`,
    /// `verify<Kind>ExpStats` and `verify<Kind>DetStats`, archived as
    /// `<kind>Run.yaml`, `<kind>Exp.yaml` and `<kind>Det.yaml`
    pub fn standard(name: &str, data_id: DataId, levels: &[Level], delta: f64) -> Self {
        let kind = capitalize(name);
        let components = levels
            .iter()
            .map(|&level| {
                let (product_suffix, file_suffix) = match level {
                    Level::Run => ("Stats", "Run"),
                    Level::Exposure => ("ExpStats", "Exp"),
                    Level::Detector => ("DetStats", "Det"),
                };
                Component::new(
                    level,
                    &format!("verify{}{}", kind, product_suffix),
                    &format!("{}{}.yaml", name, file_suffix),
                )
            })
            .collect();

        Self {
            name: name.to_string(),
            collection: format!("ci_cpv_{}", name),
            data_id,
            components,
            delta: Tolerance::new(delta).unwrap_or_default(),
            availability: Availability::Always,
        }
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// The suites run by `ci-cpp verify`
    pub fn catalog() -> Vec<VerificationSuite> {
        use Level::{Detector, Exposure, Run};

        let detector = DataId::new(DEFAULT_INSTRUMENT).with_detector(0);

        vec![
            Self::standard(
                "bias",
                detector.clone().with_exposure(2021052500015),
                &[Run, Exposure, Detector],
                1.0,
            ),
            Self::standard(
                "dark",
                detector.clone().with_exposure(2021052500057),
                &[Run, Exposure, Detector],
                3.0,
            ),
            Self::standard(
                "flat",
                detector
                    .clone()
                    .with_exposure(2021052500080)
                    .with_dimension("physical_filter", "RG610~empty"),
                &[Run, Exposure, Detector],
                2.0,
            ),
            Self::standard("ptc", detector.clone(), &[Run, Detector], 50.0),
            Self::standard(
                "bfk",
                detector.clone().with_exposure(2021052500190),
                &[Run, Exposure, Detector],
                0.4,
            )
            .with_availability(Availability::Disabled(
                "brighter-fatter kernel fits are not stable".to_string(),
            )),
            Self::standard("linearizer", detector.clone(), &[Run, Detector], 2.0)
                .with_availability(Availability::CurrentOnly),
            Self::standard("crosstalk", detector, &[Run, Detector], 0.4)
                .with_availability(Availability::LegacyOnly),
        ]
    }

    /// Look a catalog suite up by name
    pub fn find(name: &str) -> Option<VerificationSuite> {
        Self::catalog().into_iter().find(|s| s.name == name)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
