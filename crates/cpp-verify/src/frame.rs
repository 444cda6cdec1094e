//! Frame statistics checks (DMTN-101)
//!
//! A processed exposure is exported as a document with one entry per
//! amplifier:
//!
//! ```yaml
//! detector: 0
//! amps:
//!   - name: C00
//!     read_noise: 7.1
//!     pixels: [0.3, -1.2, ...]
//!     mask: [0, 8, ...]     # optional, afw mask bits
//! ```
//!
//! The CR plane is expected to be set already by the repair step that
//! produced the export.

use crate::stats::{self, StatisticsControl};
use crate::suite::Availability;
use bitflags::bitflags;
use cpp_core::{DataId, Document, DEFAULT_INSTRUMENT};
use thiserror::Error;

bitflags! {
    /// Mask planes, using the afw default bit assignment
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MaskPlanes: u32 {
        const BAD = 1 << 0;
        const SAT = 1 << 1;
        const INTRP = 1 << 2;
        const CR = 1 << 3;
        const EDGE = 1 << 4;
        const DETECTED = 1 << 5;
        const DETECTED_NEGATIVE = 1 << 6;
        const SUSPECT = 1 << 7;
        const NO_DATA = 1 << 8;
    }
}

impl MaskPlanes {
    /// Planes excluded from masked-image noise measurements
    pub fn bad_pixels() -> Self {
        MaskPlanes::SAT | MaskPlanes::BAD | MaskPlanes::NO_DATA
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Malformed exposure: {field}: {reason}")]
    Malformed { field: String, reason: String },
}

impl FrameError {
    fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FrameError::Malformed {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Pixels of one amplifier
#[derive(Debug, Clone, PartialEq)]
pub struct AmpImage {
    pub name: String,
    pub read_noise: f64,
    pub pixels: Vec<f64>,
    /// Same length as `pixels`
    pub mask: Vec<u32>,
}

impl AmpImage {
    pub fn new(name: impl Into<String>, read_noise: f64, pixels: Vec<f64>) -> Self {
        let mask = vec![0; pixels.len()];
        Self {
            name: name.into(),
            read_noise,
            pixels,
            mask,
        }
    }

    pub fn with_mask(mut self, mask: Vec<u32>) -> Self {
        self.mask = mask;
        self
    }

    fn from_document(doc: &Document, index: usize) -> Result<Self, FrameError> {
        let prefix = format!("amps[{}]", index);
        let name = field(doc, &prefix, "name")?
            .as_str()
            .ok_or_else(|| FrameError::malformed(format!("{}.name", prefix), "expected a string"))?
            .to_string();
        let read_noise = number(
            field(doc, &prefix, "read_noise")?,
            &format!("{}.read_noise", prefix),
        )?;

        let pixels = field(doc, &prefix, "pixels")?
            .as_sequence()
            .ok_or_else(|| {
                FrameError::malformed(format!("{}.pixels", prefix), "expected a sequence")
            })?
            .iter()
            .enumerate()
            .map(|(i, p)| match p {
                Document::Null => Ok(f64::NAN),
                other => number(other, &format!("{}.pixels[{}]", prefix, i)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mask = match doc.get("mask") {
            None | Some(Document::Null) => vec![0; pixels.len()],
            Some(mask) => {
                let bits = mask
                    .as_sequence()
                    .ok_or_else(|| {
                        FrameError::malformed(format!("{}.mask", prefix), "expected a sequence")
                    })?
                    .iter()
                    .enumerate()
                    .map(|(i, m)| mask_bits(m, &format!("{}.mask[{}]", prefix, i)))
                    .collect::<Result<Vec<_>, _>>()?;
                if bits.len() != pixels.len() {
                    return Err(FrameError::malformed(
                        format!("{}.mask", prefix),
                        format!("{} mask entries for {} pixels", bits.len(), pixels.len()),
                    ));
                }
                bits
            }
        };

        Ok(Self {
            name,
            read_noise,
            pixels,
            mask,
        })
    }
}

fn field<'a>(doc: &'a Document, prefix: &str, key: &str) -> Result<&'a Document, FrameError> {
    doc.get(key)
        .ok_or_else(|| FrameError::malformed(format!("{}.{}", prefix, key), "missing"))
}

fn number(doc: &Document, field: &str) -> Result<f64, FrameError> {
    doc.as_f64()
        .ok_or_else(|| {
            FrameError::malformed(field, format!("expected a number, found {}", doc.kind()))
        })
}

fn mask_bits(doc: &Document, field: &str) -> Result<u32, FrameError> {
    let value = number(doc, field)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(FrameError::malformed(field, format!("invalid mask value {}", value)));
    }
    Ok(value as u32)
}

/// A processed exposure as exported for frame checks
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedExposure {
    pub detector: u32,
    pub amps: Vec<AmpImage>,
}

impl ProcessedExposure {
    /// Every pixel of every amplifier, ignoring masks
    pub fn all_pixels(&self) -> Vec<f64> {
        self.amps.iter().flat_map(|a| a.pixels.iter().copied()).collect()
    }
}

impl TryFrom<&Document> for ProcessedExposure {
    type Error = FrameError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        if doc.as_mapping().is_none() {
            return Err(FrameError::malformed(
                "<root>",
                format!("expected a mapping, found {}", doc.kind()),
            ));
        }

        let detector = match doc.get("detector") {
            Some(d) => {
                let value = number(d, "detector")?;
                if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
                    return Err(FrameError::malformed(
                        "detector",
                        format!("invalid detector {}", value),
                    ));
                }
                value as u32
            }
            None => return Err(FrameError::malformed("detector", "missing")),
        };

        let amps = doc
            .get("amps")
            .ok_or_else(|| FrameError::malformed("amps", "missing"))?
            .as_sequence()
            .ok_or_else(|| FrameError::malformed("amps", "expected a sequence"))?
            .iter()
            .enumerate()
            .map(|(i, amp)| AmpImage::from_document(amp, i))
            .collect::<Result<Vec<_>, _>>()?;

        if amps.is_empty() {
            return Err(FrameError::malformed("amps", "no amplifiers"));
        }

        Ok(Self { detector, amps })
    }
}

/// One acceptance criterion
#[derive(Debug, Clone, PartialEq)]
pub enum FrameCheck {
    /// `|mean| < limit` over the whole frame
    MeanBelow { test: String, limit: f64 },
    /// `|mean - expected| < stddev` over the whole frame
    MeanWithinSigma { test: String, expected: f64 },
    /// `stddev < limit` over the whole frame
    SigmaBelow { test: String, limit: f64 },
    /// Per amp: `|clipped sigma - read noise| / read noise < max_fractional_error`
    ReadNoise {
        test: String,
        max_fractional_error: f64,
        /// Planes excluded from the clipped sigma
        and_mask: MaskPlanes,
    },
    /// Per amp: `|sigma - clipped sigma| / clipped sigma < max_fractional_error`
    CrConsistency {
        test: String,
        max_fractional_error: f64,
        /// Planes excluded from the clipped sigma
        clip_mask: MaskPlanes,
        /// Planes excluded from the unclipped, cosmic-ray rejected sigma
        and_mask: MaskPlanes,
    },
}

impl FrameCheck {
    pub fn test_id(&self) -> &str {
        match self {
            FrameCheck::MeanBelow { test, .. }
            | FrameCheck::MeanWithinSigma { test, .. }
            | FrameCheck::SigmaBelow { test, .. }
            | FrameCheck::ReadNoise { test, .. }
            | FrameCheck::CrConsistency { test, .. } => test,
        }
    }

    /// Failure messages; empty when the check passes
    pub fn evaluate(&self, exposure: &ProcessedExposure) -> Vec<String> {
        match self {
            FrameCheck::MeanBelow { test, limit } => {
                let mean = stats::mean(&exposure.all_pixels());
                if mean.abs() < *limit {
                    Vec::new()
                } else {
                    vec![format!("Test {}: mean {} (limit {})", test, mean, limit)]
                }
            }
            FrameCheck::MeanWithinSigma { test, expected } => {
                let pixels = exposure.all_pixels();
                let mean = stats::mean(&pixels);
                let sigma = stats::stddev(&pixels);
                if (mean - expected).abs() < sigma {
                    Vec::new()
                } else {
                    vec![format!(
                        "Test {}: mean {} expected {} sigma {}",
                        test, mean, expected, sigma
                    )]
                }
            }
            FrameCheck::SigmaBelow { test, limit } => {
                let sigma = stats::stddev(&exposure.all_pixels());
                if sigma < *limit {
                    Vec::new()
                } else {
                    vec![format!("Test {}: sigma {} (limit {})", test, sigma, limit)]
                }
            }
            FrameCheck::ReadNoise {
                test,
                max_fractional_error,
                and_mask,
            } => exposure
                .amps
                .iter()
                .filter_map(|amp| {
                    let clip = StatisticsControl::new(5.0, 5).with_and_mask(*and_mask);
                    let sigma = stats::clipped_stddev(&amp.pixels, &amp.mask, &clip);
                    let error = (sigma - amp.read_noise).abs() / amp.read_noise;
                    if error < *max_fractional_error {
                        None
                    } else {
                        Some(format!(
                            "Test {}: {} {} (limit {})",
                            test, amp.name, error, max_fractional_error
                        ))
                    }
                })
                .collect(),
            FrameCheck::CrConsistency {
                test,
                max_fractional_error,
                clip_mask,
                and_mask,
            } => exposure
                .amps
                .iter()
                .filter_map(|amp| {
                    let clip = StatisticsControl::new(5.0, 5).with_and_mask(*clip_mask);
                    let sigma_clip = stats::clipped_stddev(&amp.pixels, &amp.mask, &clip);
                    let sigma = stats::masked_stddev(&amp.pixels, &amp.mask, *and_mask);
                    let error = (sigma - sigma_clip).abs() / sigma_clip;
                    if error < *max_fractional_error {
                        None
                    } else {
                        Some(format!(
                            "Test {}: {} {} (limit {})",
                            test, amp.name, error, max_fractional_error
                        ))
                    }
                })
                .collect(),
        }
    }
}

/// Frame checks for one processed calibration exposure
#[derive(Debug, Clone)]
pub struct FrameSuite {
    pub name: String,
    pub collection: String,
    pub product_type: String,
    pub data_id: DataId,
    pub checks: Vec<FrameCheck>,
    pub availability: Availability,
}

impl FrameSuite {
    fn new(name: &str, collection: &str, exposure: u64, checks: Vec<FrameCheck>) -> Self {
        Self {
            name: name.to_string(),
            collection: collection.to_string(),
            product_type: "postISRCCD".to_string(),
            data_id: DataId::new(DEFAULT_INSTRUMENT)
                .with_detector(0)
                .with_exposure(exposure),
            checks,
            availability: Availability::Always,
        }
    }

    /// Bias (4.x), dark (5.x) and flat (10.x) acceptance tests
    pub fn catalog() -> Vec<FrameSuite> {
        let mut bias = Self::new(
            "bias",
            "ci_cpp_isrBias",
            2021052500015,
            vec![
                FrameCheck::MeanBelow {
                    test: "4.2".to_string(),
                    limit: 1.0,
                },
                FrameCheck::ReadNoise {
                    test: "4.3".to_string(),
                    max_fractional_error: 0.71,
                    and_mask: MaskPlanes::bad_pixels(),
                },
                FrameCheck::CrConsistency {
                    test: "4.4".to_string(),
                    max_fractional_error: 3.0,
                    clip_mask: MaskPlanes::bad_pixels(),
                    and_mask: MaskPlanes::bad_pixels() | MaskPlanes::CR,
                },
            ],
        );
        bias.availability = Availability::LegacyOnly;

        let dark = Self::new(
            "dark",
            "ci_cpp_isrDark",
            2021052500057,
            vec![
                FrameCheck::MeanWithinSigma {
                    test: "5.2".to_string(),
                    expected: 0.0,
                },
                // dark statistics read the bare image, so only the repaired
                // cosmic rays drop out
                FrameCheck::ReadNoise {
                    test: "5.3".to_string(),
                    max_fractional_error: 0.71,
                    and_mask: MaskPlanes::empty(),
                },
                FrameCheck::CrConsistency {
                    test: "5.4".to_string(),
                    max_fractional_error: 5.0,
                    clip_mask: MaskPlanes::empty(),
                    and_mask: MaskPlanes::CR,
                },
            ],
        );

        let flat = Self::new(
            "flat",
            "ci_cpp_isrFlat",
            2021052500080,
            vec![
                FrameCheck::MeanWithinSigma {
                    test: "10.X".to_string(),
                    expected: 10000.0,
                },
                FrameCheck::SigmaBelow {
                    test: "10.X2".to_string(),
                    limit: 3000.0,
                },
            ],
        );

        vec![bias, dark, flat]
    }

    pub fn find(name: &str) -> Option<FrameSuite> {
        Self::catalog().into_iter().find(|s| s.name == name)
    }

    /// Run every check, collecting all failure messages
    pub fn evaluate(&self, exposure: &ProcessedExposure) -> Vec<String> {
        self.checks.iter().flat_map(|c| c.evaluate(exposure)).collect()
    }
}
