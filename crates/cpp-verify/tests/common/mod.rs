//! Shared fixtures for the verification integration tests

#![allow(dead_code)]

use cpp_core::Document;
use cpp_store::MemoryProductStore;
use cpp_verify::{AmpImage, ProcessedExposure, VerificationSuite};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// A small statistics document shaped like the cp_verify outputs
pub fn stats_document(offset: f64) -> Document {
    let amp = |mean: f64, noise: f64| {
        Document::mapping([
            ("MEAN", Document::from(mean + offset)),
            ("NOISE", Document::from(noise + offset)),
            ("CR_NOISE", Document::from(noise * 1.01 + offset)),
        ])
    };

    Document::mapping([
        (
            "AMP",
            Document::mapping([("C00", amp(0.12, 7.1)), ("C01", amp(-0.04, 6.9))]),
        ),
        ("SUCCESS", Document::from(true)),
        ("FAILURES", Document::sequence(Vec::<Document>::new())),
    ])
}

/// Products and expectations for every catalog suite, offset from each other
pub fn populate(offset: f64) -> (MemoryProductStore, HashMap<String, Document>) {
    let store = MemoryProductStore::new();
    let mut expectations = HashMap::new();

    for suite in VerificationSuite::catalog() {
        for component in &suite.components {
            store.insert(
                suite.collection.as_str(),
                component.product_type.as_str(),
                suite.data_id.clone(),
                stats_document(offset),
            );
            expectations.insert(component.expectation.clone(), stats_document(0.0));
        }
    }

    (store, expectations)
}

/// Gaussian sample by the Box-Muller transform
pub fn gaussian(rng: &mut ChaCha8Rng, mean: f64, sigma: f64) -> f64 {
    // (0, 1] keeps the logarithm finite
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = rng.r#gen::<f64>();
    mean + sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Four-amp exposure with gaussian pixels, the same for every call
pub fn exposure(level: f64, sigma: f64, read_noise: f64) -> ProcessedExposure {
    let mut rng = ChaCha8Rng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
    let amps = ["C00", "C01", "C10", "C11"]
        .iter()
        .map(|name| {
            let pixels = (0..1500).map(|_| gaussian(&mut rng, level, sigma)).collect();
            AmpImage::new(*name, read_noise, pixels)
        })
        .collect();
    ProcessedExposure { detector: 0, amps }
}

/// Document form of a processed exposure, as exported for frame checks
pub fn exposure_document(exposure: &ProcessedExposure) -> Document {
    let amps: Vec<Document> = exposure
        .amps
        .iter()
        .map(|amp| {
            Document::mapping([
                ("name", Document::from(amp.name.as_str())),
                ("read_noise", Document::from(amp.read_noise)),
                ("pixels", Document::sequence(amp.pixels.iter().copied())),
                ("mask", Document::sequence(amp.mask.iter().copied())),
            ])
        })
        .collect();

    Document::mapping([
        ("detector", Document::from(exposure.detector)),
        ("amps", Document::Sequence(amps)),
    ])
}
