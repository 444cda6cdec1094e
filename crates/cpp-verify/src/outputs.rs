//! Output presence checks

use crate::suite::Availability;
use cpp_core::{DataId, DEFAULT_INSTRUMENT};

/// A product the pipeline must have written
///
/// `data_id` and `collections` fall back to the harness defaults when unset.
#[derive(Debug, Clone)]
pub struct OutputCheck {
    pub name: String,
    pub product_type: String,
    pub data_id: Option<DataId>,
    pub collections: Option<Vec<String>>,
    pub availability: Availability,
}

impl OutputCheck {
    pub fn new(product_type: &str) -> Self {
        Self {
            name: product_type.to_string(),
            product_type: product_type.to_string(),
            data_id: None,
            collections: None,
            availability: Availability::Always,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn at_exposure(mut self, exposure: u64) -> Self {
        self.data_id = Some(
            DataId::new(DEFAULT_INSTRUMENT)
                .with_detector(0)
                .with_exposure(exposure),
        );
        self
    }

    pub fn in_collection(mut self, collection: &str) -> Self {
        self.collections = Some(vec![collection.to_string()]);
        self
    }

    pub fn legacy_only(mut self) -> Self {
        self.availability = Availability::LegacyOnly;
        self
    }

    /// Every product the calibration pipeline writes
    pub fn catalog() -> Vec<OutputCheck> {
        vec![
            Self::new("camera"),
            Self::new("bias"),
            Self::new("dark"),
            Self::new("flat"),
            Self::new("crosstalk"),
            Self::new("ptc"),
            Self::new("bfk").legacy_only(),
            Self::new("cpPtcPartial")
                .named("gain")
                .at_exposure(2021052500079)
                .legacy_only(),
            Self::new("linearizer"),
            Self::new("defects"),
            Self::new("postISRCCD")
                .named("science")
                .at_exposure(2021052500198)
                .in_collection("ci_cpp_science"),
            Self::new("sky"),
            Self::new("cti").legacy_only(),
            Self::new("postISRCCD")
                .named("ctiProc")
                .at_exposure(2021052500077)
                .in_collection("ci_cpp_ctiProc")
                .legacy_only(),
        ]
    }
}
