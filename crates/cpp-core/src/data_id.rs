//! Data identifiers used to look products up in a store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for unparseable data ids
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataIdError {
    #[error("data id must contain an 'instrument' dimension")]
    MissingInstrument,

    #[error("dimension '{0}' must be written as key=value")]
    InvalidDimension(String),

    #[error("dimension '{key}' has invalid value '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("dimension '{0}' given more than once")]
    DuplicateDimension(String),
}

/// Identifies a product: instrument, detector, exposure and any extra
/// dimensions (e.g. `physical_filter`)
///
/// Parses from and displays as `instrument=LATISS,detector=0,exposure=2021052500015`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataId {
    pub instrument: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl DataId {
    /// Create an instrument-level data id
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            detector: None,
            exposure: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_detector(mut self, detector: u32) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_exposure(mut self, exposure: u64) -> Self {
        self.exposure = Some(exposure);
        self
    }

    /// Add an extra dimension such as `physical_filter`
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Ordered key/value pairs: instrument, detector, exposure, then extras
    /// sorted by key
    pub fn dimensions(&self) -> Vec<(String, String)> {
        let mut dims = vec![("instrument".to_string(), self.instrument.clone())];
        if let Some(detector) = self.detector {
            dims.push(("detector".to_string(), detector.to_string()));
        }
        if let Some(exposure) = self.exposure {
            dims.push(("exposure".to_string(), exposure.to_string()));
        }
        dims.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        dims
    }

    /// File stem used by directory-backed stores
    ///
    /// Path separators in values are replaced so the stem is always a
    /// single path component.
    pub fn file_stem(&self) -> String {
        self.dimensions()
            .into_iter()
            .map(|(k, v)| format!("{}-{}", k, sanitize(&v)))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// This id followed by progressively coarser ids
    ///
    /// Calibrations are stored per detector (or per instrument) but are
    /// looked up with an exposure-level id, so a lookup walks from the most
    /// specific id to the least.
    pub fn lookup_chain(&self) -> Vec<DataId> {
        let mut chain = vec![self.clone()];

        if self.exposure.is_some() || !self.extra.is_empty() {
            let mut coarser = DataId::new(self.instrument.clone());
            coarser.detector = self.detector;
            chain.push(coarser);
        }

        if self.detector.is_some() {
            chain.push(DataId::new(self.instrument.clone()));
        }

        chain
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

impl FromStr for DataId {
    type Err = DataIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut instrument = None;
        let mut detector = None;
        let mut exposure = None;
        let mut extra = BTreeMap::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| DataIdError::InvalidDimension(part.to_string()))?;

            if key.is_empty() || value.is_empty() {
                return Err(DataIdError::InvalidDimension(part.to_string()));
            }

            let invalid = || DataIdError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            };

            let duplicate = match key {
                "instrument" => instrument.replace(value.to_string()).is_some(),
                "detector" => detector
                    .replace(value.parse::<u32>().map_err(|_| invalid())?)
                    .is_some(),
                "exposure" => exposure
                    .replace(value.parse::<u64>().map_err(|_| invalid())?)
                    .is_some(),
                _ => extra.insert(key.to_string(), value.to_string()).is_some(),
            };

            if duplicate {
                return Err(DataIdError::DuplicateDimension(key.to_string()));
            }
        }

        Ok(Self {
            instrument: instrument.ok_or(DataIdError::MissingInstrument)?,
            detector,
            exposure,
            extra,
        })
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .dimensions()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", rendered.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_id() -> DataId {
        DataId::new("LATISS")
            .with_detector(0)
            .with_exposure(2021052500015)
    }

    #[test]
    fn test_display_and_parse() {
        let id = raw_id();
        assert_eq!(
            id.to_string(),
            "instrument=LATISS,detector=0,exposure=2021052500015"
        );
        let parsed: DataId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_extra_dimension() {
        let id: DataId = "instrument=LATISS, detector=0, physical_filter=RG610~empty"
            .parse()
            .unwrap();
        assert_eq!(id.detector, Some(0));
        assert_eq!(id.exposure, None);
        assert_eq!(
            id.extra.get("physical_filter").map(String::as_str),
            Some("RG610~empty")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "detector=0".parse::<DataId>(),
            Err(DataIdError::MissingInstrument)
        );
        assert!(matches!(
            "instrument=LATISS,detector".parse::<DataId>(),
            Err(DataIdError::InvalidDimension(_))
        ));
        assert!(matches!(
            "instrument=LATISS,detector=zero".parse::<DataId>(),
            Err(DataIdError::InvalidValue { .. })
        ));
        assert!(matches!(
            "instrument=LATISS,instrument=LSSTCam".parse::<DataId>(),
            Err(DataIdError::DuplicateDimension(_))
        ));
    }

    #[test]
    fn test_file_stem() {
        let id = raw_id().with_dimension("physical_filter", "RG610/empty");
        assert_eq!(
            id.file_stem(),
            "instrument-LATISS_detector-0_exposure-2021052500015_physical_filter-RG610_empty"
        );
    }

    #[test]
    fn test_lookup_chain() {
        let chain = raw_id().lookup_chain();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[1], DataId::new("LATISS").with_detector(0));
        assert_eq!(chain[2], DataId::new("LATISS"));

        let detector_only = DataId::new("LATISS").with_detector(0).lookup_chain();
        assert_eq!(detector_only.len(), 2);

        assert_eq!(DataId::new("LATISS").lookup_chain().len(), 1);
    }

    #[test]
    fn test_yaml_round_trip_with_extras() {
        let yaml = "instrument: LATISS\ndetector: 0\nexposure: 2021052500080\n\
                    physical_filter: RG610~empty\n";
        let id: DataId = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(id.exposure, Some(2021052500080));
        assert_eq!(id.extra.len(), 1);
    }
}
