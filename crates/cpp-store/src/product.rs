//! Product store: the read side of the data butler

use crate::error::{StoreError, StoreResult};
use crate::io::{load_document, DocumentFormat};
use cpp_core::{DataId, Document};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Source of pipeline products
///
/// Collections are searched in order and the first match wins. A product
/// that exists in none of them is a [`StoreError::NotFound`].
pub trait ProductStore {
    fn get(
        &self,
        product_type: &str,
        data_id: &DataId,
        collections: &[String],
    ) -> StoreResult<Document>;

    /// Whether `get` would succeed
    fn contains(&self, product_type: &str, data_id: &DataId, collections: &[String]) -> bool {
        self.get(product_type, data_id, collections).is_ok()
    }
}

impl<S: ProductStore + ?Sized> ProductStore for &S {
    fn get(
        &self,
        product_type: &str,
        data_id: &DataId,
        collections: &[String],
    ) -> StoreResult<Document> {
        (**self).get(product_type, data_id, collections)
    }
}

/// Products exported to a directory tree, one document file per product
///
/// Layout: `<root>/<collection>/<product_type>/<data id stem>.{yaml,yml,json}`.
/// Within a collection the full data id is tried first, then coarser ids
/// (see [`DataId::lookup_chain`]).
#[derive(Debug, Clone)]
pub struct DirectoryProductStore {
    root: PathBuf,
}

impl DirectoryProductStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file of one product type in one collection
    pub fn product_dir(&self, collection: &str, product_type: &str) -> PathBuf {
        let mut dir = self.root.clone();
        // Collections such as `LATISS/calib` map onto nested directories
        for part in collection.split('/').filter(|p| !p.is_empty()) {
            dir.push(part);
        }
        dir.join(product_type)
    }

    /// Path a product is written to (YAML)
    pub fn product_path(&self, collection: &str, product_type: &str, data_id: &DataId) -> PathBuf {
        self.product_dir(collection, product_type)
            .join(format!("{}.yaml", data_id.file_stem()))
    }

    fn find_file(&self, collection: &str, product_type: &str, data_id: &DataId) -> Option<PathBuf> {
        let dir = self.product_dir(collection, product_type);
        for candidate in data_id.lookup_chain() {
            let stem = candidate.file_stem();
            for ext in DocumentFormat::EXTENSIONS {
                let path = dir.join(format!("{}.{}", stem, ext));
                trace!("Probing {:?}", path);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }
}

impl ProductStore for DirectoryProductStore {
    fn get(
        &self,
        product_type: &str,
        data_id: &DataId,
        collections: &[String],
    ) -> StoreResult<Document> {
        for collection in collections {
            if let Some(path) = self.find_file(collection, product_type, data_id) {
                debug!("Found {} for {} in {}: {:?}", product_type, data_id, collection, path);
                return load_document(path);
            }
        }

        Err(StoreError::NotFound {
            product_type: product_type.to_string(),
            data_id: data_id.clone(),
            collections: collections.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save_document;
    use std::fs;
    use tempfile::TempDir;

    fn raw_id() -> DataId {
        DataId::new("LATISS")
            .with_detector(0)
            .with_exposure(2021052500015)
    }

    fn collections(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_lookup() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryProductStore::new(dir.path());
        let doc = Document::mapping([("MEAN", Document::from(1.0))]);
        save_document(
            store.product_path("ci_cpv_bias", "verifyBiasExpStats", &raw_id()),
            &doc,
        )
        .unwrap();

        let found = store
            .get("verifyBiasExpStats", &raw_id(), &collections(&["ci_cpv_bias"]))
            .unwrap();
        assert_eq!(found, doc);
    }

    #[test]
    fn test_calibration_resolves_from_exposure_id() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryProductStore::new(dir.path());
        let detector_id = DataId::new("LATISS").with_detector(0);
        save_document(
            store.product_path("LATISS/calib", "bias", &detector_id),
            &Document::from("bias frame"),
        )
        .unwrap();
        save_document(
            store.product_path("LATISS/calib", "camera", &DataId::new("LATISS")),
            &Document::from("camera"),
        )
        .unwrap();

        let colls = collections(&["LATISS/raw/all", "LATISS/calib"]);
        assert_eq!(
            store.get("bias", &raw_id(), &colls).unwrap(),
            Document::from("bias frame")
        );
        assert_eq!(
            store.get("camera", &raw_id(), &colls).unwrap(),
            Document::from("camera")
        );
        assert!(dir
            .path()
            .join("LATISS")
            .join("calib")
            .join("bias")
            .is_dir());
    }

    #[test]
    fn test_first_collection_wins() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryProductStore::new(dir.path());
        let older = store.product_path("calib/v00", "dark", &raw_id());
        let newer = store.product_path("LATISS/calib", "dark", &raw_id());
        save_document(older, &Document::from(1)).unwrap();
        save_document(newer, &Document::from(2)).unwrap();

        let found = store
            .get("dark", &raw_id(), &collections(&["LATISS/calib", "calib/v00"]))
            .unwrap();
        assert_eq!(found, Document::from(2));
    }

    #[test]
    fn test_json_products() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryProductStore::new(dir.path());
        let product_dir = store.product_dir("ci_cpv_ptc", "verifyPtcStats");
        fs::create_dir_all(&product_dir).unwrap();
        fs::write(
            product_dir.join("instrument-LATISS_detector-0.json"),
            r#"{"SUCCESS": true}"#,
        )
        .unwrap();

        let id = DataId::new("LATISS").with_detector(0);
        let doc = store
            .get("verifyPtcStats", &id, &collections(&["ci_cpv_ptc"]))
            .unwrap();
        assert_eq!(doc.get("SUCCESS").and_then(Document::as_bool), Some(true));
    }

    #[test]
    fn test_not_found() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryProductStore::new(dir.path());
        let err = store
            .get("flat", &raw_id(), &collections(&["calib/v00"]))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("'flat'"));
        assert!(!store.contains("flat", &raw_id(), &collections(&["calib/v00"])));
    }
}
