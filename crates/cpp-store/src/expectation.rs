//! Archived expectation documents ("golden files")

use crate::error::{StoreError, StoreResult};
use crate::io::{load_document, save_document, stage_document};
use cpp_core::Document;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of archived expectation documents, addressed by file name
pub trait ExpectationStore {
    fn read(&self, name: &str) -> StoreResult<Document>;
}

impl<S: ExpectationStore + ?Sized> ExpectationStore for &S {
    fn read(&self, name: &str) -> StoreResult<Document> {
        (**self).read(name)
    }
}

impl ExpectationStore for HashMap<String, Document> {
    fn read(&self, name: &str) -> StoreResult<Document> {
        self.get(name)
            .cloned()
            .ok_or_else(|| StoreError::ExpectationNotFound {
                path: PathBuf::from(name),
            })
    }
}

/// Expectations stored as YAML/JSON files in one directory
///
/// The directory is chosen by the caller; in legacy mode it is the
/// `legacy_202409` subdirectory of the regular one.
#[derive(Debug, Clone)]
pub struct DirectoryExpectationStore {
    dir: PathBuf,
}

impl DirectoryExpectationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Archive a document as the new expectation for `name`
    pub fn write(&self, name: &str, document: &Document) -> StoreResult<PathBuf> {
        let path = self.path_for(name);
        save_document(&path, document)?;
        info!("Archived expectation {:?}", path);
        Ok(path)
    }

    /// Archive several documents together
    ///
    /// Every document is encoded and written to its temp file before any is
    /// renamed into place, so an encoding or write failure leaves the
    /// existing expectations untouched. A failed rename can still leave the
    /// earlier documents of the batch committed.
    pub fn write_all<'a, I>(&self, documents: I) -> StoreResult<Vec<PathBuf>>
    where
        I: IntoIterator<Item = (&'a str, &'a Document)>,
    {
        let staged = documents
            .into_iter()
            .map(|(name, document)| stage_document(self.path_for(name), document))
            .collect::<StoreResult<Vec<_>>>()?;

        staged
            .into_iter()
            .map(|staged| {
                let path = staged.commit()?;
                info!("Archived expectation {:?}", path);
                Ok(path)
            })
            .collect()
    }
}

impl ExpectationStore for DirectoryExpectationStore {
    fn read(&self, name: &str) -> StoreResult<Document> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(StoreError::ExpectationNotFound { path });
        }
        debug!("Reading expectation {:?}", path);
        load_document(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_yaml_expectation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("biasRun.yaml"), "SUCCESS: true\nMEAN: 0.1\n").unwrap();

        let store = DirectoryExpectationStore::new(dir.path());
        let doc = store.read("biasRun.yaml").unwrap();
        assert_eq!(doc.get("MEAN").and_then(Document::as_f64), Some(0.1));
    }

    #[test]
    fn test_missing_expectation() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryExpectationStore::new(dir.path());
        let err = store.read("darkRun.yaml").unwrap_err();
        assert!(matches!(err, StoreError::ExpectationNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryExpectationStore::new(dir.path().join("legacy_202409"));
        let noise = Document::mapping([("NOISE", Document::from(7.25))]);
        let doc = Document::mapping([("C00", noise)]);

        let path = store.write("flatDet.yaml", &doc).unwrap();
        assert!(path.ends_with("legacy_202409/flatDet.yaml"));
        assert_eq!(store.read("flatDet.yaml").unwrap(), doc);
    }

    #[test]
    fn test_write_json_expectation() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryExpectationStore::new(dir.path());
        let doc = Document::mapping([("PTC_GAIN", Document::sequence([1.25, 1.5]))]);

        store.write("ptcRun.json", &doc).unwrap();
        assert_eq!(store.read("ptcRun.json").unwrap(), doc);
    }

    #[test]
    fn test_write_all_is_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryExpectationStore::new(dir.path());
        let old = Document::from(1);
        store.write("darkRun.yaml", &old).unwrap();

        let fresh = Document::from(2);
        let broken = Document::from(f64::NAN);
        let err = store
            .write_all([("darkRun.yaml", &fresh), ("darkDet.json", &broken)])
            .unwrap_err();
        assert!(matches!(err, StoreError::NonFiniteJson { .. }));
        assert_eq!(store.read("darkRun.yaml").unwrap(), old);
        assert!(!store.path_for("darkRun.yaml.tmp").exists());
        assert!(!store.path_for("darkDet.json").exists());

        let written = store
            .write_all([("darkRun.yaml", &fresh), ("darkDet.yaml", &broken)])
            .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(store.read("darkRun.yaml").unwrap(), fresh);
    }

    #[test]
    fn test_map_expectations() {
        let mut map = HashMap::new();
        map.insert("ptcRun.yaml".to_string(), Document::from(1));
        assert_eq!(map.read("ptcRun.yaml").unwrap(), Document::from(1));
        assert!(map.read("ptcDet.yaml").is_err());
    }
}
