//! Reading and writing documents on disk

use crate::error::{StoreError, StoreResult};
use cpp_core::{DocPath, Document};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialization format of a document file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Extensions tried, in order, when a file is looked up by stem
    pub const EXTENSIONS: [&'static str; 3] = ["yaml", "yml", "json"];

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            Some("json") => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// Parse document text; `path` is only used for error reporting
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    path: &Path,
) -> StoreResult<Document> {
    match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| StoreError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        }),
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| StoreError::ParseJson {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Load a YAML or JSON document
pub fn load_document(path: impl AsRef<Path>) -> StoreResult<Document> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path).ok_or_else(|| StoreError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let content = fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Loaded document: {:?}", path);
    parse_document(&content, format, path)
}

/// Location of the first NaN or infinite number, in document order
fn first_non_finite(document: &Document, path: DocPath) -> Option<DocPath> {
    match document {
        Document::Number(x) if !x.is_finite() => Some(path),
        Document::Mapping(map) => map
            .iter()
            .find_map(|(key, value)| first_non_finite(value, path.key(key))),
        Document::Sequence(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, value)| first_non_finite(value, path.index(i))),
        _ => None,
    }
}

/// Serialize a document in the format named by the path's extension
///
/// JSON has no NaN or infinity, so documents holding one are rejected
/// rather than written as `null`.
pub fn encode_document(path: &Path, document: &Document) -> StoreResult<String> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| StoreError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    match format {
        DocumentFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| StoreError::SerializeYaml {
                path: path.to_path_buf(),
                source: e,
            })
        }
        DocumentFormat::Json => {
            if let Some(location) = first_non_finite(document, DocPath::root()) {
                return Err(StoreError::NonFiniteJson {
                    path: path.to_path_buf(),
                    location: location.to_string(),
                });
            }
            serde_json::to_string_pretty(document).map_err(|e| StoreError::SerializeJson {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    PathBuf::from(temp_name)
}

/// Encode a document and write it next to `path` as `<path>.tmp`
///
/// The document is not visible under `path` until [`StagedDocument::commit`].
pub fn stage_document(path: impl AsRef<Path>, document: &Document) -> StoreResult<StagedDocument> {
    let path = path.as_ref();
    let io_err = |e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    let content = encode_document(path, document)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let temp = temp_path(path);
    fs::write(&temp, &content).map_err(io_err)?;
    Ok(StagedDocument {
        temp: Some(temp),
        path: path.to_path_buf(),
    })
}

/// A document written to its temp file, waiting to be renamed into place
///
/// Dropping it without committing removes the temp file.
#[derive(Debug)]
pub struct StagedDocument {
    temp: Option<PathBuf>,
    path: PathBuf,
}

impl StagedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temp file over the final path
    pub fn commit(mut self) -> StoreResult<PathBuf> {
        if let Some(temp) = self.temp.take() {
            fs::rename(&temp, &self.path).map_err(|e| StoreError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        }
        debug!("Saved document: {:?}", self.path);
        Ok(std::mem::take(&mut self.path))
    }
}

impl Drop for StagedDocument {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            let _ = fs::remove_file(temp);
        }
    }
}

/// Write a document as YAML or JSON, chosen by the path's extension
///
/// Writes atomically by first writing to a temp file, then renaming.
pub fn save_document(path: impl AsRef<Path>, document: &Document) -> StoreResult<()> {
    stage_document(path, document)?.commit().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("biasRun.yaml");
        let doc = Document::mapping([
            ("MEAN", Document::from(0.25)),
            ("NOISE", Document::from(f64::NAN)),
            ("AMPS", Document::sequence(["C00", "C01"])),
        ]);

        save_document(&path, &doc).unwrap();
        assert!(!dir.path().join("nested").join("biasRun.yaml.tmp").exists());

        let loaded = load_document(&path).unwrap();
        assert_eq!(loaded.get("MEAN"), doc.get("MEAN"));
        assert!(loaded.get("NOISE").and_then(Document::as_f64).unwrap().is_nan());
        assert_eq!(loaded.get("AMPS"), doc.get("AMPS"));
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, r#"{"gain": [1.5, 1.6]}"#).unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.get("gain").unwrap().len(), 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load_document("stats.fits");
        assert!(matches!(result, Err(StoreError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "a: [1, 2\n").unwrap();
        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, StoreError::ParseYaml { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_save_then_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptcRun.json");
        let doc = Document::mapping([
            ("GAIN", Document::sequence([1.5, 1.625])),
            ("AMP", Document::mapping([("name", Document::from("C00"))])),
            ("SUCCESS", Document::from(true)),
            ("NOTE", Document::Null),
        ]);

        save_document(&path, &doc).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('{'));
        assert_eq!(load_document(&path).unwrap(), doc);
    }

    #[test]
    fn test_json_rejects_non_finite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptcDet.json");
        let doc = Document::mapping([(
            "AMP",
            Document::sequence([Document::from(7.0), Document::from(f64::NAN)]),
        )]);

        match save_document(&path, &doc) {
            Err(StoreError::NonFiniteJson { location, .. }) => assert_eq!(location, "AMP[1]"),
            other => panic!("expected NonFiniteJson, got {:?}", other),
        }
        assert!(!path.exists());
        assert!(!dir.path().join("ptcDet.json.tmp").exists());

        // YAML has .nan, so the same document saves there
        save_document(dir.path().join("ptcDet.yaml"), &doc).unwrap();
    }

    #[test]
    fn test_save_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptcRun.fits");
        let result = save_document(&path, &Document::from(1));
        assert!(matches!(result, Err(StoreError::UnsupportedFormat { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cti.yaml");
        let staged = stage_document(&path, &Document::from(2)).unwrap();
        assert!(dir.path().join("cti.yaml.tmp").exists());
        assert!(!path.exists());

        drop(staged);
        assert!(!dir.path().join("cti.yaml.tmp").exists());
        assert!(!path.exists());
    }
}
