//! Structured documents: statistics snapshots and archived expectations
//!
//! A [`Document`] is the in-memory form of a nested YAML/JSON value. Products
//! fetched from the store and golden files read from disk both land here
//! before they are compared.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// A recursively-typed value
///
/// Mapping key order is kept as read from the source so that reports walk
/// keys in a stable order; it plays no part in equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Mapping(IndexMap<String, Document>),
    Sequence(Vec<Document>),
    Number(f64),
    Text(String),
    Boolean(bool),
    Null,
}

/// The variant tag of a [`Document`], used for shape checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Mapping,
    Sequence,
    Number,
    Text,
    Boolean,
    Null,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Mapping => write!(f, "mapping"),
            DocumentKind::Sequence => write!(f, "sequence"),
            DocumentKind::Number => write!(f, "number"),
            DocumentKind::Text => write!(f, "string"),
            DocumentKind::Boolean => write!(f, "boolean"),
            DocumentKind::Null => write!(f, "null"),
        }
    }
}

impl Document {
    /// Build a mapping from key/value pairs, keeping their order
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Document)>,
    {
        Document::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a sequence from anything convertible into documents
    pub fn sequence<T, I>(items: I) -> Self
    where
        T: Into<Document>,
        I: IntoIterator<Item = T>,
    {
        Document::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Get the variant tag
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Mapping(_) => DocumentKind::Mapping,
            Document::Sequence(_) => DocumentKind::Sequence,
            Document::Number(_) => DocumentKind::Number,
            Document::Text(_) => DocumentKind::Text,
            Document::Boolean(_) => DocumentKind::Boolean,
            Document::Null => DocumentKind::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Document>> {
        match self {
            Document::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Document::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key in a mapping; `None` for missing keys and non-mappings
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Number of direct children (0 for scalars)
    pub fn len(&self) -> usize {
        match self {
            Document::Mapping(map) => map.len(),
            Document::Sequence(seq) => seq.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::Null
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Document::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Document::Number(n) => write!(f, "{}", n),
            Document::Text(s) => write!(f, "{:?}", s),
            Document::Boolean(b) => write!(f, "{}", b),
            Document::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for Document {
    fn from(n: f64) -> Self {
        Document::Number(n)
    }
}

impl From<f32> for Document {
    fn from(n: f32) -> Self {
        Document::Number(f64::from(n))
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Document::Number(n as f64)
    }
}

impl From<i32> for Document {
    fn from(n: i32) -> Self {
        Document::Number(f64::from(n))
    }
}

impl From<u64> for Document {
    fn from(n: u64) -> Self {
        Document::Number(n as f64)
    }
}

impl From<u32> for Document {
    fn from(n: u32) -> Self {
        Document::Number(f64::from(n))
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Boolean(b)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::Text(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::Text(s)
    }
}

impl From<Vec<Document>> for Document {
    fn from(seq: Vec<Document>) -> Self {
        Document::Sequence(seq)
    }
}

impl From<IndexMap<String, Document>> for Document {
    fn from(map: IndexMap<String, Document>) -> Self {
        Document::Mapping(map)
    }
}

impl<T: Into<Document>> From<Option<T>> for Document {
    fn from(value: Option<T>) -> Self {
        value.map_or(Document::Null, Into::into)
    }
}

// Integral values are written back as integers so archived files keep the
// shape a human would expect (`exposure: 2021052500015`, not `2.021e12`).
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Mapping(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    state.serialize_entry(k, v)?;
                }
                state.end()
            }
            Document::Sequence(seq) => {
                let mut state = serializer.serialize_seq(Some(seq.len()))?;
                for v in seq {
                    state.serialize_element(v)?;
                }
                state.end()
            }
            Document::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Document::Text(s) => serializer.serialize_str(s),
            Document::Boolean(b) => serializer.serialize_bool(*b),
            Document::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping, sequence, number, string, boolean or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        Ok(Document::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Ok(Document::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        Document::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Document, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Document::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((MappingKey(key), value)) = access.next_entry::<MappingKey, Document>()? {
            map.insert(key, value);
        }
        Ok(Document::Mapping(map))
    }
}

/// Mapping key that accepts any scalar and keeps its textual form
///
/// YAML allows `0: ...` or `true: ...`; these become the keys `"0"` and
/// `"true"`.
struct MappingKey(String);

impl<'de> Deserialize<'de> for MappingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MappingKeyVisitor)
    }
}

struct MappingKeyVisitor;

impl<'de> Visitor<'de> for MappingKeyVisitor {
    type Value = MappingKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MappingKey, E> {
        Ok(MappingKey(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MappingKey, E> {
        Ok(MappingKey(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MappingKey, E> {
        Ok(MappingKey(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MappingKey, E> {
        Ok(MappingKey(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MappingKey, E> {
        Ok(MappingKey(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MappingKey, E> {
        Ok(MappingKey(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MappingKey, E> {
        Ok(MappingKey("null".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_document() {
        let doc: Document = serde_yaml::from_str(
            r#"
C00:
  MEAN: 0.12
  NOISE: 5.2
  FLAGS: [SAT, BAD]
  VALID: true
  NOTE: null
"#,
        )
        .unwrap();

        let amp = doc.get("C00").unwrap();
        assert_eq!(amp.kind(), DocumentKind::Mapping);
        assert_eq!(amp.get("MEAN").and_then(Document::as_f64), Some(0.12));
        assert_eq!(amp.get("FLAGS").unwrap().len(), 2);
        assert_eq!(amp.get("VALID").and_then(Document::as_bool), Some(true));
        assert!(amp.get("NOTE").unwrap().is_null());
    }

    #[test]
    fn test_yaml_nan_is_number() {
        let doc: Document = serde_yaml::from_str("gain: .nan\n").unwrap();
        let gain = doc.get("gain").and_then(Document::as_f64).unwrap();
        assert!(gain.is_nan());
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let doc: Document = serde_yaml::from_str("0: zero\ntrue: yes\n").unwrap();
        assert_eq!(doc.get("0").and_then(Document::as_str), Some("zero"));
        assert_eq!(doc.get("true").and_then(Document::as_str), Some("yes"));
    }

    #[test]
    fn test_key_order_preserved() {
        let doc: Document = serde_yaml::from_str("b: 1\na: 2\nc: 3\n").unwrap();
        let keys: Vec<&str> = doc.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_parse_json_document() {
        let doc: Document =
            serde_json::from_str(r#"{"amps": [{"gain": 1.5}, {"gain": 1.6}], "n": 2}"#).unwrap();
        let amps = doc.get("amps").and_then(Document::as_sequence).unwrap();
        assert_eq!(amps[1].get("gain").and_then(Document::as_f64), Some(1.6));
        assert_eq!(doc.get("n").and_then(Document::as_f64), Some(2.0));
    }

    #[test]
    fn test_integers_serialize_as_integers() {
        let doc = Document::mapping([
            ("exposure", Document::from(2021052500015_u64)),
            ("mean", Document::from(0.5)),
        ]);
        let yaml = serde_yaml::to_string(&doc).unwrap();
        assert!(yaml.contains("exposure: 2021052500015"));
        assert!(yaml.contains("mean: 0.5"));
    }

    #[test]
    fn test_display() {
        let doc = Document::mapping([
            ("a", Document::from(1)),
            ("b", Document::sequence(["x", "y"])),
        ]);
        assert_eq!(doc.to_string(), r#"{a: 1, b: ["x", "y"]}"#);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Document::from("1").kind().to_string(), "string");
        assert_eq!(Document::from(1).kind().to_string(), "number");
        assert_eq!(Document::Null.kind().to_string(), "null");
    }
}
