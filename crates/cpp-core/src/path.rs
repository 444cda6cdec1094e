//! Breadcrumb paths into a document

use std::fmt;

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence position
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Path from the document root to a node, e.g. `amps[1].gain`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// The empty path (the document root)
    pub fn root() -> Self {
        Self::default()
    }

    /// Path extended by a mapping key
    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// Path extended by a sequence index
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for DocPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_path() {
        let path = DocPath::root().key("amps").index(1).key("gain");
        assert_eq!(path.to_string(), "amps[1].gain");
    }

    #[test]
    fn test_display_root() {
        assert_eq!(DocPath::root().to_string(), "<root>");
        assert_eq!(DocPath::root().index(3).to_string(), "[3]");
    }

    #[test]
    fn test_from_iter_matches_builder() {
        let built = DocPath::root().key("amps").index(1).key("gain");
        let collected: DocPath = vec![
            PathSegment::from("amps"),
            PathSegment::from(1),
            PathSegment::from("gain"),
        ]
        .into_iter()
        .collect();
        assert_eq!(built, collected);
        assert_eq!(built.len(), 3);
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = DocPath::root().key("a");
        let _child = parent.key("b");
        assert_eq!(parent.segments(), &[PathSegment::from("a")]);
    }
}
