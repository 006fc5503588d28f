//! # Document Paths
//!
//! `$`-rooted locators into a canonical document, rendered the way
//! violation messages print them: `$`, `$.tracer_provider.processors[0]`,
//! `$.resource.attributes['service.name']`.

use std::fmt;

/// One step from a container to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

/// A locator into a JSON value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<PathSegment>,
}

impl DocumentPath {
    /// The document root, rendered as `$`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path extended by an object key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.into()));
        next
    }

    /// Returns a new path extended by an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    /// Returns the segments from the root outwards.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns true for the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Keys made only of these characters print in dotted form.
fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => write!(f, ".{key}")?,
                PathSegment::Key(key) => write!(f, "['{}']", key.replace('\'', "\\'"))?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(DocumentPath::root().to_string(), "$");
        assert!(DocumentPath::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = DocumentPath::root()
            .key("tracer_provider")
            .key("processors")
            .index(0)
            .key("batch");
        assert_eq!(path.to_string(), "$.tracer_provider.processors[0].batch");
    }

    #[test]
    fn test_dotted_key_is_bracketed() {
        let path = DocumentPath::root().key("attributes").key("service.name");
        assert_eq!(path.to_string(), "$.attributes['service.name']");
    }

    #[test]
    fn test_hyphenated_key_stays_plain() {
        let path = DocumentPath::root().key("headers").key("api-key");
        assert_eq!(path.to_string(), "$.headers.api-key");
    }

    #[test]
    fn test_empty_key_is_bracketed() {
        assert_eq!(DocumentPath::root().key("").to_string(), "$['']");
    }
}
