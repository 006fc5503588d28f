//! # Schema Catalog
//!
//! Maps logical schema URIs to local files so that schemas split across a
//! directory can `$ref` each other without any network access.
//!
//! Every regular file directly inside the directory is registered under
//! `<base-uri>/<stem>`, where the stem is the file name up to its first
//! `.`: `span_exporter.json` becomes
//! `https://opentelemetry.io/schemas/sdkconfig/span_exporter`.
//!
//! A catalog is built by one directory scan and is immutable afterwards.
//! Share it with `Arc` across every schema compiled from the same
//! directory rather than rescanning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use otelconf_core::ConfigError;

/// Base URI under which the OpenTelemetry configuration schemas are published.
pub const DEFAULT_BASE_URI: &str = "https://opentelemetry.io/schemas/sdkconfig";

/// Logical URI → local path table for one schema directory.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    /// Absolute path of the scanned directory.
    dir: PathBuf,
    /// Base URI without a trailing slash.
    base_uri: String,
    /// Map from logical URI to absolute file path.
    by_uri: BTreeMap<String, PathBuf>,
    /// Map from file name (e.g. `common.json`) to logical URI.
    by_file_name: BTreeMap<String, String>,
}

impl SchemaCatalog {
    /// Scan `dir` using [`DEFAULT_BASE_URI`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SchemaDirectoryMissing`] if `dir` does not
    /// exist, [`ConfigError::NotADirectory`] if it is a file, and
    /// [`ConfigError::DuplicateSchemaUri`] if two files share a stem.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::scan_with_base_uri(dir, DEFAULT_BASE_URI)
    }

    /// Scan `dir`, registering files under `base_uri`.
    pub fn scan_with_base_uri(
        dir: impl AsRef<Path>,
        base_uri: &str,
    ) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(ConfigError::SchemaDirectoryMissing {
                path: dir.to_path_buf(),
            });
        }
        if !dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let dir = dir.canonicalize().map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let base_uri = base_uri.trim_end_matches('/').to_string();

        let read_dir = std::fs::read_dir(&dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        // read_dir order is platform-dependent; sort so collisions report stably.
        paths.sort();

        let mut by_uri: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut by_file_name = BTreeMap::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!(path = %path.display(), "skipping schema file with non-UTF-8 name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let name = name.to_string();
            let uri = format!("{base_uri}/{}", schema_stem(&name));
            if let Some(first) = by_uri.get(&uri) {
                return Err(ConfigError::DuplicateSchemaUri {
                    uri,
                    first: first.clone(),
                    second: path,
                });
            }
            by_uri.insert(uri.clone(), path);
            by_file_name.insert(name, uri);
        }

        tracing::debug!(
            dir = %dir.display(),
            schemas = by_uri.len(),
            "scanned schema catalog"
        );

        Ok(Self {
            dir,
            base_uri,
            by_uri,
            by_file_name,
        })
    }

    /// Returns the absolute path of the scanned directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the base URI (no trailing slash).
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.by_uri.len()
    }

    /// Returns true if the directory held no schema files.
    pub fn is_empty(&self) -> bool {
        self.by_uri.is_empty()
    }

    /// Resolve a logical URI to its local file.
    ///
    /// Accepts the exact registered URI, and also the same URI with the
    /// file extension kept (`.../common.json`). Fragments are ignored.
    pub fn resolve(&self, uri: &str) -> Option<&Path> {
        let uri = uri.split_once('#').map_or(uri, |(base, _)| base);
        if let Some(path) = self.by_uri.get(uri) {
            return Some(path);
        }
        let (prefix, last) = uri.rsplit_once('/')?;
        let stripped = format!("{prefix}/{}", schema_stem(last));
        self.by_uri.get(&stripped).map(PathBuf::as_path)
    }

    /// Logical URI of a catalog file, looked up by file name or by stem.
    pub fn uri_for(&self, file_name: &str) -> Option<&str> {
        if let Some(uri) = self.by_file_name.get(file_name) {
            return Some(uri);
        }
        let uri = format!("{}/{}", self.base_uri, schema_stem(file_name));
        self.by_uri.get_key_value(&uri).map(|(k, _)| k.as_str())
    }

    /// Local path of a catalog file, looked up by file name or by stem.
    pub fn path_for(&self, file_name: &str) -> Option<&Path> {
        self.uri_for(file_name)
            .and_then(|uri| self.by_uri.get(uri))
            .map(PathBuf::as_path)
    }

    /// Iterate `(uri, path)` pairs in URI order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.by_uri.iter().map(|(uri, path)| (uri.as_str(), path.as_path()))
    }

    /// File names of all registered schemas, sorted.
    pub fn file_names(&self) -> Vec<&str> {
        self.by_file_name.keys().map(String::as_str).collect()
    }
}

/// File name up to its first `.`.
pub fn schema_stem(file_name: &str) -> &str {
    file_name
        .split_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_scan_registers_every_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "common.json", "{}");
        write(tmp.path(), "span_exporter.json", "{}");
        let catalog = SchemaCatalog::scan(tmp.path()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.uri_for("common.json"),
            Some("https://opentelemetry.io/schemas/sdkconfig/common")
        );
        let path = catalog
            .resolve("https://opentelemetry.io/schemas/sdkconfig/span_exporter")
            .unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("span_exporter.json"));
    }

    #[test]
    fn test_stem_stops_at_first_dot() {
        assert_eq!(schema_stem("span_exporter.json"), "span_exporter");
        assert_eq!(schema_stem("module.schema.json"), "module");
        assert_eq!(schema_stem("plain"), "plain");
    }

    #[test]
    fn test_resolve_accepts_extension_and_fragment() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "common.json", "{}");
        let catalog = SchemaCatalog::scan(tmp.path()).unwrap();

        let base = "https://opentelemetry.io/schemas/sdkconfig";
        assert!(catalog.resolve(&format!("{base}/common.json")).is_some());
        assert!(catalog
            .resolve(&format!("{base}/common#/definitions/Headers"))
            .is_some());
        assert!(catalog.resolve(&format!("{base}/missing")).is_none());
        assert!(catalog.resolve("https://example.com/common").is_none());
    }

    #[test]
    fn test_subdirectories_and_hidden_files_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "common.json", "{}");
        write(tmp.path(), ".DS_Store", "");
        fs::create_dir(tmp.path().join("nested")).unwrap();
        write(&tmp.path().join("nested"), "inner.json", "{}");

        let catalog = SchemaCatalog::scan(tmp.path()).unwrap();
        assert_eq!(catalog.file_names(), vec!["common.json"]);
    }

    #[test]
    fn test_duplicate_stem_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "common.json", "{}");
        write(tmp.path(), "common.yaml", "{}");
        let err = SchemaCatalog::scan(tmp.path()).unwrap_err();
        match err {
            ConfigError::DuplicateSchemaUri { uri, first, second } => {
                assert!(uri.ends_with("/common"));
                assert!(first.ends_with("common.json"));
                assert!(second.ends_with("common.yaml"));
            }
            other => panic!("Expected DuplicateSchemaUri, got: {other}"),
        }
    }

    #[test]
    fn test_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SchemaCatalog::scan(tmp.path().join("absent")).unwrap_err();
        assert!(
            matches!(err, ConfigError::SchemaDirectoryMissing { .. }),
            "Expected SchemaDirectoryMissing, got: {err}"
        );
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "common.json", "{}");
        let err = SchemaCatalog::scan(tmp.path().join("common.json")).unwrap_err();
        assert!(
            matches!(err, ConfigError::NotADirectory { .. }),
            "Expected NotADirectory, got: {err}"
        );
    }

    #[test]
    fn test_custom_base_uri_trailing_slash() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.json", "{}");
        let catalog =
            SchemaCatalog::scan_with_base_uri(tmp.path(), "https://example.com/schemas/").unwrap();
        assert_eq!(catalog.base_uri(), "https://example.com/schemas");
        assert_eq!(catalog.uri_for("a"), Some("https://example.com/schemas/a"));
    }
}
