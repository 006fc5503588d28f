//! # Schema Cache
//!
//! Caller-owned memo of scanned catalogs and compiled schemas, keyed by
//! canonicalized path. A long-running host compiles each root schema once
//! and shares the result through `Arc`.
//!
//! Concurrent misses for the same key may both compile; the first insert
//! wins and both callers receive equivalent schemas.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use otelconf_core::ConfigError;

use crate::catalog::SchemaCatalog;
use crate::resolver::{CompiledSchema, Dialect, SchemaResolver, DEFAULT_CATALOG_DIALECT};

/// Which schema to validate against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaSelector {
    /// A single self-contained schema file.
    File(PathBuf),
    /// A root schema inside a catalog directory.
    Catalog {
        /// Directory holding the schema set.
        dir: PathBuf,
        /// File name of the root schema.
        file: String,
    },
}

impl SchemaSelector {
    fn canonical(&self) -> Self {
        match self {
            Self::File(path) => Self::File(canonical_path(path)),
            Self::Catalog { dir, file } => Self::Catalog {
                dir: canonical_path(dir),
                file: file.clone(),
            },
        }
    }
}

fn canonical_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Thread-safe cache of catalogs and compiled schemas.
#[derive(Debug)]
pub struct SchemaCache {
    dialect: Dialect,
    catalogs: RwLock<HashMap<PathBuf, Arc<SchemaCatalog>>>,
    compiled: RwLock<HashMap<SchemaSelector, Arc<CompiledSchema>>>,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    /// Create an empty cache compiling catalog schemas as draft-07.
    pub fn new() -> Self {
        Self::with_dialect(DEFAULT_CATALOG_DIALECT)
    }

    /// Create an empty cache compiling catalog schemas under `dialect`.
    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            catalogs: RwLock::new(HashMap::new()),
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Scanned catalog for `dir`, scanning on first use.
    pub fn catalog(&self, dir: &Path) -> Result<Arc<SchemaCatalog>, ConfigError> {
        let key = canonical_path(dir);
        if let Some(catalog) = self.catalogs.read().get(&key) {
            return Ok(Arc::clone(catalog));
        }
        let scanned = Arc::new(SchemaCatalog::scan(&key)?);
        let mut catalogs = self.catalogs.write();
        Ok(Arc::clone(catalogs.entry(key).or_insert(scanned)))
    }

    /// Compiled schema for `file` in `dir`, compiling on first use.
    pub fn get_or_build(&self, dir: &Path, file: &str) -> Result<Arc<CompiledSchema>, ConfigError> {
        self.get(&SchemaSelector::Catalog {
            dir: dir.to_path_buf(),
            file: file.to_string(),
        })
    }

    /// Compiled schema for `selector`, compiling on first use.
    pub fn get(&self, selector: &SchemaSelector) -> Result<Arc<CompiledSchema>, ConfigError> {
        let key = selector.canonical();
        if let Some(schema) = self.compiled.read().get(&key) {
            return Ok(Arc::clone(schema));
        }
        tracing::debug!(selector = ?key, "schema cache miss");
        let built = Arc::new(match &key {
            SchemaSelector::File(path) => SchemaResolver::build_file(path)?,
            SchemaSelector::Catalog { dir, file } => SchemaResolver::new(self.catalog(dir)?)
                .with_dialect(self.dialect)
                .build(file)?,
        });
        let mut compiled = self.compiled.write();
        Ok(Arc::clone(compiled.entry(key).or_insert(built)))
    }

    /// Drop the catalog and every compiled schema under `dir`.
    pub fn invalidate(&self, dir: &Path) {
        let key = canonical_path(dir);
        self.catalogs.write().remove(&key);
        self.compiled.write().retain(|selector, _| match selector {
            SchemaSelector::Catalog { dir, .. } => dir != &key,
            SchemaSelector::File(path) => !path.starts_with(&key),
        });
        tracing::debug!(dir = %key.display(), "invalidated schema cache entries");
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.catalogs.write().clear();
        self.compiled.write().clear();
    }

    /// Number of compiled schemas held.
    pub fn len(&self) -> usize {
        self.compiled.read().len()
    }

    /// Returns true if no schema has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.compiled.read().is_empty()
    }
}
