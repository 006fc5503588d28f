//! # Schema Resolution
//!
//! Compiles a root schema into a reusable [`CompiledSchema`], resolving
//! every `$ref` to a sibling file through the [`SchemaCatalog`].
//!
//! ## Reference Resolution
//!
//! Catalog schemas are compiled with a local retriever installed. When the
//! validator meets a `$ref` to `https://opentelemetry.io/schemas/sdkconfig/common`
//! (with or without the `.json` extension) the retriever reads the matching
//! file from the catalog directory. Relative refs like `common.json#/...`
//! resolve against the root's logical URI, which is injected as `$id` when
//! the root schema declares none.
//!
//! Nothing is ever fetched over the network. A reference with no local
//! file fails compilation with [`ConfigError::SchemaCompile`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;

use otelconf_core::ConfigError;

use crate::catalog::SchemaCatalog;

/// JSON Schema draft used to interpret a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Draft 4.
    Draft4,
    /// Draft 6.
    Draft6,
    /// Draft 7.
    Draft7,
    /// Draft 2019-09.
    Draft201909,
    /// Draft 2020-12.
    Draft202012,
}

impl Dialect {
    fn draft(self) -> jsonschema::Draft {
        match self {
            Self::Draft4 => jsonschema::Draft::Draft4,
            Self::Draft6 => jsonschema::Draft::Draft6,
            Self::Draft7 => jsonschema::Draft::Draft7,
            Self::Draft201909 => jsonschema::Draft::Draft201909,
            Self::Draft202012 => jsonschema::Draft::Draft202012,
        }
    }

    /// Keyword naming a schema's base URI in this draft.
    fn id_keyword(self) -> &'static str {
        match self {
            Self::Draft4 => "id",
            _ => "$id",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft4 => "draft-04",
            Self::Draft6 => "draft-06",
            Self::Draft7 => "draft-07",
            Self::Draft201909 => "2019-09",
            Self::Draft202012 => "2020-12",
        };
        f.write_str(name)
    }
}

/// Dialect used for schemas compiled out of a catalog directory.
pub const DEFAULT_CATALOG_DIALECT: Dialect = Dialect::Draft7;

/// Dialect used for standalone schema files.
pub const DEFAULT_FILE_DIALECT: Dialect = Dialect::Draft202012;

/// Resolves `$ref` URIs to files registered in a [`SchemaCatalog`].
struct CatalogRetriever {
    catalog: Arc<SchemaCatalog>,
}

impl Retrieve for CatalogRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let path = self.catalog.resolve(uri_str).ok_or_else(|| {
            format!(
                "no local schema for {uri_str} in {}",
                self.catalog.dir().display()
            )
        })?;
        tracing::debug!(uri = uri_str, path = %path.display(), "resolved schema reference");
        Ok(load_schema_document(path)?)
    }
}

/// Refuses every external reference. Installed for standalone files.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema reference {} is not available offline", uri.as_str()).into())
    }
}

/// Read a schema file as JSON, or as YAML for `.yaml`/`.yml` files.
pub fn load_schema_document(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| ConfigError::SchemaLoad {
        path: path.to_path_buf(),
        reason,
    })
}

/// A root schema compiled with all of its references resolved.
///
/// Immutable after construction. `Send + Sync`, so one instance can serve
/// concurrent validations.
pub struct CompiledSchema {
    name: String,
    dialect: Dialect,
    pub(crate) validator: Validator,
}

impl CompiledSchema {
    /// File name (or path) the schema was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dialect the schema was compiled under.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .finish()
    }
}

/// Builds [`CompiledSchema`]s out of one catalog directory.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    catalog: Arc<SchemaCatalog>,
    dialect: Dialect,
}

impl SchemaResolver {
    /// Create a resolver over an already scanned catalog.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            dialect: DEFAULT_CATALOG_DIALECT,
        }
    }

    /// Scan `dir` and create a resolver over it.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(SchemaCatalog::scan(dir)?)))
    }

    /// Override the dialect used for schemas compiled by this resolver.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// The catalog backing this resolver.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// The dialect schemas are compiled under.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(self.dialect.draft());
        opts.with_retriever(CatalogRetriever {
            catalog: Arc::clone(&self.catalog),
        });
        opts
    }

    /// Compile the catalog file `file_name` as a root schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SchemaNotFound`] if the file is not in the
    /// catalog, [`ConfigError::SchemaLoad`] if it is not JSON or YAML, and
    /// [`ConfigError::SchemaCompile`] for malformed keywords or a `$ref`
    /// with no local target.
    pub fn build(&self, file_name: &str) -> Result<CompiledSchema, ConfigError> {
        let not_found = || ConfigError::SchemaNotFound {
            name: file_name.to_string(),
            dir: self.catalog.dir().to_path_buf(),
        };
        let uri = self.catalog.uri_for(file_name).ok_or_else(not_found)?;
        let path = self.catalog.path_for(file_name).ok_or_else(not_found)?;

        let mut schema = load_schema_document(path)?;
        if let Value::Object(map) = &mut schema {
            map.entry(self.dialect.id_keyword())
                .or_insert_with(|| Value::String(uri.to_string()));
        }

        let validator = self.build_options().build(&schema).map_err(|e| {
            ConfigError::SchemaCompile {
                schema: file_name.to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(schema = file_name, uri, dialect = %self.dialect, "compiled schema");

        Ok(CompiledSchema {
            name: file_name.to_string(),
            dialect: self.dialect,
            validator,
        })
    }

    /// Compile a single self-contained schema file under
    /// [`DEFAULT_FILE_DIALECT`].
    pub fn build_file(path: impl AsRef<Path>) -> Result<CompiledSchema, ConfigError> {
        Self::build_file_with_dialect(path, DEFAULT_FILE_DIALECT)
    }

    /// Compile a single self-contained schema file.
    ///
    /// Internal `#/...` references resolve. External references fail with
    /// [`ConfigError::SchemaCompile`].
    pub fn build_file_with_dialect(
        path: impl AsRef<Path>,
        dialect: Dialect,
    ) -> Result<CompiledSchema, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::SchemaNotFound {
                name: path.display().to_string(),
                dir: path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            });
        }
        let schema = load_schema_document(path)?;
        let name = path.display().to_string();

        let mut opts = jsonschema::options();
        opts.with_draft(dialect.draft());
        opts.with_retriever(OfflineRetriever);
        let validator = opts.build(&schema).map_err(|e| ConfigError::SchemaCompile {
            schema: name.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(schema = %name, dialect = %dialect, "compiled standalone schema");

        Ok(CompiledSchema {
            name,
            dialect,
            validator,
        })
    }
}
