//! # otelconf-schema — Multi-File JSON Schema Validation
//!
//! Validates canonical configuration documents against a JSON Schema set
//! split across one directory, resolving cross-file `$ref`s locally.
//!
//! ## Pipeline
//!
//! 1. [`SchemaCatalog::scan`] maps every schema file in a directory to a
//!    logical URI under [`DEFAULT_BASE_URI`].
//! 2. [`SchemaResolver::build`] compiles one root schema, routing
//!    references through the catalog.
//! 3. [`CompiledSchema::validate`] returns the full [`ViolationSet`] for a
//!    document; [`CompiledSchema::check`] turns a clean result into a
//!    [`ValidatedDocument`] for the decoding stages.
//!
//! [`SchemaCache`] memoizes steps 1 and 2 for long-running hosts.
//!
//! ## Crate Policy
//!
//! - Depends only on `otelconf-core` internally.
//! - Never fetches schemas over the network.
//! - A failed validation is data, not an error: `ConfigError` is reserved
//!   for a broken schema set.

pub mod cache;
pub mod catalog;
pub mod resolver;
pub mod validate;

pub use cache::{SchemaCache, SchemaSelector};
pub use catalog::{SchemaCatalog, DEFAULT_BASE_URI};
pub use resolver::{
    load_schema_document, CompiledSchema, Dialect, SchemaResolver, DEFAULT_CATALOG_DIALECT,
    DEFAULT_FILE_DIALECT,
};
pub use validate::{ValidatedDocument, Violation, ViolationSet};
