//! # Error Types — Structured Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - [`ConfigError`] is a deployment defect: the schema directory, a schema
//!   file, or a `$ref` target is missing or malformed. Never retried.
//! - [`ParseError`] means the input document is not well-formed YAML or
//!   cannot be expressed as JSON. Fatal for that call.
//! - [`DecodeError`] is raised when a document that already passed
//!   validation still cannot be mapped into a typed shape or protobuf
//!   message. It is surfaced rather than producing a partial object.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the configuration pipeline.
#[derive(Error, Debug)]
pub enum OtelConfError {
    /// Schema setup failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The input document could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A validated document could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Error locating, loading or compiling a schema.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The schema directory does not exist.
    #[error("schema directory does not exist: {}", path.display())]
    SchemaDirectoryMissing {
        /// The path that was scanned.
        path: PathBuf,
    },

    /// The schema location exists but is not a directory.
    #[error("schema location is not a directory: {}", path.display())]
    NotADirectory {
        /// The path that was scanned.
        path: PathBuf,
    },

    /// Two files in the same directory derive the same logical URI.
    #[error("schema URI {uri} is claimed by both {} and {}", first.display(), second.display())]
    DuplicateSchemaUri {
        /// The contested logical URI.
        uri: String,
        /// The file registered first.
        first: PathBuf,
        /// The file that collided with it.
        second: PathBuf,
    },

    /// The requested schema file is not part of the catalog.
    #[error("schema {name} not found in {}", dir.display())]
    SchemaNotFound {
        /// The requested file name.
        name: String,
        /// The catalog directory.
        dir: PathBuf,
    },

    /// The schema file could not be read or parsed.
    #[error("failed to load schema {}: {reason}", path.display())]
    SchemaLoad {
        /// Path to the schema file.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// The schema could not be compiled (malformed keyword, unresolvable `$ref`).
    #[error("failed to compile schema {schema}: {reason}")]
    SchemaCompile {
        /// Schema file name or logical URI.
        schema: String,
        /// Human-readable reason.
        reason: String,
    },

    /// IO error while scanning the schema directory.
    #[error("io error reading {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Error normalizing a YAML document.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input is not well-formed YAML (or holds more than one document).
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The input is not UTF-8 text.
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The input stream could not be read.
    #[error("cannot read document: {0}")]
    Io(#[from] std::io::Error),

    /// A mapping key is not a scalar and has no JSON object-key form.
    #[error("unsupported mapping key at {path}: {found}")]
    UnsupportedKey {
        /// Locator of the mapping holding the key.
        path: String,
        /// Debug rendering of the key.
        found: String,
    },

    /// `.nan` and `.inf` have no JSON representation.
    #[error("non-finite number at {path} cannot be represented in JSON")]
    NonFiniteNumber {
        /// Locator of the offending scalar.
        path: String,
    },

    /// Canonical JSON serialization failed.
    #[error("canonical serialization failed: {0}")]
    Canonical(#[from] serde_json::Error),
}

/// Error decoding a validated document.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The document does not fit the typed configuration shape.
    #[error("cannot decode document into {target}: {reason}")]
    Typed {
        /// Rust type name of the target shape.
        target: &'static str,
        /// Human-readable reason from the deserializer.
        reason: String,
    },

    /// A known protobuf field holds a value of the wrong shape.
    #[error("cannot merge field {path}: {reason}")]
    Proto {
        /// Dotted field path inside the message.
        path: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The descriptor pool has no message with this full name.
    #[error("unknown protobuf message: {0}")]
    UnknownMessage(String),

    /// Protobuf descriptors could not be loaded or compiled.
    #[error("invalid protobuf descriptors: {0}")]
    Descriptor(String),
}
