//! # otelconf-model — Typed OpenTelemetry Configuration
//!
//! Serde shapes mirroring the configuration schema set, and the decoder
//! that maps a validated document onto them.
//!
//! ```ignore
//! let schema = SchemaResolver::from_dir("schemas")?.build("opentelemetry_configuration.json")?;
//! let validated = schema.check(CanonicalDocument::from_yaml_file("otel.yaml")?)?;
//! let config = otelconf_model::decode_configuration(&validated)?;
//! ```
//!
//! ## Crate Policy
//!
//! - Decoding requires a `ValidatedDocument`; there is no path from raw
//!   YAML straight to a typed tree.

pub mod config;
pub mod decode;

pub use config::*;
pub use decode::{decode, decode_configuration};
