//! # otelconf-core — Foundational Types for File Configuration
//!
//! This crate is the leaf of the `otelconf` workspace. It owns the one
//! representation every later stage consumes: the [`CanonicalDocument`],
//! the alias-expanded JSON form of a YAML configuration file.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalDocument` newtype.** Schema validation, typed decoding and
//!    protobuf merging all accept a `&CanonicalDocument`. Its only
//!    constructors run the full normalization pipeline (YAML parse, alias
//!    and merge-key expansion, key stringification, JCS serialization), so
//!    no stage can observe an un-expanded alias.
//!
//! 2. **Structured errors.** [`ConfigError`], [`ParseError`] and
//!    [`DecodeError`] separate setup defects from bad input and from
//!    should-not-happen decode paths. A failed validation is not an error;
//!    it is a non-empty violation set returned by `otelconf-schema`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `otelconf-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use canonical::{normalize, CanonicalDocument};
pub use error::{ConfigError, DecodeError, OtelConfError, ParseError};
pub use path::{DocumentPath, PathSegment};
