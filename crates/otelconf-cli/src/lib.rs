//! # otelconf-cli — Configuration File Command-Line Interface
//!
//! ## Subcommands
//!
//! - `validate`: validate a YAML file against a schema file or schema
//!   directory, then decode it into the typed configuration tree
//! - `proto`: merge a YAML file into a protobuf message and print it as
//!   proto3 JSON
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers here take parsed args and
//!   an output sink so they can be tested without a process.
//! - Handlers return an exit code: 0 success, 1 violations. Operational
//!   failures are `Err` and map to 2.

pub mod proto;
pub mod validate;

use std::path::Path;

use anyhow::{bail, Result};

/// Fail before any pipeline work if the input file is missing.
pub(crate) fn ensure_input_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File does not exist: {}", path.display());
    }
    Ok(())
}
