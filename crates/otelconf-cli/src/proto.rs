//! # Proto Subcommand
//!
//! `otelconf proto <FILE>`: merge a YAML configuration file into a protobuf
//! message and print it as proto3 JSON. Validates first when a schema
//! source is given.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use otelconf_core::CanonicalDocument;
use otelconf_proto::{ProtoBridge, CONFIGURATION_MESSAGE};

use crate::validate::{write_violations, SchemaSourceArgs};

/// Arguments for the `otelconf proto` subcommand.
#[derive(Args, Debug)]
pub struct ProtoArgs {
    /// YAML configuration file to merge.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Full name of the target message.
    #[arg(long, default_value = CONFIGURATION_MESSAGE)]
    pub message: String,

    /// `.proto` file to compile instead of the bundled protos. Repeatable.
    #[arg(long = "proto", value_name = "FILE")]
    pub protos: Vec<PathBuf>,

    /// Include directory for `--proto` files. Repeatable; defaults to `.`.
    #[arg(long = "include", value_name = "DIR")]
    pub includes: Vec<PathBuf>,

    #[command(flatten)]
    pub source: SchemaSourceArgs,
}

/// Execute the proto subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_proto(args: &ProtoArgs, out: &mut impl Write) -> Result<u8> {
    crate::ensure_input_exists(&args.file)?;
    let document = CanonicalDocument::from_yaml_file(&args.file)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    if let Some(schema) = args.source.compile()? {
        let violations = schema.validate(&document);
        if !violations.is_empty() {
            write_violations(out, &violations)?;
            return Ok(1);
        }
    }

    let bridge = if args.protos.is_empty() {
        ProtoBridge::bundled()?
    } else {
        let includes = if args.includes.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.includes.clone()
        };
        ProtoBridge::from_proto_files(&args.protos, &includes)?
    };

    let message = bridge.decode(&document, &args.message)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&message)?)?;
    Ok(0)
}
