//! # otelconf CLI Entry Point
//!
//! Parses command-line arguments, initializes tracing and dispatches to
//! subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use otelconf_cli::proto::{run_proto, ProtoArgs};
use otelconf_cli::validate::{run_validate, ValidateArgs};

/// OpenTelemetry file configuration toolchain.
///
/// Validates SDK configuration YAML against a multi-file JSON Schema set and
/// decodes it into a typed tree or a protobuf message.
#[derive(Parser, Debug)]
#[command(name = "otelconf", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration file and print the decoded tree.
    Validate(ValidateArgs),

    /// Merge a configuration file into a protobuf message.
    Proto(ProtoArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides the verbosity flag.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &mut stdout),
        Commands::Proto(args) => run_proto(&args, &mut stdout),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_validate_with_schema_dir() {
        let cli = Cli::try_parse_from([
            "otelconf",
            "validate",
            "otel.yaml",
            "--schema-dir",
            "schemas",
            "--dialect",
            "2020-12",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.file.to_str(), Some("otel.yaml"));
                assert_eq!(args.source.schema, "opentelemetry_configuration.json");
                assert_eq!(
                    args.source.dialect,
                    Some(otelconf_cli::validate::DialectArg::Draft202012)
                );
            }
            other => panic!("expected validate, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_proto_repeated_flags() {
        let cli = Cli::try_parse_from([
            "otelconf",
            "proto",
            "otel.yaml",
            "--proto",
            "a.proto",
            "--proto",
            "b.proto",
            "--include",
            "protos",
            "--message",
            "demo.Config",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Proto(args) => {
                assert_eq!(args.protos.len(), 2);
                assert_eq!(args.includes.len(), 1);
                assert_eq!(args.message, "demo.Config");
            }
            other => panic!("expected proto, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_requires_file() {
        assert!(Cli::try_parse_from(["otelconf", "validate"]).is_err());
    }
}
