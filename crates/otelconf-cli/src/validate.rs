//! # Validate Subcommand
//!
//! `otelconf validate <FILE>`: normalize a YAML configuration file, validate
//! it against a schema, and on success print the decoded configuration tree.
//!
//! Output:
//!
//! ```text
//! Error(s) detected validating schema:
//! 	$.tracer_provider.processors[0].batch.exporter: string found, object expected
//! ```
//!
//! or `Schema successfully validated.` followed by
//! `Successfully parsed schema:` and the tree as pretty JSON.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};

use otelconf_core::CanonicalDocument;
use otelconf_model::decode_configuration;
use otelconf_schema::{
    CompiledSchema, Dialect, SchemaResolver, ViolationSet, DEFAULT_CATALOG_DIALECT,
    DEFAULT_FILE_DIALECT,
};

/// Root schema file name in the bundled schema set.
pub const ROOT_SCHEMA: &str = "opentelemetry_configuration.json";

/// JSON Schema draft selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectArg {
    Draft4,
    Draft6,
    Draft7,
    #[value(name = "2019-09")]
    Draft201909,
    #[value(name = "2020-12")]
    Draft202012,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Draft4 => Dialect::Draft4,
            DialectArg::Draft6 => Dialect::Draft6,
            DialectArg::Draft7 => Dialect::Draft7,
            DialectArg::Draft201909 => Dialect::Draft201909,
            DialectArg::Draft202012 => Dialect::Draft202012,
        }
    }
}

/// Where the schema comes from. `--schema-file` wins over `--schema-dir`.
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaSourceArgs {
    /// Single self-contained schema file.
    #[arg(long, env = "SCHEMA_FILE", value_name = "FILE")]
    pub schema_file: Option<PathBuf>,

    /// Directory of schema files that `$ref` each other.
    #[arg(long, env = "SCHEMA_DIR", value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Root schema file name inside `--schema-dir`.
    #[arg(long, value_name = "NAME", default_value = ROOT_SCHEMA)]
    pub schema: String,

    /// JSON Schema draft. Defaults to draft-07 for directories and 2020-12
    /// for single files.
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,
}

impl SchemaSourceArgs {
    /// Compile the selected schema, or `None` if no source was given.
    pub fn compile(&self) -> Result<Option<CompiledSchema>> {
        let dialect = self.dialect.map(Dialect::from);
        if let Some(file) = &self.schema_file {
            if !file.exists() {
                anyhow::bail!("Specified SCHEMA_FILE does not exist: {}", file.display());
            }
            let schema = SchemaResolver::build_file_with_dialect(
                file,
                dialect.unwrap_or(DEFAULT_FILE_DIALECT),
            )?;
            return Ok(Some(schema));
        }
        if let Some(dir) = &self.schema_dir {
            let schema = SchemaResolver::from_dir(dir)?
                .with_dialect(dialect.unwrap_or(DEFAULT_CATALOG_DIALECT))
                .build(&self.schema)?;
            return Ok(Some(schema));
        }
        Ok(None)
    }
}

/// Arguments for the `otelconf validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// YAML configuration file to validate.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub source: SchemaSourceArgs,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs, out: &mut impl Write) -> Result<u8> {
    crate::ensure_input_exists(&args.file)?;
    let schema = args.source.compile()?.ok_or_else(|| {
        anyhow!("a schema is required: pass --schema-file (SCHEMA_FILE) or --schema-dir (SCHEMA_DIR)")
    })?;
    let document = CanonicalDocument::from_yaml_file(&args.file)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    tracing::info!(file = %args.file.display(), schema = schema.name(), "validating");

    let validated = match schema.check(document) {
        Ok(validated) => validated,
        Err(violations) => {
            write_violations(out, &violations)?;
            return Ok(1);
        }
    };
    writeln!(out, "Schema successfully validated.")?;

    let configuration = decode_configuration(&validated)?;
    writeln!(out, "Successfully parsed schema:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&configuration)?)?;
    Ok(0)
}

/// Print a violation report, one tab-indented violation per line.
pub(crate) fn write_violations(out: &mut impl Write, violations: &ViolationSet) -> Result<()> {
    writeln!(out, "Error(s) detected validating schema: ")?;
    for violation in violations {
        writeln!(out, "\t{violation}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn repo_root() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop();
        dir.pop();
        dir
    }

    fn catalog_args(file: &Path) -> ValidateArgs {
        ValidateArgs {
            file: file.to_path_buf(),
            source: SchemaSourceArgs {
                schema_dir: Some(repo_root().join("schemas")),
                schema: ROOT_SCHEMA.to_string(),
                ..SchemaSourceArgs::default()
            },
        }
    }

    fn run(args: &ValidateArgs) -> (u8, String) {
        let mut out = Vec::new();
        let code = run_validate(args, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_kitchen_sink_validates_and_decodes() {
        let (code, output) = run(&catalog_args(&repo_root().join("fixtures/kitchen-sink.yaml")));
        assert_eq!(code, 0, "{output}");
        assert!(output.starts_with("Schema successfully validated.\nSuccessfully parsed schema:\n"));
        assert!(output.contains("\"file_format\": \"0.1\""));
    }

    #[test]
    fn test_violations_exit_one() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("bad.yaml");
        std::fs::write(&file, "file_format: \"0.1\"\ndisabled: nope\n").unwrap();
        let (code, output) = run(&catalog_args(&file));
        assert_eq!(code, 1);
        assert_eq!(
            output,
            "Error(s) detected validating schema: \n\t$.disabled: string found, boolean expected\n"
        );
    }

    #[test]
    fn test_single_schema_file() {
        let tmp = tempfile::tempdir().unwrap();
        let schema = tmp.path().join("schema.json");
        std::fs::write(
            &schema,
            r#"{"type":"object","required":["file_format"],"properties":{"file_format":{"type":"string"}}}"#,
        )
        .unwrap();
        let file = tmp.path().join("config.yaml");
        std::fs::write(&file, "disabled: true\n").unwrap();
        let args = ValidateArgs {
            file,
            source: SchemaSourceArgs {
                schema_file: Some(schema),
                ..SchemaSourceArgs::default()
            },
        };
        let (code, output) = run(&args);
        assert_eq!(code, 1);
        assert!(output.contains("\t$.file_format: is missing but it is required"));
    }

    #[test]
    fn test_missing_input_fails_first() {
        let args = ValidateArgs {
            file: PathBuf::from("/definitely/not/here.yaml"),
            source: SchemaSourceArgs::default(),
        };
        let err = run_validate(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("File does not exist"), "{err}");
    }

    #[test]
    fn test_no_schema_source_is_an_error() {
        let args = ValidateArgs {
            file: repo_root().join("fixtures/kitchen-sink.yaml"),
            source: SchemaSourceArgs::default(),
        };
        let err = run_validate(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("a schema is required"), "{err}");
    }

    #[test]
    fn test_missing_schema_file() {
        let args = ValidateArgs {
            file: repo_root().join("fixtures/kitchen-sink.yaml"),
            source: SchemaSourceArgs {
                schema_file: Some(PathBuf::from("/definitely/not/schema.json")),
                ..SchemaSourceArgs::default()
            },
        };
        let err = run_validate(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("SCHEMA_FILE does not exist"), "{err}");
    }
}
