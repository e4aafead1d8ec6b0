//! # Validate Subcommand
//!
//! Validates a data document (YAML or JSON) against a named schema, in full
//! (create) mode by default or partial (update) mode with `--partial`.
//!
//! Exit codes: 0 when the data conforms, 1 when it does not (the failure is
//! printed on stderr). Configuration problems such as an unknown schema are
//! reported as errors.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use formwork_schema::{SchemaEngine, SchemaError, ValidationFailure, ValidationMode};

use crate::loader::{build_engine, load_document};

/// Arguments for the `formwork validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Declaration files (YAML or JSON), registered in the order given.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Name of the schema to validate against.
    #[arg(long)]
    pub schema: String,

    /// Data document to validate.
    #[arg(long, value_name = "PATH")]
    pub data: PathBuf,

    /// Only check the fields present in the data (update semantics).
    #[arg(long)]
    pub partial: bool,
}

impl ValidateArgs {
    /// The validation mode selected by `--partial`.
    pub fn mode(&self) -> ValidationMode {
        ValidationMode::from_full_flag(!self.partial)
    }
}

/// Execute the validate subcommand. Returns the process exit code.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(&args.files, config)?;
    match validate_document(&engine, args)? {
        None => {
            println!("OK: {} conforms to schema '{}'", args.data.display(), args.schema);
            Ok(0)
        }
        Some(failure) => {
            eprintln!("FAIL: {}: {failure}", args.data.display());
            Ok(1)
        }
    }
}

/// Validate the data document named by `args`. `Ok(Some(_))` carries the
/// first data failure; configuration errors are returned as `Err`.
pub fn validate_document(engine: &SchemaEngine, args: &ValidateArgs) -> Result<Option<ValidationFailure>> {
    let data = load_document(&args.data)?;
    let mode = args.mode();
    tracing::debug!(schema = %args.schema, mode = ?mode, "validating data document");

    match engine.validate_model(&args.schema, &data, mode) {
        Ok(()) => Ok(None),
        Err(SchemaError::Invalid(failure)) => Ok(Some(failure)),
        Err(other) => Err(other.into()),
    }
}
