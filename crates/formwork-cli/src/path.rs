//! # Path Subcommand
//!
//! Checks that a dotted field path (`leaves[0].color`) addresses a declared
//! field of a schema. Only the schema shape is consulted.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use formwork_schema::{SchemaEngine, SchemaError, ValidationFailure};

use crate::loader::build_engine;

/// Arguments for the `formwork path` subcommand.
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Declaration files (YAML or JSON), registered in the order given.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Name of the schema the path starts from.
    #[arg(long)]
    pub schema: String,

    /// Dotted field path, e.g. `leaves[0].color`.
    #[arg(long)]
    pub path: String,
}

/// Execute the path subcommand. Returns the process exit code.
pub fn run_path(args: &PathArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(&args.files, config)?;
    match check_path(&engine, args)? {
        None => {
            println!("OK: '{}' is a valid path of schema '{}'", args.path, args.schema);
            Ok(0)
        }
        Some(failure) => {
            eprintln!("FAIL: {failure}");
            Ok(1)
        }
    }
}

/// Check the path named by `args`. `Ok(Some(_))` carries the path failure.
pub fn check_path(engine: &SchemaEngine, args: &PathArgs) -> Result<Option<ValidationFailure>> {
    match engine.validate_map(&args.schema, &args.path) {
        Ok(()) => Ok(None),
        Err(SchemaError::Invalid(failure)) => Ok(Some(failure)),
        Err(other) => Err(other.into()),
    }
}
