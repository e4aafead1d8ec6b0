//! # Check Subcommand
//!
//! Loads declaration files, registers and resolves them, and lists the
//! resulting schema names. A dangling reference or malformed declaration
//! makes the command fail.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use formwork_schema::SchemaEngine;

use crate::loader::build_engine;

/// Arguments for the `formwork check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Declaration files (YAML or JSON), registered in the order given.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the check subcommand. Returns the process exit code.
pub fn run_check(args: &CheckArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(&args.files, config)?;
    for line in summary(&engine) {
        println!("{line}");
    }
    Ok(0)
}

/// One line per registered schema, followed by a total.
pub fn summary(engine: &SchemaEngine) -> Vec<String> {
    let mut lines: Vec<String> = engine
        .registry()
        .iter()
        .map(|(_, schema)| {
            let shape = if schema.is_array { "[]" } else { "" };
            format!("  {}{shape}", schema.name)
        })
        .collect();
    lines.push(format!("{} schema(s) registered and resolved", engine.registry().len()));
    lines
}
