//! # Show Subcommand
//!
//! Prints wire-safe snapshots of registered schemas as pretty JSON: one
//! schema with `--name`, or every schema whose name matches `--pattern`
//! (all schemas by default).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use formwork_schema::SchemaEngine;

use crate::loader::build_engine;

/// Arguments for the `formwork show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Declaration files (YAML or JSON), registered in the order given.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Show only the schema with this name.
    #[arg(long, conflicts_with = "pattern")]
    pub name: Option<String>,

    /// Show every schema whose name matches this regular expression.
    #[arg(long)]
    pub pattern: Option<String>,
}

/// Execute the show subcommand. Returns the process exit code.
pub fn run_show(args: &ShowArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(&args.files, config)?;
    let document = snapshot_document(&engine, args)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(0)
}

/// The snapshot (or name → snapshot map) selected by `args`.
pub fn snapshot_document(engine: &SchemaEngine, args: &ShowArgs) -> Result<Value> {
    let document = match &args.name {
        Some(name) => serde_json::to_value(engine.schema_to_object(name)?),
        None => {
            let pattern = args.pattern.as_deref().unwrap_or(".*");
            serde_json::to_value(engine.schemas_to_object(pattern)?)
        }
    };
    document.context("failed to render schema snapshots")
}
