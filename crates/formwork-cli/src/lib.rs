//! # formwork-cli: Command-Line Interface for formwork
//!
//! Provides the `formwork` command: load schema declaration files, resolve
//! them into a schema graph, and inspect or exercise that graph.
//!
//! ## Subcommands
//!
//! - `formwork check`: Register and resolve declarations, list schema names.
//! - `formwork show`: Print wire-safe schema snapshots as JSON.
//! - `formwork validate`: Validate a data document against a schema.
//! - `formwork path`: Check a dotted field path against a schema.
//!
//! ```bash
//! formwork check schemas/*.yaml
//! formwork show schemas/*.yaml --pattern '^Tree'
//! formwork validate schemas/*.yaml --schema Tree --data tree.json --partial
//! formwork path schemas/*.yaml --schema Tree --path 'leaves[0].color'
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; each subcommand module exposes an
//!   `Args` struct, a `run_*` entry point, and a testable core function.
//! - Schema semantics belong to `formwork-schema`; nothing is re-implemented here.
//! - Results go to stdout, failures and logs to stderr.

pub mod check;
pub mod loader;
pub mod path;
pub mod show;
pub mod validate;

pub use loader::{build_engine, load_config, load_declarations, load_document};
