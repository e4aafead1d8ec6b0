//! # Engine Configuration
//!
//! Tunables of a [`SchemaEngine`](crate::SchemaEngine). Every field has a
//! default, so an empty document (or no document at all) is a valid
//! configuration.

use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_NAME_PREFIX;

/// Identity and audit keys accepted on any map schema without a declaration.
pub const DEFAULT_BOOKKEEPING_FIELDS: &[&str] =
    &["_id", "id", "createdAt", "updatedAt", "createdBy", "updatedBy"];

/// Configuration of the schema engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Keys that always pass validation and never count as unknown fields.
    pub bookkeeping_fields: Vec<String>,
    /// Prefix for generated schema names.
    pub generated_name_prefix: String,
    /// Install the built-in metadata rules when the engine is created.
    pub builtin_rules: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bookkeeping_fields: DEFAULT_BOOKKEEPING_FIELDS.iter().map(|s| s.to_string()).collect(),
            generated_name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            builtin_rules: true,
        }
    }
}

impl EngineConfig {
    /// Whether `key` is a bookkeeping field.
    pub fn is_bookkeeping(&self, key: &str) -> bool {
        self.bookkeeping_fields.iter().any(|field| field == key)
    }
}
