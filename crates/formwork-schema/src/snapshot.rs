//! # Wire-Safe Snapshots
//!
//! Shallow, serializable renderings of registered schemas. Every field type
//! is reduced to a display name (primitive kind, `Any`, custom type name or
//! linked schema name), so a snapshot never embeds another schema and stays
//! finite for cyclic graphs.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::types::{Fields, SchemaObject, SchemaType};

/// Display-name rendering of a schema's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldsSnapshot {
    /// Single-type schema.
    Single(String),
    /// Map schema: field name → display name.
    Map(IndexMap<String, String>),
}

/// Snapshot of one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    /// Registered name.
    pub name: String,
    /// Field types by display name.
    pub fields: FieldsSnapshot,
    /// Whether data must be a sequence.
    pub is_array: bool,
    /// Element identity field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,
    /// Per-field annotation blocks for map schemas; the flat block for
    /// single-type schemas.
    pub meta_data: Value,
    /// Whether every reference has been resolved.
    pub resolved: bool,
}

impl SchemaRegistry {
    /// Display name of a type.
    pub fn display_name<'a>(&'a self, ty: &'a SchemaType) -> &'a str {
        match ty {
            SchemaType::Primitive(kind) => kind.as_str(),
            SchemaType::Any => "Any",
            SchemaType::Custom(name) | SchemaType::Reference(name) => name,
            SchemaType::Nested(id) => self.schema(*id).map_or("<unknown>", |s| s.name.as_str()),
        }
    }

    /// Snapshot of the schema registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownSchema`] if no such schema exists.
    pub fn schema_to_object(&self, name: &str) -> Result<SchemaSnapshot, SchemaError> {
        self.get_schema(name).map(|schema| self.snapshot(schema))
    }

    /// Snapshots of every schema whose name matches the regular expression
    /// `pattern` (unanchored), keyed by name in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPattern`] if `pattern` does not compile.
    pub fn schemas_to_object(&self, pattern: &str) -> Result<IndexMap<String, SchemaSnapshot>, SchemaError> {
        let re = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self
            .iter()
            .filter(|(_, schema)| re.is_match(&schema.name))
            .map(|(_, schema)| (schema.name.clone(), self.snapshot(schema)))
            .collect())
    }

    fn snapshot(&self, schema: &SchemaObject) -> SchemaSnapshot {
        let (fields, meta_data) = match &schema.fields {
            Fields::Single(ty) => (
                FieldsSnapshot::Single(self.display_name(ty).to_string()),
                Value::Object(schema.meta_data.schema.clone()),
            ),
            Fields::Map(map) => (
                FieldsSnapshot::Map(
                    map.iter()
                        .map(|(field, ty)| (field.clone(), self.display_name(ty).to_string()))
                        .collect(),
                ),
                Value::Object(
                    schema
                        .meta_data
                        .fields
                        .iter()
                        .map(|(field, block)| (field.clone(), Value::Object(block.clone())))
                        .collect(),
                ),
            ),
        };

        SchemaSnapshot {
            name: schema.name.clone(),
            fields,
            is_array: schema.is_array,
            unique_key: schema.unique_key.clone(),
            meta_data,
            resolved: schema.resolved,
        }
    }
}
