//! # Schema Engine
//!
//! One owner for the registry, the type catalog and the configuration,
//! exposing the whole registration, query and validation surface.
//!
//! The expected lifecycle is register-all, then resolve, then validate
//! repeatedly. Registration and resolution take `&mut self`; every query
//! and validation call takes `&self`, so a fully built engine can be
//! shared freely between readers.

use indexmap::IndexMap;
use serde_json::Value;

use crate::catalog::{RuleInput, TypeCatalog};
use crate::config::EngineConfig;
use crate::declaration::Declaration;
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::snapshot::SchemaSnapshot;
use crate::types::{Annotations, SchemaDef, SchemaId, SchemaObject};
use crate::validate::{ValidationMode, Validator};

/// Registry, catalog and configuration behind one API.
#[derive(Debug, Clone)]
pub struct SchemaEngine {
    registry: SchemaRegistry,
    catalog: TypeCatalog,
    config: EngineConfig,
}

impl Default for SchemaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaEngine {
    /// An engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// An engine configured by `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        let catalog = if config.builtin_rules {
            TypeCatalog::with_builtin_rules()
        } else {
            TypeCatalog::new()
        };
        Self {
            registry: SchemaRegistry::with_name_prefix(config.generated_name_prefix.clone()),
            catalog,
            config,
        }
    }

    // ─── Registration ────────────────────────────────────────────────

    /// Register an already classified schema definition. `name_hint` is
    /// folded into the generated name when `def` is anonymous.
    pub fn register_schema(
        &mut self,
        def: SchemaDef,
        name_hint: Option<&str>,
        tolerate_duplicate: bool,
    ) -> Result<SchemaId, SchemaError> {
        self.registry.register_schema(def, name_hint, tolerate_duplicate)
    }

    /// Classify `decl` and register the result.
    pub fn register_schema_from_declaration(
        &mut self,
        decl: &Declaration,
        tolerate_duplicate: bool,
    ) -> Result<SchemaId, SchemaError> {
        self.registry
            .register_declaration(decl, &self.catalog, tolerate_duplicate)
    }

    /// Register a batch of declarations in order, then resolve.
    ///
    /// Stops at the first registration failure; schemas registered before it
    /// stay registered.
    pub fn register_declarations<'d, I>(&mut self, decls: I) -> Result<Vec<SchemaId>, SchemaError>
    where
        I: IntoIterator<Item = &'d Declaration>,
    {
        let ids = decls
            .into_iter()
            .map(|decl| self.register_schema_from_declaration(decl, false))
            .collect::<Result<Vec<_>, _>>()?;
        self.resolve_all()?;
        tracing::info!(schemas = ids.len(), total = self.registry.len(), "registered declaration batch");
        Ok(ids)
    }

    /// Register a custom type that accepts every value.
    pub fn register_type(&mut self, name: impl Into<String>) {
        self.catalog.register_type(name);
    }

    /// Register a custom type backed by `predicate`.
    pub fn register_type_with<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value, &Annotations) -> bool + Send + Sync + 'static,
    {
        self.catalog.register_type_with(name, predicate);
    }

    /// Register a metadata rule under annotation key `key`.
    pub fn register_metadata_rule<F>(&mut self, key: impl Into<String>, rule: F)
    where
        F: Fn(&RuleInput<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.catalog.register_rule(key, rule);
    }

    // ─── Resolution ──────────────────────────────────────────────────

    /// Resolve one schema by name and report whether it is now resolved.
    pub fn resolve_schema(&mut self, name: &str) -> Result<bool, SchemaError> {
        let id = self
            .registry
            .id_of(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))?;
        Ok(self.registry.resolve_schema(id, &self.catalog))
    }

    /// Resolve every pending reference.
    pub fn resolve_all(&mut self) -> Result<(), SchemaError> {
        self.registry.resolve_all(&self.catalog)
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// The schema registered under `name`.
    pub fn get_schema(&self, name: &str) -> Result<&SchemaObject, SchemaError> {
        self.registry.get_schema(name)
    }

    /// Whether a schema is registered under `name`.
    pub fn has_schema(&self, name: &str) -> bool {
        self.registry.has_schema(name)
    }

    /// Registered schema names in registration order.
    pub fn registered_schemas(&self) -> Vec<&str> {
        self.registry.registered_schemas()
    }

    /// Snapshot of one schema.
    pub fn schema_to_object(&self, name: &str) -> Result<SchemaSnapshot, SchemaError> {
        self.registry.schema_to_object(name)
    }

    /// Snapshots of every schema whose name matches `pattern`.
    pub fn schemas_to_object(&self, pattern: &str) -> Result<IndexMap<String, SchemaSnapshot>, SchemaError> {
        self.registry.schemas_to_object(pattern)
    }

    // ─── Validation ──────────────────────────────────────────────────

    /// Validate `data` against schema `name`.
    pub fn validate_model(&self, name: &str, data: &Value, mode: ValidationMode) -> Result<(), SchemaError> {
        self.validator().validate_model(name, data, mode)
    }

    /// Check that the dotted `path` addresses a declared field of schema `name`.
    pub fn validate_map(&self, name: &str, path: &str) -> Result<(), SchemaError> {
        self.registry.validate_map(name, path)
    }

    /// A validator borrowing this engine.
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.registry, &self.catalog, &self.config)
    }

    // ─── Accessors ───────────────────────────────────────────────────

    /// The underlying registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The type catalog.
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
