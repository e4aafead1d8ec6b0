//! # Schema Registry
//!
//! Owns every registered [`SchemaObject`] in an append-only arena, indexed by
//! name. Entries are never removed or renamed; the only in-place mutation
//! is reference resolution (see [`crate::resolve`]).
//!
//! ## Naming Policy
//!
//! - No name: a name is generated (`<prefix>_<n>`, or `<prefix>_<n>_<hint>`
//!   when the caller supplies a hint).
//! - Unused name: kept.
//! - Used name, duplicates not tolerated: [`SchemaError::DuplicateSchemaName`].
//! - Used name, duplicates tolerated: if the definition reproduces the
//!   registered entry (inline children included), that entry is returned
//!   unchanged and nothing is registered; otherwise the new schema is
//!   stored under a freshly suffixed name (`<name>_<n>`). An existing entry
//!   is never overwritten.
//!
//! Once the name decision allows registration, inline children are
//! registered first, always duplicate tolerant and hinted with the field
//! name they were declared under.

use indexmap::IndexMap;

use crate::catalog::TypeCatalog;
use crate::classify::Classifier;
use crate::declaration::Declaration;
use crate::error::SchemaError;
use crate::types::{Fields, FieldsDef, SchemaDef, SchemaId, SchemaObject, SchemaType, TypeDef};

/// Default prefix for generated schema names.
pub const DEFAULT_NAME_PREFIX: &str = "schema";

/// Registry of named schemas.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pub(crate) arena: Vec<SchemaObject>,
    pub(crate) names: IndexMap<String, SchemaId>,
    name_prefix: String,
    generated: usize,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// An empty registry using the default name prefix.
    pub fn new() -> Self {
        Self::with_name_prefix(DEFAULT_NAME_PREFIX)
    }

    /// An empty registry generating names with `prefix`.
    pub fn with_name_prefix(prefix: impl Into<String>) -> Self {
        Self {
            arena: Vec::new(),
            names: IndexMap::new(),
            name_prefix: prefix.into(),
            generated: 0,
        }
    }

    /// Register a schema definition and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateSchemaName`] if `def` carries a name
    /// that is already registered and `tolerate_duplicate` is false. Nothing
    /// is registered in that case, not even inline children.
    pub fn register_schema(
        &mut self,
        def: SchemaDef,
        name_hint: Option<&str>,
        tolerate_duplicate: bool,
    ) -> Result<SchemaId, SchemaError> {
        if let Some(name) = &def.name {
            if let Some(existing) = self.id_of(name) {
                if !tolerate_duplicate {
                    return Err(SchemaError::DuplicateSchemaName(name.clone()));
                }
                if self.schema(existing).is_some_and(|schema| self.matches_def(schema, &def)) {
                    tracing::debug!(schema = %name, "re-registration of identical schema");
                    return Ok(existing);
                }
            }
        }

        let SchemaDef {
            name,
            fields,
            is_array,
            unique_key,
            meta_data,
        } = def;

        let fields = match fields {
            FieldsDef::Map(map) => {
                let mut registered = IndexMap::with_capacity(map.len());
                for (field, ty) in map {
                    let ty = self.register_type_def(ty, &field)?;
                    registered.insert(field, ty);
                }
                Fields::Map(registered)
            }
            FieldsDef::Single(ty) => {
                let hint = name.clone().or_else(|| name_hint.map(str::to_string));
                Fields::Single(self.register_type_def(ty, hint.as_deref().unwrap_or("item"))?)
            }
        };

        let mut schema = SchemaObject {
            name: String::new(),
            fields,
            is_array,
            unique_key,
            meta_data,
            resolved: true,
        };
        schema.resolved = !schema.has_references();

        schema.name = match name {
            None => self.generate_name(name_hint),
            Some(name) => match self.id_of(&name) {
                None => name,
                Some(_) => {
                    let renamed = self.suffixed_name(&name);
                    tracing::debug!(schema = %name, renamed = %renamed, "name collision, storing under new name");
                    renamed
                }
            },
        };

        Ok(self.insert(schema))
    }

    /// Classify `decl` against the current registry and `catalog`, then register it.
    pub fn register_declaration(
        &mut self,
        decl: &Declaration,
        catalog: &TypeCatalog,
        tolerate_duplicate: bool,
    ) -> Result<SchemaId, SchemaError> {
        let def = Classifier::new(self, catalog).classify(decl)?;
        self.register_schema(def, None, tolerate_duplicate)
    }

    /// Whether registering `def` would reproduce `schema`: same layout,
    /// flags and annotations, with inline children compared against the
    /// schemas the existing links point at.
    fn matches_def(&self, schema: &SchemaObject, def: &SchemaDef) -> bool {
        if schema.is_array != def.is_array
            || schema.unique_key != def.unique_key
            || schema.meta_data != def.meta_data
        {
            return false;
        }
        match (&schema.fields, &def.fields) {
            (Fields::Map(types), FieldsDef::Map(defs)) => {
                types.len() == defs.len()
                    && defs
                        .iter()
                        .all(|(field, ty)| types.get(field).is_some_and(|existing| self.matches_type(existing, ty)))
            }
            (Fields::Single(existing), FieldsDef::Single(ty)) => self.matches_type(existing, ty),
            _ => false,
        }
    }

    fn matches_type(&self, existing: &SchemaType, ty: &TypeDef) -> bool {
        match (existing, ty) {
            (SchemaType::Nested(id), TypeDef::Inline(child)) => self
                .schema(*id)
                .is_some_and(|schema| self.matches_def(schema, child)),
            // A forward reference that has since been resolved.
            (SchemaType::Nested(id), TypeDef::Kind(SchemaType::Reference(name))) => {
                self.schema(*id).is_some_and(|schema| &schema.name == name)
            }
            (SchemaType::Custom(custom), TypeDef::Kind(SchemaType::Reference(name))) => custom == name,
            (existing, TypeDef::Kind(ty)) => existing == ty,
            (_, TypeDef::Inline(_)) => false,
        }
    }

    fn register_type_def(&mut self, ty: TypeDef, hint: &str) -> Result<SchemaType, SchemaError> {
        match ty {
            TypeDef::Kind(ty) => Ok(ty),
            TypeDef::Inline(child) => self
                .register_schema(*child, Some(hint), true)
                .map(SchemaType::Nested),
        }
    }

    fn insert(&mut self, schema: SchemaObject) -> SchemaId {
        let id = SchemaId(self.arena.len());
        tracing::debug!(
            schema = %schema.name,
            id = id.0,
            resolved = schema.resolved,
            "registered schema"
        );
        self.names.insert(schema.name.clone(), id);
        self.arena.push(schema);
        id
    }

    fn generate_name(&mut self, hint: Option<&str>) -> String {
        loop {
            self.generated += 1;
            let candidate = match hint {
                Some(hint) => format!("{}_{}_{hint}", self.name_prefix, self.generated),
                None => format!("{}_{}", self.name_prefix, self.generated),
            };
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn suffixed_name(&mut self, base: &str) -> String {
        loop {
            self.generated += 1;
            let candidate = format!("{base}_{}", self.generated);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Id of the schema registered under `name`.
    pub fn id_of(&self, name: &str) -> Option<SchemaId> {
        self.names.get(name).copied()
    }

    /// The schema with id `id`, if it belongs to this registry.
    pub fn schema(&self, id: SchemaId) -> Option<&SchemaObject> {
        self.arena.get(id.0)
    }

    /// The schema registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownSchema`] if no such schema exists.
    pub fn get_schema(&self, name: &str) -> Result<&SchemaObject, SchemaError> {
        self.id_of(name)
            .and_then(|id| self.schema(id))
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    /// Whether a schema is registered under `name`.
    pub fn has_schema(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Names of all registered schemas, in registration order.
    pub fn registered_schemas(&self) -> Vec<&str> {
        self.names.keys().map(String::as_str).collect()
    }

    /// Iterate over every registered schema with its id.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &SchemaObject)> {
        self.arena.iter().enumerate().map(|(i, schema)| (SchemaId(i), schema))
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
