//! # Reference Resolution
//!
//! Closes forward and circular references once every schema of a batch has
//! been registered. Each [`SchemaType::Reference`] is rewritten in place:
//!
//! - to [`SchemaType::Nested`] when the name is a registered schema;
//! - to [`SchemaType::Custom`] when the name is a registered custom type.
//!
//! Because links are arena ids, two schemas that reference each other end
//! up pointing at the very entries the registry hands out by name, so a
//! cycle through field maps or arrays needs no special handling. A cycle
//! made only of non-array single-type wrappers (`Loop: Loop`) describes no
//! value at all; its members stay unresolved.

use crate::catalog::TypeCatalog;
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::types::{Fields, SchemaId, SchemaObject, SchemaType};

impl SchemaRegistry {
    /// Resolve the references of one schema and return its final state.
    ///
    /// Already resolved schemas are left untouched. Unknown ids report `false`,
    /// and so does a schema caught in a wrapper cycle.
    pub fn resolve_schema(&mut self, id: SchemaId, catalog: &TypeCatalog) -> bool {
        let has_references = {
            let Self { arena, names, .. } = &mut *self;
            let Some(schema) = arena.get_mut(id.0) else {
                return false;
            };
            if schema.resolved {
                return true;
            }

            for ty in schema.fields.iter_mut() {
                let SchemaType::Reference(name) = ty else {
                    continue;
                };
                if let Some(&target) = names.get(name.as_str()) {
                    *ty = SchemaType::Nested(target);
                } else if catalog.has_type(name) {
                    let name = std::mem::take(name);
                    *ty = SchemaType::Custom(name);
                }
            }
            schema.has_references()
        };

        let resolved = !has_references && !self.in_wrapper_cycle(id);
        if let Some(schema) = self.arena.get_mut(id.0) {
            schema.resolved = resolved;
            tracing::trace!(schema = %schema.name, resolved, "resolution pass");
        }
        resolved
    }

    /// Resolve every unresolved schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnresolvableSchemas`] naming every schema that
    /// still holds an unmatched reference or sits in a wrapper cycle, in
    /// registration order.
    pub fn resolve_all(&mut self, catalog: &TypeCatalog) -> Result<(), SchemaError> {
        let pending: Vec<SchemaId> = self
            .iter()
            .filter(|(_, schema)| !schema.resolved)
            .map(|(id, _)| id)
            .collect();

        let mut unresolved: Vec<SchemaId> = pending
            .into_iter()
            .filter(|&id| !self.resolve_schema(id, catalog))
            .collect();

        // Cycle members registered after their target was linked directly
        // were never pending.
        let cycles: Vec<SchemaId> = self
            .iter()
            .filter(|(id, schema)| schema.resolved && self.in_wrapper_cycle(*id))
            .map(|(id, _)| id)
            .collect();
        for id in &cycles {
            if let Some(schema) = self.arena.get_mut(id.0) {
                schema.resolved = false;
            }
        }
        unresolved.extend(cycles);

        if unresolved.is_empty() {
            tracing::debug!(schemas = self.len(), "all schemas resolved");
            return Ok(());
        }

        unresolved.sort_unstable();
        unresolved.dedup();
        let names: Vec<String> = unresolved
            .into_iter()
            .filter_map(|id| self.schema(id).map(|schema| schema.name.clone()))
            .collect();
        tracing::warn!(unresolved = ?names, "schemas left unresolved");
        Err(SchemaError::UnresolvableSchemas(names))
    }

    /// Whether following the single-type links of non-array schemas from
    /// `id` leads back to `id`. Such a chain never reaches a field map, an
    /// array or a leaf type, so no value can be validated against it.
    pub(crate) fn in_wrapper_cycle(&self, id: SchemaId) -> bool {
        let mut current = id;
        for _ in 0..self.arena.len() {
            let Some(SchemaObject {
                fields: Fields::Single(SchemaType::Nested(next)),
                is_array: false,
                ..
            }) = self.schema(current)
            else {
                return false;
            };
            if *next == id {
                return true;
            }
            current = *next;
        }
        false
    }

    /// Names that some schema references but nothing defines.
    pub fn dangling_references(&self) -> Vec<&str> {
        let mut dangling: Vec<&str> = self
            .arena
            .iter()
            .flat_map(|schema| schema.fields.iter())
            .filter_map(|(_, ty)| match ty {
                SchemaType::Reference(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        dangling.sort_unstable();
        dangling.dedup();
        dangling
    }
}
