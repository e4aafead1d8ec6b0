//! # Type-Kind Classifier
//!
//! Turns a [`Declaration`] into an unregistered [`SchemaDef`] whose field
//! types are canonical. Names are looked up in this order:
//!
//! 1. primitive keyword (`Number`, `String`, `Boolean`) or `Any`;
//! 2. custom type in the [`TypeCatalog`];
//! 3. schema already in the [`SchemaRegistry`], linked directly;
//! 4. anything else becomes a [`SchemaType::Reference`] and leaves the
//!    enclosing schema unresolved until `resolve_all`.
//!
//! Nested field maps and array shorthands become inline child definitions,
//! registered together with their parent. An array shorthand around a field
//! map yields an array-shaped map schema; around anything else it yields an
//! array-shaped single-type wrapper schema.

use indexmap::IndexMap;
use serde_json::Value;

use crate::catalog::TypeCatalog;
use crate::declaration::{Declaration, TypeDecl};
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::types::{
    is_any_keyword, Annotations, FieldsDef, MetaData, PrimitiveKind, SchemaDef, SchemaType,
    TypeDef,
};

/// Read-only view of the registry and catalog used to classify declarations.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    registry: &'a SchemaRegistry,
    catalog: &'a TypeCatalog,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over the current registry and catalog contents.
    pub fn new(registry: &'a SchemaRegistry, catalog: &'a TypeCatalog) -> Self {
        Self { registry, catalog }
    }

    /// Classify a whole declaration.
    pub fn classify(&self, decl: &Declaration) -> Result<SchemaDef, SchemaError> {
        let context = decl.context();
        let (fields, wrapped_array) = match &decl.ty {
            None => (FieldsDef::Single(SchemaType::Any.into()), false),
            Some(TypeDecl::Array(items)) => {
                let inner = Self::sole_entry(context, items)?;
                (self.classify_layout(context, inner)?, true)
            }
            Some(other) => (self.classify_layout(context, other)?, false),
        };

        let meta_data = Self::classify_meta_data(context, &fields, decl.meta_data.as_ref())?;

        Ok(SchemaDef {
            name: decl.name.clone(),
            fields,
            is_array: decl.is_array || wrapped_array,
            unique_key: decl.unique_key.clone(),
            meta_data,
        })
    }

    /// Classify the type of one field.
    pub fn classify_type(&self, context: &str, decl: &TypeDecl) -> Result<TypeDef, SchemaError> {
        match decl {
            TypeDecl::Kind(kind) => Ok(SchemaType::Primitive(*kind).into()),
            TypeDecl::Name(name) => Ok(self.classify_name(name).into()),
            TypeDecl::Fields(map) => {
                let child = SchemaDef {
                    fields: self.classify_map(context, map)?,
                    ..SchemaDef::map()
                };
                Ok(child.into())
            }
            TypeDecl::Array(items) => {
                let inner = Self::sole_entry(context, items)?;
                Ok(self.array_child(context, inner)?.into())
            }
        }
    }

    /// Classify a bare name.
    pub fn classify_name(&self, name: &str) -> SchemaType {
        if let Ok(kind) = name.parse::<PrimitiveKind>() {
            return SchemaType::Primitive(kind);
        }
        if is_any_keyword(name) {
            return SchemaType::Any;
        }
        if self.catalog.has_type(name) {
            return SchemaType::Custom(name.to_string());
        }
        match self.registry.id_of(name) {
            Some(id) => SchemaType::Nested(id),
            None => {
                tracing::trace!(reference = %name, "deferring unknown name as schema reference");
                SchemaType::Reference(name.to_string())
            }
        }
    }

    fn classify_layout(&self, context: &str, decl: &TypeDecl) -> Result<FieldsDef, SchemaError> {
        match decl {
            TypeDecl::Fields(map) => self.classify_map(context, map),
            TypeDecl::Array(items) => {
                let inner = Self::sole_entry(context, items)?;
                Ok(FieldsDef::Single(self.array_child(context, inner)?.into()))
            }
            other => Ok(FieldsDef::Single(self.classify_type(context, other)?)),
        }
    }

    fn classify_map(
        &self,
        context: &str,
        map: &IndexMap<String, TypeDecl>,
    ) -> Result<FieldsDef, SchemaError> {
        map.iter()
            .map(|(field, decl)| {
                let ctx = format!("{context}.{field}");
                self.classify_type(&ctx, decl).map(|ty| (field.clone(), ty))
            })
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(FieldsDef::Map)
    }

    fn array_child(&self, context: &str, inner: &TypeDecl) -> Result<SchemaDef, SchemaError> {
        let fields = match inner {
            TypeDecl::Fields(map) => self.classify_map(context, map)?,
            other => FieldsDef::Single(self.classify_type(context, other)?),
        };
        Ok(SchemaDef {
            fields,
            ..SchemaDef::map()
        }
        .array())
    }

    fn sole_entry<'d>(context: &str, items: &'d [TypeDecl]) -> Result<&'d TypeDecl, SchemaError> {
        match items {
            [inner] => Ok(inner),
            _ => Err(SchemaError::InvalidArrayShorthand {
                context: context.to_string(),
                found: items.len(),
            }),
        }
    }

    fn classify_meta_data(
        context: &str,
        fields: &FieldsDef,
        raw: Option<&Annotations>,
    ) -> Result<MetaData, SchemaError> {
        let Some(raw) = raw else {
            return Ok(MetaData::default());
        };
        match fields {
            FieldsDef::Single(_) => Ok(MetaData {
                schema: raw.clone(),
                ..MetaData::default()
            }),
            FieldsDef::Map(_) => {
                let fields = raw
                    .iter()
                    .map(|(field, block)| match block {
                        Value::Object(block) => Ok((field.clone(), block.clone())),
                        other => Err(SchemaError::InvalidMetadata {
                            context: context.to_string(),
                            reason: format!("annotations of field '{field}' must be an object, got {other}"),
                        }),
                    })
                    .collect::<Result<IndexMap<_, _>, _>>()?;
                Ok(MetaData {
                    fields,
                    ..MetaData::default()
                })
            }
        }
    }
}
