//! # Schema Data Model
//!
//! The canonical, registry-owned representation of a schema, plus the
//! unregistered [`SchemaDef`] form that callers and the classifier build
//! before handing a schema to the registry.
//!
//! ## Graph Representation
//!
//! Registered schemas live in an arena owned by
//! [`SchemaRegistry`](crate::SchemaRegistry) and are addressed by
//! [`SchemaId`]. A [`SchemaType::Nested`] link stores the id, never a copy,
//! so two schemas that point at the same child observe the same node, and
//! cycles are closed by rewriting a [`SchemaType::Reference`] into a
//! `Nested` id in place.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Annotation key/value pairs attached to a field or a schema.
pub type Annotations = Map<String, Value>;

/// Annotation key the engine itself interprets.
pub const REQUIRED: &str = "required";

/// Identity of a registered schema: its index in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    /// The raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

// ─── Primitive Kinds ─────────────────────────────────────────────────

/// The built-in primitive kinds, matched against a value's runtime kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Any JSON number.
    Number,
    /// Any JSON string.
    String,
    /// `true` or `false`.
    Boolean,
}

impl PrimitiveKind {
    /// Display name, as used in snapshots and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::String => "String",
            Self::Boolean => "Boolean",
        }
    }

    /// Whether `value` has exactly this runtime kind.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Number, Value::Number(_))
                | (Self::String, Value::String(_))
                | (Self::Boolean, Value::Bool(_))
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Number" | "number" => Ok(Self::Number),
            "String" | "string" => Ok(Self::String),
            "Boolean" | "boolean" => Ok(Self::Boolean),
            _ => Err(format!("not a primitive keyword: {s}")),
        }
    }
}

/// Whether `keyword` names the accept-everything type.
pub fn is_any_keyword(keyword: &str) -> bool {
    matches!(keyword, "Any" | "any")
}

/// Runtime kind name of a JSON value, for messages.
pub fn runtime_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─── Schema Types ────────────────────────────────────────────────────

/// The canonical type of a field (or of a single-type schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    /// One of the built-in kinds.
    Primitive(PrimitiveKind),
    /// Accepts every value.
    Any,
    /// A predicate registered in the [`TypeCatalog`](crate::TypeCatalog).
    Custom(String),
    /// A by-name link to a schema that was not registered when this type was
    /// classified. Only present while the owning schema is unresolved.
    Reference(String),
    /// A direct link to a registered schema.
    Nested(SchemaId),
}

impl SchemaType {
    /// Whether this is a pending by-name reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

/// The field layout of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    /// Named fields, in declaration order.
    Map(IndexMap<String, SchemaType>),
    /// The schema wraps one bare type.
    Single(SchemaType),
}

impl Fields {
    /// Iterate over every type held, with its field name for map schemas.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&str>, &SchemaType)> + '_> {
        match self {
            Self::Map(map) => Box::new(map.iter().map(|(k, t)| (Some(k.as_str()), t))),
            Self::Single(ty) => Box::new(std::iter::once((None, ty))),
        }
    }

    /// Mutable counterpart of [`Fields::iter`].
    pub fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut SchemaType> + '_> {
        match self {
            Self::Map(map) => Box::new(map.values_mut()),
            Self::Single(ty) => Box::new(std::iter::once(ty)),
        }
    }
}

/// Annotations of a schema: one block per field for map schemas, and a flat
/// schema-level block (used by single-type schemas).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    /// Per-field annotation blocks.
    pub fields: IndexMap<String, Annotations>,
    /// Schema-level annotations.
    pub schema: Annotations,
}

impl MetaData {
    /// Annotations of `field`, or the schema-level block when `field` is `None`.
    pub fn for_field(&self, field: Option<&str>) -> Option<&Annotations> {
        match field {
            Some(name) => self.fields.get(name),
            None => Some(&self.schema),
        }
    }

    /// Whether the annotations of `field` mark it as required.
    pub fn is_required(&self, field: Option<&str>) -> bool {
        self.for_field(field)
            .and_then(|block| block.get(REQUIRED))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A registered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaObject {
    /// Unique name within the registry.
    pub name: String,
    /// Field layout.
    pub fields: Fields,
    /// Whether data must be a sequence of values of this shape.
    pub is_array: bool,
    /// Field that identifies an array element. Carried for callers; the engine
    /// does not enforce it.
    pub unique_key: Option<String>,
    /// Field and schema annotations.
    pub meta_data: MetaData,
    /// `false` while some field still holds an unmatched [`SchemaType::Reference`].
    pub resolved: bool,
}

impl SchemaObject {
    /// Whether this is a single-type schema.
    pub fn is_single_type(&self) -> bool {
        matches!(self.fields, Fields::Single(_))
    }

    /// Whether any field is still a by-name reference.
    pub fn has_references(&self) -> bool {
        self.fields.iter().any(|(_, ty)| ty.is_reference())
    }
}

// ─── Unregistered Definitions ────────────────────────────────────────

/// A field type inside a [`SchemaDef`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// An already canonical type.
    Kind(SchemaType),
    /// A child schema that is registered together with its parent.
    Inline(Box<SchemaDef>),
}

impl From<SchemaType> for TypeDef {
    fn from(ty: SchemaType) -> Self {
        Self::Kind(ty)
    }
}

impl From<PrimitiveKind> for TypeDef {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Kind(SchemaType::Primitive(kind))
    }
}

impl From<SchemaDef> for TypeDef {
    fn from(def: SchemaDef) -> Self {
        Self::Inline(Box::new(def))
    }
}

/// Field layout of a [`SchemaDef`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldsDef {
    /// Named fields, in declaration order.
    Map(IndexMap<String, TypeDef>),
    /// One bare type.
    Single(TypeDef),
}

/// A schema that has not been registered yet.
///
/// Build one directly with the constructors below, or let the
/// [`Classifier`](crate::Classifier) produce one from a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDef {
    /// Requested name; `None` asks the registry to generate one.
    pub name: Option<String>,
    /// Field layout.
    pub fields: FieldsDef,
    /// Whether data must be a sequence.
    pub is_array: bool,
    /// Field that identifies an array element.
    pub unique_key: Option<String>,
    /// Field and schema annotations.
    pub meta_data: MetaData,
}

impl SchemaDef {
    /// An anonymous map schema with no fields.
    pub fn map() -> Self {
        Self {
            name: None,
            fields: FieldsDef::Map(IndexMap::new()),
            is_array: false,
            unique_key: None,
            meta_data: MetaData::default(),
        }
    }

    /// An anonymous single-type schema.
    pub fn single(ty: impl Into<TypeDef>) -> Self {
        Self {
            fields: FieldsDef::Single(ty.into()),
            ..Self::map()
        }
    }

    /// Set the requested name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add (or replace) a field. Turns a single-type definition into a map.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeDef>) -> Self {
        match &mut self.fields {
            FieldsDef::Map(map) => {
                map.insert(name.into(), ty.into());
            }
            FieldsDef::Single(_) => {
                let mut map = IndexMap::new();
                map.insert(name.into(), ty.into());
                self.fields = FieldsDef::Map(map);
            }
        }
        self
    }

    /// Mark the schema as array-shaped.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Set the element identity field.
    pub fn unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = Some(key.into());
        self
    }

    /// Attach an annotation to `field`.
    pub fn annotate(mut self, field: &str, key: &str, value: Value) -> Self {
        self.meta_data
            .fields
            .entry(field.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    /// Mark `field` as required.
    pub fn require(self, field: &str) -> Self {
        self.annotate(field, REQUIRED, Value::Bool(true))
    }

    /// Attach a schema-level annotation.
    pub fn annotate_schema(mut self, key: &str, value: Value) -> Self {
        self.meta_data.schema.insert(key.to_string(), value);
        self
    }
}
