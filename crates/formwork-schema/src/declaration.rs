//! # Schema Declarations
//!
//! The persisted/transmitted form of a schema, as read from JSON or YAML:
//!
//! ```text
//! { "name": "Tree",
//!   "type": { "age": "Number", "leaves": ["Leaf"], "site": { "lat": "Number" } },
//!   "isArray": false,
//!   "uniqueKey": "age",
//!   "metaData": { "age": { "required": true, "min": 0 } } }
//! ```
//!
//! `type` is a keyword or schema-name string, a field map, or a one-element
//! array wrapper around any of these. Programmatic callers can also use
//! [`TypeDecl::Kind`] to name a primitive kind without a string lookup.
//!
//! Parsing only checks shapes. Names are interpreted by the
//! [`Classifier`](crate::Classifier).

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::types::{Annotations, PrimitiveKind};

/// Context used in messages for declarations without a name.
pub(crate) const ANONYMOUS: &str = "<anonymous>";

/// A raw type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    /// A built-in kind, given directly.
    Kind(PrimitiveKind),
    /// A keyword, custom-type name or schema name.
    Name(String),
    /// A nested field map.
    Fields(IndexMap<String, TypeDecl>),
    /// Array shorthand. Valid only with exactly one entry.
    Array(Vec<TypeDecl>),
}

impl TypeDecl {
    /// Parse a JSON value into a type declaration.
    pub fn from_value(context: &str, value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::String(name) => Ok(Self::Name(name.clone())),
            Value::Object(map) => map
                .iter()
                .map(|(field, inner)| {
                    let ctx = format!("{context}.{field}");
                    Self::from_value(&ctx, inner).map(|decl| (field.clone(), decl))
                })
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Self::Fields),
            Value::Array(items) => items
                .iter()
                .map(|inner| Self::from_value(context, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            other => Err(SchemaError::InvalidTypeDeclaration {
                context: context.to_string(),
                reason: format!("expected a type name, field map or array shorthand, got {other}"),
            }),
        }
    }

    /// Shorthand for a one-element array wrapper.
    pub fn array_of(inner: TypeDecl) -> Self {
        Self::Array(vec![inner])
    }
}

impl From<PrimitiveKind> for TypeDecl {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<&str> for TypeDecl {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// A complete schema declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Declaration {
    /// Requested schema name.
    pub name: Option<String>,
    /// The declared type; `None` declares an accept-everything schema.
    pub ty: Option<TypeDecl>,
    /// Whether data must be a sequence.
    pub is_array: bool,
    /// Field that identifies an array element.
    pub unique_key: Option<String>,
    /// Raw annotations: field name → block for map schemas, flat for single-type.
    pub meta_data: Option<Annotations>,
}

impl Declaration {
    /// A declaration with a name and a type.
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDecl>) -> Self {
        Self {
            name: Some(name.into()),
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    /// An anonymous declaration of `ty`.
    pub fn anonymous(ty: impl Into<TypeDecl>) -> Self {
        Self {
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    /// Name used in error messages.
    pub fn context(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Parse a declaration object.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let invalid = |context: &str, reason: String| SchemaError::InvalidTypeDeclaration {
            context: context.to_string(),
            reason,
        };

        let Value::Object(map) = value else {
            return Err(invalid(ANONYMOUS, format!("declaration must be an object, got {value}")));
        };

        let name = match map.get("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => return Err(invalid(ANONYMOUS, format!("'name' must be a string, got {other}"))),
        };
        let context = name.as_deref().unwrap_or(ANONYMOUS);

        let ty = match map.get("type") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(TypeDecl::from_value(context, raw)?),
        };

        let is_array = match map.get("isArray") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(other) => return Err(invalid(context, format!("'isArray' must be a boolean, got {other}"))),
        };

        let unique_key = match map.get("uniqueKey") {
            None | Some(Value::Null) => None,
            Some(Value::String(key)) => Some(key.clone()),
            Some(other) => return Err(invalid(context, format!("'uniqueKey' must be a string, got {other}"))),
        };

        let meta_data = match map.get("metaData") {
            None | Some(Value::Null) => None,
            Some(Value::Object(meta)) => Some(meta.clone()),
            Some(other) => {
                return Err(SchemaError::InvalidMetadata {
                    context: context.to_string(),
                    reason: format!("'metaData' must be an object, got {other}"),
                })
            }
        };

        Ok(Self {
            name,
            ty,
            is_array,
            unique_key,
            meta_data,
        })
    }
}

impl TryFrom<Value> for Declaration {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}
