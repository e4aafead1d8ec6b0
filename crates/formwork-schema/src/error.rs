//! # Error Types
//!
//! Two layers, following the split between configuration problems and data
//! problems:
//!
//! - [`SchemaError`] covers everything a caller can get wrong while declaring,
//!   registering, resolving or addressing schemas, and wraps data failures in
//!   [`SchemaError::Invalid`].
//! - [`ValidationFailure`] is the single, first data failure found by the
//!   validation engine or the path checker. It records the schema the failure
//!   was detected in and the field path from the validated root, so the message
//!   stays meaningful after bubbling up through nested schemas.

use std::fmt;

use thiserror::Error;

/// Error raised by the schema registry, resolver and validation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// An explicitly named schema collides with an existing entry and the
    /// caller did not tolerate duplicates.
    #[error("duplicate schema name: {0}")]
    DuplicateSchemaName(String),

    /// No schema is registered under the requested name.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// The schema still holds by-name references that have not been resolved.
    #[error("schema '{0}' has unresolved references; call resolve_all() after registering its dependencies")]
    UnresolvedSchema(String),

    /// `resolve_all` finished with schemas whose references match nothing.
    #[error("unresolvable schemas: {}", .0.join(", "))]
    UnresolvableSchemas(Vec<String>),

    /// A declaration value has a shape the classifier does not understand.
    #[error("invalid type declaration for '{context}': {reason}")]
    InvalidTypeDeclaration {
        /// Schema or field the declaration belongs to.
        context: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An array shorthand wrapper did not hold exactly one declaration.
    #[error("invalid array shorthand for '{context}': expected exactly one inner declaration, found {found}")]
    InvalidArrayShorthand {
        /// Schema or field the declaration belongs to.
        context: String,
        /// Number of entries found in the wrapper.
        found: usize,
    },

    /// A metadata block is not a mapping of annotation blocks.
    #[error("invalid metadata for '{context}': {reason}")]
    InvalidMetadata {
        /// Schema the metadata belongs to.
        context: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A field refers to a custom type that is not in the type catalog.
    #[error("unknown custom type: {0}")]
    UnknownCustomType(String),

    /// A schema-name pattern could not be compiled.
    #[error("invalid schema name pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// The data (or field path) does not conform to the schema.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

impl SchemaError {
    /// The data failure carried by this error, if it is one.
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Invalid(failure) => Some(failure),
            _ => None,
        }
    }

    /// Prepend a path segment to a data failure; other errors pass through.
    pub(crate) fn nested(self, segment: PathSegment) -> Self {
        match self {
            Self::Invalid(failure) => Self::Invalid(failure.nested(segment)),
            other => other,
        }
    }
}

/// The first data failure found while validating a value or a field path.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("schema '{schema}' at '{path}': {kind}")]
pub struct ValidationFailure {
    /// Name of the schema in which the failure was detected.
    pub schema: String,
    /// Field path from the validated root to the failing value.
    pub path: FieldPath,
    /// What went wrong.
    pub kind: FailureKind,
}

impl ValidationFailure {
    /// Create a failure located at the root of `schema`.
    pub fn new(schema: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            schema: schema.into(),
            path: FieldPath::default(),
            kind,
        }
    }

    /// Create a failure located at `field` of `schema`.
    pub fn at_field(schema: impl Into<String>, field: &str, kind: FailureKind) -> Self {
        Self::new(schema, kind).nested(PathSegment::Field(field.to_string()))
    }

    pub(crate) fn nested(mut self, segment: PathSegment) -> Self {
        self.path.0.insert(0, segment);
        self
    }
}

/// Kinds of data failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// Sequence data for a non-array schema, or non-sequence data for an array schema.
    #[error("expected {expected}, got {actual}")]
    ArrayShapeMismatch {
        /// `"array"` or `"non-array value"`.
        expected: &'static str,
        /// Runtime kind of the value found.
        actual: &'static str,
    },

    /// A map schema was handed something other than an object.
    #[error("expected object, got {actual}")]
    NotAnObject {
        /// Runtime kind of the value found.
        actual: &'static str,
    },

    /// A key is not declared by the schema.
    #[error("unknown field '{field}'")]
    UnknownField {
        /// The undeclared key.
        field: String,
    },

    /// A field marked `required` is absent in full mode.
    #[error("missing required field '{field}'")]
    RequiredFieldMissing {
        /// The missing field.
        field: String,
    },

    /// The value's kind does not match the declared type.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// Display name of the declared type.
        expected: String,
        /// Runtime kind of the value found.
        actual: &'static str,
    },

    /// A single-type schema received no value in full mode.
    #[error("missing value")]
    MissingValue,

    /// A metadata rule rejected the value.
    #[error("{rule}: {message}")]
    RuleViolation {
        /// Metadata key of the rule.
        rule: String,
        /// The rule's own description of the failure.
        message: String,
    },

    /// A path segment carries an index but the schema at that point is not an array.
    #[error("'{segment}' is not an array")]
    NotAnArray {
        /// The offending path segment.
        segment: String,
    },

    /// A path segment is not of the form `name`, `[index]` or `name[index]`.
    #[error("malformed path segment '{segment}'")]
    InvalidPath {
        /// The offending path segment.
        segment: String,
    },
}

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named field of a map schema.
    Field(String),
    /// A position inside an array.
    Index(usize),
}

/// Location of a value relative to the validated root, e.g. `leaves[1].color`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(pub Vec<PathSegment>);

impl FieldPath {
    /// Whether this path points at the root itself.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_display() {
        let path = FieldPath(vec![
            PathSegment::Field("leaves".into()),
            PathSegment::Index(1),
            PathSegment::Field("color".into()),
        ]);
        assert_eq!(path.to_string(), "leaves[1].color");
        assert_eq!(FieldPath::default().to_string(), "(root)");
    }

    #[test]
    fn test_failure_display_is_schema_qualified() {
        let failure = ValidationFailure::at_field(
            "Leaf",
            "color",
            FailureKind::TypeMismatch {
                expected: "String".into(),
                actual: "number",
            },
        )
        .nested(PathSegment::Index(0))
        .nested(PathSegment::Field("leaves".into()));

        assert_eq!(
            failure.to_string(),
            "schema 'Leaf' at 'leaves[0].color': expected String, got number"
        );
    }

    #[test]
    fn test_nested_passes_configuration_errors_through() {
        let err = SchemaError::UnknownSchema("Tree".into()).nested(PathSegment::Index(3));
        assert_eq!(err, SchemaError::UnknownSchema("Tree".into()));
        assert!(err.failure().is_none());
    }

    #[test]
    fn test_unresolvable_lists_every_name() {
        let err = SchemaError::UnresolvableSchemas(vec!["A".into(), "B".into()]);
        assert_eq!(err.to_string(), "unresolvable schemas: A, B");
    }
}
