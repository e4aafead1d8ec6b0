//! # Field Path Checks
//!
//! Shape-only check of a dotted field path such as `leaves[1].color` against
//! a registered schema. No data is involved: a name segment must be a
//! declared field, and an index suffix asserts that the schema reached at
//! that point is array-shaped. The index itself never moves the pointer.

use crate::error::{FailureKind, FieldPath, PathSegment, SchemaError, ValidationFailure};
use crate::registry::SchemaRegistry;
use crate::types::{Fields, SchemaObject, SchemaType};

/// `name`, `[index]` or `name[index]`; `None` for anything else.
fn parse_segment(raw: &str) -> Option<(Option<&str>, Option<usize>)> {
    let (name, index) = match raw.find('[') {
        Some(open) => {
            let digits = raw[open + 1..].strip_suffix(']')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (&raw[..open], Some(digits.parse().ok()?))
        }
        None => (raw, None),
    };
    if name.contains(|c: char| c == '[' || c == ']') || (name.is_empty() && index.is_none()) {
        return None;
    }
    Some(((!name.is_empty()).then_some(name), index))
}

/// Where the walk currently points.
#[derive(Clone, Copy)]
enum Cursor<'a> {
    Schema(&'a SchemaObject),
    /// A non-schema field type; nothing can follow it.
    Leaf(&'a SchemaObject),
}

impl SchemaRegistry {
    /// Check that `path` addresses a declared field of schema `name`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownSchema`] if `name` is not registered.
    /// - [`SchemaError::UnresolvedSchema`] if the walk meets a pending reference.
    /// - [`SchemaError::Invalid`] with [`FailureKind::InvalidPath`],
    ///   [`FailureKind::UnknownField`] or [`FailureKind::NotAnArray`].
    pub fn validate_map(&self, name: &str, path: &str) -> Result<(), SchemaError> {
        let mut cursor = Cursor::Schema(self.get_schema(name)?);
        let mut walked = FieldPath::default();

        for raw in path.split('.') {
            let (owner, leaf) = match cursor {
                Cursor::Schema(schema) => (schema, false),
                Cursor::Leaf(schema) => (schema, true),
            };
            let fail = |kind: FailureKind| -> SchemaError {
                ValidationFailure {
                    schema: owner.name.clone(),
                    path: walked.clone(),
                    kind,
                }
                .into()
            };

            let (field, index) = parse_segment(raw).ok_or_else(|| {
                fail(FailureKind::InvalidPath {
                    segment: raw.to_string(),
                })
            })?;

            if let Some(field) = field {
                if leaf {
                    return Err(fail(FailureKind::UnknownField {
                        field: field.to_string(),
                    }));
                }
                let ty = self.field_type(owner, field)?.ok_or_else(|| {
                    fail(FailureKind::UnknownField {
                        field: field.to_string(),
                    })
                })?;
                cursor = match ty {
                    SchemaType::Nested(id) => Cursor::Schema(
                        self.schema(*id)
                            .ok_or_else(|| SchemaError::UnknownSchema(format!("#{}", id.index())))?,
                    ),
                    _ => Cursor::Leaf(owner),
                };
                walked.0.push(PathSegment::Field(field.to_string()));
            }

            if let Some(index) = index {
                match cursor {
                    Cursor::Schema(schema) if schema.is_array => {}
                    Cursor::Schema(schema) | Cursor::Leaf(schema) => {
                        return Err(ValidationFailure {
                            schema: schema.name.clone(),
                            path: walked,
                            kind: FailureKind::NotAnArray {
                                segment: raw.to_string(),
                            },
                        }
                        .into());
                    }
                }
                walked.0.push(PathSegment::Index(index));
            }
        }

        tracing::trace!(schema = %name, path = %path, "path check passed");
        Ok(())
    }

    /// Type of `field` in `schema`, looking through single-type wrappers.
    fn field_type<'a>(&'a self, schema: &'a SchemaObject, field: &str) -> Result<Option<&'a SchemaType>, SchemaError> {
        let mut current = schema;
        // Bounded so that a cycle of single-type wrappers terminates.
        for _ in 0..=self.len() {
            match &current.fields {
                Fields::Map(map) => return Ok(map.get(field)),
                Fields::Single(SchemaType::Nested(id)) => match self.schema(*id) {
                    Some(next) => current = next,
                    None => return Ok(None),
                },
                Fields::Single(SchemaType::Reference(_)) => {
                    return Err(SchemaError::UnresolvedSchema(current.name.clone()))
                }
                Fields::Single(_) => return Ok(None),
            }
        }
        Ok(None)
    }
}
