//! # Validation Engine
//!
//! Walks a resolved schema and a [`serde_json::Value`] together and reports
//! the first failure found.
//!
//! ## Modes
//!
//! - [`ValidationMode::Full`] (create): every declared field is visited, so
//!   missing required fields are caught, and undeclared keys are rejected
//!   unless they are bookkeeping fields.
//! - [`ValidationMode::Partial`] (update): only the keys present in the data
//!   are visited; absent fields are fine.
//!
//! ## Evaluation Order
//!
//! Fields are checked in declaration order (full mode) or data order
//! (partial mode), array elements by position. Each check is one step of a
//! `try_for_each`, so evaluation stops at the first failure and that failure
//! is returned, qualified with the schema it was found in and the path
//! from the validated root.
//!
//! `Value::Null` stands for an absent value.

use serde_json::{Map, Value};

use crate::catalog::{RuleInput, TypeCatalog};
use crate::config::EngineConfig;
use crate::error::{FailureKind, PathSegment, SchemaError, ValidationFailure};
use crate::registry::SchemaRegistry;
use crate::types::{runtime_kind, Annotations, Fields, SchemaId, SchemaObject, SchemaType};

/// Create-style or update-style validation. Defaults to `Partial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// All declared fields are checked; required fields must be present.
    Full,
    /// Only present fields are checked.
    #[default]
    Partial,
}

impl ValidationMode {
    /// `Full` when `full` is true, `Partial` otherwise.
    pub fn from_full_flag(full: bool) -> Self {
        if full {
            Self::Full
        } else {
            Self::Partial
        }
    }

    /// Whether this is full validation.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Read-only validator over a registry and a catalog.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a SchemaRegistry,
    catalog: &'a TypeCatalog,
    config: &'a EngineConfig,
}

impl<'a> Validator<'a> {
    /// Create a validator.
    pub fn new(registry: &'a SchemaRegistry, catalog: &'a TypeCatalog, config: &'a EngineConfig) -> Self {
        Self {
            registry,
            catalog,
            config,
        }
    }

    /// Validate `data` against the schema registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownSchema`] / [`SchemaError::UnresolvedSchema`]
    ///   for configuration problems.
    /// - [`SchemaError::Invalid`] carrying the first [`ValidationFailure`]
    ///   when the data does not conform.
    pub fn validate_model(&self, name: &str, data: &Value, mode: ValidationMode) -> Result<(), SchemaError> {
        let id = self
            .registry
            .id_of(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))?;
        let result = self.validate_id(id, data, mode);
        if let Err(err) = &result {
            tracing::debug!(schema = %name, mode = ?mode, error = %err, "validation failed");
        }
        result
    }

    fn validate_id(&self, id: SchemaId, data: &Value, mode: ValidationMode) -> Result<(), SchemaError> {
        let schema = self
            .registry
            .schema(id)
            .ok_or_else(|| SchemaError::UnknownSchema(format!("#{}", id.index())))?;
        if !schema.resolved {
            return Err(SchemaError::UnresolvedSchema(schema.name.clone()));
        }

        match (schema.is_array, data) {
            (true, Value::Array(items)) => items.iter().enumerate().try_for_each(|(i, item)| {
                self.validate_item(schema, item, mode)
                    .map_err(|err| err.nested(PathSegment::Index(i)))
            }),
            (true, other) => Err(fail(
                schema,
                FailureKind::ArrayShapeMismatch {
                    expected: "array",
                    actual: runtime_kind(other),
                },
            )),
            (false, Value::Array(_)) => Err(fail(
                schema,
                FailureKind::ArrayShapeMismatch {
                    expected: "non-array value",
                    actual: "array",
                },
            )),
            (false, other) => self.validate_item(schema, other, mode),
        }
    }

    fn validate_item(&self, schema: &SchemaObject, data: &Value, mode: ValidationMode) -> Result<(), SchemaError> {
        match &schema.fields {
            Fields::Single(ty) => self.validate_single(schema, ty, data, mode),
            Fields::Map(_) => self.validate_fields(schema, data, mode),
        }
    }

    fn validate_single(
        &self,
        schema: &SchemaObject,
        ty: &SchemaType,
        data: &Value,
        mode: ValidationMode,
    ) -> Result<(), SchemaError> {
        if data.is_null() {
            let optional_leaf = matches!(ty, SchemaType::Primitive(_) | SchemaType::Custom(_))
                && !schema.meta_data.is_required(None);
            return if !mode.is_full() || optional_leaf {
                Ok(())
            } else {
                Err(fail(schema, FailureKind::MissingValue))
            };
        }
        self.check_value(schema, None, ty, data, mode)
    }

    fn validate_fields(&self, schema: &SchemaObject, data: &Value, mode: ValidationMode) -> Result<(), SchemaError> {
        let Fields::Map(fields) = &schema.fields else {
            return Ok(());
        };
        let Value::Object(object) = data else {
            return Err(fail(
                schema,
                FailureKind::NotAnObject {
                    actual: runtime_kind(data),
                },
            ));
        };

        if mode.is_full() {
            if let Some(unknown) = object
                .keys()
                .find(|key| !fields.contains_key(key.as_str()) && !self.config.is_bookkeeping(key))
            {
                return Err(fail_at(
                    schema,
                    unknown,
                    FailureKind::UnknownField {
                        field: unknown.clone(),
                    },
                ));
            }
            fields
                .keys()
                .try_for_each(|key| self.validate_field(schema, object, key, mode))
        } else {
            object
                .keys()
                .try_for_each(|key| self.validate_field(schema, object, key, mode))
        }
    }

    fn validate_field(
        &self,
        schema: &SchemaObject,
        object: &Map<String, Value>,
        key: &str,
        mode: ValidationMode,
    ) -> Result<(), SchemaError> {
        let required = mode.is_full() && schema.meta_data.is_required(Some(key));
        let value = object.get(key).filter(|value| !value.is_null());

        let Some(value) = value else {
            return if required {
                Err(fail_at(
                    schema,
                    key,
                    FailureKind::RequiredFieldMissing {
                        field: key.to_string(),
                    },
                ))
            } else {
                Ok(())
            };
        };

        if self.config.is_bookkeeping(key) {
            return Ok(());
        }
        let Fields::Map(fields) = &schema.fields else {
            return Ok(());
        };
        // Undeclared keys only reach this point in partial mode.
        let Some(ty) = fields.get(key) else {
            return Ok(());
        };

        self.check_value(schema, Some(key), ty, value, mode)
            .map_err(|err| err.nested(PathSegment::Field(key.to_string())))
    }

    /// Base type check followed by the metadata rules of `field`.
    fn check_value(
        &self,
        schema: &SchemaObject,
        field: Option<&str>,
        ty: &SchemaType,
        value: &Value,
        mode: ValidationMode,
    ) -> Result<(), SchemaError> {
        let empty = Annotations::new();
        let annotations = schema.meta_data.for_field(field).unwrap_or(&empty);

        self.check_type(schema, ty, value, annotations, mode)?;
        self.check_rules(schema, field, ty, value, annotations)
    }

    fn check_type(
        &self,
        schema: &SchemaObject,
        ty: &SchemaType,
        value: &Value,
        annotations: &Annotations,
        mode: ValidationMode,
    ) -> Result<(), SchemaError> {
        match ty {
            SchemaType::Primitive(kind) if kind.matches(value) => Ok(()),
            SchemaType::Primitive(kind) => Err(fail(
                schema,
                FailureKind::TypeMismatch {
                    expected: kind.as_str().to_string(),
                    actual: runtime_kind(value),
                },
            )),
            SchemaType::Any => Ok(()),
            SchemaType::Custom(name) => match self.catalog.check_type(name, value, annotations) {
                Some(true) => Ok(()),
                Some(false) => Err(fail(
                    schema,
                    FailureKind::TypeMismatch {
                        expected: name.clone(),
                        actual: runtime_kind(value),
                    },
                )),
                None => Err(SchemaError::UnknownCustomType(name.clone())),
            },
            SchemaType::Reference(_) => Err(SchemaError::UnresolvedSchema(schema.name.clone())),
            SchemaType::Nested(child) => self.validate_id(*child, value, mode),
        }
    }

    fn check_rules(
        &self,
        schema: &SchemaObject,
        field: Option<&str>,
        ty: &SchemaType,
        value: &Value,
        annotations: &Annotations,
    ) -> Result<(), SchemaError> {
        annotations.iter().try_for_each(|(key, setting)| {
            let Some(rule) = self.catalog.rule(key) else {
                return Ok(());
            };
            let input = RuleInput {
                setting,
                field,
                value,
                ty,
                annotations,
            };
            rule(&input).map_err(|message| {
                fail(
                    schema,
                    FailureKind::RuleViolation {
                        rule: key.clone(),
                        message,
                    },
                )
            })
        })
    }
}

fn fail(schema: &SchemaObject, kind: FailureKind) -> SchemaError {
    ValidationFailure::new(schema.name.clone(), kind).into()
}

fn fail_at(schema: &SchemaObject, field: &str, kind: FailureKind) -> SchemaError {
    ValidationFailure::at_field(schema.name.clone(), field, kind).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, SchemaDef};
    use serde_json::json;

    struct Fixture {
        registry: SchemaRegistry,
        catalog: TypeCatalog,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: SchemaRegistry::new(),
                catalog: TypeCatalog::with_builtin_rules(),
                config: EngineConfig::default(),
            }
        }

        fn add(&mut self, def: SchemaDef) -> SchemaId {
            self.registry.register_schema(def, None, false).unwrap()
        }

        fn validate(&self, name: &str, data: Value, mode: ValidationMode) -> Result<(), SchemaError> {
            Validator::new(&self.registry, &self.catalog, &self.config).validate_model(name, &data, mode)
        }
    }

    fn kind(result: Result<(), SchemaError>) -> FailureKind {
        match result {
            Err(SchemaError::Invalid(failure)) => failure.kind,
            other => panic!("expected a data failure, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_and_unresolved_are_configuration_errors() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::map().named("A").field("b", SchemaType::Reference("B".into())));
        assert_eq!(
            fx.validate("Nope", json!({}), ValidationMode::Full),
            Err(SchemaError::UnknownSchema("Nope".into()))
        );
        assert_eq!(
            fx.validate("A", json!({}), ValidationMode::Full),
            Err(SchemaError::UnresolvedSchema("A".into()))
        );
    }

    #[test]
    fn test_primitive_kinds_match_exactly() {
        let mut fx = Fixture::new();
        fx.add(
            SchemaDef::map()
                .named("P")
                .field("n", PrimitiveKind::Number)
                .field("s", PrimitiveKind::String)
                .field("b", PrimitiveKind::Boolean),
        );
        assert!(fx.validate("P", json!({ "n": 1, "s": "x", "b": true }), ValidationMode::Full).is_ok());
        assert_eq!(
            kind(fx.validate("P", json!({ "n": "1" }), ValidationMode::Partial)),
            FailureKind::TypeMismatch {
                expected: "Number".into(),
                actual: "string"
            }
        );
    }

    #[test]
    fn test_full_mode_rejects_unknown_but_allows_bookkeeping() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::map().named("Tree").field("age", PrimitiveKind::Number));
        assert!(fx
            .validate("Tree", json!({ "age": 3, "_id": "t1", "updatedAt": 7 }), ValidationMode::Full)
            .is_ok());
        assert_eq!(
            kind(fx.validate("Tree", json!({ "age": 3, "height": 9 }), ValidationMode::Full)),
            FailureKind::UnknownField { field: "height".into() }
        );
        assert!(fx
            .validate("Tree", json!({ "age": 3, "height": 9 }), ValidationMode::Partial)
            .is_ok());
    }

    #[test]
    fn test_required_only_enforced_in_full_mode() {
        let mut fx = Fixture::new();
        fx.add(
            SchemaDef::map()
                .named("Tree")
                .field("treeAge", PrimitiveKind::Number)
                .field("leaves", PrimitiveKind::Number)
                .require("leaves"),
        );
        assert_eq!(
            kind(fx.validate("Tree", json!({ "treeAge": 10 }), ValidationMode::Full)),
            FailureKind::RequiredFieldMissing { field: "leaves".into() }
        );
        assert!(fx.validate("Tree", json!({ "treeAge": 10 }), ValidationMode::Partial).is_ok());
        assert_eq!(
            kind(fx.validate("Tree", json!({ "leaves": null }), ValidationMode::Full)),
            FailureKind::RequiredFieldMissing { field: "leaves".into() }
        );
        assert!(fx.validate("Tree", json!({ "leaves": null }), ValidationMode::Partial).is_ok());
        assert!(fx.validate("Tree", json!({ "leaves": 1, "treeAge": null }), ValidationMode::Full).is_ok());
    }

    #[test]
    fn test_metadata_rule_after_type_check() {
        let mut fx = Fixture::new();
        fx.catalog.register_rule("minimum", |input| match input.value.as_f64() {
            Some(v) if v < input.setting.as_f64().unwrap_or(f64::MIN) => {
                Err(format!("{v} is below {}", input.setting))
            }
            _ => Ok(()),
        });
        fx.add(
            SchemaDef::map()
                .named("Counter")
                .field("count", PrimitiveKind::Number)
                .require("count")
                .annotate("count", "minimum", json!(10)),
        );

        assert_eq!(
            kind(fx.validate("Counter", json!({ "count": 9 }), ValidationMode::Full)),
            FailureKind::RuleViolation {
                rule: "minimum".into(),
                message: "9 is below 10".into()
            }
        );
        assert!(fx.validate("Counter", json!({ "count": 13 }), ValidationMode::Full).is_ok());
    }

    #[test]
    fn test_unregistered_metadata_keys_are_ignored() {
        let mut fx = Fixture::new();
        fx.add(
            SchemaDef::map()
                .named("M")
                .field("x", PrimitiveKind::Number)
                .annotate("x", "label", json!("The X"))
                .annotate("x", "widget", json!({ "kind": "slider" })),
        );
        assert!(fx.validate("M", json!({ "x": 1 }), ValidationMode::Full).is_ok());
    }

    #[test]
    fn test_rule_receives_context() {
        let mut fx = Fixture::new();
        fx.catalog.register_rule("inspect", |input| {
            assert_eq!(input.field, Some("x"));
            assert_eq!(input.ty, &SchemaType::Primitive(PrimitiveKind::Number));
            assert!(input.annotations.contains_key("other"));
            Ok(())
        });
        fx.add(
            SchemaDef::map()
                .named("M")
                .field("x", PrimitiveKind::Number)
                .annotate("x", "inspect", json!(true))
                .annotate("x", "other", json!(1)),
        );
        assert!(fx.validate("M", json!({ "x": 1 }), ValidationMode::Partial).is_ok());
    }

    #[test]
    fn test_custom_type_predicate() {
        let mut fx = Fixture::new();
        fx.catalog
            .register_type_with("Even", |value, _| value.as_i64().is_some_and(|n| n % 2 == 0));
        fx.add(SchemaDef::map().named("E").field("n", SchemaType::Custom("Even".into())));
        assert!(fx.validate("E", json!({ "n": 4 }), ValidationMode::Full).is_ok());
        assert_eq!(
            kind(fx.validate("E", json!({ "n": 3 }), ValidationMode::Full)),
            FailureKind::TypeMismatch {
                expected: "Even".into(),
                actual: "number"
            }
        );
    }

    #[test]
    fn test_unregistered_custom_type_is_configuration_error() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::map().named("E").field("n", SchemaType::Custom("Odd".into())));
        assert_eq!(
            fx.validate("E", json!({ "n": 3 }), ValidationMode::Full),
            Err(SchemaError::UnknownCustomType("Odd".into()))
        );
    }

    #[test]
    fn test_array_shape() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::single(PrimitiveKind::Number).named("Ages").array());
        fx.add(SchemaDef::single(PrimitiveKind::Number).named("Age"));

        assert!(fx.validate("Ages", json!([]), ValidationMode::Full).is_ok());
        assert!(fx.validate("Ages", json!([1, 2]), ValidationMode::Full).is_ok());
        assert!(matches!(
            kind(fx.validate("Ages", json!(5), ValidationMode::Full)),
            FailureKind::ArrayShapeMismatch { expected: "array", .. }
        ));
        assert!(matches!(
            kind(fx.validate("Age", json!([5]), ValidationMode::Full)),
            FailureKind::ArrayShapeMismatch { actual: "array", .. }
        ));
    }

    #[test]
    fn test_first_failing_element_is_reported() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::single(PrimitiveKind::Number).named("Ages").array());
        let err = fx
            .validate("Ages", json!([1, "two", false]), ValidationMode::Full)
            .unwrap_err();
        let failure = err.failure().unwrap();
        assert_eq!(failure.path.to_string(), "[1]");
        assert_eq!(
            failure.kind,
            FailureKind::TypeMismatch {
                expected: "Number".into(),
                actual: "string"
            }
        );
    }

    #[test]
    fn test_single_type_absent_value() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::single(PrimitiveKind::Number).named("Loose"));
        fx.add(
            SchemaDef::single(PrimitiveKind::Number)
                .named("Strict")
                .annotate_schema("required", json!(true)),
        );
        fx.add(SchemaDef::single(SchemaType::Any).named("Anything"));

        assert!(fx.validate("Loose", Value::Null, ValidationMode::Full).is_ok());
        assert_eq!(
            kind(fx.validate("Strict", Value::Null, ValidationMode::Full)),
            FailureKind::MissingValue
        );
        assert_eq!(
            kind(fx.validate("Anything", Value::Null, ValidationMode::Full)),
            FailureKind::MissingValue
        );
        assert!(fx.validate("Strict", Value::Null, ValidationMode::Partial).is_ok());
    }

    #[test]
    fn test_single_type_schema_rules() {
        let mut fx = Fixture::new();
        fx.add(
            SchemaDef::single(PrimitiveKind::String)
                .named("Code")
                .annotate_schema("pattern", json!("^[A-Z]{3}$")),
        );
        assert!(fx.validate("Code", json!("ABC"), ValidationMode::Full).is_ok());
        assert!(matches!(
            kind(fx.validate("Code", json!("abc"), ValidationMode::Full)),
            FailureKind::RuleViolation { ref rule, .. } if rule == "pattern"
        ));
    }

    #[test]
    fn test_nested_failure_path_and_schema() {
        let mut fx = Fixture::new();
        let leaf = fx.add(
            SchemaDef::map()
                .named("Leaf")
                .field("color", PrimitiveKind::String)
                .array(),
        );
        fx.add(SchemaDef::map().named("Tree").field("leaves", SchemaType::Nested(leaf)));

        let err = fx
            .validate(
                "Tree",
                json!({ "leaves": [{ "color": "green" }, { "color": 5 }] }),
                ValidationMode::Full,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema 'Leaf' at 'leaves[1].color': expected String, got number"
        );
    }

    #[test]
    fn test_map_schema_rejects_non_object() {
        let mut fx = Fixture::new();
        fx.add(SchemaDef::map().named("Tree").field("age", PrimitiveKind::Number));
        assert_eq!(
            kind(fx.validate("Tree", json!("oak"), ValidationMode::Partial)),
            FailureKind::NotAnObject { actual: "string" }
        );
    }

    #[test]
    fn test_stops_at_first_failing_field_in_declaration_order() {
        let mut fx = Fixture::new();
        fx.add(
            SchemaDef::map()
                .named("Two")
                .field("first", PrimitiveKind::Number)
                .field("second", PrimitiveKind::Number),
        );
        let err = fx
            .validate("Two", json!({ "second": "b", "first": "a" }), ValidationMode::Full)
            .unwrap_err();
        assert_eq!(err.failure().unwrap().path.to_string(), "first");
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(ValidationMode::from_full_flag(true), ValidationMode::Full);
        assert_eq!(ValidationMode::from_full_flag(false), ValidationMode::Partial);
        assert_eq!(ValidationMode::default(), ValidationMode::Partial);
    }
}
