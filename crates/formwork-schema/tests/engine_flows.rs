//! End-to-end flows through the public engine surface: declare, register,
//! resolve, then validate data and field paths.

use formwork_schema::{
    Declaration, EngineConfig, FailureKind, Fields, SchemaEngine, SchemaError, SchemaType,
    ValidationMode,
};
use serde_json::{json, Value};

fn declarations(raw: Value) -> Vec<Declaration> {
    serde_json::from_value(raw).expect("declarations parse")
}

fn engine_with(raw: Value) -> SchemaEngine {
    let mut engine = SchemaEngine::new();
    engine
        .register_declarations(&declarations(raw))
        .expect("declarations register");
    engine
}

fn field(engine: &SchemaEngine, schema: &str, name: &str) -> SchemaType {
    match &engine.get_schema(schema).unwrap().fields {
        Fields::Map(map) => map[name].clone(),
        Fields::Single(_) => panic!("{schema} is not a map schema"),
    }
}

fn failure_kind(result: Result<(), SchemaError>) -> FailureKind {
    match result {
        Err(SchemaError::Invalid(failure)) => failure.kind,
        other => panic!("expected a data failure, got {other:?}"),
    }
}

// =========================================================================
// Resolution
// =========================================================================

#[test]
fn test_mutual_references_close_into_shared_links() {
    let engine = engine_with(json!([
        { "name": "A", "type": { "b": "B" } },
        { "name": "B", "type": { "a": "A" } }
    ]));

    let a = engine.registry().id_of("A").unwrap();
    let b = engine.registry().id_of("B").unwrap();
    assert_eq!(field(&engine, "A", "b"), SchemaType::Nested(b));
    assert_eq!(field(&engine, "B", "a"), SchemaType::Nested(a));
    assert!(engine.get_schema("A").unwrap().resolved);
    assert!(engine.get_schema("B").unwrap().resolved);

    let deep = json!({ "b": { "a": { "b": { "a": {} } } } });
    assert!(engine.validate_model("A", &deep, ValidationMode::Full).is_ok());
    let bad = json!({ "b": { "a": { "b": { "a": { "x": 1 } } } } });
    let err = engine
        .validate_model("A", &bad, ValidationMode::Full)
        .unwrap_err();
    assert_eq!(err.failure().unwrap().path.to_string(), "b.a.b.a.x");
}

#[test]
fn test_every_reference_free_schema_is_resolved() {
    let engine = engine_with(json!([
        { "name": "Forest", "type": ["Tree"] },
        { "name": "Tree", "type": { "age": "Number", "leaves": [{ "color": "String" }], "top": "Leaf" } },
        { "name": "Leaf", "type": { "color": "String" } }
    ]));
    for (_, schema) in engine.registry().iter() {
        assert!(!schema.has_references(), "{} still has references", schema.name);
        assert!(schema.resolved, "{} not marked resolved", schema.name);
    }
}

#[test]
fn test_dangling_reference_is_reported_by_name() {
    let mut engine = SchemaEngine::new();
    let decls = declarations(json!([
        { "name": "Tree", "type": { "roots": "Root" } },
        { "name": "Leaf", "type": { "color": "String" } }
    ]));
    assert_eq!(
        engine.register_declarations(&decls),
        Err(SchemaError::UnresolvableSchemas(vec!["Tree".into()]))
    );
    assert_eq!(
        engine.validate_model("Tree", &json!({}), ValidationMode::Full),
        Err(SchemaError::UnresolvedSchema("Tree".into()))
    );
    assert!(engine
        .validate_model("Leaf", &json!({ "color": "red" }), ValidationMode::Full)
        .is_ok());
}

#[test]
fn test_wrapper_cycles_are_rejected_not_followed() {
    let mut engine = SchemaEngine::new();
    let decls = declarations(json!([{ "name": "Loop", "type": "Loop" }]));
    assert_eq!(
        engine.register_declarations(&decls),
        Err(SchemaError::UnresolvableSchemas(vec!["Loop".into()]))
    );
    assert_eq!(
        engine.validate_model("Loop", &json!(5), ValidationMode::Full),
        Err(SchemaError::UnresolvedSchema("Loop".into()))
    );

    let mut engine = SchemaEngine::new();
    let decls = declarations(json!([
        { "name": "A", "type": "B" },
        { "name": "B", "type": "A" }
    ]));
    assert_eq!(
        engine.register_declarations(&decls),
        Err(SchemaError::UnresolvableSchemas(vec!["A".into(), "B".into()]))
    );
    for name in ["A", "B"] {
        assert!(matches!(
            engine.validate_model(name, &json!("x"), ValidationMode::Partial),
            Err(SchemaError::UnresolvedSchema(_))
        ));
    }
}

#[test]
fn test_recursive_array_schema_validates_nested_data() {
    let engine = engine_with(json!([{ "name": "Nest", "type": "Nest", "isArray": true }]));
    assert!(engine
        .validate_model("Nest", &json!([[], [[]], [[[]]]]), ValidationMode::Full)
        .is_ok());
    assert!(engine
        .validate_model("Nest", &json!([[1]]), ValidationMode::Full)
        .is_err());
}

#[test]
fn test_custom_type_registered_after_declaration() {
    let mut engine = SchemaEngine::new();
    let decls = declarations(json!([{ "name": "User", "type": { "mail": "Email" } }]));
    assert!(engine.register_declarations(&decls).is_err());

    engine.register_type_with("Email", |value, _| value.as_str().is_some_and(|s| s.contains('@')));
    engine.resolve_all().unwrap();
    assert_eq!(field(&engine, "User", "mail"), SchemaType::Custom("Email".into()));

    assert!(engine
        .validate_model("User", &json!({ "mail": "a@b.c" }), ValidationMode::Full)
        .is_ok());
    assert_eq!(
        failure_kind(engine.validate_model("User", &json!({ "mail": "nope" }), ValidationMode::Full)),
        FailureKind::TypeMismatch {
            expected: "Email".into(),
            actual: "string"
        }
    );
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_metadata_rule_threshold() {
    let mut engine = SchemaEngine::new();
    engine.register_metadata_rule("minimum", |input| {
        let floor = input.setting.as_f64().unwrap_or(f64::MIN);
        match input.value.as_f64() {
            Some(v) if v < floor => Err(format!("{v} < {floor}")),
            _ => Ok(()),
        }
    });
    let decls = declarations(json!([{
        "name": "Counter",
        "type": { "count": "Number" },
        "metaData": { "count": { "required": true, "minimum": 10 } }
    }]));
    engine.register_declarations(&decls).unwrap();

    assert!(matches!(
        failure_kind(engine.validate_model("Counter", &json!({ "count": 9 }), ValidationMode::Full)),
        FailureKind::RuleViolation { ref rule, .. } if rule == "minimum"
    ));
    assert!(engine
        .validate_model("Counter", &json!({ "count": 13 }), ValidationMode::Full)
        .is_ok());
}

#[test]
fn test_builtin_rules_follow_config() {
    let decls = declarations(json!([{
        "name": "Tag",
        "type": "String",
        "metaData": { "maxLength": 3 }
    }]));

    let mut strict = SchemaEngine::new();
    strict.register_declarations(&decls).unwrap();
    assert!(strict
        .validate_model("Tag", &json!("long"), ValidationMode::Full)
        .is_err());

    let mut lax = SchemaEngine::with_config(EngineConfig {
        builtin_rules: false,
        ..EngineConfig::default()
    });
    lax.register_declarations(&decls).unwrap();
    assert!(lax
        .validate_model("Tag", &json!("long"), ValidationMode::Full)
        .is_ok());
}

#[test]
fn test_array_schema_shapes() {
    let engine = engine_with(json!([
        { "name": "Leaves", "type": { "color": "String" }, "isArray": true }
    ]));

    assert!(engine.validate_model("Leaves", &json!([]), ValidationMode::Full).is_ok());
    assert!(matches!(
        failure_kind(engine.validate_model("Leaves", &json!({ "color": "red" }), ValidationMode::Full)),
        FailureKind::ArrayShapeMismatch { expected: "array", .. }
    ));

    let err = engine
        .validate_model(
            "Leaves",
            &json!([{ "color": "red" }, { "color": 7 }]),
            ValidationMode::Full,
        )
        .unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.path.to_string(), "[1].color");
    assert_eq!(
        failure.kind,
        FailureKind::TypeMismatch {
            expected: "String".into(),
            actual: "number"
        }
    );
}

#[test]
fn test_inline_array_field_reports_child_schema() {
    let engine = engine_with(json!([
        { "name": "Tree", "type": { "leaves": [{ "color": "String" }] } }
    ]));
    let SchemaType::Nested(child) = field(&engine, "Tree", "leaves") else {
        panic!("expected inline child link");
    };
    let child_name = engine.registry().schema(child).unwrap().name.clone();

    let err = engine
        .validate_model(
            "Tree",
            &json!({ "leaves": [{ "color": "green" }, { "color": false }] }),
            ValidationMode::Full,
        )
        .unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.schema, child_name);
    assert_eq!(failure.path.to_string(), "leaves[1].color");
}

#[test]
fn test_required_leaf_only_in_full_mode() {
    let engine = engine_with(json!([{
        "name": "Tree",
        "type": { "treeAge": "Number", "leaves": "Number" },
        "metaData": { "leaves": { "required": true } }
    }]));
    let data = json!({ "treeAge": 10 });

    assert_eq!(
        failure_kind(engine.validate_model("Tree", &data, ValidationMode::Full)),
        FailureKind::RequiredFieldMissing {
            field: "leaves".into()
        }
    );
    assert!(engine.validate_model("Tree", &data, ValidationMode::Partial).is_ok());
}

#[test]
fn test_undeclared_key_full_versus_partial() {
    let engine = engine_with(json!([{ "name": "Tree", "type": { "age": "Number" } }]));
    let data = json!({ "age": 4, "height": 12 });

    assert_eq!(
        failure_kind(engine.validate_model("Tree", &data, ValidationMode::Full)),
        FailureKind::UnknownField {
            field: "height".into()
        }
    );
    assert!(engine.validate_model("Tree", &data, ValidationMode::Partial).is_ok());

    let invalid_present = json!({ "age": "four", "height": 12 });
    assert!(engine
        .validate_model("Tree", &invalid_present, ValidationMode::Partial)
        .is_err());
}

#[test]
fn test_bookkeeping_fields_follow_config() {
    let decls = declarations(json!([{ "name": "Doc", "type": { "title": "String" } }]));
    let data = json!({ "title": "t", "rev": 3 });

    let mut default = SchemaEngine::new();
    default.register_declarations(&decls).unwrap();
    assert!(default.validate_model("Doc", &data, ValidationMode::Full).is_err());
    assert!(default
        .validate_model("Doc", &json!({ "title": "t", "_id": "x" }), ValidationMode::Full)
        .is_ok());

    let mut custom = SchemaEngine::with_config(EngineConfig {
        bookkeeping_fields: vec!["rev".into()],
        ..EngineConfig::default()
    });
    custom.register_declarations(&decls).unwrap();
    assert!(custom.validate_model("Doc", &data, ValidationMode::Full).is_ok());
}

#[test]
fn test_any_accepts_everything_present() {
    let engine = engine_with(json!([
        { "name": "Blob" },
        { "name": "Bag", "type": { "payload": "Any" } }
    ]));
    for value in [json!(1), json!("s"), json!({ "k": [1, 2] }), json!(true)] {
        assert!(engine
            .validate_model("Bag", &json!({ "payload": value.clone() }), ValidationMode::Full)
            .is_ok());
        assert!(engine.validate_model("Blob", &value, ValidationMode::Full).is_ok());
    }
}

// =========================================================================
// Paths and snapshots
// =========================================================================

#[test]
fn test_path_checks_against_declarations() {
    let engine = engine_with(json!([
        { "name": "Tree", "type": { "age": "Number", "leaves": [{ "color": "String" }] } }
    ]));

    assert!(engine.validate_map("Tree", "leaves[3].color").is_ok());
    assert!(engine.validate_map("Tree", "age").is_ok());
    assert!(matches!(
        failure_kind(engine.validate_map("Tree", "age[0]")),
        FailureKind::NotAnArray { .. }
    ));
    assert!(matches!(
        failure_kind(engine.validate_map("Tree", "leaves[0].size")),
        FailureKind::UnknownField { ref field } if field == "size"
    ));
    assert!(matches!(
        failure_kind(engine.validate_map("Tree", "leaves[a]")),
        FailureKind::InvalidPath { .. }
    ));
}

#[test]
fn test_snapshots_of_registered_graph() {
    let engine = engine_with(json!([
        { "name": "Tree", "type": { "age": "Number", "top": "Leaf" }, "uniqueKey": "age" },
        { "name": "Leaf", "type": { "color": "String", "parent": "Tree" } }
    ]));

    let snapshots = engine.schemas_to_object("^(Tree|Leaf)$").unwrap();
    let rendered = serde_json::to_value(&snapshots).unwrap();
    assert_eq!(rendered["Tree"]["fields"], json!({ "age": "Number", "top": "Leaf" }));
    assert_eq!(rendered["Leaf"]["fields"], json!({ "color": "String", "parent": "Tree" }));
    assert_eq!(rendered["Tree"]["uniqueKey"], json!("age"));
    assert_eq!(engine.registered_schemas(), ["Tree", "Leaf"]);
}
