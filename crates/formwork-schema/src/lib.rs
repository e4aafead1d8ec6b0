#![deny(missing_docs)]

//! # formwork-schema: Structural Schema Registry & Validation
//!
//! Declares named data shapes, links them into a graph that may contain
//! forward and circular references, and validates runtime
//! [`serde_json::Value`] data against them.
//!
//! ## Pipeline
//!
//! 1. **Classify** ([`classify`]): a [`Declaration`] (parsed from JSON or
//!    YAML) becomes an unregistered [`SchemaDef`] with canonical
//!    [`SchemaType`]s. Names that match nothing yet become by-name
//!    references.
//! 2. **Register** ([`registry`]): the definition is stored in an
//!    append-only arena under a unique name, inline children first.
//! 3. **Resolve** ([`resolve`]): once a batch is registered,
//!    [`SchemaRegistry::resolve_all`] rewrites every reference into a
//!    direct [`SchemaId`] link (or a custom type).
//! 4. **Validate** ([`validate`], [`path`]): data is checked recursively in
//!    full (create) or partial (update) mode, stopping at the first failure.
//!
//! [`SchemaEngine`] bundles the registry, the [`TypeCatalog`] and the
//! [`EngineConfig`] behind one API.
//!
//! ## Crate Policy
//!
//! - No internal crate dependencies.
//! - Registered schemas are never removed or renamed; the only in-place
//!   mutation is reference resolution.
//! - Validation is read-only over the schema graph and reports exactly one
//!   failure: the first one in declaration or positional order.
//! - Structured errors with `thiserror`; no `.unwrap()` outside tests.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod path;
pub mod registry;
pub mod resolve;
pub mod snapshot;
pub mod types;
pub mod validate;

// Re-export primary types at crate root for ergonomic imports.
pub use catalog::{MetadataRule, RuleInput, TypeCatalog, TypePredicate};
pub use classify::Classifier;
pub use config::{EngineConfig, DEFAULT_BOOKKEEPING_FIELDS};
pub use declaration::{Declaration, TypeDecl};
pub use engine::SchemaEngine;
pub use error::{FailureKind, FieldPath, PathSegment, SchemaError, ValidationFailure};
pub use registry::{SchemaRegistry, DEFAULT_NAME_PREFIX};
pub use snapshot::{FieldsSnapshot, SchemaSnapshot};
pub use types::{
    Annotations, Fields, FieldsDef, MetaData, PrimitiveKind, SchemaDef, SchemaId, SchemaObject,
    SchemaType, TypeDef,
};
pub use validate::{ValidationMode, Validator};
