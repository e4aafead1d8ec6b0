//! # Type Catalog
//!
//! Named custom-type predicates and metadata rules, supplied by the embedding
//! application. A catalog is built explicitly during setup, then shared by
//! reference with the classifier, the resolver and the validation engine,
//! which only read it.
//!
//! Registration order matters: a declaration naming a custom type is only
//! classified as [`SchemaType::Custom`] when the type is already in the
//! catalog. Otherwise it becomes a by-name schema reference, which
//! `resolve_all` later turns into the custom type once it has been added.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;

use crate::types::{Annotations, SchemaType};

/// Predicate deciding whether a value belongs to a custom type. Receives the
/// value and the annotation block of the field being checked.
pub type TypePredicate = Arc<dyn Fn(&Value, &Annotations) -> bool + Send + Sync>;

/// A metadata rule. `Err` carries the rule's description of the failure.
pub type MetadataRule = Arc<dyn Fn(&RuleInput<'_>) -> Result<(), String> + Send + Sync>;

/// Everything a metadata rule gets to see.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// The annotation value stored under the rule's key (e.g. `10` for `min: 10`).
    pub setting: &'a Value,
    /// Field being checked; `None` for single-type schemas.
    pub field: Option<&'a str>,
    /// The data value.
    pub value: &'a Value,
    /// Declared type of the field.
    pub ty: &'a SchemaType,
    /// The whole annotation block the setting came from.
    pub annotations: &'a Annotations,
}

/// Registry of custom types and metadata rules.
#[derive(Clone, Default)]
pub struct TypeCatalog {
    types: IndexMap<String, TypePredicate>,
    rules: IndexMap<String, MetadataRule>,
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TypeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog preloaded with the built-in metadata rules: `min`, `max`,
    /// `minLength`, `maxLength`, `enum` and `pattern`.
    pub fn with_builtin_rules() -> Self {
        let mut catalog = Self::new();
        catalog.install_builtin_rules();
        catalog
    }

    /// Add the built-in metadata rules, replacing same-named rules.
    ///
    /// Built-in rules only judge values of the kind they apply to (numbers
    /// for `min`/`max`, strings and arrays for the lengths, strings for
    /// `pattern`); other values pass and are left to the type check.
    pub fn install_builtin_rules(&mut self) {
        let patterns = PatternCache::default();
        self.register_rule("min", rule_min);
        self.register_rule("max", rule_max);
        self.register_rule("minLength", rule_min_length);
        self.register_rule("maxLength", rule_max_length);
        self.register_rule("enum", rule_enum);
        self.register_rule("pattern", move |input| rule_pattern(&patterns, input));
    }

    /// Register a custom type that accepts every value.
    pub fn register_type(&mut self, name: impl Into<String>) {
        self.register_type_with(name, |_, _| true);
    }

    /// Register a custom type backed by `predicate`. Re-registering a name
    /// replaces its predicate.
    pub fn register_type_with<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value, &Annotations) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(custom_type = %name, "registered custom type");
        self.types.insert(name, Arc::new(predicate));
    }

    /// Register a metadata rule under annotation key `key`.
    pub fn register_rule<F>(&mut self, key: impl Into<String>, rule: F)
    where
        F: Fn(&RuleInput<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        let key = key.into();
        tracing::debug!(rule = %key, "registered metadata rule");
        self.rules.insert(key, Arc::new(rule));
    }

    /// Whether `name` is a registered custom type.
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Run the predicate of custom type `name`. `None` if the type is unknown.
    pub fn check_type(&self, name: &str, value: &Value, annotations: &Annotations) -> Option<bool> {
        self.types.get(name).map(|predicate| predicate(value, annotations))
    }

    /// The rule registered under `key`, if any.
    pub fn rule(&self, key: &str) -> Option<&MetadataRule> {
        self.rules.get(key)
    }

    /// Names of all custom types, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Keys of all metadata rules, in registration order.
    pub fn rule_keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

// ─── Built-in Rules ──────────────────────────────────────────────────

fn number_setting(input: &RuleInput<'_>) -> Result<f64, String> {
    input
        .setting
        .as_f64()
        .ok_or_else(|| format!("setting {} is not a number", input.setting))
}

fn length_setting(input: &RuleInput<'_>) -> Result<usize, String> {
    input
        .setting
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| format!("setting {} is not a length", input.setting))
}

fn value_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn rule_min(input: &RuleInput<'_>) -> Result<(), String> {
    let min = number_setting(input)?;
    match input.value.as_f64() {
        Some(v) if v < min => Err(format!("value {v} is less than minimum {min}")),
        _ => Ok(()),
    }
}

fn rule_max(input: &RuleInput<'_>) -> Result<(), String> {
    let max = number_setting(input)?;
    match input.value.as_f64() {
        Some(v) if v > max => Err(format!("value {v} is greater than maximum {max}")),
        _ => Ok(()),
    }
}

fn rule_min_length(input: &RuleInput<'_>) -> Result<(), String> {
    let min = length_setting(input)?;
    match value_length(input.value) {
        Some(len) if len < min => Err(format!("length {len} is less than minimum {min}")),
        _ => Ok(()),
    }
}

fn rule_max_length(input: &RuleInput<'_>) -> Result<(), String> {
    let max = length_setting(input)?;
    match value_length(input.value) {
        Some(len) if len > max => Err(format!("length {len} is greater than maximum {max}")),
        _ => Ok(()),
    }
}

fn rule_enum(input: &RuleInput<'_>) -> Result<(), String> {
    let allowed = input
        .setting
        .as_array()
        .ok_or_else(|| format!("setting {} is not a list", input.setting))?;
    if allowed.contains(input.value) {
        Ok(())
    } else {
        Err(format!("{} is not one of {}", input.value, input.setting))
    }
}

/// Compiled `pattern` settings, shared by every clone of the rule.
#[derive(Debug, Clone, Default)]
struct PatternCache {
    compiled: Arc<RwLock<HashMap<String, Regex>>>,
}

impl PatternCache {
    fn get(&self, pattern: &str) -> Result<Regex, String> {
        if let Some(re) = self.compiled.read().get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
        self.compiled.write().insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled.read().len()
    }
}

fn rule_pattern(cache: &PatternCache, input: &RuleInput<'_>) -> Result<(), String> {
    let pattern = input
        .setting
        .as_str()
        .ok_or_else(|| format!("setting {} is not a string", input.setting))?;
    let re = cache.get(pattern)?;
    let Value::String(s) = input.value else {
        return Ok(());
    };
    if re.is_match(s) {
        Ok(())
    } else {
        Err(format!("'{s}' does not match pattern '{pattern}'"))
    }
}
