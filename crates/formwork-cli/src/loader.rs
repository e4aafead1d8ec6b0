//! # Declaration & Document Loading
//!
//! Reads declaration files, data documents and engine configuration from
//! disk. Files ending in `.yaml` or `.yml` are parsed as YAML straight into
//! [`serde_json::Value`]; everything else is parsed as JSON.
//!
//! A declaration file holds either one declaration object or a list of them.
//! Declarations from several files are registered in file order and resolved
//! once at the end, so files may reference each other freely.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use formwork_schema::{Declaration, EngineConfig, SchemaEngine};

/// Whether `path` should be parsed as YAML.
fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Read a YAML or JSON document.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if is_yaml(path) {
        serde_yaml::from_str::<Value>(&content)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))
    }
}

/// Read every declaration in one file.
pub fn load_declarations(path: &Path) -> Result<Vec<Declaration>> {
    let document = load_document(path)?;
    let items = match document {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => bail!(
            "{}: expected a declaration object or a list of declarations, got {other}",
            path.display()
        ),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Declaration::from_value(item)
                .with_context(|| format!("{}: declaration #{}", path.display(), i + 1))
        })
        .collect()
}

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let document = load_document(path)?;
    serde_json::from_value(document)
        .with_context(|| format!("invalid engine configuration in {}", path.display()))
}

/// Build an engine from declaration files: register everything in file
/// order, then resolve.
pub fn build_engine(files: &[PathBuf], config: Option<&Path>) -> Result<SchemaEngine> {
    let mut engine = SchemaEngine::with_config(load_config(config)?);

    let mut declarations = Vec::new();
    for file in files {
        let loaded = load_declarations(file)?;
        tracing::debug!(file = %file.display(), declarations = loaded.len(), "loaded declaration file");
        declarations.extend(loaded);
    }

    engine
        .register_declarations(&declarations)
        .context("failed to register schema declarations")?;
    Ok(engine)
}
