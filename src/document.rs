//! Configuration documents
//!
//! A configuration item is a named YAML document: a mapping from string keys
//! to scalars, nested mappings or sequences. This module provides the shape
//! helpers shared by the differ, the comparer and the merger.
//!
//! ## Absent marker
//!
//! The snapshot of active configuration has to distinguish "this item was
//! not installed" from "this item was installed as an empty document". The
//! YAML null document is reserved as that marker: real configuration items are
//! always mappings, so an empty item is `{}` and never `~`.

use serde_yaml::{Mapping, Value};

use crate::error::Result;

/// A configuration document.
pub type Document = Value;

/// Top-level key listing the items a configuration item depends on.
pub const DEPENDENCIES_KEY: &str = "dependencies";

/// Key holding the stable identity of configuration entities.
pub const UUID_KEY: &str = "uuid";

/// Returns the marker stored for an item that was absent when snapshotted.
pub fn absent() -> Document {
    Value::Null
}

/// Whether a stored document is the absent marker.
pub fn is_absent(doc: &Document) -> bool {
    doc.is_null()
}

/// Structural shape of a value, as seen by the merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Unordered keyed data
    Map,
    /// Ordered sequence of values
    List,
    /// Anything that is not a container
    Scalar,
}

/// Classify a value as map-like, list-like or scalar.
///
/// Sequences are list-like. A mapping is also list-like when its keys are
/// exactly the integers `0..n` for some `n > 0`, which is how a sequence
/// looks once it has been written with explicit indices.
pub fn shape(value: &Value) -> Shape {
    match value {
        Value::Sequence(_) => Shape::List,
        Value::Mapping(map) if has_index_keys(map) => Shape::List,
        Value::Mapping(_) => Shape::Map,
        Value::Tagged(tagged) => shape(&tagged.value),
        _ => Shape::Scalar,
    }
}

fn has_index_keys(map: &Mapping) -> bool {
    if map.is_empty() {
        return false;
    }
    let mut seen = vec![false; map.len()];
    for key in map.keys() {
        let Some(idx) = key.as_u64() else {
            return false;
        };
        match usize::try_from(idx).ok().and_then(|i| seen.get_mut(i)) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// View a container as a list of values.
///
/// Index-keyed mappings are returned in index order. Scalars yield `None`.
pub fn as_list(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Sequence(seq) => Some(seq.clone()),
        Value::Mapping(map) if has_index_keys(map) => {
            let mut items: Vec<(u64, Value)> = map
                .iter()
                .filter_map(|(k, v)| k.as_u64().map(|i| (i, v.clone())))
                .collect();
            items.sort_by_key(|(i, _)| *i);
            Some(items.into_iter().map(|(_, v)| v).collect())
        }
        Value::Tagged(tagged) => as_list(&tagged.value),
        _ => None,
    }
}

/// View a container as a mapping.
///
/// Sequences are keyed by their indices. Scalars yield `None`.
pub fn as_map(value: &Value) -> Option<Mapping> {
    match value {
        Value::Mapping(map) => Some(map.clone()),
        Value::Sequence(seq) => Some(
            seq.iter()
                .enumerate()
                .map(|(i, v)| (Value::Number((i as u64).into()), v.clone()))
                .collect(),
        ),
        Value::Tagged(tagged) => as_map(&tagged.value),
        _ => None,
    }
}

/// Names of the configuration items a document declares as dependencies.
///
/// Reads `dependencies.config`, ignoring anything that is not a string.
pub fn config_dependencies(doc: &Document) -> Vec<String> {
    doc.get(DEPENDENCIES_KEY)
        .and_then(|deps| deps.get("config"))
        .and_then(Value::as_sequence)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The `uuid` of a configuration entity, if it carries a non-empty one.
pub fn uuid(doc: &Document) -> Option<&str> {
    doc.get(UUID_KEY)
        .and_then(Value::as_str)
        .filter(|uuid| !uuid.is_empty())
}

/// Parse a YAML string into a document.
///
/// An empty file is an empty mapping, not the absent marker.
pub fn parse(content: &str) -> Result<Document> {
    if content.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Serialize a document to YAML.
pub fn to_yaml(doc: &Document) -> Result<String> {
    Ok(serde_yaml::to_string(doc)?)
}

/// Render a mapping key for log messages and dotted paths.
pub fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => format!("{:?}", key),
    }
}

/// Get a human-readable type name for a YAML value
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Sequence(_) => "Sequence",
        Value::Mapping(_) => "Mapping",
        Value::Tagged(_) => "Tagged",
    }
}
