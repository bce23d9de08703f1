//! Structural comparison of configuration documents
//!
//! Two copies of a configuration item regularly differ in ways that carry no
//! meaning: the active copy of a configuration entity has a `uuid` that the
//! shipped copy lacks, and YAML writers do not agree on mapping key order.
//! [`ConfigDiff`] normalizes those differences away before comparing, so that
//! only real changes show up as updates.
//!
//! Sequence order is significant: a reordered list is a different list.

use serde_yaml::{Mapping, Value};

use crate::document::{key_to_string, Document};

/// Top-level keys ignored by default when comparing documents.
pub const DEFAULT_IGNORE_KEYS: &[&str] = &["uuid", "_core"];

/// Configuration differ with a set of volatile top-level keys
#[derive(Debug, Clone)]
pub struct ConfigDiff {
    ignore_keys: Vec<String>,
}

impl Default for ConfigDiff {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_KEYS.iter().map(|key| key.to_string()))
    }
}

impl ConfigDiff {
    /// Create a differ ignoring the given top-level keys
    pub fn new<I, S>(ignore_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore_keys: ignore_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Keys ignored at the top level of a document
    pub fn ignore_keys(&self) -> &[String] {
        &self.ignore_keys
    }

    /// Whether two documents are equivalent after normalization.
    pub fn same(&self, a: &Document, b: &Document) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Strip ignored top-level keys and sort mapping keys recursively.
    pub fn normalize(&self, doc: &Document) -> Document {
        match doc {
            Value::Mapping(map) => {
                let filtered: Mapping = map
                    .iter()
                    .filter(|(key, _)| {
                        key.as_str()
                            .map(|key| !self.ignore_keys.iter().any(|ignored| ignored == key))
                            .unwrap_or(true)
                    })
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                sort_keys(&Value::Mapping(filtered))
            }
            other => sort_keys(other),
        }
    }

    /// Dotted paths at which two documents differ after normalization.
    ///
    /// Sequences are compared as a whole; a path ending in a sequence is
    /// reported when any element differs.
    pub fn changed_paths(&self, a: &Document, b: &Document) -> Vec<String> {
        let mut paths = Vec::new();
        collect_changed_paths(&self.normalize(a), &self.normalize(b), "", &mut paths);
        paths
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = map
                .iter()
                .map(|(key, value)| (key.clone(), sort_keys(value)))
                .collect();
            entries.sort_by(|(a, _), (b, _)| key_to_string(a).cmp(&key_to_string(b)));
            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(seq) => Value::Sequence(seq.iter().map(sort_keys).collect()),
        Value::Tagged(tagged) => {
            let mut tagged = tagged.clone();
            tagged.value = sort_keys(&tagged.value);
            Value::Tagged(tagged)
        }
        other => other.clone(),
    }
}

fn collect_changed_paths(a: &Value, b: &Value, path: &str, paths: &mut Vec<String>) {
    if a == b {
        return;
    }
    match (a, b) {
        (Value::Mapping(left), Value::Mapping(right)) => {
            let mut keys: Vec<&Value> = left.keys().collect();
            for key in right.keys() {
                if !left.contains_key(key) {
                    keys.push(key);
                }
            }
            for key in keys {
                let key_str = key_to_string(key);
                let child_path = if path.is_empty() {
                    key_str
                } else {
                    format!("{}.{}", path, key_str)
                };
                match (left.get(key), right.get(key)) {
                    (Some(l), Some(r)) => collect_changed_paths(l, r, &child_path, paths),
                    _ => paths.push(child_path),
                }
            }
        }
        _ => paths.push(if path.is_empty() {
            "<root>".to_string()
        } else {
            path.to_string()
        }),
    }
}
