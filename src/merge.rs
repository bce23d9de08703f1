//! Three-way merge of configuration item states
//!
//! Merges the changes an extension made to a configuration item into the
//! site's active copy without clobbering the site's own customizations.
//!
//! ## States
//!
//! - **previous**: the item as the extension provided it at the last snapshot
//! - **current**: the item as the extension provides it now
//! - **active**: the item as it is on the site
//!
//! Only the differences between previous and current are applied, and each
//! one only where the active copy still matches previous.
//!
//! ## Mappings and sequences
//!
//! If any of the three states is map-like the level is merged key by key.
//! Otherwise the level is merged as a set of values: values dropped upstream
//! are removed from active, values added upstream are appended once, and
//! order is otherwise kept as active has it.

use log::debug;
use serde_yaml::Value;

use crate::document::{self, Document, Shape};

/// Merge changes between `previous` and `current` into `active`.
///
/// This is a pure function: the same three states always produce the same
/// result.
pub fn merge(previous: &Document, current: &Document, active: &Document) -> Document {
    merge_at(previous, current, active, "")
}

fn merge_at(previous: &Value, current: &Value, active: &Value, path: &str) -> Value {
    if previous == current {
        return active.clone();
    }

    let shapes = [
        document::shape(previous),
        document::shape(current),
        document::shape(active),
    ];

    if shapes.contains(&Shape::Scalar) {
        return replace_if_unchanged(previous, current, active, path);
    }
    if shapes.contains(&Shape::Map) {
        return merge_maps(previous, current, active, path);
    }
    merge_lists(previous, current, active)
}

/// Take the upstream value only when the site kept the previous one.
fn replace_if_unchanged(previous: &Value, current: &Value, active: &Value, path: &str) -> Value {
    if active == previous {
        current.clone()
    } else {
        if previous != current {
            debug!(
                "Keeping customized value at '{}' ({} -> {} upstream)",
                display_path(path),
                document::type_name(previous),
                document::type_name(current)
            );
        }
        active.clone()
    }
}

fn merge_maps(previous: &Value, current: &Value, active: &Value, path: &str) -> Value {
    let previous = document::as_map(previous).unwrap_or_default();
    let current = document::as_map(current).unwrap_or_default();
    let active = document::as_map(active).unwrap_or_default();
    let mut result = active.clone();

    // Removals: only where the site left the previous value alone
    for (key, previous_value) in &previous {
        if !current.contains_key(key) && active.get(key) == Some(previous_value) {
            result.remove(key);
        }
    }

    // Additions: never over something the site already has
    for (key, current_value) in &current {
        if !previous.contains_key(key) && !active.contains_key(key) {
            result.insert(key.clone(), current_value.clone());
        }
    }

    // Changes
    for (key, current_value) in &current {
        let Some(previous_value) = previous.get(key) else {
            continue;
        };
        if previous_value == current_value {
            continue;
        }
        let Some(active_value) = active.get(key) else {
            // The site removed the key; do not bring it back
            continue;
        };

        let child_path = child_path(path, key);
        if is_container(previous_value) && consistent(previous_value, current_value, active_value) {
            let merged = merge_at(previous_value, current_value, active_value, &child_path);
            result.insert(key.clone(), merged);
        } else if active_value == previous_value {
            result.insert(key.clone(), current_value.clone());
        } else {
            debug!("Keeping customized value at '{}'", child_path);
        }
    }

    Value::Mapping(result)
}

fn merge_lists(previous: &Value, current: &Value, active: &Value) -> Value {
    let previous = document::as_list(previous).unwrap_or_default();
    let current = document::as_list(current).unwrap_or_default();
    let mut result = document::as_list(active).unwrap_or_default();

    for removed in previous.iter().filter(|value| !current.contains(value)) {
        if let Some(pos) = result.iter().position(|value| value == removed) {
            result.remove(pos);
        }
    }

    for added in current.iter().filter(|value| !previous.contains(value)) {
        if !result.contains(added) {
            result.push(added.clone());
        }
    }

    Value::Sequence(result)
}

fn is_container(value: &Value) -> bool {
    document::shape(value) != Shape::Scalar
}

/// All three states are containers of the same shape.
fn consistent(previous: &Value, current: &Value, active: &Value) -> bool {
    let shape = document::shape(previous);
    document::shape(current) == shape && document::shape(active) == shape
}

fn child_path(path: &str, key: &Value) -> String {
    let key = document::key_to_string(key);
    if path.is_empty() {
        key
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
