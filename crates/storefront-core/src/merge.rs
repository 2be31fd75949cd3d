//! Configuration reconciliation.
//!
//! Reconciles a canonical default tree with a partial, possibly stale
//! override document:
//! - `null` or missing override: the default wins
//! - Arrays: REPLACE wholesale, but only by another array
//! - Objects: deep-merge by key (recursive)
//! - Scalars and other shape mismatches: override wins
//!
//! Arrays are never merged element by element. Slide and carousel lists are
//! operator-curated, so an imported partial list replaces the default list
//! as-is with no per-element backfill.
//!
//! Inputs are borrowed and never modified; the result shares no structure
//! with either of them. `serde_json::Value` is a tree, so recursion depth is
//! bounded by the input's own nesting.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Result of a reconciliation, with the paths whose overrides were rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// The fully populated configuration.
    pub value: Value,
    /// JSON pointers of override values discarded as shape-incompatible.
    pub discarded: Vec<String>,
}

/// Merge `overrides` onto `defaults`, returning a new tree.
pub fn merge(defaults: &Value, overrides: &Value) -> Value {
    merge_report(defaults, overrides).value
}

/// Like [`merge`], but also reports which override fields were discarded.
pub fn merge_report(defaults: &Value, overrides: &Value) -> MergeOutcome {
    let mut discarded = Vec::new();

    // A document whose root is not an object cannot override an object root.
    let value = if defaults.is_object() && !overrides.is_object() && !overrides.is_null() {
        debug!("discarding non-object override document");
        discarded.push(String::new());
        defaults.clone()
    } else {
        merge_value(defaults, overrides, "", &mut discarded)
    };

    MergeOutcome { value, discarded }
}

/// Merge several override layers in order (last has highest precedence).
pub fn merge_layers<'a>(defaults: &Value, layers: impl IntoIterator<Item = &'a Value>) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        value: defaults.clone(),
        discarded: Vec::new(),
    };
    for layer in layers {
        let next = merge_report(&outcome.value, layer);
        outcome.value = next.value;
        outcome.discarded.extend(next.discarded);
    }
    outcome
}

fn merge_value(default: &Value, overlay: &Value, path: &str, discarded: &mut Vec<String>) -> Value {
    match (default, overlay) {
        // Cleared or absent: keep the default
        (_, Value::Null) => default.clone(),

        // Arrays: REPLACE, but only by another array
        (Value::Array(_), Value::Array(_)) => overlay.clone(),
        (Value::Array(_), _) => {
            debug!(path, "discarding non-array override for array field");
            discarded.push(path.to_owned());
            default.clone()
        }

        // Both objects: deep merge
        (Value::Object(base), Value::Object(over)) => {
            Value::Object(merge_objects(base, over, path, discarded))
        }

        // Scalars and any other case: overlay wins
        (_, _) => overlay.clone(),
    }
}

fn merge_objects(
    base: &Map<String, Value>,
    over: &Map<String, Value>,
    path: &str,
    discarded: &mut Vec<String>,
) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, overlay_value) in over {
        match base.get(key) {
            Some(default_value) => {
                let child = child_path(path, key);
                out.insert(
                    key.clone(),
                    merge_value(default_value, overlay_value, &child, discarded),
                );
            }
            None if overlay_value.is_null() => {}
            None => {
                out.insert(key.clone(), overlay_value.clone());
            }
        }
    }
    out
}

/// Append one RFC 6901 reference token to a JSON pointer.
fn child_path(parent: &str, key: &str) -> String {
    let escaped = key.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{escaped}")
}
