//! Effective configuration snapshots.
//!
//! An [`EffectiveConfig`] is the merged result of the builtin defaults and
//! whatever override layer was most recently available for one document.
//! Snapshots are immutable: every new input produces a new value, and
//! consumers share it through an `Arc`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use crate::document::DocumentKind;
use crate::merge::merge_report;
use crate::model::SlideDeck;

/// Where the override layer of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfigOrigin {
    /// Nothing but builtin defaults.
    Defaults,
    /// Defaults merged with the local fallback cache.
    Cache,
    /// Defaults merged with a document from the remote store.
    Remote,
}

/// Fully populated configuration for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub kind: DocumentKind,
    pub value: Arc<Value>,
    pub origin: ConfigOrigin,
    /// Monotonic per-document counter; 0 is the initial defaults snapshot.
    pub revision: u64,
    pub merged_at: DateTime<Utc>,
    /// JSON pointers of override fields dropped as shape-incompatible.
    pub discarded: Vec<String>,
}

impl EffectiveConfig {
    /// The initial snapshot: defaults only.
    pub fn from_defaults(kind: DocumentKind, defaults: Arc<Value>) -> Self {
        Self {
            kind,
            value: defaults,
            origin: ConfigOrigin::Defaults,
            revision: 0,
            merged_at: Utc::now(),
            discarded: Vec::new(),
        }
    }

    /// Merge `overrides` onto `defaults` into a new snapshot.
    pub fn reconcile(
        kind: DocumentKind,
        defaults: &Value,
        overrides: &Value,
        origin: ConfigOrigin,
        revision: u64,
    ) -> Self {
        let outcome = merge_report(defaults, overrides);
        if !outcome.discarded.is_empty() {
            tracing::debug!(
                %kind,
                %origin,
                discarded = ?outcome.discarded,
                "override fields discarded during merge"
            );
        }
        Self {
            kind,
            value: Arc::new(outcome.value),
            origin,
            revision,
            merged_at: Utc::now(),
            discarded: outcome.discarded,
        }
    }

    /// The merged document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Look up a nested value by JSON pointer (`""` is the whole document).
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.value.pointer(pointer)
    }

    /// Parse the slide deck found at `pointer`.
    ///
    /// A missing or non-object location yields an empty deck.
    pub fn deck(&self, pointer: &str) -> SlideDeck {
        self.pointer(pointer)
            .map(SlideDeck::from_value)
            .unwrap_or_default()
    }
}
