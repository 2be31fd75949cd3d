use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::defaults::DefaultConfig;
use crate::document::DocumentKind;
use crate::effective::{ConfigOrigin, EffectiveConfig};
use crate::error::CoreError;
use crate::stream::ConfigStream;

/// Health of a document's link to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncStatus {
    /// No remote response yet; serving defaults or cache.
    Pending,
    /// Last remote read or feed snapshot succeeded.
    Live,
    /// Remote failed; serving the last good snapshot.
    Degraded { error: String },
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Live => f.write_str("live"),
            Self::Degraded { error } => write!(f, "degraded ({error})"),
        }
    }
}

struct DocumentSlot {
    defaults: Arc<Value>,
    config: watch::Sender<Arc<EffectiveConfig>>,
    status: watch::Sender<SyncStatus>,
}

/// Current effective configuration for every managed document.
///
/// Snapshots are immutable; publishing replaces the `Arc` and notifies
/// subscribers only when the merged value actually changed.
pub struct ConfigStore {
    slots: DashMap<DocumentKind, DocumentSlot>,
}

impl ConfigStore {
    /// Create a store seeded with defaults (revision 0) for each kind.
    pub fn new(defaults: &DefaultConfig, kinds: impl IntoIterator<Item = DocumentKind>) -> Self {
        let slots = DashMap::new();
        for kind in kinds {
            let document = defaults.get(kind);
            let (config, _) = watch::channel(Arc::new(EffectiveConfig::from_defaults(
                kind,
                Arc::clone(&document),
            )));
            let (status, _) = watch::channel(SyncStatus::Pending);
            slots.insert(
                kind,
                DocumentSlot {
                    defaults: document,
                    config,
                    status,
                },
            );
        }
        Self { slots }
    }

    /// Managed kinds, in declaration order.
    pub fn kinds(&self) -> Vec<DocumentKind> {
        let mut kinds: Vec<_> = self.slots.iter().map(|r| *r.key()).collect();
        kinds.sort();
        kinds
    }

    pub fn contains(&self, kind: DocumentKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// The default document backing `kind`.
    pub fn defaults(&self, kind: DocumentKind) -> Result<Arc<Value>, CoreError> {
        self.with_slot(kind, |slot| Arc::clone(&slot.defaults))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self, kind: DocumentKind) -> Result<Arc<EffectiveConfig>, CoreError> {
        self.with_slot(kind, |slot| slot.config.borrow().clone())
    }

    pub fn status(&self, kind: DocumentKind) -> Result<SyncStatus, CoreError> {
        self.with_slot(kind, |slot| slot.status.borrow().clone())
    }

    /// Follow snapshots of one document.
    pub fn subscribe(&self, kind: DocumentKind) -> Result<ConfigStream, CoreError> {
        self.with_slot(kind, |slot| ConfigStream::new(kind, slot.config.subscribe()))
    }

    /// Follow sync status changes of one document.
    pub fn subscribe_status(
        &self,
        kind: DocumentKind,
    ) -> Result<watch::Receiver<SyncStatus>, CoreError> {
        self.with_slot(kind, |slot| slot.status.subscribe())
    }

    /// Merge `overrides` onto the document's defaults and publish the result.
    ///
    /// `None` publishes the bare defaults with origin `Defaults`. When the
    /// merged value equals the current one, the snapshot's origin is updated
    /// in place without notifying subscribers or bumping the revision.
    pub fn publish(
        &self,
        kind: DocumentKind,
        overrides: Option<&Value>,
        origin: ConfigOrigin,
    ) -> Result<Arc<EffectiveConfig>, CoreError> {
        let slot = self
            .slots
            .get(&kind)
            .ok_or(CoreError::UnmanagedDocument { kind })?;

        let (overrides, origin) = match overrides {
            Some(value) => (value, origin),
            None => (&Value::Null, ConfigOrigin::Defaults),
        };
        let candidate = EffectiveConfig::reconcile(kind, &slot.defaults, overrides, origin, 0);

        let mut published = None;
        let notified = slot.config.send_if_modified(|current| {
            if current.value == candidate.value {
                if current.origin != origin {
                    let mut refreshed = EffectiveConfig::clone(current);
                    refreshed.origin = origin;
                    refreshed.merged_at = candidate.merged_at;
                    *current = Arc::new(refreshed);
                }
                published = Some(Arc::clone(current));
                return false;
            }
            let next = Arc::new(EffectiveConfig {
                revision: current.revision + 1,
                ..candidate
            });
            published = Some(Arc::clone(&next));
            *current = next;
            true
        });

        let snapshot = published.ok_or_else(|| CoreError::Internal("publish produced no snapshot".into()))?;
        if notified {
            tracing::debug!(%kind, %origin, revision = snapshot.revision, "published configuration");
        } else {
            tracing::trace!(%kind, %origin, "configuration unchanged");
        }
        Ok(snapshot)
    }

    /// Update sync status; subscribers are notified only on change.
    pub fn set_status(&self, kind: DocumentKind, status: SyncStatus) -> Result<(), CoreError> {
        self.with_slot(kind, |slot| {
            slot.status.send_if_modified(|current| {
                if *current == status {
                    return false;
                }
                tracing::debug!(%kind, from = %current, to = %status, "sync status changed");
                *current = status;
                true
            });
        })
    }

    fn with_slot<R>(
        &self,
        kind: DocumentKind,
        f: impl FnOnce(&DocumentSlot) -> R,
    ) -> Result<R, CoreError> {
        self.slots
            .get(&kind)
            .map(|slot| f(&slot))
            .ok_or(CoreError::UnmanagedDocument { kind })
    }
}
