// ── Reactive configuration streams ──
//
// Subscription types for consuming snapshots from the ConfigStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::document::DocumentKind;
use crate::effective::EffectiveConfig;

/// A subscription to one document's effective configuration.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
#[derive(Clone)]
pub struct ConfigStream {
    kind: DocumentKind,
    current: Arc<EffectiveConfig>,
    receiver: watch::Receiver<Arc<EffectiveConfig>>,
}

impl ConfigStream {
    pub(crate) fn new(kind: DocumentKind, receiver: watch::Receiver<Arc<EffectiveConfig>>) -> Self {
        let current = receiver.borrow().clone();
        Self {
            kind,
            current,
            receiver,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The snapshot seen most recently through this stream.
    pub fn current(&self) -> &Arc<EffectiveConfig> {
        &self.current
    }

    /// The latest published snapshot (may be newer than `current`).
    pub fn latest(&self) -> Arc<EffectiveConfig> {
        self.receiver.borrow().clone()
    }

    /// Whether a snapshot newer than `current` has been published.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<EffectiveConfig>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` that yields the current snapshot first.
    pub fn into_stream(self) -> ConfigWatchStream {
        ConfigWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct ConfigWatchStream {
    inner: WatchStream<Arc<EffectiveConfig>>,
}

impl Stream for ConfigWatchStream {
    type Item = Arc<EffectiveConfig>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::future::poll_fn;

    use serde_json::json;

    use super::*;
    use crate::defaults::DefaultConfig;
    use crate::effective::ConfigOrigin;
    use crate::store::ConfigStore;

    #[tokio::test]
    async fn changed_yields_new_snapshot() {
        let store = ConfigStore::new(&DefaultConfig::builtin(), [DocumentKind::Theme]);
        let mut stream = store.subscribe(DocumentKind::Theme).unwrap();
        assert_eq!(stream.current().revision, 0);

        store
            .publish(DocumentKind::Theme, Some(&json!({"colors": {"brand": "#111"}})), ConfigOrigin::Remote)
            .unwrap();
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.revision, 1);
        assert_eq!(stream.current().revision, 1);
        assert!(!stream.has_changed());
    }

    #[tokio::test]
    async fn changed_returns_none_after_store_drop() {
        let store = ConfigStore::new(&DefaultConfig::builtin(), [DocumentKind::Theme]);
        let mut stream = store.subscribe(DocumentKind::Theme).unwrap();
        drop(store);
        assert!(stream.changed().await.is_none());
        assert_eq!(stream.latest().revision, 0);
    }

    #[tokio::test]
    async fn into_stream_starts_with_current() {
        let store = ConfigStore::new(&DefaultConfig::builtin(), [DocumentKind::Banners]);
        let mut stream = store.subscribe(DocumentKind::Banners).unwrap().into_stream();
        let first = poll_fn(|cx| Pin::new(&mut stream).poll_next(cx)).await.unwrap();
        assert_eq!(first.kind, DocumentKind::Banners);
        assert_eq!(first.revision, 0);
    }
}
