// ── Document backend abstraction ──
//
// The seam between the storefront core and whatever managed service holds
// the configuration documents. Point reads and writes are plain futures;
// the live feed is a channel fed by a background task owned by the
// subscription handle.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Capacity of the per-subscription event channel.
pub(crate) const FEED_CHANNEL_CAPACITY: usize = 64;

/// One event delivered by a live document subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Full replacement of the document. `None` means it no longer exists.
    Snapshot(Option<Value>),
    /// The feed hit a recoverable problem and is retrying on its own.
    Error(String),
}

/// Handle to a live subscription on a single document.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// cancels the background task that feeds it.
#[derive(Debug)]
pub struct DocumentSubscription {
    key: String,
    events: mpsc::Receiver<FeedEvent>,
    cancel: CancellationToken,
}

impl DocumentSubscription {
    pub fn new(key: impl Into<String>, events: mpsc::Receiver<FeedEvent>, cancel: CancellationToken) -> Self {
        Self {
            key: key.into(),
            events,
            cancel,
        }
    }

    /// The document key this subscription watches.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the next feed event. Returns `None` once the feed has shut down.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    /// Stop the feed. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for DocumentSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Access to a remote store of JSON configuration documents.
///
/// Implementations must be cheap to share across tasks; the core holds
/// one behind an `Arc` for the lifetime of a storefront.
pub trait DocumentBackend: Send + Sync + 'static {
    /// Read one document. `Ok(None)` means the document does not exist.
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Option<Value>, Error>> + Send;

    /// Create or replace one document.
    fn persist(&self, key: &str, document: &Value) -> impl Future<Output = Result<(), Error>> + Send;

    /// Open a live feed that yields a full replacement document on every change.
    ///
    /// Must be called from within a Tokio runtime.
    fn subscribe(&self, key: &str) -> DocumentSubscription;
}

impl<B: DocumentBackend> DocumentBackend for Arc<B> {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Option<Value>, Error>> + Send {
        (**self).fetch(key)
    }

    fn persist(&self, key: &str, document: &Value) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).persist(key, document)
    }

    fn subscribe(&self, key: &str) -> DocumentSubscription {
        (**self).subscribe(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropping_subscription_cancels_its_token() {
        let (_tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let sub = DocumentSubscription::new("theme", rx, cancel.clone());
        assert_eq!(sub.key(), "theme");
        assert!(!cancel.is_cancelled());

        sub.unsubscribe();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn recv_returns_none_after_sender_drops() {
        let (tx, rx) = mpsc::channel(1);
        let mut sub = DocumentSubscription::new("theme", rx, CancellationToken::new());
        tx.send(FeedEvent::Snapshot(None)).await.ok();
        drop(tx);

        assert_eq!(sub.recv().await, Some(FeedEvent::Snapshot(None)));
        assert_eq!(sub.recv().await, None);
    }
}
