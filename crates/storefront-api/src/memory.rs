// ── In-process document backend ──
//
// Holds documents in a `DashMap` and fans every write out to live
// subscribers through a `broadcast` channel per key. Used for offline
// previews and as the test double for the core's load/subscribe lifecycle.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::backend::{DocumentBackend, DocumentSubscription, FEED_CHANNEL_CAPACITY, FeedEvent};
use crate::error::Error;

const BROADCAST_CAPACITY: usize = 64;

/// A [`DocumentBackend`] that lives entirely in memory.
///
/// Cheaply cloneable; clones share the same documents and subscribers.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    documents: DashMap<String, Value>,
    channels: DashMap<String, broadcast::Sender<FeedEvent>>,
    /// Keys whose point reads fail with the stored message.
    fetch_failures: DashMap<String, String>,
    /// Number of `persist` calls per key.
    persisted: DashMap<String, usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seed of one document.
    #[must_use]
    pub fn with_document(self, key: &str, document: Value) -> Self {
        self.inner.documents.insert(key.to_owned(), document);
        self
    }

    /// Current stored document, if any.
    pub fn document(&self, key: &str) -> Option<Value> {
        self.inner.documents.get(key).map(|d| d.value().clone())
    }

    /// Replace a document and notify every subscriber.
    pub fn put(&self, key: &str, document: Value) {
        self.inner.documents.insert(key.to_owned(), document.clone());
        self.publish(key, FeedEvent::Snapshot(Some(document)));
    }

    /// Delete a document and notify every subscriber.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.documents.remove(key).map(|(_, v)| v);
        self.publish(key, FeedEvent::Snapshot(None));
        removed
    }

    /// Push a recoverable feed error to every subscriber of `key`.
    pub fn inject_feed_error(&self, key: &str, message: &str) {
        self.publish(key, FeedEvent::Error(message.to_owned()));
    }

    /// Make every subsequent `fetch(key)` fail until [`restore`](Self::restore).
    pub fn fail_fetches(&self, key: &str, message: &str) {
        self.inner
            .fetch_failures
            .insert(key.to_owned(), message.to_owned());
    }

    /// Undo [`fail_fetches`](Self::fail_fetches).
    pub fn restore(&self, key: &str) {
        self.inner.fetch_failures.remove(key);
    }

    /// How many times `persist` was called for `key`.
    pub fn persist_count(&self, key: &str) -> usize {
        self.inner.persisted.get(key).map_or(0, |c| *c.value())
    }

    fn sender(&self, key: &str) -> broadcast::Sender<FeedEvent> {
        self.inner
            .channels
            .entry(key.to_owned())
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .clone()
    }

    fn publish(&self, key: &str, event: FeedEvent) {
        // Ignore send errors -- just means no active subscribers right now
        let _ = self.sender(key).send(event);
    }
}

impl DocumentBackend for MemoryBackend {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, Error> {
        if let Some(message) = self.inner.fetch_failures.get(key) {
            return Err(Error::Simulated(message.value().clone()));
        }
        Ok(self.document(key))
    }

    async fn persist(&self, key: &str, document: &Value) -> Result<(), Error> {
        *self.inner.persisted.entry(key.to_owned()).or_insert(0) += 1;
        self.put(key, document.clone());
        Ok(())
    }

    fn subscribe(&self, key: &str) -> DocumentSubscription {
        // Subscribe before reading so a concurrent put is never missed.
        let mut updates = self.sender(key).subscribe();
        let initial = self.document(key);

        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_key = key.to_owned();

        tokio::spawn(async move {
            if tx.send(FeedEvent::Snapshot(initial)).await.is_err() {
                return;
            }
            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    update = updates.recv() => match update {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(key = %task_key, skipped, "memory feed lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!(key = %task_key, "memory feed closed");
        });

        DocumentSubscription::new(key, rx, cancel)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_returns_seeded_document() {
        let backend = MemoryBackend::new().with_document("theme", json!({ "brand": "#000" }));
        assert_eq!(
            backend.fetch("theme").await.unwrap(),
            Some(json!({ "brand": "#000" }))
        );
        assert_eq!(backend.fetch("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_fetch_failure_until_restored() {
        let backend = MemoryBackend::new().with_document("theme", json!({}));
        backend.fail_fetches("theme", "offline");
        assert!(matches!(
            backend.fetch("theme").await,
            Err(Error::Simulated(msg)) if msg == "offline"
        ));

        backend.restore("theme");
        assert!(backend.fetch("theme").await.is_ok());
    }

    #[tokio::test]
    async fn subscription_sees_initial_then_updates() {
        let backend = MemoryBackend::new().with_document("heroes", json!({ "v": 1 }));
        let mut sub = backend.subscribe("heroes");

        assert_eq!(
            sub.recv().await,
            Some(FeedEvent::Snapshot(Some(json!({ "v": 1 }))))
        );

        backend.put("heroes", json!({ "v": 2 }));
        assert_eq!(
            sub.recv().await,
            Some(FeedEvent::Snapshot(Some(json!({ "v": 2 }))))
        );

        backend.inject_feed_error("heroes", "flaky");
        assert_eq!(sub.recv().await, Some(FeedEvent::Error("flaky".into())));

        backend.remove("heroes");
        assert_eq!(sub.recv().await, Some(FeedEvent::Snapshot(None)));
    }

    #[tokio::test]
    async fn persist_counts_and_publishes() {
        let backend = MemoryBackend::new();
        let mut sub = backend.subscribe("layout");
        assert_eq!(sub.recv().await, Some(FeedEvent::Snapshot(None)));

        backend.persist("layout", &json!({ "sections": [] })).await.unwrap();
        assert_eq!(backend.persist_count("layout"), 1);
        assert_eq!(
            sub.recv().await,
            Some(FeedEvent::Snapshot(Some(json!({ "sections": [] }))))
        );
    }
}
