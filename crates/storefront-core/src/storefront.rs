// ── Storefront facade ──
//
// Wires a document backend, the local fallback cache, and the reactive
// ConfigStore together. Cheaply cloneable via `Arc<Inner>`. Collaborators
// are injected by the caller; nothing here is global.

use std::sync::Arc;

use serde_json::Value;
use storefront_api::{DocumentBackend, DocumentSubscription, FeedEvent};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::ConfigCache;
use crate::config::StorefrontSettings;
use crate::document::DocumentKind;
use crate::effective::{ConfigOrigin, EffectiveConfig};
use crate::error::CoreError;
use crate::rotation::{DeckSource, RotationHandle};
use crate::store::{ConfigStore, SyncStatus};
use crate::stream::ConfigStream;

/// The main entry point for consumers of storefront configuration.
///
/// Every managed document has an effective configuration from the moment
/// of construction (the builtin defaults), so renderers never see a blank
/// state. [`load`](Self::load) layers the cache and a remote read on top;
/// [`start`](Self::start) additionally follows the live feed.
pub struct Storefront<B: DocumentBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: DocumentBackend> Clone for Storefront<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B> {
    settings: StorefrontSettings,
    backend: B,
    cache: Arc<dyn ConfigCache>,
    store: ConfigStore,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: DocumentBackend> Storefront<B> {
    /// Create a storefront and publish defaults for every managed document.
    pub fn new(settings: StorefrontSettings, backend: B, cache: Arc<dyn ConfigCache>) -> Self {
        let store = ConfigStore::new(&settings.defaults, settings.documents.iter().copied());
        Self {
            inner: Arc::new(Inner {
                settings,
                backend,
                cache,
                store,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn settings(&self) -> &StorefrontSettings {
        &self.inner.settings
    }

    pub fn tenant(&self) -> &str {
        &self.inner.settings.tenant
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn store(&self) -> &ConfigStore {
        &self.inner.store
    }

    pub fn documents(&self) -> Vec<DocumentKind> {
        self.inner.store.kinds()
    }

    pub fn snapshot(&self, kind: DocumentKind) -> Result<Arc<EffectiveConfig>, CoreError> {
        self.inner.store.snapshot(kind)
    }

    pub fn status(&self, kind: DocumentKind) -> Result<SyncStatus, CoreError> {
        self.inner.store.status(kind)
    }

    pub fn subscribe(&self, kind: DocumentKind) -> Result<ConfigStream, CoreError> {
        self.inner.store.subscribe(kind)
    }

    pub fn subscribe_status(&self, kind: DocumentKind) -> Result<watch::Receiver<SyncStatus>, CoreError> {
        self.inner.store.subscribe_status(kind)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cache-then-remote load of every managed document.
    ///
    /// Every document is attempted; failures leave that document degraded
    /// on its last good snapshot. Returns the first failure, if any.
    pub async fn load(&self) -> Result<(), CoreError> {
        let mut first_error = None;
        for kind in self.documents() {
            if let Err(e) = self.load_document(kind).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Cache-then-remote load of one document.
    pub async fn load_document(&self, kind: DocumentKind) -> Result<Arc<EffectiveConfig>, CoreError> {
        self.inner.apply_cache(kind)?;
        self.inner.fetch(kind).await
    }

    /// Apply the cached copy of one document without contacting the store.
    ///
    /// Returns the resulting snapshot: the cached configuration, or the
    /// current one when nothing is cached.
    pub fn load_cached(&self, kind: DocumentKind) -> Result<Arc<EffectiveConfig>, CoreError> {
        self.inner.apply_cache(kind)?;
        self.snapshot(kind)
    }

    /// One point-in-time remote read, bypassing the cache.
    pub async fn refresh(&self, kind: DocumentKind) -> Result<Arc<EffectiveConfig>, CoreError> {
        self.inner.fetch(kind).await
    }

    /// Load everything, then follow the live feed of each document.
    ///
    /// A failed initial load is not fatal: the feed may still recover.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Internal("storefront has been shut down".into()));
        }
        if let Err(e) = self.load().await {
            warn!(error = %e, "initial load incomplete, continuing with live feed");
        }

        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            debug!("live feeds already running");
            return Ok(());
        }
        for kind in self.documents() {
            let subscription = self.inner.backend.subscribe(kind.key());
            let inner = Arc::clone(&self.inner);
            let cancel = self.inner.cancel.child_token();
            handles.push(tokio::spawn(feed_task(inner, kind, subscription, cancel)));
        }
        info!(tenant = %self.tenant(), documents = handles.len(), "storefront live");
        Ok(())
    }

    /// Rotate the deck at `source` using the configured rotation settings.
    /// The rotation stops on [`shutdown`](Self::shutdown).
    pub fn rotation(&self, source: DeckSource) -> Result<RotationHandle, CoreError> {
        let stream = self.inner.store.subscribe(source.document)?;
        RotationHandle::spawn(
            stream,
            source,
            self.inner.settings.rotation,
            self.inner.cancel.child_token(),
        )
    }

    /// Stop feeds and rotations and wait for background tasks.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!(tenant = %self.tenant(), "storefront shut down");
    }
}

impl<B: DocumentBackend> Inner<B> {
    fn tenant(&self) -> &str {
        &self.settings.tenant
    }

    fn apply_cache(&self, kind: DocumentKind) -> Result<(), CoreError> {
        if let Some(cached) = self.cache.load(self.tenant(), kind) {
            let snapshot = self.store.publish(kind, Some(&cached), ConfigOrigin::Cache)?;
            debug!(%kind, revision = snapshot.revision, "applied cached configuration");
        }
        Ok(())
    }

    async fn fetch(&self, kind: DocumentKind) -> Result<Arc<EffectiveConfig>, CoreError> {
        match self.backend.fetch(kind.key()).await {
            Ok(Some(document)) => self.apply_remote(kind, Some(&document)),
            Ok(None) => {
                info!(%kind, "document not found, falling back to defaults");
                let snapshot = self.apply_remote(kind, None)?;
                if self.settings.persist_defaults {
                    self.persist_defaults(kind).await;
                }
                Ok(snapshot)
            }
            Err(e) => {
                let err = CoreError::from(e);
                self.degrade(kind, &err.to_string());
                Err(err)
            }
        }
    }

    /// Publish a remote document (or defaults for `None`), cache it, go live.
    fn apply_remote(&self, kind: DocumentKind, document: Option<&Value>) -> Result<Arc<EffectiveConfig>, CoreError> {
        let snapshot = self.store.publish(kind, document, ConfigOrigin::Remote)?;
        self.cache.store(self.tenant(), kind, &snapshot.value);
        self.store.set_status(kind, SyncStatus::Live)?;
        Ok(snapshot)
    }

    async fn persist_defaults(&self, kind: DocumentKind) {
        let Ok(defaults) = self.store.defaults(kind) else {
            return;
        };
        match self.backend.persist(kind.key(), &defaults).await {
            Ok(()) => info!(%kind, "persisted default document upstream"),
            Err(e) => warn!(%kind, error = %e, "failed to persist default document"),
        }
    }

    fn degrade(&self, kind: DocumentKind, error: &str) {
        warn!(%kind, error, "serving last good configuration");
        let _ = self.store.set_status(
            kind,
            SyncStatus::Degraded {
                error: error.to_owned(),
            },
        );
    }
}

async fn feed_task<B: DocumentBackend>(
    inner: Arc<Inner<B>>,
    kind: DocumentKind,
    mut subscription: DocumentSubscription,
    cancel: CancellationToken,
) {
    debug!(%kind, key = subscription.key(), "following live feed");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = subscription.recv() => {
                let Some(event) = event else {
                    warn!(%kind, "live feed ended");
                    break;
                };
                match event {
                    FeedEvent::Snapshot(document) => {
                        if let Err(e) = inner.apply_remote(kind, document.as_ref()) {
                            warn!(%kind, error = %e, "failed to apply feed snapshot");
                        }
                    }
                    FeedEvent::Error(message) => inner.degrade(kind, &message),
                }
            }
        }
    }
    subscription.unsubscribe();
    debug!(%kind, "live feed task stopped");
}
