#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use storefront_core::{
    ConfigOrigin, DeckSource, DocumentKind, MemoryBackend, MemoryCache, RotationMode, Storefront,
    StorefrontSettings, SyncStatus,
};
use storefront_core::cache::ConfigCache;

const WAIT: Duration = Duration::from_secs(2);

fn settings() -> StorefrontSettings {
    StorefrontSettings::new("acme").with_documents([DocumentKind::Theme, DocumentKind::Heroes])
}

#[tokio::test]
async fn live_feed_updates_flow_into_snapshots() {
    let backend = MemoryBackend::new().with_document("theme", json!({"colors": {"brand": "#111"}}));
    let cache = Arc::new(MemoryCache::new());
    let sf = Storefront::new(settings(), backend.clone(), cache.clone());
    sf.start().await.unwrap();

    let mut theme = sf.subscribe(DocumentKind::Theme).unwrap();
    assert_eq!(theme.current().value()["colors"]["brand"], "#111");

    backend.put("theme", json!({"colors": {"brand": "#222", "accent": null}}));
    let snap = tokio::time::timeout(WAIT, theme.changed()).await.unwrap().unwrap();
    assert_eq!(snap.value()["colors"]["brand"], "#222");
    // Null keeps the default.
    assert_eq!(snap.value()["colors"]["accent"], "#f97316");
    assert_eq!(snap.origin, ConfigOrigin::Remote);
    assert_eq!(cache.load("acme", DocumentKind::Theme).unwrap(), *snap.value);

    sf.shutdown().await;
}

#[tokio::test]
async fn feed_errors_degrade_until_next_snapshot() {
    let backend = MemoryBackend::new().with_document("heroes", json!({"rotation_interval": 9}));
    let sf = Storefront::new(settings(), backend.clone(), Arc::new(MemoryCache::new()));
    sf.start().await.unwrap();
    let mut status = sf.subscribe_status(DocumentKind::Heroes).unwrap();
    status.borrow_and_update();

    backend.inject_feed_error("heroes", "socket reset");
    tokio::time::timeout(WAIT, status.changed()).await.unwrap().unwrap();
    assert!(matches!(&*status.borrow_and_update(), SyncStatus::Degraded { error } if error == "socket reset"));
    assert_eq!(sf.snapshot(DocumentKind::Heroes).unwrap().value()["rotation_interval"], 9);

    backend.put("heroes", json!({"rotation_interval": 4}));
    tokio::time::timeout(WAIT, status.changed()).await.unwrap().unwrap();
    assert_eq!(*status.borrow(), SyncStatus::Live);

    sf.shutdown().await;
}

#[tokio::test]
async fn deleted_document_falls_back_to_defaults() {
    let backend = MemoryBackend::new().with_document("theme", json!({"colors": {"brand": "#333"}}));
    let sf = Storefront::new(settings(), backend.clone(), Arc::new(MemoryCache::new()));
    sf.start().await.unwrap();
    let mut theme = sf.subscribe(DocumentKind::Theme).unwrap();

    backend.remove("theme");
    let snap = tokio::time::timeout(WAIT, theme.changed()).await.unwrap().unwrap();
    assert_eq!(snap.origin, ConfigOrigin::Defaults);
    assert_eq!(snap.value()["colors"]["brand"], "#0f172a");

    sf.shutdown().await;
}

#[tokio::test]
async fn cache_is_served_before_the_network() {
    let cache = Arc::new(MemoryCache::new());
    cache.store("acme", DocumentKind::Theme, &json!({"colors": {"brand": "#cac"}}));
    let backend = MemoryBackend::new().with_document("theme", json!({"colors": {"brand": "#0e0"}}));
    let sf = Storefront::new(settings(), backend, cache);
    let mut theme = sf.subscribe(DocumentKind::Theme).unwrap();

    sf.load_document(DocumentKind::Theme).await.unwrap();
    // Two publishes: cache first, then remote.
    let latest = theme.changed().await.unwrap();
    assert_eq!(latest.value()["colors"]["brand"], "#0e0");
    assert_eq!(latest.revision, 2);
}

#[tokio::test]
async fn refresh_reports_errors_without_losing_config() {
    let backend = MemoryBackend::new().with_document("theme", json!({"colors": {"brand": "#444"}}));
    let sf = Storefront::new(settings(), backend.clone(), Arc::new(MemoryCache::new()));
    sf.load().await.unwrap();

    backend.fail_fetches("theme", "boom");
    assert!(sf.refresh(DocumentKind::Theme).await.is_err());
    assert_eq!(sf.snapshot(DocumentKind::Theme).unwrap().value()["colors"]["brand"], "#444");

    backend.restore("theme");
    let snap = sf.refresh(DocumentKind::Theme).await.unwrap();
    assert_eq!(snap.value()["colors"]["brand"], "#444");
    assert_eq!(sf.status(DocumentKind::Theme).unwrap(), SyncStatus::Live);
}

#[tokio::test]
async fn rotation_follows_live_deck_and_stops_on_shutdown() {
    let backend = MemoryBackend::new().with_document(
        "heroes",
        json!({"slides": [{"id": "only", "typed": {"target": "none", "phrases": []}}]}),
    );
    let sf = Storefront::new(settings(), backend.clone(), Arc::new(MemoryCache::new()));
    sf.start().await.unwrap();

    let rotation = sf.rotation(DeckSource::heroes()).unwrap();
    assert_eq!(rotation.state().mode, RotationMode::Idle);
    let mut states = rotation.subscribe();

    backend.put("heroes", json!({"slides": [{"id": "x"}, {"id": "y"}]}));
    tokio::time::timeout(WAIT, states.changed()).await.unwrap().unwrap();
    let state = rotation.state();
    assert_eq!(state.slide_count, 2);
    assert_eq!(state.mode, RotationMode::AutoAdvancing);

    sf.shutdown().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rotation.send(storefront_core::RotationCommand::Next).await.is_err());
}
