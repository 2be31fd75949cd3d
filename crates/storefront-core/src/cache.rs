// ── Local fallback cache ──
//
// Best-effort storage of the last known merged configuration per tenant,
// read on startup so the first render never waits for the network.
// Failures are logged and swallowed; the cache never fails its caller.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::document::DocumentKind;
use crate::error::CoreError;

/// Key-value storage for the last known configuration.
pub trait ConfigCache: Send + Sync {
    /// The cached document, if any.
    fn load(&self, tenant: &str, kind: DocumentKind) -> Option<Value>;

    /// Overwrite the cached document.
    fn store(&self, tenant: &str, kind: DocumentKind, document: &Value);
}

/// JSON files laid out as `{dir}/{tenant}/{kind}.json`.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of one cached document.
    pub fn path_for(&self, tenant: &str, kind: DocumentKind) -> PathBuf {
        self.dir
            .join(sanitize_tenant(tenant))
            .join(format!("{}.json", kind.key()))
    }

    pub fn try_load(&self, tenant: &str, kind: DocumentKind) -> Result<Option<Value>, CoreError> {
        let path = self.path_for(tenant, kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CoreError::MalformedDocument {
                message: format!("{}: {e}", path.display()),
            })
    }

    /// Write through a uniquely named temp file and rename, so readers never
    /// see a torn file and concurrent writers never share one.
    pub fn try_store(&self, tenant: &str, kind: DocumentKind, document: &Value) -> Result<(), CoreError> {
        let dir = self.dir.join(sanitize_tenant(tenant));
        fs::create_dir_all(&dir)?;
        let body = serde_json::to_vec_pretty(document)
            .map_err(|e| CoreError::Internal(format!("cache serialization: {e}")))?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.persist(self.path_for(tenant, kind)).map_err(io::Error::from)?;
        Ok(())
    }
}

impl ConfigCache for FileCache {
    fn load(&self, tenant: &str, kind: DocumentKind) -> Option<Value> {
        match self.try_load(tenant, kind) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tenant, %kind, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    fn store(&self, tenant: &str, kind: DocumentKind, document: &Value) {
        if let Err(e) = self.try_store(tenant, kind, document) {
            tracing::warn!(tenant, %kind, error = %e, "failed to write cache entry");
        }
    }
}

/// In-process cache, handy for tests and offline previews.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<(String, DocumentKind), Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigCache for MemoryCache {
    fn load(&self, tenant: &str, kind: DocumentKind) -> Option<Value> {
        self.entries
            .get(&(tenant.to_owned(), kind))
            .map(|r| r.value().clone())
    }

    fn store(&self, tenant: &str, kind: DocumentKind, document: &Value) {
        self.entries.insert((tenant.to_owned(), kind), document.clone());
    }
}

/// Cache that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ConfigCache for NoCache {
    fn load(&self, _tenant: &str, _kind: DocumentKind) -> Option<Value> {
        None
    }

    fn store(&self, _tenant: &str, _kind: DocumentKind, _document: &Value) {}
}

/// Reduce a tenant identifier to one safe path component.
fn sanitize_tenant(tenant: &str) -> String {
    let cleaned: String = tenant
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_owned()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        assert!(cache.load("acme", DocumentKind::Theme).is_none());
        cache.store("acme", DocumentKind::Theme, &json!({"colors": {"brand": "#123"}}));

        let path = dir.path().join("acme").join("theme.json");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(
            cache.load("acme", DocumentKind::Theme),
            Some(json!({"colors": {"brand": "#123"}}))
        );
        assert!(cache.load("other", DocumentKind::Theme).is_none());
    }

    #[test]
    fn concurrent_stores_leave_one_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    let doc = json!({"writer": writer, "pad": "x".repeat(4096)});
                    for _ in 0..20 {
                        cache.try_store("acme", DocumentKind::Layout, &doc).unwrap();
                    }
                });
            }
        });

        let stored = cache.try_load("acme", DocumentKind::Layout).unwrap().unwrap();
        assert!(stored["writer"].as_u64().unwrap() < 8);
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("acme"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("layout.json")]);
    }

    #[test]
    fn file_cache_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.store("acme", DocumentKind::Heroes, &json!({"v": 1}));
        cache.store("acme", DocumentKind::Heroes, &json!({"v": 2}));
        assert_eq!(cache.load("acme", DocumentKind::Heroes), Some(json!({"v": 2})));
    }

    #[test]
    fn corrupt_entry_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let path = cache.path_for("acme", DocumentKind::Layout);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{not json").unwrap();

        assert!(cache.load("acme", DocumentKind::Layout).is_none());
        assert!(matches!(
            cache.try_load("acme", DocumentKind::Layout),
            Err(CoreError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn tenant_cannot_escape_cache_dir() {
        let cache = FileCache::new("/tmp/cache");
        let path = cache.path_for("../../etc", DocumentKind::Theme);
        assert_eq!(path, PathBuf::from("/tmp/cache/.._.._etc/theme.json"));
        assert_eq!(sanitize_tenant(".."), "_");
        assert_eq!(sanitize_tenant(""), "_");
        assert_eq!(sanitize_tenant("shop-1.eu"), "shop-1.eu");
    }

    #[test]
    fn memory_cache_is_keyed_by_tenant() {
        let cache = MemoryCache::new();
        cache.store("a", DocumentKind::Theme, &json!(1));
        cache.store("b", DocumentKind::Theme, &json!(2));
        assert_eq!(cache.load("a", DocumentKind::Theme), Some(json!(1)));
        assert_eq!(cache.load("b", DocumentKind::Theme), Some(json!(2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn no_cache_holds_nothing() {
        NoCache.store("a", DocumentKind::Theme, &json!(1));
        assert!(NoCache.load("a", DocumentKind::Theme).is_none());
    }
}
