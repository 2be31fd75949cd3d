//! The document backend chosen at startup: the REST store, or nothing at all
//! when running `--offline`.

use serde_json::Value;

use storefront_api::{DocumentBackend, DocumentSubscription, Error};
use storefront_core::{MemoryBackend, RestBackend};

pub enum StoreBackend {
    Rest(RestBackend),
    /// Empty in-memory store; offline sessions never read from it.
    Offline(MemoryBackend),
}

impl StoreBackend {
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }
}

impl DocumentBackend for StoreBackend {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, Error> {
        match self {
            Self::Rest(rest) => rest.fetch(key).await,
            Self::Offline(memory) => memory.fetch(key).await,
        }
    }

    async fn persist(&self, key: &str, document: &Value) -> Result<(), Error> {
        match self {
            Self::Rest(rest) => rest.persist(key, document).await,
            Self::Offline(memory) => memory.persist(key, document).await,
        }
    }

    fn subscribe(&self, key: &str) -> DocumentSubscription {
        match self {
            Self::Rest(rest) => rest.subscribe(key),
            Self::Offline(memory) => memory.subscribe(key),
        }
    }
}
