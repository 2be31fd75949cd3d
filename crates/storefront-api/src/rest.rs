// Document store HTTP client
//
// Wraps `reqwest::Client` with tenant-scoped URL construction and the
// `{ "data": ... }` envelope. Live subscriptions go over the WebSocket
// feed in `crate::feed`, derived from the same document URL.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::backend::{DocumentBackend, DocumentSubscription, FEED_CHANNEL_CAPACITY, FeedEvent};
use crate::error::Error;
use crate::feed::{ReconnectConfig, feed_loop};
use crate::transport::TransportConfig;

/// Body shape for both reads and writes.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP + WebSocket accessor for a tenant's configuration documents.
///
/// Documents live at `{base}/tenants/{tenant}/documents/{key}`; the live
/// feed for a document is the same path with `/live` appended over
/// `ws`/`wss`.
pub struct RestBackend {
    http: reqwest::Client,
    base_url: Url,
    tenant: String,
    token: Option<SecretString>,
    reconnect: ReconnectConfig,
}

impl RestBackend {
    /// Create a backend from a `TransportConfig`.
    pub fn new(base_url: Url, tenant: impl Into<String>, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            tenant: tenant.into(),
            token: transport.token.clone(),
            reconnect: ReconnectConfig::default(),
        })
    }

    /// Create a backend with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, tenant: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            tenant: tenant.into(),
            token: None,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Override the live feed's reconnect policy.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// The tenant whose documents this backend reads.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// The store base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of one document.
    pub fn document_url(&self, key: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["tenants", self.tenant.as_str(), "documents", key]);
        Ok(url)
    }

    /// WebSocket URL of one document's live feed.
    pub fn live_url(&self, key: &str) -> Result<Url, Error> {
        let mut url = self.document_url(key)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::InvalidUrl(url::ParseError::InvalidDomainCharacter))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push("live");
        Ok(url)
    }

    async fn status_error(resp: reqwest::Response) -> Error {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Error::Unauthorized;
        }
        let message = resp.text().await.unwrap_or_default();
        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl DocumentBackend for RestBackend {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, Error> {
        let url = self.document_url(key)?;
        debug!(%url, "fetching document");

        let resp = self.http.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(key, "document not found");
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::status_error(resp).await);
        }

        let body = resp.text().await?;
        trace!(key, bytes = body.len(), "document body received");
        let envelope: Envelope<Value> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        Ok(match envelope.data {
            Value::Null => None,
            doc => Some(doc),
        })
    }

    async fn persist(&self, key: &str, document: &Value) -> Result<(), Error> {
        let url = self.document_url(key)?;
        debug!(%url, "persisting document");

        let resp = self
            .http
            .put(url)
            .json(&Envelope { data: document })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::status_error(resp).await);
        }
        Ok(())
    }

    fn subscribe(&self, key: &str) -> DocumentSubscription {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        match self.live_url(key) {
            Ok(url) => {
                tokio::spawn(feed_loop(
                    url,
                    self.token.clone(),
                    self.reconnect.clone(),
                    tx,
                    cancel.clone(),
                ));
            }
            Err(e) => {
                let _ = tx.try_send(FeedEvent::Error(e.to_string()));
            }
        }

        DocumentSubscription::new(key, rx, cancel)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RestBackend {
        RestBackend::with_client(reqwest::Client::new(), Url::parse(base).unwrap(), "acme")
    }

    #[test]
    fn document_url_is_tenant_scoped() {
        let b = backend("https://store.example.com/api/");
        assert_eq!(
            b.document_url("theme").unwrap().as_str(),
            "https://store.example.com/api/tenants/acme/documents/theme"
        );
    }

    #[test]
    fn live_url_swaps_scheme() {
        let secure = backend("https://store.example.com");
        assert_eq!(
            secure.live_url("heroes").unwrap().as_str(),
            "wss://store.example.com/tenants/acme/documents/heroes/live"
        );

        let plain = backend("http://127.0.0.1:8080");
        assert_eq!(
            plain.live_url("heroes").unwrap().as_str(),
            "ws://127.0.0.1:8080/tenants/acme/documents/heroes/live"
        );
    }
}
