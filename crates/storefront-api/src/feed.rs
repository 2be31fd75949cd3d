//! Live document feed over WebSocket with auto-reconnect.
//!
//! Connects to the store's `/live` endpoint for one document and forwards
//! every snapshot frame into the owning [`DocumentSubscription`]'s channel.
//! Handles reconnection with exponential backoff + jitter automatically;
//! the subscriber only ever sees [`FeedEvent`]s.
//!
//! Wire format, one JSON text frame per change:
//!
//! ```json
//! { "event": "snapshot", "data": { "brand": "#fff" } }
//! { "event": "snapshot", "data": null }
//! { "event": "error", "data": "quota exceeded" }
//! ```
//!
//! [`DocumentSubscription`]: crate::DocumentSubscription

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::backend::FeedEvent;
use crate::error::Error;

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// First retry delay (1s).
    pub initial_delay: Duration,
    /// Ceiling for the doubled delay (30s).
    pub max_delay: Duration,
    /// Give up after this many consecutive failures; unlimited when unset.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

/// How a single connection ended without an error.
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// Server closed or the stream ended; reconnect.
    Disconnected,
    /// Nobody is listening any more; stop for good.
    SubscriberGone,
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
pub(crate) async fn feed_loop(
    url: Url,
    token: Option<SecretString>,
    reconnect: ReconnectConfig,
    events: mpsc::Sender<FeedEvent>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, token.as_ref(), &events, &cancel) => {
                match result {
                    Ok(ReadOutcome::SubscriberGone) => break,
                    // Clean disconnect: reset the attempt counter and reconnect immediately.
                    Ok(ReadOutcome::Disconnected) => {
                        tracing::info!(%url, "document feed disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "document feed error");
                        if events.send(FeedEvent::Error(e.to_string())).await.is_err() {
                            break;
                        }

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "document feed reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!(%url, "document feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection, read frames until it drops.
async fn connect_and_read(
    url: &Url,
    token: Option<&SecretString>,
    events: &mpsc::Sender<FeedEvent>,
    cancel: &CancellationToken,
) -> Result<ReadOutcome, Error> {
    tracing::info!(%url, "connecting to document feed");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = token {
        request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("document feed connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(ReadOutcome::SubscriberGone),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(event) = parse_frame(&text) {
                            if events.send(event).await.is_err() {
                                return Ok(ReadOutcome::SubscriberGone);
                            }
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(cf) = frame {
                            let code = u16::from(cf.code);
                            // 1000 is a normal close; anything else is worth a backoff.
                            if code != 1000 {
                                return Err(Error::WebSocketClosed {
                                    code,
                                    reason: cf.reason.to_string(),
                                });
                            }
                        }
                        return Ok(ReadOutcome::Disconnected);
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("document feed stream ended");
                        return Ok(ReadOutcome::Disconnected);
                    }
                    // Ping is answered by tungstenite; Binary, Pong and raw frames are ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeedFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Parse one text frame into a feed event.
///
/// Malformed frames and unknown event types are logged and skipped; they
/// never tear down the connection.
fn parse_frame(text: &str) -> Option<FeedEvent> {
    let frame: FeedFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse feed frame");
            return None;
        }
    };

    match frame.event.as_str() {
        "snapshot" => Some(FeedEvent::Snapshot(match frame.data {
            Value::Null => None,
            doc => Some(doc),
        })),
        "error" => Some(FeedEvent::Error(
            frame
                .data
                .as_str()
                .map_or_else(|| frame.data.to_string(), String::from),
        )),
        other => {
            tracing::trace!(event = other, "ignoring feed frame");
            None
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from many storefront tabs.
pub(crate) fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
