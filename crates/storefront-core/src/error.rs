// ── Core error types ──
//
// User-facing errors from storefront-core. Consumers never see HTTP status
// codes or WebSocket failures directly: the `From<storefront_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::document::DocumentKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote store ─────────────────────────────────────────────────
    #[error("Document store unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("Document store timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Document store rejected the request: {message}")]
    Rejected {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Access to the document store was denied")]
    Unauthorized,

    #[error("Malformed document from store: {message}")]
    MalformedDocument { message: String },

    // ── Documents ────────────────────────────────────────────────────
    #[error("Document '{kind}' is not managed by this storefront")]
    UnmanagedDocument { kind: DocumentKind },

    #[error("Unknown document '{name}'")]
    UnknownDocument { name: String },

    // ── Local cache ──────────────────────────────────────────────────
    #[error("Cache I/O failed: {0}")]
    Cache(#[from] std::io::Error),

    // ── Rotation ─────────────────────────────────────────────────────
    #[error("Rotation driver has shut down")]
    RotationClosed,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the failure is worth surfacing as a degraded (retryable) state
    /// rather than a hard failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable { .. } | Self::Timeout { .. } | Self::Rejected { status: Some(500..), .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<storefront_api::Error> for CoreError {
    fn from(err: storefront_api::Error) -> Self {
        use storefront_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::RemoteUnavailable {
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::RemoteUnavailable {
                reason: format!("invalid store URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::RemoteUnavailable {
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Http { status, message } => CoreError::Rejected {
                message,
                status: Some(status),
            },
            ApiError::Unauthorized => CoreError::Unauthorized,
            ApiError::WebSocketConnect(reason) => CoreError::RemoteUnavailable {
                reason: format!("live feed connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::RemoteUnavailable {
                reason: format!("live feed closed (code {code}): {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::MalformedDocument { message }
            }
            ApiError::Simulated(reason) => CoreError::RemoteUnavailable { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_map_to_rejected() {
        let err: CoreError = storefront_api::Error::Http {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Rejected { status: Some(502), .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn client_rejections_are_not_recoverable() {
        let err: CoreError = storefront_api::Error::Http {
            status: 400,
            message: "bad request".into(),
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(!CoreError::Unauthorized.is_recoverable());
    }

    #[test]
    fn deserialization_maps_to_malformed_document() {
        let err: CoreError = storefront_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }
        .into();
        assert!(matches!(err, CoreError::MalformedDocument { .. }));
    }
}
