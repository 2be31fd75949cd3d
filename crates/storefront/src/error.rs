//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and settings errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use storefront_config::ConfigError;
use storefront_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the document store: {reason}")]
    #[diagnostic(
        code(storefront::connection_failed),
        help(
            "Check the store URL and your network connection.\n\
             Use --offline to work from defaults and the local cache."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("The document store rejected the token")]
    #[diagnostic(
        code(storefront::auth_failed),
        help(
            "Check the store token.\n\
             Set it with --token, STOREFRONT_TOKEN, or token_env in the profile."
        )
    )]
    AuthFailed,

    #[error("Document store error: {message}")]
    #[diagnostic(code(storefront::store_error))]
    StoreError { message: String, status: Option<u16> },

    #[error("Document store returned a malformed document: {message}")]
    #[diagnostic(code(storefront::malformed_document))]
    MalformedDocument { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(storefront::not_found), help("{hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(storefront::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid JSON in {path}")]
    #[diagnostic(code(storefront::json), help("Check the JSON file contents and try again."))]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in settings")]
    #[diagnostic(
        code(storefront::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: storefront config init --store-url <URL> --tenant-id <TENANT>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No document store configured")]
    #[diagnostic(
        code(storefront::no_config),
        help(
            "Create a profile with: storefront config init --store-url <URL> --tenant-id <TENANT>\n\
             Or pass --store and --tenant, or use --offline.\n\
             Settings file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(storefront::config))]
    Config(Box<figment::Error>),

    #[error("Profile '{name}' already exists")]
    #[diagnostic(code(storefront::profile_exists), help("Pass --force to replace it."))]
    ProfileExists { name: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(storefront::timeout),
        help("Increase the timeout with --timeout or check the store's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(storefront::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(storefront::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::StoreError { status: Some(500..), .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidJson { .. }
            | Self::NoConfig { .. }
            | Self::ProfileExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RemoteUnavailable { reason } => CliError::ConnectionFailed { reason },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Rejected { message, status } => CliError::StoreError { message, status },
            CoreError::Unauthorized => CliError::AuthFailed,
            CoreError::MalformedDocument { message } => CliError::MalformedDocument { message },
            CoreError::UnmanagedDocument { kind } => CliError::NotFound {
                resource_type: "document".into(),
                identifier: kind.to_string(),
                hint: "The active profile does not manage this document; check its `documents` list.".into(),
            },
            CoreError::UnknownDocument { name } => CliError::NotFound {
                resource_type: "document".into(),
                identifier: name,
                hint: "Run: storefront defaults to see available documents".into(),
            },
            CoreError::Cache(e) => CliError::Io(e),
            CoreError::RotationClosed => CliError::Internal("rotation stopped unexpectedly".into()),
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<storefront_api::Error> for CliError {
    fn from(err: storefront_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::MissingProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::Serialization(e) => CliError::Internal(format!("failed to serialize settings: {e}")),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
