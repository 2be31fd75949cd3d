//! Shared settings for storefront tools.
//!
//! TOML profiles, token resolution (env + plaintext), and translation to
//! `storefront_core::StorefrontSettings` and the accessor's
//! `TransportConfig`. The CLI adds flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_api::{TlsMode, TransportConfig};
use storefront_core::{
    Breakpoint, DocumentKind, ResolvedTiming, RotationSettings, StorefrontSettings,
};

/// Environment variable consulted when a profile names no token variable.
pub const TOKEN_ENV: &str = "STOREFRONT_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    MissingProfile { profile: String },

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML settings structs ───────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub rotation: RotationDefaults,

    /// Named store profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            cache: CacheSettings::default(),
            rotation: RotationDefaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Profile to use: the explicit name, else `default_profile`, else "default".
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| ConfigError::MissingProfile {
            profile: name.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Local fallback cache.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override the platform cache directory.
    pub dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Global rotation defaults; decks and slides override them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RotationDefaults {
    pub interval_secs: f64,
    pub typing_speed_ms: u64,
    pub hold_ms: u64,
    pub fade_out_ms: u64,
    pub swipe_threshold: f64,
    pub breakpoint: String,
}

impl Default for RotationDefaults {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            typing_speed_ms: 80,
            hold_ms: 2000,
            fade_out_ms: 500,
            swipe_threshold: 50.0,
            breakpoint: "desktop".into(),
        }
    }
}

/// A named store profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Document store base URL (e.g., "https://config.example.com/v1").
    pub store_url: String,

    /// Tenant identifier.
    pub tenant: String,

    /// Bearer token (plaintext; prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Documents to manage; all when unset.
    pub documents: Option<Vec<String>>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "storefront", "storefront")
}

/// Resolve the settings file path via XDG / platform conventions.
pub fn settings_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory of the local fallback cache.
pub fn cache_dir(settings: &Settings) -> PathBuf {
    if let Some(ref dir) = settings.cache.dir {
        return dir.clone();
    }
    project_dirs().map_or_else(|| dirs_fallback(".cache"), |dirs| dirs.cache_dir().to_path_buf())
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("storefront");
    p
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load settings from the canonical path + environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_path())
}

/// Load settings from `path` + environment. A missing file yields defaults.
///
/// Environment keys use `__` for nesting, e.g. `STOREFRONT_DEFAULTS__OUTPUT`.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STOREFRONT_").split("__"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Write settings to the canonical path.
pub fn save_settings(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = settings_path();
    save_settings_to(&path, settings)?;
    Ok(path)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the store token: `token_env` → `STOREFRONT_TOKEN` → plaintext.
pub fn resolve_token(profile: &Profile) -> Option<SecretString> {
    resolve_token_with(profile, |name| std::env::var(name).ok())
}

/// [`resolve_token`] with an injectable environment lookup.
pub fn resolve_token_with(
    profile: &Profile,
    env: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    if let Some(value) = profile.token_env.as_deref().and_then(&env) {
        return Some(SecretString::from(value));
    }
    if let Some(value) = env(TOKEN_ENV) {
        return Some(SecretString::from(value));
    }
    profile.token.clone().map(SecretString::from)
}

// ── Translation into runtime types ──────────────────────────────────

/// Parse and validate a profile's store URL.
pub fn store_url(profile: &Profile) -> Result<url::Url, ConfigError> {
    profile
        .store_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "store_url".into(),
            reason: format!("invalid URL: {}", profile.store_url),
        })
}

/// Transport settings for the REST accessor.
pub fn transport_config(profile: &Profile, settings: &Settings) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(settings.defaults.timeout)),
        token: resolve_token(profile),
    }
}

/// Validate rotation defaults and convert them into core settings.
pub fn rotation_settings(rotation: &RotationDefaults) -> Result<RotationSettings, ConfigError> {
    let rotation_interval = Duration::try_from_secs_f64(rotation.interval_secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ConfigError::Validation {
            field: "rotation.interval_secs".into(),
            reason: format!("must be a positive number, got {}", rotation.interval_secs),
        })?;

    for (field, value) in [
        ("rotation.typing_speed_ms", rotation.typing_speed_ms),
        ("rotation.hold_ms", rotation.hold_ms),
        ("rotation.fade_out_ms", rotation.fade_out_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation {
                field: field.into(),
                reason: "must be greater than zero".into(),
            });
        }
    }

    if !rotation.swipe_threshold.is_finite() || rotation.swipe_threshold < 0.0 {
        return Err(ConfigError::Validation {
            field: "rotation.swipe_threshold".into(),
            reason: format!("must be a non-negative number, got {}", rotation.swipe_threshold),
        });
    }

    let breakpoint = Breakpoint::from_str(&rotation.breakpoint).map_err(|_| ConfigError::Validation {
        field: "rotation.breakpoint".into(),
        reason: format!("expected mobile, tablet, or desktop, got '{}'", rotation.breakpoint),
    })?;

    Ok(RotationSettings {
        timing: ResolvedTiming {
            rotation_interval,
            typing_speed: Duration::from_millis(rotation.typing_speed_ms),
            hold: Duration::from_millis(rotation.hold_ms),
            fade_out: Duration::from_millis(rotation.fade_out_ms),
            ..ResolvedTiming::default()
        },
        swipe_threshold: rotation.swipe_threshold,
        breakpoint,
    })
}

/// Build `StorefrontSettings` from a profile, without CLI overrides.
pub fn profile_to_storefront_settings(
    profile: &Profile,
    settings: &Settings,
) -> Result<StorefrontSettings, ConfigError> {
    let tenant = profile.tenant.trim();
    if tenant.is_empty() {
        return Err(ConfigError::Validation {
            field: "tenant".into(),
            reason: "must not be empty".into(),
        });
    }

    let documents = match profile.documents {
        Some(ref names) => parse_documents(names)?,
        None => DocumentKind::all(),
    };

    Ok(StorefrontSettings::new(tenant)
        .with_documents(documents)
        .with_rotation(rotation_settings(&settings.rotation)?))
}

/// Parse document names, rejecting unknown ones.
pub fn parse_documents(names: &[String]) -> Result<Vec<DocumentKind>, ConfigError> {
    names
        .iter()
        .map(|name| {
            DocumentKind::from_str(name).map_err(|_| ConfigError::Validation {
                field: "documents".into(),
                reason: format!("unknown document '{name}'"),
            })
        })
        .collect()
}
