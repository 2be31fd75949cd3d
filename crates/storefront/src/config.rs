//! Session resolution: settings file + global flags → a ready `Storefront`.
//!
//! This is the single boundary where CLI flags cross into core types.

use std::sync::Arc;

use secrecy::SecretString;

use storefront_config::{Profile, Settings};
use storefront_core::{
    ConfigCache, FileCache, MemoryBackend, NoCache, RestBackend, Storefront,
};

use crate::backend::StoreBackend;
use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Tenant used offline when neither a profile nor `--tenant` names one.
const OFFLINE_TENANT: &str = "default";

pub type Session = Storefront<StoreBackend>;

/// Load settings from file + environment.
pub fn load_settings() -> Result<Settings, CliError> {
    Ok(storefront_config::load_settings()?)
}

/// Resolve the active profile name from CLI flags and settings.
pub fn active_profile_name(global: &GlobalOpts, settings: &Settings) -> String {
    settings.profile_name(global.profile.as_deref()).to_owned()
}

/// Pick the profile to use, synthesizing one from `--store`/`--tenant`
/// when the settings file has none.
fn select_profile(global: &GlobalOpts, settings: &Settings) -> Result<Profile, CliError> {
    let name = active_profile_name(global, settings);
    if let Some(profile) = settings.profiles.get(&name) {
        return Ok(profile.clone());
    }

    if global.store.is_some() || global.offline {
        return Ok(Profile {
            store_url: global.store.clone().unwrap_or_default(),
            tenant: global.tenant.clone().unwrap_or_else(|| OFFLINE_TENANT.into()),
            ..Profile::default()
        });
    }

    if global.profile.is_some() {
        let available: Vec<&str> = settings.profiles.keys().map(String::as_str).collect();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    Err(CliError::NoConfig {
        path: storefront_config::settings_path().display().to_string(),
    })
}

/// Apply flag overrides (flag > env > profile) on top of a profile.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref store) = global.store {
        profile.store_url.clone_from(store);
    }
    if let Some(ref tenant) = global.tenant {
        profile.tenant.clone_from(tenant);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile
}

/// Build the storefront for this invocation. Nothing is fetched yet.
pub fn resolve_session(global: &GlobalOpts, settings: &Settings) -> Result<Session, CliError> {
    let profile = apply_overrides(select_profile(global, settings)?, global);
    let storefront_settings = storefront_config::profile_to_storefront_settings(&profile, settings)?;

    let backend = if global.offline {
        StoreBackend::Offline(MemoryBackend::new())
    } else {
        let url = storefront_config::store_url(&profile)?;
        let mut transport = storefront_config::transport_config(&profile, settings);
        if let Some(ref token) = global.token {
            transport.token = Some(SecretString::from(token.clone()));
        }
        StoreBackend::Rest(RestBackend::new(url, storefront_settings.tenant.clone(), &transport)?)
    };

    let cache = build_cache(global, settings);
    let storefront_settings = storefront_settings.persist_defaults(!backend.is_offline());

    tracing::debug!(
        tenant = %storefront_settings.tenant,
        offline = global.offline,
        documents = storefront_settings.documents.len(),
        "resolved session"
    );
    Ok(Storefront::new(storefront_settings, backend, cache))
}

fn build_cache(global: &GlobalOpts, settings: &Settings) -> Arc<dyn ConfigCache> {
    if global.no_cache || !settings.cache.enabled {
        Arc::new(NoCache)
    } else {
        Arc::new(FileCache::new(storefront_config::cache_dir(settings)))
    }
}
