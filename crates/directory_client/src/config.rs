use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "directory.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub store_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_url: None,
            api_key: None,
            request_timeout_secs: 15,
        }
    }
}

/// A checked store location and credential, ready to build a client handle from.
#[derive(Debug, Clone)]
pub struct StoreEndpoint {
    pub base_url: Url,
    pub api_key: String,
    pub request_timeout: Duration,
}

pub fn load_settings() -> anyhow::Result<StoreSettings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values override defaults; environment values override the file.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<StoreSettings> {
    let mut settings = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        toml::from_str::<StoreSettings>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?
    } else {
        StoreSettings::default()
    };

    if let Some(v) = env("SUPABASE_URL") {
        settings.store_url = Some(v);
    }
    if let Some(v) = env("DIRECTORY_STORE_URL") {
        settings.store_url = Some(v);
    }

    if let Some(v) = env("SUPABASE_ANON_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = env("DIRECTORY_STORE_KEY") {
        settings.api_key = Some(v);
    }

    if let Some(v) = env("DIRECTORY_REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    Ok(settings)
}

impl StoreSettings {
    pub fn validate(&self) -> anyhow::Result<StoreEndpoint> {
        let raw_url = self
            .store_url
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("missing store url (set DIRECTORY_STORE_URL or store_url)"))?;
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("missing store api key (set DIRECTORY_STORE_KEY or api_key)"))?;

        let mut base_url =
            Url::parse(raw_url).with_context(|| format!("invalid store url '{raw_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("store url '{raw_url}' cannot be used as a base url"));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(StoreEndpoint {
            base_url,
            api_key: api_key.to_string(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        })
    }
}
