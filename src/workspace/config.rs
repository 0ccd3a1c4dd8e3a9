//! Client configuration helpers.
//!
//! The config file is optional; commands fall back to defaults so a fresh
//! workspace works before `init` has run.
use super::types::{default_draft_debounce_ms, default_timeout_secs};
use super::{ClientConfig, WorkspacePaths, API_URL_ENV, CONFIG_SCHEMA_VERSION};
use crate::enrollment::LocationDefaults;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const MAX_DRAFT_DEBOUNCE_MS: u64 = 60_000;

/// Build the default config written by `init`.
pub fn default_config() -> ClientConfig {
    ClientConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        api_base_url: DEFAULT_API_BASE_URL.to_string(),
        timeout_secs: default_timeout_secs(),
        draft_debounce_ms: default_draft_debounce_ms(),
        location_defaults: LocationDefaults::default(),
    }
}

/// Load the config from `state/config.json`.
pub fn load_config(workspace_root: &Path) -> Result<ClientConfig> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    let path = paths.config_path();
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: ClientConfig = serde_json::from_slice(&bytes).context("parse client config JSON")?;
    Ok(config)
}

/// Load the config if present, otherwise return the defaults.
pub fn load_config_or_default(workspace_root: &Path) -> Result<ClientConfig> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    if !paths.config_path().is_file() {
        return Ok(default_config());
    }
    load_config(workspace_root)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(workspace_root: &Path, config: &ClientConfig) -> Result<()> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    let path = paths.config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create state dir")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize client config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Apply environment overrides; `lookup` is `std::env::var` outside tests.
pub fn with_env_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
        config.api_base_url = url.trim().to_string();
    }
    config
}

/// Validate schema version and user-editable values.
pub fn validate_config(config: &ClientConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported client config schema_version {}",
            config.schema_version
        ));
    }
    let url = config.api_base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!(
            "api_base_url must start with http:// or https:// (got {url:?})"
        ));
    }
    if config.timeout_secs == 0 {
        return Err(anyhow!("timeout_secs must be greater than 0"));
    }
    if config.draft_debounce_ms > MAX_DRAFT_DEBOUNCE_MS {
        return Err(anyhow!(
            "draft_debounce_ms must be at most {MAX_DRAFT_DEBOUNCE_MS} (got {})",
            config.draft_debounce_ms
        ));
    }
    let defaults = &config.location_defaults;
    for (label, value) in [
        ("municipality", &defaults.municipality),
        ("province", &defaults.province),
        ("region", &defaults.region),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("location_defaults.{label} must be non-empty"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
