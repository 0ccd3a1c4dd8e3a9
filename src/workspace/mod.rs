//! Client-owned workspace: config, storage slots, and submission history.
//!
//! Everything the CLI persists lives under one workspace root so a run can be
//! inspected or thrown away as a unit.
/// Current schema version for `state/config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Current schema version for `state/history.jsonl`.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

/// Overrides `api_base_url` from the config file.
pub const API_URL_ENV: &str = "RSBSA_API_URL";
/// Overrides the bearer token stored in the auth session.
pub const API_TOKEN_ENV: &str = "RSBSA_API_TOKEN";

mod config;
mod history;
mod paths;
mod types;

pub use config::{
    default_config, load_config, load_config_or_default, validate_config, with_env_overrides,
    write_config,
};
pub use history::{append_history, read_history};
pub use paths::WorkspacePaths;
pub use types::*;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, or zero if the clock is before it.
pub fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
