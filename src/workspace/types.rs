use crate::enrollment::LocationDefaults;
use serde::{Deserialize, Serialize};

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_draft_debounce_ms() -> u64 {
    400
}

/// Workspace config stored in `state/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub schema_version: u32,
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_draft_debounce_ms")]
    pub draft_debounce_ms: u64,
    #[serde(default)]
    pub location_defaults: LocationDefaults,
}

/// One submit or save-draft attempt that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub schema_version: u32,
    pub recorded_at_epoch_ms: u128,
    pub applicant_id: String,
    pub kind: String,
    pub outcome: String,
    pub success: bool,
    pub message: Option<String>,
    pub elapsed_ms: u128,
}
