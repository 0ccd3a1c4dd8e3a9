//! Local draft persistence: slot encoding and the debounced writer.
use super::merge::overlay;
use super::types::EnrollmentDraft;
use crate::storage::{SessionStore, StorageError, DRAFT_KEY};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Current schema version for the stored draft slot.
pub const DRAFT_SCHEMA_VERSION: u32 = 1;
/// Quiet period before a pending draft is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Why a stored draft could not be used. Callers treat every variant as "no draft".
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("read stored draft: {0}")]
    Storage(#[from] StorageError),
    #[error("stored draft is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported stored draft schema_version {0}")]
    SchemaVersion(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDraft {
    pub schema_version: u32,
    pub saved_at_epoch_ms: u128,
    pub draft: serde_json::Value,
}

/// Serialize a draft into the slot format.
pub fn encode_draft(draft: &EnrollmentDraft) -> Result<String, serde_json::Error> {
    let stored = StoredDraft {
        schema_version: DRAFT_SCHEMA_VERSION,
        saved_at_epoch_ms: now_epoch_ms(),
        draft: serde_json::to_value(draft)?,
    };
    serde_json::to_string(&stored)
}

/// Decode a slot and fold it onto `base`, keeping base values the slot lacks.
pub fn decode_draft(raw: &str, base: &EnrollmentDraft) -> Result<EnrollmentDraft, ParseError> {
    let stored: StoredDraft = serde_json::from_str(raw)?;
    if stored.schema_version != DRAFT_SCHEMA_VERSION {
        return Err(ParseError::SchemaVersion(stored.schema_version));
    }
    let mut merged = serde_json::to_value(base)?;
    overlay(&mut merged, &stored.draft);
    Ok(serde_json::from_value(merged)?)
}

/// Read the draft slot. `Ok(None)` when nothing is stored.
pub fn load_stored_draft<S: SessionStore>(
    store: &S,
    base: &EnrollmentDraft,
) -> Result<Option<EnrollmentDraft>, ParseError> {
    let Some(raw) = store.get(DRAFT_KEY)? else {
        return Ok(None);
    };
    decode_draft(&raw, base).map(Some)
}

fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// Outcome of the one-time startup restore.
#[derive(Debug)]
pub enum DraftRestore {
    Restored,
    Absent,
    /// Stored data was unusable and has been ignored.
    Discarded(ParseError),
    /// A restore already ran for this session.
    AlreadyAttempted,
}

impl DraftRestore {
    pub fn label(&self) -> &'static str {
        match self {
            DraftRestore::Restored => "restored",
            DraftRestore::Absent => "absent",
            DraftRestore::Discarded(_) => "discarded",
            DraftRestore::AlreadyAttempted => "already_attempted",
        }
    }
}

/// Single pending-write timer; each change pushes the deadline out.
#[derive(Debug, Clone)]
pub struct DebouncedWriter {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebouncedWriter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending write if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending write regardless of time.
    pub fn take_pending(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for DebouncedWriter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
