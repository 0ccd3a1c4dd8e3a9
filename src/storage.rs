//! Key-value slots for drafts, navigation state, and the auth session.
//!
//! The store is injected wherever state is persisted so nothing reaches for
//! ambient global storage; tests swap in [`MemorySessionStore`].
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Slot holding the serialized enrollment draft.
pub const DRAFT_KEY: &str = "draft";
/// Slot holding the current form step.
pub const STEP_KEY: &str = "step";
/// Slot holding the auth token and user profile snapshot.
pub const SESSION_KEY: &str = "session";
/// Slot holding the last application status reported by the backend.
pub const STATUS_KEY: &str = "status";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opaque string slots with last-writer-wins semantics.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&mut self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per slot inside a state directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                action: "read",
                path,
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            action: "create",
            path: self.dir.clone(),
            source,
        })?;
        // Write then rename so a crash never leaves a torn slot behind.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value.as_bytes()).map_err(|source| StorageError::Io {
            action: "write",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| StorageError::Io {
            action: "publish",
            path: path.clone(),
            source,
        })?;
        tracing::debug!(key, bytes = value.len(), "session slot written");
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                action: "remove",
                path,
                source,
            }),
        }
    }
}

/// In-memory slots that also count writes per key.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    slots: BTreeMap<String, String>,
    writes: BTreeMap<String, usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls observed for `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.writes.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.insert(key.to_string(), value.to_string());
        *self.writes.entry(key.to_string()).or_default() += 1;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), StorageError> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
