//! Typed paths into a workspace layout.
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `state/` directory path.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    /// Return the `state/config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join("config.json")
    }

    /// Directory holding one JSON file per storage slot.
    pub fn slots_dir(&self) -> PathBuf {
        self.state_dir().join("slots")
    }

    /// Return the `state/history.jsonl` path.
    pub fn history_path(&self) -> PathBuf {
        self.state_dir().join("history.jsonl")
    }
}
