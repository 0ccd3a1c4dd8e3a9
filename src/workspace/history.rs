//! Append-only ledger of submission attempts.
use super::{SubmissionRecord, WorkspacePaths};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Append a record as JSONL.
pub fn append_history(workspace_root: &Path, record: &SubmissionRecord) -> Result<()> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    let path = paths.history_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create state dir")?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(record).context("serialize submission record")?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Read every record; a missing ledger is empty.
pub fn read_history(workspace_root: &Path) -> Result<Vec<SubmissionRecord>> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    let path = paths.history_path();
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text =
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), index + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::HISTORY_SCHEMA_VERSION;

    fn record(outcome: &str, success: bool) -> SubmissionRecord {
        SubmissionRecord {
            schema_version: HISTORY_SCHEMA_VERSION,
            recorded_at_epoch_ms: 1_700_000_000_000,
            applicant_id: "42".to_string(),
            kind: "submit".to_string(),
            outcome: outcome.to_string(),
            success,
            message: None,
            elapsed_ms: 12,
        }
    }

    #[test]
    fn records_append_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(read_history(dir.path()).expect("empty history").is_empty());

        append_history(dir.path(), &record("failed", false)).expect("append first");
        append_history(dir.path(), &record("submitted", true)).expect("append second");

        let history = read_history(dir.path()).expect("read history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].outcome, "failed");
        assert!(history[1].success);
    }
}
