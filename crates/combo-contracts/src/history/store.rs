use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::record::HistoryRecord;

/// Whole-file history store: read once at the start of a run, rewritten in full
/// at the end of a run that accepted at least one entry.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing or blank file is an empty history. Anything unreadable is an
    /// error, since a later rewrite would otherwise discard it.
    pub fn load(&self) -> anyhow::Result<Vec<HistoryRecord>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed reading history {}", self.path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("history {} is not a record array", self.path.display()))
    }

    pub fn save(&self, records: &[HistoryRecord]) -> anyhow::Result<()> {
        write_records_atomic(&self.path, records)
    }
}

/// Writes exactly the entries accepted by one run.
pub fn write_run_output(path: &Path, records: &[HistoryRecord]) -> anyhow::Result<()> {
    write_records_atomic(path, records)
}

fn write_records_atomic(path: &Path, records: &[HistoryRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, serde_json::to_string_pretty(records)?)
        .with_context(|| format!("failed writing {}", staging.display()))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}
