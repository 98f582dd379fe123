//! Append-only change feed written after each publish.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Event name recorded when the documentation site was republished.
pub const DOCS_UPDATED: &str = "docs_updated";

/// One line of the change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFeedRecord {
    /// RFC 3339 timestamp of the event.
    pub timestamp: String,
    /// Identifier of the agent that produced the event.
    pub source: String,
    /// Event kind.
    pub event: String,
    /// Human-readable message.
    pub message: String,
}

impl ChangeFeedRecord {
    /// Record a `docs_updated` event.
    pub fn docs_updated(
        timestamp: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            source: source.into(),
            event: DOCS_UPDATED.to_string(),
            message: message.into(),
        }
    }
}

/// Append a record to a JSON-lines feed, creating the file and its parents.
pub fn append_record(path: &Path, record: &ChangeFeedRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Read every record from a feed file.
pub fn read_records(path: &Path) -> Result<Vec<ChangeFeedRecord>> {
    let contents = std::fs::read_to_string(path)?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}
