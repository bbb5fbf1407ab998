//! Append-only record of session interceptions.

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Event written after every trigger in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub query: String,
    #[serde(rename = "history_snippet")]
    pub history: String,
}

impl ShellEvent {
    pub fn session_interception(query: impl Into<String>, history: impl Into<String>) -> Self {
        Self {
            kind: "session_interception".to_string(),
            query: query.into(),
            history: history.into(),
        }
    }
}

/// Destination for [`ShellEvent`]s. Callers treat failures as non-fatal.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &ShellEvent) -> Result<()>;
}

/// One JSON object per line, appended under an exclusive file lock.
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every event back, skipping lines that are not shell events.
    pub fn read_all(&self) -> Result<Vec<ShellEvent>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read history: {}", self.path.display()));
            }
        };

        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

impl EventSink for JsonlHistory {
    fn record(&self, event: &ShellEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let mut line = serde_json::to_string(event).context("Failed to serialize event")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history: {}", self.path.display()))?;

        file.lock_exclusive()
            .with_context(|| "Failed to acquire history lock")?;
        let result = file
            .write_all(line.as_bytes())
            .with_context(|| "Failed to append history event");
        let _ = FileExt::unlock(&file);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_appends_lines() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlHistory::new(dir.path().join("nested").join("history.jsonl"));

        sink.record(&ShellEvent::session_interception("why?", "Command: ls"))
            .unwrap();
        sink.record(&ShellEvent::session_interception("again", ""))
            .unwrap();

        let events = sink.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].query, "why?");
        assert_eq!(events[1].kind, "session_interception");
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_value(ShellEvent::session_interception("q", "h")).unwrap();
        assert_eq!(json["type"], "session_interception");
        assert_eq!(json["query"], "q");
        assert_eq!(json["history_snippet"], "h");
    }

    #[test]
    fn test_read_all_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlHistory::new(dir.path().join("none.jsonl"));
        assert!(sink.read_all().unwrap().is_empty());
    }
}
