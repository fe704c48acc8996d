//! JSONL activity log: one self-contained JSON object per line.
//!
//! Optional companion to the text log for tooling that wants to follow what a
//! sync did without parsing prose. Rotation and degradation are handled by
//! [`RotatingFile`]; a line that fails to serialize is reported on stderr and
//! dropped.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logger::rotating::{RotatingFile, RotationConfig};
use crate::logger::stats::StatsSnapshot;

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Event types in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SyncStart,
    SyncStop,
    FileCreate,
    FileUpdate,
    DirCreate,
    FileDelete,
    DirDelete,
    ActionFailed,
    PassComplete,
    StartupError,
}

/// A single JSONL log entry. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with milliseconds.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Source-side path of the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Replica-side path of the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries_visited: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// RSY error code if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            source: None,
            replica: None,
            dry_run: None,
            stats: None,
            entries_visited: None,
            failures: None,
            duration_ms: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Append-only JSONL log writer.
pub struct JsonlWriter {
    sink: RotatingFile,
}

impl JsonlWriter {
    pub fn open(config: JsonlConfig) -> Self {
        let sink = RotatingFile::open(
            RotationConfig {
                path: config.path,
                max_size_bytes: config.max_size_bytes,
                max_rotated_files: config.max_rotated_files,
            },
            "[RSY-JSONL]",
        );
        Self { sink }
    }

    /// Write a single log entry as one JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.sink.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[RSY-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        self.sink.flush();
    }

    /// Current degradation state.
    pub fn state(&self) -> &'static str {
        self.sink.state()
    }

    pub fn try_recover(&mut self) {
        self.sink.try_recover();
    }
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::stats::ChangeStats;
    use crate::sync::detector::ActionKind;
    use std::fs;
    use std::path::Path;

    fn open_writer(path: &Path) -> JsonlWriter {
        JsonlWriter::open(JsonlConfig {
            path: path.to_path_buf(),
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 3,
        })
    }

    #[test]
    fn write_entry_produces_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut writer = open_writer(&path);

        writer.write_entry(&LogEntry::new(EventType::SyncStart, Severity::Info));
        let mut failed = LogEntry::new(EventType::ActionFailed, Severity::Error);
        failed.replica = Some("/rep/a.txt".to_string());
        failed.error_code = Some("RSY-3001".to_string());
        writer.write_entry(&failed);
        writer.flush();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "sync_start");
        assert_eq!(lines[0]["severity"], "info");
        assert_eq!(lines[1]["event"], "action_failed");
        assert_eq!(lines[1]["error_code"], "RSY-3001");
        assert_eq!(writer.state(), "normal");
    }

    #[test]
    fn optional_fields_omitted_when_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.jsonl");
        let mut writer = open_writer(&path);

        writer.write_entry(&LogEntry::new(EventType::SyncStop, Severity::Info));
        writer.flush();

        let line = fs::read_to_string(&path).unwrap();
        assert!(!line.contains("\"source\""));
        assert!(!line.contains("\"stats\""));
        assert!(!line.contains("\"error_code\""));
    }

    #[test]
    fn pass_entry_embeds_stats_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pass.jsonl");
        let mut writer = open_writer(&path);

        let mut stats = ChangeStats::new();
        stats.record(ActionKind::CreateFile);
        let mut entry = LogEntry::new(EventType::PassComplete, Severity::Info);
        entry.stats = Some(stats.drain());
        entry.entries_visited = Some(3);
        writer.write_entry(&entry);
        writer.flush();

        let parsed: serde_json::Value =
            serde_json::from_str(fs::read_to_string(&path).unwrap().trim()).unwrap();
        assert_eq!(parsed["stats"]["created"], 1);
        assert_eq!(parsed["stats"]["dir-deleted"], 0);
        assert_eq!(parsed["entries_visited"], 3);
    }
}
