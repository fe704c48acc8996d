//! Activity logger: one entry point that fans each [`ActivityEvent`] out to the
//! text log and, when configured, the JSONL activity log.
//!
//! Calls are synchronous. The sync itself is single-threaded, so a line is on
//! disk before the next filesystem action starts.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::time::Duration;

use crate::core::config::LoggingConfig;
use crate::core::errors::SyncError;
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use crate::logger::stats::StatsSnapshot;
use crate::logger::text::{Level, TextLogConfig, TextLogger};
use crate::sync::detector::{ActionKind, SyncAction};

// ──────────────────── public event type ────────────────────

/// Everything worth logging during a run.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    SyncStarted {
        source: PathBuf,
        replica: PathBuf,
        /// Human description such as `5 minutes`.
        interval: String,
        dry_run: bool,
        config_hash: String,
    },
    SyncStopped {
        passes: u64,
        reason: String,
    },
    Applied {
        action: SyncAction,
        dry_run: bool,
    },
    ActionFailed {
        /// The action that failed; `None` when the failure happened while
        /// walking or inspecting rather than applying.
        action: Option<SyncAction>,
        path: Option<PathBuf>,
        code: &'static str,
        message: String,
    },
    PassCompleted {
        stats: StatsSnapshot,
        entries_visited: u64,
        failures: u64,
        duration: Duration,
    },
    StartupFailed {
        code: &'static str,
        message: String,
    },
}

impl ActivityEvent {
    /// Build an [`ActivityEvent::ActionFailed`] from an error.
    pub fn failure(action: Option<&SyncAction>, err: &SyncError) -> Self {
        Self::ActionFailed {
            action: action.cloned(),
            path: err.path().map(std::path::Path::to_path_buf),
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn startup_failure(err: &SyncError) -> Self {
        Self::StartupFailed {
            code: err.code(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::ActionFailed { .. } | Self::StartupFailed { .. } => Level::Error,
            Self::PassCompleted { failures, .. } if *failures > 0 => Level::Warning,
            _ => Level::Info,
        }
    }

    /// Text-log rendering of the event.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::SyncStarted {
                source,
                replica,
                interval,
                dry_run,
                ..
            } => {
                let mode = if *dry_run { " (dry run)" } else { "" };
                format!(
                    "Mirroring {} to {} every {interval}{mode}",
                    source.display(),
                    replica.display()
                )
            }
            Self::SyncStopped { passes, reason } => {
                format!("Stopped after {passes} pass(es): {reason}")
            }
            Self::Applied { action, dry_run } => {
                let prefix = if *dry_run { "[dry-run] " } else { "" };
                format!("{prefix}{}", applied_message(action))
            }
            Self::ActionFailed {
                action, message, ..
            } => match action {
                Some(action) => format!("{}: {message}", failed_message(action)),
                None => message.clone(),
            },
            Self::PassCompleted { stats, .. } => stats.to_string(),
            Self::StartupFailed { message, .. } => message.clone(),
        }
    }

    /// JSONL rendering of the event.
    #[must_use]
    pub fn to_log_entry(&self) -> LogEntry {
        match self {
            Self::SyncStarted {
                source,
                replica,
                interval,
                dry_run,
                config_hash,
            } => {
                let mut e = LogEntry::new(EventType::SyncStart, Severity::Info);
                e.source = Some(source.display().to_string());
                e.replica = Some(replica.display().to_string());
                e.dry_run = Some(*dry_run);
                e.details = Some(format!("interval={interval} config_hash={config_hash}"));
                e
            }
            Self::SyncStopped { passes, reason } => {
                let mut e = LogEntry::new(EventType::SyncStop, Severity::Info);
                e.details = Some(format!("passes={passes} reason={reason}"));
                e
            }
            Self::Applied { action, dry_run } => {
                let event = match action.kind {
                    ActionKind::CreateFile => EventType::FileCreate,
                    ActionKind::UpdateFile => EventType::FileUpdate,
                    ActionKind::CreateDir => EventType::DirCreate,
                    ActionKind::DeleteFile => EventType::FileDelete,
                    ActionKind::DeleteDir => EventType::DirDelete,
                };
                let mut e = LogEntry::new(event, Severity::Info);
                if !action.kind.is_deletion() {
                    e.source = Some(action.source.display().to_string());
                }
                e.replica = Some(action.replica.display().to_string());
                e.dry_run = Some(*dry_run);
                e
            }
            Self::ActionFailed {
                action,
                path,
                code,
                message,
            } => {
                let mut e = LogEntry::new(EventType::ActionFailed, Severity::Error);
                if let Some(action) = action {
                    e.source = Some(action.source.display().to_string());
                    e.replica = Some(action.replica.display().to_string());
                    e.details = Some(action.kind.label().to_string());
                } else if let Some(path) = path {
                    e.details = Some(path.display().to_string());
                }
                e.error_code = Some((*code).to_string());
                e.error_message = Some(message.clone());
                e
            }
            Self::PassCompleted {
                stats,
                entries_visited,
                failures,
                duration,
            } => {
                let severity = if *failures > 0 {
                    Severity::Warning
                } else {
                    Severity::Info
                };
                let mut e = LogEntry::new(EventType::PassComplete, severity);
                e.stats = Some(*stats);
                e.entries_visited = Some(*entries_visited);
                e.failures = Some(*failures);
                e.duration_ms = Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
                e
            }
            Self::StartupFailed { code, message } => {
                let mut e = LogEntry::new(EventType::StartupError, Severity::Error);
                e.error_code = Some((*code).to_string());
                e.error_message = Some(message.clone());
                e
            }
        }
    }
}

fn applied_message(action: &SyncAction) -> String {
    let src = action.source.display();
    let dst = action.replica.display();
    match action.kind {
        ActionKind::CreateFile => format!("Created and copied {src} to {dst}"),
        ActionKind::UpdateFile => format!("Copied {src} to {dst}"),
        ActionKind::CreateDir => format!("Created new directory: {dst}"),
        ActionKind::DeleteFile => format!("Deleted file: {dst}"),
        ActionKind::DeleteDir => format!("Deleted directory: {dst}"),
    }
}

fn failed_message(action: &SyncAction) -> String {
    let src = action.source.display();
    let dst = action.replica.display();
    match action.kind {
        ActionKind::CreateFile | ActionKind::UpdateFile => {
            format!("Failed to copy {src} to {dst}")
        }
        ActionKind::CreateDir => format!("Failed to create new directory: {dst}"),
        ActionKind::DeleteFile => format!("Failed to delete file: {dst}"),
        ActionKind::DeleteDir => format!("Failed to delete directory: {dst}"),
    }
}

// ──────────────────── logger ────────────────────

/// Owns both sinks.
pub struct ActivityLogger {
    text: TextLogger,
    jsonl: Option<JsonlWriter>,
}

impl ActivityLogger {
    pub fn open(text: TextLogConfig, jsonl: Option<JsonlConfig>) -> Self {
        Self {
            text: TextLogger::open(text),
            jsonl: jsonl.map(JsonlWriter::open),
        }
    }

    /// Build both sinks from the `[logging]` config section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let text = TextLogConfig {
            path: config.log_file.clone(),
            console: config.console,
            max_size_bytes: config.max_log_bytes,
            max_rotated_files: config.max_rotated_files,
        };
        let jsonl = config.jsonl_log.as_ref().map(|path| JsonlConfig {
            path: path.clone(),
            max_size_bytes: config.max_log_bytes,
            max_rotated_files: config.max_rotated_files,
        });
        Self::open(text, jsonl)
    }

    pub fn log(&mut self, event: &ActivityEvent) {
        self.text.log(event.level(), &event.message());
        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.write_entry(&event.to_log_entry());
        }
    }

    pub fn flush(&mut self) {
        self.text.flush();
        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.flush();
        }
    }

    /// Re-open degraded sinks; called between passes.
    pub fn try_recover(&mut self) {
        self.text.try_recover();
        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.try_recover();
        }
    }
}
