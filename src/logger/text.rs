//! Human-readable log: `<timestamp> - <LEVEL>: <message>`.
//!
//! Lines go to the configured log file and, when console output is enabled,
//! to stderr as well. Timestamps are local time with millisecond precision,
//! e.g. `2024-03-01 12:00:05,123`.

#![allow(missing_docs)]

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local, TimeZone};

use crate::logger::rotating::{RotatingFile, RotationConfig};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Severity of a text log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TextLogConfig {
    pub path: PathBuf,
    /// Echo every line to stderr.
    pub console: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Line logger writing to a file and optionally stderr.
pub struct TextLogger {
    file: RotatingFile,
    console: bool,
}

impl TextLogger {
    pub fn open(config: TextLogConfig) -> Self {
        let file = RotatingFile::open(
            RotationConfig {
                path: config.path,
                max_size_bytes: config.max_size_bytes,
                max_rotated_files: config.max_rotated_files,
            },
            "[RSY-LOG]",
        );
        Self {
            file,
            console: config.console,
        }
    }

    pub fn log(&mut self, level: Level, message: &str) {
        let line = format_line(&Local::now(), level, message);
        // A sink already on stderr would print the line twice.
        if self.console && !self.file.is_on_stderr() {
            let _ = io::stderr().write_all(line.as_bytes());
        }
        self.file.write_line(&line);
    }

    pub fn flush(&mut self) {
        self.file.flush();
    }

    /// Degradation state of the file sink.
    pub fn state(&self) -> &'static str {
        self.file.state()
    }

    pub fn try_recover(&mut self) {
        self.file.try_recover();
    }
}

/// Render one newline-terminated log line.
pub fn format_line<Tz>(ts: &DateTime<Tz>, level: Level, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("{} - {level}: {message}\n", ts.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    #[test]
    fn line_format_matches_log_layout() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 5, 42)
            .unwrap()
            .and_utc();
        assert_eq!(
            format_line(&ts, Level::Warning, "Replica folder /x does not exist"),
            "2024-03-01 12:00:05,042 - WARNING: Replica folder /x does not exist\n"
        );
    }

    #[test]
    fn levels_render_upper_case() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Error.to_string(), "ERROR");
        assert!(Level::Info < Level::Error);
    }

    #[test]
    fn writes_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.log");
        let mut logger = TextLogger::open(TextLogConfig {
            path: path.clone(),
            console: false,
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 2,
        });
        logger.log(Level::Info, "Copied a to b");
        logger.log(Level::Error, "Failed to delete file: c");
        logger.flush();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO: Copied a to b"));
        assert!(lines[1].ends_with(" - ERROR: Failed to delete file: c"));
        assert_eq!(logger.state(), "normal");
    }
}
