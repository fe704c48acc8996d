//! Append-only line sink with size-based rotation and graceful degradation.
//!
//! Shared by the text log and the JSONL activity log. Every line is written
//! with a single `write_all` and flushed immediately, so a tailing reader never
//! sees half a line.
//!
//! Degradation chain:
//! 1. The configured file (rotated to `name.1`, `name.2`, ... when full)
//! 2. stderr, prefixed with the sink's tag
//! 3. Silent discard (logging failures never stop a sync)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SyncError};

/// Where a sink writes and when it rotates.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub path: PathBuf,
    /// Rotate once the current file would grow past this many bytes.
    pub max_size_bytes: u64,
    /// Rotated generations to keep.
    pub max_rotated_files: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Normal,
    Stderr,
    Discard,
}

/// File-backed line sink.
pub struct RotatingFile {
    config: RotationConfig,
    /// Prefix for diagnostics and stderr fallback lines, e.g. `[RSY-LOG]`.
    tag: &'static str,
    writer: Option<BufWriter<File>>,
    state: SinkState,
    bytes_written: u64,
}

impl RotatingFile {
    /// Open the sink, falling straight to stderr if the file cannot be opened.
    pub fn open(config: RotationConfig, tag: &'static str) -> Self {
        let mut sink = Self {
            config,
            tag,
            writer: None,
            state: SinkState::Discard,
            bytes_written: 0,
        };
        match open_append(&sink.config.path) {
            Ok((file, size)) => {
                sink.writer = Some(BufWriter::new(file));
                sink.state = SinkState::Normal;
                sink.bytes_written = size;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "{tag} cannot open log file, using stderr: {e}");
                sink.state = SinkState::Stderr;
            }
        }
        sink
    }

    /// Append one line. `line` must end with `\n`.
    pub fn write_line(&mut self, line: &str) {
        if self.state == SinkState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
            && self.bytes_written > 0
        {
            self.rotate();
        }

        match self.state {
            SinkState::Normal => {
                let ok = self.writer.as_mut().is_some_and(|w| {
                    w.write_all(line.as_bytes()).is_ok() && w.flush().is_ok()
                });
                if ok {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            SinkState::Stderr => {
                if write!(io::stderr(), "{} {line}", self.tag).is_err() {
                    self.degrade();
                }
            }
            SinkState::Discard => {}
        }
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &'static str {
        match self.state {
            SinkState::Normal => "normal",
            SinkState::Stderr => "stderr",
            SinkState::Discard => "discard",
        }
    }

    /// Whether lines are going to stderr instead of the file.
    pub fn is_on_stderr(&self) -> bool {
        self.state == SinkState::Stderr
    }

    /// Bytes in the current (unrotated) file.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Try to get back to the file after a degradation.
    pub fn try_recover(&mut self) {
        if self.state == SinkState::Normal {
            return;
        }
        if let Ok((file, size)) = open_append(&self.config.path) {
            self.writer = Some(BufWriter::new(file));
            self.state = SinkState::Normal;
            self.bytes_written = size;
            let _ = writeln!(
                io::stderr(),
                "{} recovered log file: {}",
                self.tag,
                self.config.path.display()
            );
        }
    }

    // ──────────────────────── internals ────────────────────────

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            SinkState::Normal => {
                let _ = writeln!(io::stderr(), "{} log file write failed, using stderr", self.tag);
                SinkState::Stderr
            }
            SinkState::Stderr | SinkState::Discard => SinkState::Discard,
        };
    }

    fn rotate(&mut self) {
        self.flush();
        self.writer = None;
        let base = self.config.path.clone();

        // .N is dropped, .N-1 → .N, ..., current → .1
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = rename(&base, rotated_name(&base, 1));

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|source| SyncError::io("create log directory", parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SyncError::io("open log file", path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// Build a rotated filename: `sync.log` → `sync.log.3`.
pub fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}
