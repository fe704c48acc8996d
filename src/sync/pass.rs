//! One synchronization pass: mirror the source tree onto the replica, then
//! remove replica entries that no longer exist in the source.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::config::SyncConfig;
use crate::core::errors::{Result, SyncError};
use crate::core::paths::{check_disjoint, resolve_absolute_path};
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::logger::stats::ChangeStats;
use crate::platform::pal::{FsOps, LocalFs};
use crate::sync::applier::Applier;
use crate::sync::detector::{ActionKind, ChangeDetector};
use crate::sync::walker::{TreeWalker, Visit, WalkerConfig};

// ──────────────────── session ────────────────────

/// The two roots of a mirror, absolute and fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSession {
    source: PathBuf,
    replica: PathBuf,
}

impl SyncSession {
    /// Resolve both roots and check that they exist and do not overlap.
    ///
    /// The source is checked first, so when both are missing the source is
    /// the one reported.
    pub fn open(source: &Path, replica: &Path) -> Result<Self> {
        let source = resolve_absolute_path(source);
        let replica = resolve_absolute_path(replica);
        require_dir("Source", &source)?;
        require_dir("Replica", &replica)?;
        check_disjoint(&source, &replica)?;
        Ok(Self { source, replica })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }
}

fn require_dir(role: &'static str, path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SyncError::MissingRoot {
            role,
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(SyncError::InvalidConfig {
            details: format!("{role} folder {} is not a directory", path.display()),
        });
    }
    Ok(())
}

// ──────────────────── report ────────────────────

/// Outcome of one pass. Counts of applied actions live in [`ChangeStats`].
#[derive(Debug, Default)]
pub struct PassReport {
    /// Entries seen across both walks.
    pub entries_visited: u64,
    /// Every per-entry failure, in the order encountered.
    pub failures: Vec<SyncError>,
    pub duration: Duration,
}

impl PassReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failures.len() as u64
    }
}

// ──────────────────── synchronizer ────────────────────

/// Runs passes for one session.
pub struct Synchronizer<F: FsOps = LocalFs> {
    session: SyncSession,
    detector: ChangeDetector,
    applier: Applier<F>,
    max_depth: usize,
    follow_symlinks: bool,
}

impl Synchronizer<LocalFs> {
    pub fn local(session: SyncSession, config: &SyncConfig) -> Self {
        Self::new(session, config, LocalFs)
    }
}

impl<F: FsOps> Synchronizer<F> {
    pub fn new(session: SyncSession, config: &SyncConfig, fs: F) -> Self {
        let detector = ChangeDetector::new(session.source(), session.replica());
        Self {
            session,
            detector,
            applier: Applier::new(fs, config.dry_run),
            max_depth: config.max_depth,
            follow_symlinks: config.follow_symlinks,
        }
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    /// Run one full pass, recording every applied action in `stats`.
    ///
    /// Failures never abort the pass: each is logged, left out of `stats`,
    /// and returned in the report.
    pub fn run_pass(&self, stats: &mut ChangeStats, logger: &mut ActivityLogger) -> PassReport {
        let start = Instant::now();
        let mut report = PassReport::default();

        self.mirror_source(stats, logger, &mut report);
        self.prune_replica(stats, logger, &mut report);

        report.duration = start.elapsed();
        report
    }

    /// The replica is never walked through symlinks, so pruning cannot reach
    /// outside it.
    fn walker(&self, root: &Path, follow_symlinks: bool) -> TreeWalker {
        TreeWalker::new(WalkerConfig {
            root: root.to_path_buf(),
            max_depth: self.max_depth,
            follow_symlinks,
        })
    }

    fn mirror_source(
        &self,
        stats: &mut ChangeStats,
        logger: &mut ActivityLogger,
        report: &mut PassReport,
    ) {
        let walk_errors = self.walker(self.session.source(), self.follow_symlinks).walk(|entry| {
            report.entries_visited += 1;
            let action = match self.detector.detect(entry) {
                Ok(Some(action)) => action,
                Ok(None) => return Visit::Descend,
                Err(err) => {
                    logger.log(&ActivityEvent::failure(None, &err));
                    report.failures.push(err);
                    return Visit::Descend;
                }
            };
            match self.applier.apply(&action) {
                Ok(()) => {
                    stats.record(action.kind);
                    logger.log(&ActivityEvent::Applied {
                        action,
                        dry_run: self.applier.is_dry_run(),
                    });
                }
                Err(err) => {
                    logger.log(&ActivityEvent::failure(Some(&action), &err));
                    report.failures.push(err);
                }
            }
            Visit::Descend
        });
        record_walk_errors(walk_errors, logger, report);
    }

    fn prune_replica(
        &self,
        stats: &mut ChangeStats,
        logger: &mut ActivityLogger,
        report: &mut PassReport,
    ) {
        let walk_errors = self.walker(self.session.replica(), false).walk(|entry| {
            report.entries_visited += 1;
            let action = match self.detector.detect_orphan(entry) {
                Ok(Some(action)) => action,
                Ok(None) => return Visit::Descend,
                Err(err) => {
                    logger.log(&ActivityEvent::failure(None, &err));
                    report.failures.push(err);
                    return Visit::Descend;
                }
            };
            match self.applier.apply(&action) {
                Ok(()) => {
                    let kind = action.kind;
                    stats.record(kind);
                    logger.log(&ActivityEvent::Applied {
                        action,
                        dry_run: self.applier.is_dry_run(),
                    });
                    // The subtree went with the directory.
                    if kind == ActionKind::DeleteDir {
                        Visit::Prune
                    } else {
                        Visit::Descend
                    }
                }
                Err(err) => {
                    logger.log(&ActivityEvent::failure(Some(&action), &err));
                    report.failures.push(err);
                    Visit::Descend
                }
            }
        });
        record_walk_errors(walk_errors, logger, report);
    }

}

fn record_walk_errors(errors: Vec<SyncError>, logger: &mut ActivityLogger, report: &mut PassReport) {
    for err in errors {
        logger.log(&ActivityEvent::failure(None, &err));
        report.failures.push(err);
    }
}
