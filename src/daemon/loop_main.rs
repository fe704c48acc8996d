//! Scheduler: run a pass, report, sleep, repeat until stopped.
//!
//! State machine:
//!
//! ```text
//! Init ──(roots ok)──> Scanning ──> Reporting ──> Sleeping ──┐
//!   │                     ^                                   │
//!   │                     └───────────(interval elapsed)──────┘
//!   └──(startup error: logged, never retried)
//!
//! any state ──(stop requested / pass limit)──> Stopped
//! ```
//!
//! A stop is only acted on between passes. A pass that has started always runs
//! to completion and is reported, so the stats line never covers half a pass.

#![allow(missing_docs)]

use std::time::Duration;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::daemon::signals::StopSignal;
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::logger::stats::{ChangeStats, StatsSnapshot};
use crate::platform::pal::{FsOps, LocalFs};
use crate::sync::pass::{PassReport, SyncSession, Synchronizer};

// ──────────────────── state ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Init,
    Scanning,
    Reporting,
    Sleeping,
    Stopped,
}

/// One reported pass.
#[derive(Debug)]
pub struct CompletedPass {
    pub stats: StatsSnapshot,
    pub report: PassReport,
}

/// What a run loop did before returning.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub passes: u64,
    /// Total per-entry failures across all passes.
    pub failures: u64,
    /// Stats of the final pass.
    pub last: Option<StatsSnapshot>,
}

// ──────────────────── scheduler ────────────────────

pub struct Scheduler<F: FsOps = LocalFs> {
    synchronizer: Synchronizer<F>,
    logger: ActivityLogger,
    stats: ChangeStats,
    state: SchedulerState,
    interval: Duration,
    passes: u64,
}

impl Scheduler<LocalFs> {
    /// Validate the config, open the logs, and check both roots.
    pub fn init(config: Config) -> Result<Self> {
        Self::init_with_fs(config, LocalFs)
    }
}

impl<F: FsOps> Scheduler<F> {
    /// Like [`Scheduler::init`] with a custom filesystem implementation.
    ///
    /// Startup failures after the logs are open are logged before being
    /// returned.
    pub fn init_with_fs(config: Config, fs: F) -> Result<Self> {
        config.validate()?;
        let mut logger = ActivityLogger::from_config(&config.logging);

        let session = match SyncSession::open(&config.sync.source, &config.sync.replica) {
            Ok(session) => session,
            Err(e) => {
                logger.log(&ActivityEvent::startup_failure(&e));
                logger.flush();
                return Err(e);
            }
        };

        logger.log(&ActivityEvent::SyncStarted {
            source: session.source().to_path_buf(),
            replica: session.replica().to_path_buf(),
            interval: format!("{} {}", config.schedule.interval, config.schedule.unit),
            dry_run: config.sync.dry_run,
            config_hash: config.stable_hash().unwrap_or_default(),
        });

        let synchronizer = Synchronizer::new(session, &config.sync, fs);
        let interval = config.schedule.interval_duration();
        Ok(Self {
            synchronizer,
            logger,
            stats: ChangeStats::new(),
            state: SchedulerState::Init,
            interval,
            passes: 0,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Passes completed so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Override the pause between passes.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Run one pass and report it. The interval's counters are drained here,
    /// so the returned stats cover exactly this pass.
    pub fn run_once(&mut self) -> CompletedPass {
        self.state = SchedulerState::Scanning;
        let report = self.synchronizer.run_pass(&mut self.stats, &mut self.logger);

        self.state = SchedulerState::Reporting;
        let stats = self.stats.drain();
        self.logger.log(&ActivityEvent::PassCompleted {
            stats,
            entries_visited: report.entries_visited,
            failures: report.failure_count(),
            duration: report.duration,
        });
        self.logger.flush();
        self.logger.try_recover();
        self.passes += 1;

        CompletedPass { stats, report }
    }

    /// Run passes until `stop` is requested.
    pub fn run(&mut self, stop: &StopSignal) -> RunSummary {
        self.run_loop(stop, None)
    }

    /// Run at most `max_passes` passes, sleeping the interval between them,
    /// unless `stop` is requested first.
    pub fn run_bounded(&mut self, stop: &StopSignal, max_passes: u64) -> RunSummary {
        self.run_loop(stop, Some(max_passes))
    }

    fn run_loop(&mut self, stop: &StopSignal, limit: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();
        let reason = loop {
            if stop.is_stopped() {
                break "stop requested";
            }
            if limit.is_some_and(|max| summary.passes >= max) {
                break "pass limit reached";
            }

            let pass = self.run_once();
            summary.passes += 1;
            summary.failures += pass.report.failure_count();
            summary.last = Some(pass.stats);

            if limit.is_some_and(|max| summary.passes >= max) {
                break "pass limit reached";
            }

            self.state = SchedulerState::Sleeping;
            if stop.wait(self.interval) {
                break "stop requested";
            }
        };

        self.state = SchedulerState::Stopped;
        self.logger.log(&ActivityEvent::SyncStopped {
            passes: self.passes,
            reason: reason.to_string(),
        });
        self.logger.flush();
        summary
    }
}
