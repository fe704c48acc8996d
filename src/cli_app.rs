//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use replisync::core::config::{Config, IntervalUnit};
use replisync::core::errors::SyncError;
use replisync::daemon::loop_main::Scheduler;
use replisync::daemon::signals::StopSignal;

/// Keep a replica directory as an exact one-way mirror of a source directory.
#[derive(Debug, Parser)]
#[command(
    name = "replisync",
    author,
    version,
    about = "One-way periodic directory mirror",
    long_about = None
)]
pub struct Cli {
    /// Directory to mirror from.
    #[arg(value_name = "SOURCE_FOLDER")]
    source: PathBuf,
    /// Directory kept identical to the source. Must already exist.
    #[arg(value_name = "REPLICA_FOLDER")]
    replica: PathBuf,
    /// Pause between passes, in minutes unless --days is given.
    #[arg(value_name = "INTERVAL_TIME", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,
    /// Text log file; lines are also echoed to stderr.
    #[arg(value_name = "LOG_FILE")]
    log_file: PathBuf,
    /// Interpret INTERVAL_TIME as days. Wins over --minutes.
    #[arg(short = 'd', long)]
    days: bool,
    /// Interpret INTERVAL_TIME as minutes (the default).
    #[arg(short = 'm', long)]
    minutes: bool,
    /// TOML config file with defaults for everything not given here.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Run a single pass, report it, and exit.
    #[arg(long)]
    once: bool,
    /// Log what would change without touching the replica.
    #[arg(long)]
    dry_run: bool,
    /// Also write a JSON-lines activity log.
    #[arg(long, value_name = "PATH")]
    jsonl: Option<PathBuf>,
    /// Mirror what symlinks point to instead of skipping them.
    #[arg(long)]
    follow_symlinks: bool,
    /// Do not echo log lines to stderr.
    #[arg(short, long)]
    quiet: bool,
}

/// Structured CLI error with stable exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad input: arguments, config, or roots.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// A `--once` pass finished with failed entries.
    #[error("{0}")]
    Partial(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) => 2,
            Self::Internal(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        if err.is_fatal() {
            Self::User(err.to_string())
        } else if matches!(err, SyncError::Serialization { .. }) {
            Self::Internal(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Merge the config file, environment, and command line, in that order.
pub fn build_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;

    config.sync.source.clone_from(&cli.source);
    config.sync.replica.clone_from(&cli.replica);
    config.schedule.interval = cli.interval;
    config.logging.log_file.clone_from(&cli.log_file);

    if cli.days {
        config.schedule.unit = IntervalUnit::Days;
    } else if cli.minutes {
        config.schedule.unit = IntervalUnit::Minutes;
    }
    if cli.dry_run {
        config.sync.dry_run = true;
    }
    if cli.follow_symlinks {
        config.sync.follow_symlinks = true;
    }
    if let Some(path) = &cli.jsonl {
        config.logging.jsonl_log = Some(path.clone());
    }
    if cli.quiet {
        config.logging.console = false;
    }

    config.validate()?;
    Ok(config)
}

/// Run the mirror until stopped, or for one pass with `--once`.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    let config = build_config(cli)?;
    let mut scheduler = Scheduler::init(config)?;
    let stop = StopSignal::new();

    if cli.once {
        let summary = scheduler.run_bounded(&stop, 1);
        if summary.failures > 0 {
            return Err(CliError::Partial(format!(
                "pass finished with {} failed entries; see the log for details",
                summary.failures
            )));
        }
        return Ok(());
    }

    stop.install_os_handlers();
    scheduler.run(&stop);
    Ok(())
}
