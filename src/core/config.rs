//! Configuration system: TOML file + env var overrides + CLI arguments on top.

#![allow(missing_docs)]

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SyncError};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Full replisync configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

/// What gets mirrored and how the trees are walked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    /// Treat symlinks as the entries they point to. Off by default: symlinks
    /// are skipped on both sides.
    pub follow_symlinks: bool,
    /// Depth bound for walks that follow symlinks; deeper directories are
    /// reported as failures. Unused when links are not followed.
    pub max_depth: usize,
    /// Classify and report actions without touching the replica.
    pub dry_run: bool,
}

/// How often a pass runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Interval amount, interpreted in `unit`.
    pub interval: u64,
    pub unit: IntervalUnit,
}

/// Unit of the scheduling interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    #[default]
    Minutes,
    Days,
}

/// Log sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
    /// Optional machine-readable activity log.
    pub jsonl_log: Option<PathBuf>,
    /// Echo log lines to stderr.
    pub console: bool,
    pub max_log_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            replica: PathBuf::new(),
            follow_symlinks: false,
            max_depth: 256,
            dry_run: false,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: 1,
            unit: IntervalUnit::Minutes,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("replisync.log"),
            jsonl_log: None,
            console: true,
            max_log_bytes: 50 * 1024 * 1024,
            max_rotated_files: 5,
        }
    }
}

impl IntervalUnit {
    #[must_use]
    pub const fn seconds(self) -> u64 {
        match self {
            Self::Minutes => SECONDS_PER_MINUTE,
            Self::Days => SECONDS_PER_DAY,
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes => f.write_str("minutes"),
            Self::Days => f.write_str("days"),
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "m" | "min" | "minute" | "minutes" => Ok(Self::Minutes),
            "d" | "day" | "days" => Ok(Self::Days),
            other => Err(SyncError::ConfigParse {
                context: "interval unit",
                details: format!("expected minutes or days, got {other:?}"),
            }),
        }
    }
}

impl ScheduleConfig {
    /// Pause between passes.
    #[must_use]
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval.saturating_mul(self.unit.seconds()))
    }
}

impl Config {
    /// Load config from an optional TOML file, then apply env overrides.
    ///
    /// Without a path the defaults are used. An explicit path that does not
    /// exist is an error. The result is not validated yet: callers layer CLI
    /// arguments on top and then call [`Config::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path)
                    .map_err(|source| SyncError::io("read config", path, source))?;
                toml::from_str(&raw)?
            }
            Some(path) => {
                return Err(SyncError::MissingConfig {
                    path: path.to_path_buf(),
                });
            }
            None => Self::default(),
        };

        cfg.apply_env_overrides_from(env_var)?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the JSON form, stable across processes and Rust releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("REPLISYNC_FOLLOW_SYMLINKS") {
            self.sync.follow_symlinks = parse_env_bool("REPLISYNC_FOLLOW_SYMLINKS", &raw)?;
        }
        if let Some(raw) = lookup("REPLISYNC_MAX_DEPTH") {
            self.sync.max_depth = parse_env_usize("REPLISYNC_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("REPLISYNC_DRY_RUN") {
            self.sync.dry_run = parse_env_bool("REPLISYNC_DRY_RUN", &raw)?;
        }
        if let Some(raw) = lookup("REPLISYNC_INTERVAL") {
            self.schedule.interval = parse_env_u64("REPLISYNC_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("REPLISYNC_INTERVAL_UNIT") {
            self.schedule.unit = raw.parse()?;
        }
        if let Some(raw) = lookup("REPLISYNC_LOG_FILE") {
            self.logging.log_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("REPLISYNC_JSONL_LOG") {
            self.logging.jsonl_log = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("REPLISYNC_CONSOLE_LOG") {
            self.logging.console = parse_env_bool("REPLISYNC_CONSOLE_LOG", &raw)?;
        }
        Ok(())
    }

    /// Check the merged configuration before anything touches the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.sync.source.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig {
                details: "sync.source must be set".to_string(),
            });
        }
        if self.sync.replica.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig {
                details: "sync.replica must be set".to_string(),
            });
        }
        if self.sync.max_depth == 0 {
            return Err(SyncError::InvalidConfig {
                details: "sync.max_depth must be >= 1".to_string(),
            });
        }
        if self.schedule.interval == 0 {
            return Err(SyncError::InvalidConfig {
                details: "schedule.interval must be >= 1".to_string(),
            });
        }
        if self.logging.log_file.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig {
                details: "logging.log_file must be set".to_string(),
            });
        }
        if self.logging.max_log_bytes == 0 || self.logging.max_rotated_files == 0 {
            return Err(SyncError::InvalidConfig {
                details: "logging.max_log_bytes and logging.max_rotated_files must be > 0"
                    .to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| SyncError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| SyncError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| SyncError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{Config, IntervalUnit, SyncError};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn runnable() -> Config {
        let mut cfg = Config::default();
        cfg.sync.source = PathBuf::from("/data/src");
        cfg.sync.replica = PathBuf::from("/data/replica");
        cfg
    }

    #[test]
    fn default_config_needs_roots() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("sync.source"));
        assert!(runnable().validate().is_ok());
    }

    #[test]
    fn interval_in_minutes_and_days() {
        let mut cfg = runnable();
        cfg.schedule.interval = 5;
        assert_eq!(
            cfg.schedule.interval_duration(),
            Duration::from_secs(5 * 60)
        );
        cfg.schedule.unit = IntervalUnit::Days;
        assert_eq!(
            cfg.schedule.interval_duration(),
            Duration::from_secs(5 * 86_400)
        );
    }

    #[test]
    fn zero_interval_rejected() {
        let mut cfg = runnable();
        cfg.schedule.interval = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("schedule.interval"));
    }

    #[test]
    fn zero_depth_rejected() {
        let mut cfg = runnable();
        cfg.sync.max_depth = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_sections_parse_with_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [sync]
            follow_symlinks = true

            [schedule]
            interval = 2
            unit = "days"

            [logging]
            jsonl_log = "/var/log/replisync.jsonl"
            "#,
        )
        .unwrap();
        assert!(cfg.sync.follow_symlinks);
        assert_eq!(cfg.sync.max_depth, 256);
        assert_eq!(cfg.schedule.unit, IntervalUnit::Days);
        assert_eq!(
            cfg.logging.jsonl_log,
            Some(PathBuf::from("/var/log/replisync.jsonl"))
        );
        assert!(cfg.logging.console);
    }

    #[test]
    fn env_overrides_apply() {
        let env = vars(&[
            ("REPLISYNC_INTERVAL", "3"),
            ("REPLISYNC_INTERVAL_UNIT", "days"),
            ("REPLISYNC_DRY_RUN", "true"),
            ("REPLISYNC_CONSOLE_LOG", "false"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .unwrap();
        assert_eq!(cfg.schedule.interval, 3);
        assert_eq!(cfg.schedule.unit, IntervalUnit::Days);
        assert!(cfg.sync.dry_run);
        assert!(!cfg.logging.console);
    }

    #[test]
    fn env_invalid_boolean_rejected() {
        let env = vars(&[("REPLISYNC_FOLLOW_SYMLINKS", "sometimes")]);
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .unwrap_err();
        assert!(matches!(err, SyncError::ConfigParse { .. }));
        assert!(err.to_string().contains("REPLISYNC_FOLLOW_SYMLINKS"));
    }

    #[test]
    fn unit_parses_short_forms() {
        assert_eq!("m".parse::<IntervalUnit>().unwrap(), IntervalUnit::Minutes);
        assert_eq!("Days".parse::<IntervalUnit>().unwrap(), IntervalUnit::Days);
        assert!("weeks".parse::<IntervalUnit>().is_err());
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load(Some(Path::new("/nonexistent/replisync/config.toml")));
        assert!(matches!(result, Err(SyncError::MissingConfig { .. })));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replisync.toml");
        std::fs::write(&path, "[schedule]\ninterval = 7\n").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.schedule.interval, 7);
    }

    #[test]
    fn stable_hash_changes_when_config_changes() {
        let a = runnable();
        let mut b = runnable();
        b.sync.dry_run = true;
        assert_eq!(a.stable_hash().unwrap(), a.stable_hash().unwrap());
        assert_ne!(a.stable_hash().unwrap(), b.stable_hash().unwrap());
    }
}
