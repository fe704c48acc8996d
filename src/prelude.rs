//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use replisync::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, IntervalUnit};
pub use crate::core::errors::{Result, SyncError};

// Platform
pub use crate::platform::pal::{FaultyFs, FsOps, LocalFs};

// Sync
pub use crate::sync::applier::Applier;
pub use crate::sync::detector::{ActionKind, ChangeDetector, SyncAction};
pub use crate::sync::pass::{PassReport, SyncSession, Synchronizer};
pub use crate::sync::walker::{EntryKind, EntryMetadata, TreeWalker, WalkEntry, WalkerConfig};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivityLogger};
pub use crate::logger::stats::{ChangeStats, StatsSnapshot};

// Scheduling
pub use crate::daemon::loop_main::{RunSummary, Scheduler, SchedulerState};
pub use crate::daemon::signals::StopSignal;
