//! Per-interval change counters.
//!
//! The scheduler owns one [`ChangeStats`] value, hands it to every pass by
//! `&mut`, and drains it once after the pass has been reported. Draining
//! returns an immutable [`StatsSnapshot`] and zeroes the counters, so a report
//! never includes actions from an earlier interval.

use std::fmt;

use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;

use crate::sync::detector::ActionKind;

/// Mutable counters for one report interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeStats {
    counts: [u64; ActionKind::ALL.len()],
}

/// Frozen counts produced by [`ChangeStats::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    counts: [u64; ActionKind::ALL.len()],
}

impl ChangeStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successfully applied action.
    pub fn record(&mut self, kind: ActionKind) {
        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_add(1);
    }

    /// Current count for `kind` without resetting.
    #[must_use]
    pub fn get(&self, kind: ActionKind) -> u64 {
        self.counts[kind.index()]
    }

    /// Snapshot all counters and reset them to zero.
    pub fn drain(&mut self) -> StatsSnapshot {
        let snapshot = StatsSnapshot {
            counts: self.counts,
        };
        self.counts = [0; ActionKind::ALL.len()];
        snapshot
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

impl StatsSnapshot {
    #[must_use]
    pub fn get(&self, kind: ActionKind) -> u64 {
        self.counts[kind.index()]
    }

    /// Sum of all counters.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(label, count)` pairs in fixed report order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        ActionKind::ALL
            .iter()
            .map(|kind| (kind.label(), self.get(*kind)))
    }
}

/// Report line: `created = 2; updated = 0; dir-created = 1; ...`.
impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (label, count)) in self.entries().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{label} = {count}")?;
        }
        Ok(())
    }
}

impl Serialize for StatsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ActionKind::ALL.len()))?;
        for (label, count) in self.entries() {
            map.serialize_entry(label, &count)?;
        }
        map.end()
    }
}
