//! Logging: human-readable text log, optional JSONL activity log, and the
//! per-interval change counters they report.

pub mod activity;
pub mod jsonl;
pub mod rotating;
pub mod stats;
pub mod text;
