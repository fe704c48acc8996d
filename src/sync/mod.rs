//! Mirroring engine: walk, detect, apply.

pub mod applier;
pub mod detector;
pub mod pass;
pub mod walker;
