//! Daemon subsystem: the periodic scheduling loop and stop handling.

pub mod loop_main;
pub mod signals;
