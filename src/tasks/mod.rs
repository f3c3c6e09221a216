//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Stale Sweep: Removes entries that are no longer fresh

mod sweep;

pub use sweep::spawn_sweep_task;
