//! `wh-schedule` — job assignment and robot health tracking.
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`scheduler`] | `TaskScheduler`, `AssignmentRecord`                    |
//! | [`health`]    | `HealthMonitor`, `HealthStatus`                        |
//!
//! # Per-tick protocol (summary)
//!
//! ```text
//! for robot in fleet: scheduler.record_robot_state(robot, pos, state)
//! for idle robot:     scheduler.select_job(...)      → Option<PackageId>
//! scheduler.detect_deadlocks()                       → robots to unwind
//! ...movement...
//! for robot in fleet: health.observe(robot, pos, state) → HealthStatus
//! ```
//!
//! Both trackers are plain synchronous state owned by one run; neither holds
//! a lock nor touches package state.  Requeueing is the caller's job.

pub mod health;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use health::{HealthMonitor, HealthStatus, DEFAULT_MAX_STALLED_TICKS};
pub use scheduler::{AssignmentRecord, TaskScheduler, DEFAULT_DEADLOCK_THRESHOLD};
