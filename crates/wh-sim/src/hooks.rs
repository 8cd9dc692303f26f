//! Side-effect boundaries invoked by the runner.
//!
//! Two traits, both with no-op defaults so implementors override only what
//! they need:
//!
//! - [`PersistenceHooks`] receive every state mutation as it happens
//!   (spawns, status changes, claims, timeline events).  They are
//!   fire-and-forget: an implementation that fails must log and carry on,
//!   the tick never waits on or aborts because of a hook.
//! - [`TickSink`] receives the run's lifecycle and its throttled tick stream;
//!   the engine implements it to update the run record and fan ticks out.

use chrono::{DateTime, Utc};

use wh_core::{Package, Reservation};

use crate::{RunStage, RunTick, TimelineEvent};

// ── PersistenceHooks ──────────────────────────────────────────────────────────

pub trait PersistenceHooks: Send {
    /// A package was queued.
    fn record_package_spawn(&mut self, _package: &Package) {}

    /// A package changed status (including the final DELIVERED).
    fn update_package_status(&mut self, _package: &Package) {}

    /// Live claims after a tick's movement phase.
    fn record_reservations(&mut self, _reservations: &[Reservation]) {}

    fn record_event(&mut self, _event: &TimelineEvent) {}

    /// The run ended; flush buffered output.
    fn finish(&mut self) {}
}

/// [`PersistenceHooks`] that discard everything.
pub struct NoopHooks;

impl PersistenceHooks for NoopHooks {}

// ── TickSink ──────────────────────────────────────────────────────────────────

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Always terminal.
    pub stage:        RunStage,
    pub completed_at: DateTime<Utc>,
    pub error:        Option<String>,
}

pub trait TickSink: Send {
    /// The loop is about to enter warm-up.
    fn on_started(&mut self, _at: DateTime<Utc>) {}

    /// Every timeline event, unthrottled, in order.
    fn on_event(&mut self, _event: &TimelineEvent) {}

    /// One emitted tick.
    fn on_tick(&mut self, _tick: &RunTick) {}

    /// Called exactly once, after the final tick.
    fn on_finished(&mut self, _outcome: &RunOutcome) {}
}

/// [`TickSink`] that ignores the stream.
pub struct NoopSink;

impl TickSink for NoopSink {}

/// Collects every emitted tick.
impl TickSink for Vec<RunTick> {
    fn on_tick(&mut self, tick: &RunTick) {
        self.push(tick.clone());
    }
}
