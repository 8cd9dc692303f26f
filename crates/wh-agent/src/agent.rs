//! Per-robot state machine.
//!
//! ```text
//!          assign_job            (at pickup)             (at dropoff)
//!   IDLE ────────────▶ FETCHING ────────────▶ DELIVERING ────────────▶ IDLE
//!                          │                      │
//!                          └──────mark_faulted────┴──▶ FAULTED ──recover──▶ IDLE
//! ```
//!
//! # Movement
//!
//! A robot advances at most one cell per [`RobotAgent::update`].  Before
//! moving it checks the shared [`ReservationManager`]: if another robot holds
//! the next cell it waits; otherwise it claims the cell, moves, and publishes
//! the claim to its [`ClaimListener`].  Each robot decides locally, so no
//! global barrier is needed to keep two robots out of the same cell.
//!
//! Claims are made only by moving.  A robot holds no claim on a cell it has
//! not moved into, and holds none at all while IDLE or FAULTED: the runner
//! releases its claim on either transition.  A working robot may therefore
//! enter a cell where an idle or faulted robot is parked.
//!
//! # Path invariant
//!
//! A committed path is never empty and its last cell is the destination.
//! `path_index` counts the cells already visited.

use wh_core::{GridPosition, PackageId, RobotId, RobotState};
use wh_spatial::ReservationManager;

use crate::{AgentError, AgentEvent, AgentResult, ClaimListener, ReservationClaim, RobotTelemetry};

/// The package a robot is currently working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub package: PackageId,
    pub pickup:  GridPosition,
}

#[derive(Debug, Clone)]
pub struct RobotAgent {
    id:          RobotId,
    position:    GridPosition,
    state:       RobotState,
    job:         Option<Job>,
    path:        Vec<GridPosition>,
    path_index:  usize,
    destination: Option<GridPosition>,
}

impl RobotAgent {
    pub fn new(id: RobotId, start: GridPosition) -> Self {
        Self {
            id,
            position: start,
            state: RobotState::Idle,
            job: None,
            path: Vec::new(),
            path_index: 0,
            destination: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> RobotId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> GridPosition {
        self.position
    }

    #[inline]
    pub fn state(&self) -> RobotState {
        self.state
    }

    #[inline]
    pub fn job(&self) -> Option<Job> {
        self.job
    }

    #[inline]
    pub fn destination(&self) -> Option<GridPosition> {
        self.destination
    }

    /// Cells still to visit, next move first.  Empty once exhausted.
    pub fn remaining_path(&self) -> &[GridPosition] {
        self.path.get(self.path_index..).unwrap_or(&[])
    }

    /// `true` while at least one committed move remains.
    #[inline]
    pub fn has_path(&self) -> bool {
        self.path_index < self.path.len()
    }

    pub fn telemetry(&self) -> RobotTelemetry {
        RobotTelemetry {
            robot_id:      self.id,
            state:         self.state,
            position:      self.position,
            battery_level: 1.0,
            current_job:   self.job.map(|j| j.package),
            path:          self.remaining_path().to_vec(),
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// IDLE → FETCHING for `package`, which waits at `pickup`.
    pub fn assign_job(&mut self, package: PackageId, pickup: GridPosition) -> AgentResult<()> {
        if self.state != RobotState::Idle {
            return Err(self.invalid("assign a job"));
        }
        self.job = Some(Job { package, pickup });
        self.state = RobotState::Fetching;
        tracing::debug!(robot = %self.id, package = %package, "job assigned");
        Ok(())
    }

    /// Replace the committed route and reset progress.
    ///
    /// `path` excludes the current cell; its last cell becomes the
    /// destination.
    pub fn set_path(&mut self, path: Vec<GridPosition>) -> AgentResult<()> {
        if self.state == RobotState::Faulted {
            return Err(self.invalid("set a path"));
        }
        let Some(&last) = path.last() else {
            return Err(AgentError::EmptyPath(self.id));
        };
        self.path = path;
        self.path_index = 0;
        self.destination = Some(last);
        Ok(())
    }

    /// Any working state → FAULTED.  Drops job and path and returns the
    /// in-flight package for the caller to requeue.
    pub fn mark_faulted(&mut self) -> AgentResult<Option<PackageId>> {
        if !self.state.is_working() {
            return Err(self.invalid("fault"));
        }
        let package = self.drop_job();
        self.state = RobotState::Faulted;
        Ok(package)
    }

    /// FAULTED → IDLE.
    pub fn recover(&mut self) -> AgentResult<()> {
        if self.state != RobotState::Faulted {
            return Err(self.invalid("recover"));
        }
        self.state = RobotState::Idle;
        Ok(())
    }

    /// Give up the current job without faulting (deadlock or planning
    /// failure).  Returns the package for the caller to requeue.
    pub fn abandon_job(&mut self) -> Option<PackageId> {
        let package = self.drop_job();
        if self.state != RobotState::Faulted {
            self.state = RobotState::Idle;
        }
        package
    }

    fn drop_job(&mut self) -> Option<PackageId> {
        self.path.clear();
        self.path_index = 0;
        self.destination = None;
        self.job.take().map(|j| j.package)
    }

    fn invalid(&self, action: &'static str) -> AgentError {
        AgentError::InvalidTransition { robot: self.id, from: self.state, action }
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance one tick.
    ///
    /// With moves left, step into the next cell unless another robot holds
    /// it.  With the path exhausted, complete the pickup or delivery when the
    /// robot stands where the leg was meant to end.
    pub fn update(
        &mut self,
        reservations: &mut ReservationManager,
        listener:     &mut dyn ClaimListener,
    ) -> AgentEvent {
        if self.state == RobotState::Faulted {
            return AgentEvent::Halted;
        }
        if self.has_path() {
            return self.step(reservations, listener);
        }

        let completed = self.destination.take();
        self.path.clear();
        self.path_index = 0;

        match (self.state, self.job) {
            (RobotState::Fetching, Some(job)) if job.pickup == self.position => {
                self.state = RobotState::Delivering;
                tracing::debug!(robot = %self.id, package = %job.package, "picked up");
                AgentEvent::PickedUp(job.package)
            }
            (RobotState::Delivering, Some(job)) if completed == Some(self.position) => {
                self.job = None;
                self.state = RobotState::Idle;
                tracing::debug!(robot = %self.id, package = %job.package, at = %self.position, "delivered");
                AgentEvent::Delivered(job.package)
            }
            (RobotState::Idle, _) => AgentEvent::Idle,
            _ => AgentEvent::AwaitingPlan,
        }
    }

    fn step(&mut self, reservations: &mut ReservationManager, listener: &mut dyn ClaimListener) -> AgentEvent {
        let next = self.path[self.path_index];
        if reservations.is_reserved(next, Some(self.id)) {
            tracing::trace!(robot = %self.id, cell = %next, "waiting on reservation");
            return AgentEvent::Waiting { blocked: next };
        }

        let claim = reservations.claim(self.id, next);
        listener.on_claim(ReservationClaim::from(&claim));

        let from = self.position;
        self.position = next;
        self.path_index += 1;
        AgentEvent::Moved { from, to: next }
    }
}
