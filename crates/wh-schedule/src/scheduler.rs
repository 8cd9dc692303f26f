//! Greedy nearest-package assignment with deadlock detection.
//!
//! # Selection order
//!
//! Among QUEUED packages not already claimed by another robot, the scheduler
//! picks the minimum of
//!
//! ```text
//! (manhattan(robot, package), package.created_at, package.id)
//! ```
//!
//! Distance is primary; creation time gives FIFO fairness between equally
//! distant packages; the id makes the choice fully deterministic.
//!
//! # Deadlocks
//!
//! Every committed assignment keeps an [`AssignmentRecord`].  Each call to
//! [`TaskScheduler::record_robot_state`] for a working robot either resets
//! its `wait_cycles` (moved) or increments it (same cell).  Robots at or above
//! the threshold are reported by [`TaskScheduler::detect_deadlocks`]; the
//! caller requeues the package and clears the assignment and reservation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use wh_core::{GridPosition, Package, PackageId, PackageStatus, RobotId, RobotState};

/// Consecutive stationary observations before an assignment counts as
/// deadlocked.
pub const DEFAULT_DEADLOCK_THRESHOLD: u32 = 10;

/// One robot's committed assignment, tracked only for deadlock detection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentRecord {
    pub robot_id:      RobotId,
    pub package_id:    PackageId,
    pub assigned_at:   DateTime<Utc>,
    pub wait_cycles:   u32,
    pub last_position: GridPosition,
}

/// Assigns queued packages to idle robots.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    deadlock_threshold: u32,
    records:            BTreeMap<RobotId, AssignmentRecord>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLOCK_THRESHOLD)
    }
}

impl TaskScheduler {
    pub fn new(deadlock_threshold: u32) -> Self {
        Self { deadlock_threshold, records: BTreeMap::new() }
    }

    #[inline]
    pub fn deadlock_threshold(&self) -> u32 {
        self.deadlock_threshold
    }

    /// Pick the best QUEUED package for `robot`, committing a pending record.
    ///
    /// Returns `None` without side effects unless `state` is `Idle`.
    /// `others` is a caller-side map of assignments made earlier in the same
    /// batch; packages appearing in it, or pending for a different robot, are
    /// skipped.
    pub fn select_job<'a>(
        &mut self,
        robot:    RobotId,
        position: GridPosition,
        state:    RobotState,
        packages: impl IntoIterator<Item = &'a Package>,
        others:   &HashMap<RobotId, PackageId>,
    ) -> Option<PackageId> {
        if state != RobotState::Idle {
            return None;
        }

        let taken: BTreeSet<PackageId> = others
            .values()
            .copied()
            .chain(
                self.records
                    .iter()
                    .filter(|(rid, _)| **rid != robot)
                    .map(|(_, rec)| rec.package_id),
            )
            .collect();

        let chosen = packages
            .into_iter()
            .filter(|pkg| pkg.status() == PackageStatus::Queued && !taken.contains(&pkg.id))
            .min_by_key(|pkg| (position.manhattan(pkg.position), pkg.created_at, pkg.id))?;

        self.records.insert(
            robot,
            AssignmentRecord {
                robot_id:      robot,
                package_id:    chosen.id,
                assigned_at:   Utc::now(),
                wait_cycles:   0,
                last_position: position,
            },
        );
        Some(chosen.id)
    }

    /// Observe one robot.  Going idle drops its record; otherwise
    /// `wait_cycles` grows while the position is unchanged.
    pub fn record_robot_state(&mut self, robot: RobotId, position: GridPosition, state: RobotState) {
        if state == RobotState::Idle {
            self.records.remove(&robot);
            return;
        }
        let Some(record) = self.records.get_mut(&robot) else {
            return;
        };
        if record.last_position == position {
            record.wait_cycles += 1;
        } else {
            record.wait_cycles = 0;
            record.last_position = position;
        }
    }

    /// Robots whose wait count has reached the threshold, in id order.
    pub fn detect_deadlocks(&self) -> Vec<RobotId> {
        let stuck: Vec<RobotId> = self
            .records
            .values()
            .filter(|rec| rec.wait_cycles >= self.deadlock_threshold)
            .map(|rec| rec.robot_id)
            .collect();
        if !stuck.is_empty() {
            tracing::debug!(count = stuck.len(), "deadlocked assignments detected");
        }
        stuck
    }

    /// Forget `robot`'s pending assignment.
    pub fn clear_assignment(&mut self, robot: RobotId) {
        self.records.remove(&robot);
    }

    /// The package currently pending for `robot`.
    pub fn pending_assignment(&self, robot: RobotId) -> Option<PackageId> {
        self.records.get(&robot).map(|rec| rec.package_id)
    }

    pub fn record(&self, robot: RobotId) -> Option<&AssignmentRecord> {
        self.records.get(&robot)
    }

    /// Number of pending assignments.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
