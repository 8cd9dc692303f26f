//! Stall detection.

use std::collections::BTreeMap;

use wh_core::{GridPosition, RobotId, RobotState};

/// Stationary working ticks before a robot is flagged faulted.
pub const DEFAULT_MAX_STALLED_TICKS: u32 = 20;

/// Stall bookkeeping for one robot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthStatus {
    pub robot_id:      RobotId,
    pub stalled_ticks: u32,
    pub faulted:       bool,
    pub last_position: GridPosition,
}

/// Flags robots that keep a job but stop moving.
///
/// Idle and already-faulted robots never accumulate stall ticks; they are
/// expected to stand still.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    max_stalled_ticks: u32,
    statuses:          BTreeMap<RobotId, HealthStatus>,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STALLED_TICKS)
    }
}

impl HealthMonitor {
    pub fn new(max_stalled_ticks: u32) -> Self {
        Self { max_stalled_ticks, statuses: BTreeMap::new() }
    }

    /// Record one observation and return the updated status.
    ///
    /// The first observation of a robot only establishes its baseline.
    pub fn observe(&mut self, robot: RobotId, position: GridPosition, state: RobotState) -> &HealthStatus {
        let max = self.max_stalled_ticks;
        let status = self.statuses.entry(robot).or_insert_with(|| HealthStatus {
            robot_id:      robot,
            stalled_ticks: 0,
            faulted:       false,
            last_position: position,
        });

        if status.last_position == position {
            if !matches!(state, RobotState::Idle | RobotState::Faulted) {
                status.stalled_ticks += 1;
            }
        } else {
            status.stalled_ticks = 0;
            status.faulted = false;
        }
        status.last_position = position;

        if status.stalled_ticks >= max && !status.faulted {
            status.faulted = true;
            tracing::warn!(robot = %robot, ticks = status.stalled_ticks, "robot stalled");
        }
        status
    }

    /// Reset `robot`'s stall counter and fault flag.
    pub fn clear_fault(&mut self, robot: RobotId) {
        if let Some(status) = self.statuses.get_mut(&robot) {
            status.faulted = false;
            status.stalled_ticks = 0;
        }
    }

    pub fn status(&self, robot: RobotId) -> Option<&HealthStatus> {
        self.statuses.get(&robot)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &HealthStatus> {
        self.statuses.values()
    }
}
