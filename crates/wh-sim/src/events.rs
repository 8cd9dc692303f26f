//! Run timeline events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What happened.  Serialized as the lower-snake-case event type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    PackageSpawned,
    AssignmentFailed,
    DropoffBlocked,
    RobotFaulted,
    RobotStalled,
    RobotRecovered,
    PackageDelivered,
    DeadlockResolved,
    StageTransition,
    RunCancelled,
    RunFailed,
}

impl TimelineEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TimelineEventKind::PackageSpawned   => "package_spawned",
            TimelineEventKind::AssignmentFailed => "assignment_failed",
            TimelineEventKind::DropoffBlocked   => "dropoff_blocked",
            TimelineEventKind::RobotFaulted     => "robot_faulted",
            TimelineEventKind::RobotStalled     => "robot_stalled",
            TimelineEventKind::RobotRecovered   => "robot_recovered",
            TimelineEventKind::PackageDelivered => "package_delivered",
            TimelineEventKind::DeadlockResolved => "deadlock_resolved",
            TimelineEventKind::StageTransition  => "stage_transition",
            TimelineEventKind::RunCancelled     => "run_cancelled",
            TimelineEventKind::RunFailed        => "run_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind:      TimelineEventKind,
    pub message:   String,
    /// Free-form details, usually `robot_id` / `package_id`.
    pub payload:   Value,
}

impl TimelineEvent {
    pub fn new(kind: TimelineEventKind, message: impl Into<String>, payload: Value) -> Self {
        Self { timestamp: Utc::now(), kind, message: message.into(), payload }
    }
}
