//! Plain data row types written by recorders.

use chrono::{DateTime, SecondsFormat, Utc};

use wh_core::{Package, Reservation};
use wh_sim::TimelineEvent;

/// One package lifecycle record: a spawn or a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub package_id:     u64,
    pub status:         &'static str,
    pub priority:       String,
    pub x:              u32,
    pub y:              u32,
    /// `None` while the package is queued.
    pub assigned_robot: Option<u32>,
    pub created_at:     DateTime<Utc>,
    pub recorded_at:    DateTime<Utc>,
}

impl PackageRow {
    pub fn new(package: &Package, recorded_at: DateTime<Utc>) -> Self {
        Self {
            package_id:     package.id.0,
            status:         package.status().as_str(),
            priority:       package.priority.clone(),
            x:              package.position.x,
            y:              package.position.y,
            assigned_robot: package.assigned_robot().map(|r| r.0),
            created_at:     package.created_at,
            recorded_at,
        }
    }
}

/// One live cell claim, tagged with the tick batch it was captured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationRow {
    pub batch:      u64,
    pub robot_id:   u32,
    pub x:          u32,
    pub y:          u32,
    pub created_at: DateTime<Utc>,
    pub ttl_secs:   u32,
}

impl ReservationRow {
    pub fn new(batch: u64, reservation: &Reservation) -> Self {
        Self {
            batch,
            robot_id:   reservation.robot_id.0,
            x:          reservation.position.x,
            y:          reservation.position.y,
            created_at: reservation.created_at,
            ttl_secs:   reservation.ttl_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub timestamp: DateTime<Utc>,
    pub kind:      &'static str,
    pub message:   String,
    /// Compact JSON.
    pub payload:   String,
}

impl From<&TimelineEvent> for EventRow {
    fn from(event: &TimelineEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            kind:      event.kind.as_str(),
            message:   event.message.clone(),
            payload:   event.payload.to_string(),
        }
    }
}

/// RFC 3339 with millisecond precision, as written to every backend.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
