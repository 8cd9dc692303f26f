//! Time-limited cell claims.

use chrono::{DateTime, Duration, Utc};

use crate::{GridPosition, RobotId};

/// A claim by one robot on one grid cell, valid for `ttl_secs` after
/// `created_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reservation {
    pub robot_id:   RobotId,
    pub position:   GridPosition,
    pub created_at: DateTime<Utc>,
    pub ttl_secs:   u32,
}

impl Reservation {
    pub fn new(robot_id: RobotId, position: GridPosition, created_at: DateTime<Utc>, ttl_secs: u32) -> Self {
        Self { robot_id, position, created_at, ttl_secs }
    }

    #[inline]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(i64::from(self.ttl_secs))
    }

    /// Expired once `now >= created_at + ttl`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}
