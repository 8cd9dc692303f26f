//! Reservation broadcast boundary.

use wh_core::{GridPosition, Reservation, RobotId};

/// `(robot, cell)` published whenever a robot claims the cell it moves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReservationClaim {
    pub robot_id: RobotId,
    pub x:        u32,
    pub y:        u32,
}

impl ReservationClaim {
    pub fn position(&self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }
}

impl From<&Reservation> for ReservationClaim {
    fn from(r: &Reservation) -> Self {
        Self { robot_id: r.robot_id, x: r.position.x, y: r.position.y }
    }
}

/// Receives every claim a robot makes.
///
/// Mirrors claims to out-of-process observers (a message bus, a UI).  The
/// simulation never depends on delivery succeeding, so implementations must
/// not fail and must not block.
pub trait ClaimListener {
    fn on_claim(&mut self, _claim: ReservationClaim) {}
}

/// A [`ClaimListener`] that drops every claim.
pub struct NoopListener;

impl ClaimListener for NoopListener {}

/// Collects claims in order.  Handy for batching a tick's claims.
impl ClaimListener for Vec<ReservationClaim> {
    fn on_claim(&mut self, claim: ReservationClaim) {
        self.push(claim);
    }
}
