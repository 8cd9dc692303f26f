//! Single-claim-per-robot cell reservations with TTL eviction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use wh_core::{GridPosition, Reservation, RobotId};

/// Default claim lifetime in seconds.
pub const DEFAULT_TTL_SECS: u32 = 3;

/// In-memory reservation table for one run.
///
/// Each robot holds at most one claim; a new claim overwrites the previous
/// one.  Expired claims are purged lazily on every read, never on a timer.
///
/// Every read has an `_at` variant taking an explicit `now` so expiry can be
/// tested without sleeping; the plain variants use `Utc::now()`.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    default_ttl:  u32,
    reservations: BTreeMap<RobotId, Reservation>,
}

impl Default for ReservationManager {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

impl ReservationManager {
    pub fn new(default_ttl: u32) -> Self {
        Self { default_ttl, reservations: BTreeMap::new() }
    }

    #[inline]
    pub fn default_ttl(&self) -> u32 {
        self.default_ttl
    }

    /// Claim `position` for `robot` with the default TTL.
    pub fn claim(&mut self, robot: RobotId, position: GridPosition) -> Reservation {
        self.claim_with_ttl(robot, position, self.default_ttl, Utc::now())
    }

    /// Claim `position` for `robot`, replacing any earlier claim.
    pub fn claim_with_ttl(
        &mut self,
        robot:    RobotId,
        position: GridPosition,
        ttl_secs: u32,
        now:      DateTime<Utc>,
    ) -> Reservation {
        let reservation = Reservation::new(robot, position, now, ttl_secs);
        self.reservations.insert(robot, reservation.clone());
        reservation
    }

    /// Drop `robot`'s claim, if any.
    pub fn release(&mut self, robot: RobotId) {
        self.reservations.remove(&robot);
    }

    /// `true` if a robot other than `exclude` holds a live claim on `position`.
    pub fn is_reserved(&mut self, position: GridPosition, exclude: Option<RobotId>) -> bool {
        self.is_reserved_at(position, exclude, Utc::now())
    }

    pub fn is_reserved_at(
        &mut self,
        position: GridPosition,
        exclude:  Option<RobotId>,
        now:      DateTime<Utc>,
    ) -> bool {
        self.purge_expired(now);
        self.reservations
            .values()
            .any(|r| r.position == position && Some(r.robot_id) != exclude)
    }

    /// All live claims, ordered by robot id.
    pub fn reservations(&mut self) -> Vec<Reservation> {
        self.reservations_at(Utc::now())
    }

    pub fn reservations_at(&mut self, now: DateTime<Utc>) -> Vec<Reservation> {
        self.purge_expired(now);
        self.reservations.values().cloned().collect()
    }

    /// `robot`'s live claim, if any.
    pub fn get(&mut self, robot: RobotId) -> Option<&Reservation> {
        self.get_at(robot, Utc::now())
    }

    pub fn get_at(&mut self, robot: RobotId, now: DateTime<Utc>) -> Option<&Reservation> {
        self.purge_expired(now);
        self.reservations.get(&robot)
    }

    /// Drop every claim.
    pub fn reset(&mut self) {
        self.reservations.clear();
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) {
        let before = self.reservations.len();
        self.reservations.retain(|_, r| !r.is_expired(now));
        let purged = before - self.reservations.len();
        if purged > 0 {
            tracing::trace!(purged, "expired reservations evicted");
        }
    }
}
