//! Packages and their delivery lifecycle.
//!
//! ```text
//! QUEUED ──assign──▶ ASSIGNED ──pick_up──▶ IN_TRANSIT ──deliver──▶ DELIVERED
//!    ▲                   │                     │
//!    └──────requeue──────┴─────────────────────┘
//! ```
//!
//! Forward transitions move exactly one step.  `requeue` is the only backward
//! edge and is reserved for recovery (faults, deadlocks, planning failures).
//! Every mutator validates the current status and returns
//! [`CoreError::InvalidPackageTransition`] instead of silently overwriting.

use chrono::{DateTime, Utc};

use crate::{CoreError, CoreResult, GridPosition, PackageId, RobotId};

/// Where a package is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PackageStatus {
    Queued,
    Assigned,
    InTransit,
    Delivered,
}

impl PackageStatus {
    /// The single status a forward transition may reach from `self`.
    pub fn next(self) -> Option<PackageStatus> {
        match self {
            PackageStatus::Queued    => Some(PackageStatus::Assigned),
            PackageStatus::Assigned  => Some(PackageStatus::InTransit),
            PackageStatus::InTransit => Some(PackageStatus::Delivered),
            PackageStatus::Delivered => None,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == PackageStatus::Delivered
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Queued    => "QUEUED",
            PackageStatus::Assigned  => "ASSIGNED",
            PackageStatus::InTransit => "IN_TRANSIT",
            PackageStatus::Delivered => "DELIVERED",
        }
    }
}

/// A unit of work: fetch from `position` (a pickup zone), carry to a dropoff.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Package {
    pub id:             PackageId,
    pub created_at:     DateTime<Utc>,
    /// Pickup cell.  Not updated while the package is carried.
    pub position:       GridPosition,
    /// Priority class name (key into the demand profile's SLA table).
    pub priority:       String,
    status:             PackageStatus,
    assigned_robot:     Option<RobotId>,
}

impl Package {
    /// A freshly queued package at `position`.
    pub fn new(id: PackageId, position: GridPosition, priority: impl Into<String>) -> Self {
        Self::with_created_at(id, position, priority, Utc::now())
    }

    /// As [`Package::new`] with an explicit creation timestamp.
    pub fn with_created_at(
        id:         PackageId,
        position:   GridPosition,
        priority:   impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            created_at,
            position,
            priority: priority.into(),
            status: PackageStatus::Queued,
            assigned_robot: None,
        }
    }

    #[inline]
    pub fn status(&self) -> PackageStatus {
        self.status
    }

    #[inline]
    pub fn assigned_robot(&self) -> Option<RobotId> {
        self.assigned_robot
    }

    /// QUEUED → ASSIGNED, recording the committed robot.
    pub fn assign(&mut self, robot: RobotId) -> CoreResult<()> {
        self.advance(PackageStatus::Assigned)?;
        self.assigned_robot = Some(robot);
        Ok(())
    }

    /// ASSIGNED → IN_TRANSIT, when the robot reaches the pickup cell.
    pub fn pick_up(&mut self) -> CoreResult<()> {
        self.advance(PackageStatus::InTransit)
    }

    /// IN_TRANSIT → DELIVERED.  Terminal.
    pub fn deliver(&mut self) -> CoreResult<()> {
        self.advance(PackageStatus::Delivered)
    }

    /// ASSIGNED | IN_TRANSIT → QUEUED, clearing the assigned robot.
    ///
    /// Requeueing an already-queued package is a no-op.
    pub fn requeue(&mut self) -> CoreResult<()> {
        match self.status {
            PackageStatus::Queued => Ok(()),
            PackageStatus::Assigned | PackageStatus::InTransit => {
                self.status = PackageStatus::Queued;
                self.assigned_robot = None;
                Ok(())
            }
            PackageStatus::Delivered => Err(self.invalid(PackageStatus::Queued)),
        }
    }

    fn advance(&mut self, to: PackageStatus) -> CoreResult<()> {
        if self.status.next() != Some(to) {
            return Err(self.invalid(to));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, to: PackageStatus) -> CoreError {
        CoreError::InvalidPackageTransition { package: self.id, from: self.status, to }
    }
}
