use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wh_agent::RobotTelemetry;
use wh_core::{Package, Reservation, WarehouseLayout};

/// Immutable point-in-time view of one simulation.
///
/// Cheap to clone apart from the package and robot vectors: the layout is
/// shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSnapshot {
    pub timestamp:    DateTime<Utc>,
    pub packages:     Vec<Package>,
    pub reservations: Vec<Reservation>,
    pub robots:       Vec<RobotTelemetry>,
    pub layout:       Arc<WarehouseLayout>,
}

impl WarehouseSnapshot {
    /// A snapshot with no packages, claims, or robots.
    pub fn empty(layout: Arc<WarehouseLayout>) -> Self {
        Self {
            timestamp:    Utc::now(),
            packages:     Vec::new(),
            reservations: Vec::new(),
            robots:       Vec::new(),
            layout,
        }
    }
}
