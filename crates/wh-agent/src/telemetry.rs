use wh_core::{GridPosition, PackageId, RobotId, RobotState};

/// Point-in-time view of one robot, as published in snapshots.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RobotTelemetry {
    pub robot_id:      RobotId,
    pub state:         RobotState,
    pub position:      GridPosition,
    /// Charge in `[0, 1]`.  Batteries are not modelled; always full.
    pub battery_level: f32,
    pub current_job:   Option<PackageId>,
    /// Cells still to visit, next move first.
    pub path:          Vec<GridPosition>,
}
