//! Robot operating states.

/// Operating state of one robot.
///
/// `Idle → Fetching → Delivering → Idle` is the success cycle; any non-idle
/// state may drop to `Faulted`, which only leaves via recovery to `Idle`.
/// The transition rules themselves are enforced by `wh-agent::RobotAgent`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RobotState {
    #[default]
    Idle,
    Fetching,
    Delivering,
    Faulted,
}

impl RobotState {
    /// `true` while the robot is working a job (counts toward utilization).
    #[inline]
    pub fn is_working(self) -> bool {
        matches!(self, RobotState::Fetching | RobotState::Delivering)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RobotState::Idle       => "IDLE",
            RobotState::Fetching   => "FETCHING",
            RobotState::Delivering => "DELIVERING",
            RobotState::Faulted    => "FAULTED",
        }
    }
}
