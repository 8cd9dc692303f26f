//! Per-tick agent outcomes.

use wh_core::{GridPosition, PackageId};

/// What one call to [`RobotAgent::update`][crate::RobotAgent::update] did.
///
/// The agent only mutates its own state.  Package-store and metric side
/// effects (`PickedUp`, `Delivered`) are applied by the caller, so agents
/// never hold references into shared simulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    /// Advanced one cell along the committed path.
    Moved { from: GridPosition, to: GridPosition },

    /// Next cell is reserved by another robot; no movement this tick.
    Waiting { blocked: GridPosition },

    /// Reached the pickup cell and is now carrying the package.
    PickedUp(PackageId),

    /// Reached the dropoff; job finished, robot is idle again.
    Delivered(PackageId),

    /// Working, but without a path that ends here.  Needs replanning.
    AwaitingPlan,

    /// Nothing to do.
    Idle,

    /// Faulted robots do not act.
    Halted,
}

impl AgentEvent {
    #[inline]
    pub fn moved(&self) -> bool {
        matches!(self, AgentEvent::Moved { .. })
    }
}
