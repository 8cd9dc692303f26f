//! Run lifecycle stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{SimError, SimResult};

/// Lifecycle phase of one scenario run.
///
/// ```text
/// QUEUED → WARMING_UP → RUNNING → { COMPLETED | FAILED | CANCELLED }
/// ```
///
/// Forward only.  A run may also end from `QUEUED` or `WARMING_UP` (cancelled
/// or failed before the active window), but never re-enters an earlier stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStage {
    #[default]
    Queued,
    WarmingUp,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStage {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Completed | RunStage::Failed | RunStage::Cancelled)
    }

    /// Position along the forward chain; terminals share the last rank.
    fn rank(self) -> u8 {
        match self {
            RunStage::Queued    => 0,
            RunStage::WarmingUp => 1,
            RunStage::Running   => 2,
            RunStage::Completed | RunStage::Failed | RunStage::Cancelled => 3,
        }
    }

    /// `true` if `self → to` is a legal forward edge.
    pub fn can_transition_to(self, to: RunStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            RunStage::Queued    => false,
            RunStage::WarmingUp => self == RunStage::Queued,
            RunStage::Running   => self == RunStage::WarmingUp,
            RunStage::Completed => self == RunStage::Running,
            RunStage::Failed | RunStage::Cancelled => to.rank() > self.rank(),
        }
    }

    /// Validated transition.
    pub fn transition(&mut self, to: RunStage) -> SimResult<()> {
        if !self.can_transition_to(to) {
            return Err(SimError::InvalidStage { from: *self, to });
        }
        *self = to;
        Ok(())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStage::Queued    => "QUEUED",
            RunStage::WarmingUp => "WARMING_UP",
            RunStage::Running   => "RUNNING",
            RunStage::Completed => "COMPLETED",
            RunStage::Failed    => "FAILED",
            RunStage::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
