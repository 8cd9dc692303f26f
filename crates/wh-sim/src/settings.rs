use std::time::Duration;

use serde::{Deserialize, Serialize};

use wh_schedule::{DEFAULT_DEADLOCK_THRESHOLD, DEFAULT_MAX_STALLED_TICKS};
use wh_spatial::{DEFAULT_MAX_COST, DEFAULT_TTL_SECS};

/// Engine-level tuning shared by every run.
///
/// Constructed explicitly and passed to [`SimulationService`] and the
/// runner; there is no process-wide instance.
///
/// [`SimulationService`]: crate::SimulationService
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub reservation_ttl_secs: u32,
    pub deadlock_threshold:   u32,
    pub max_stalled_ticks:    u32,
    pub astar_max_cost:       u32,
    /// Minimum wall-clock gap between unforced tick emissions.
    pub emit_interval_ms:     u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            reservation_ttl_secs: DEFAULT_TTL_SECS,
            deadlock_threshold:   DEFAULT_DEADLOCK_THRESHOLD,
            max_stalled_ticks:    DEFAULT_MAX_STALLED_TICKS,
            astar_max_cost:       DEFAULT_MAX_COST,
            emit_interval_ms:     5_000,
        }
    }
}

impl SimulationSettings {
    #[inline]
    pub fn emit_interval(&self) -> Duration {
        Duration::from_millis(self.emit_interval_ms)
    }
}
