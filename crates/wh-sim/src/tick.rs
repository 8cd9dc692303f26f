use serde::{Deserialize, Serialize};

use wh_core::Tick;

use crate::{Heatmap, RunMetrics, RunStage, TimelineEvent, WarehouseSnapshot};

/// One record of a run's tick stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTick {
    pub stage:           RunStage,
    /// Steps taken when the tick was built.
    pub tick:            Tick,
    pub elapsed_seconds: f64,
    pub snapshot:        WarehouseSnapshot,
    pub metrics:         RunMetrics,
    pub heatmap:         Heatmap,
    /// Events recorded since the previous emitted tick.
    pub recent_events:   Vec<TimelineEvent>,
}
