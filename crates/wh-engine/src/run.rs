//! Catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wh_core::Tick;
use wh_sim::{Heatmap, RunMetrics, RunStage, ScenarioConfig, TimelineEvent, WarehouseSnapshot};

use crate::{RunId, ScenarioId};

/// A registered scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id:         ScenarioId,
    pub created_at: DateTime<Utc>,
    pub config:     ScenarioConfig,
}

/// Live record of one run, updated by its task as ticks are emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub id:              RunId,
    pub scenario_id:     ScenarioId,
    pub stage:           RunStage,
    pub created_at:      DateTime<Utc>,
    pub started_at:      Option<DateTime<Utc>>,
    pub completed_at:    Option<DateTime<Utc>>,
    /// Step count and elapsed seconds as of the last emitted tick.
    pub tick:            Tick,
    pub elapsed_seconds: f64,
    pub metrics:         RunMetrics,
    pub heatmap:         Heatmap,
    /// Every timeline event, oldest first.
    pub timeline:        Vec<TimelineEvent>,
    pub last_snapshot:   Option<WarehouseSnapshot>,
    pub error:           Option<String>,
}

impl ScenarioRun {
    pub(crate) fn queued(id: RunId, scenario_id: ScenarioId) -> Self {
        Self {
            id,
            scenario_id,
            stage:           RunStage::Queued,
            created_at:      Utc::now(),
            started_at:      None,
            completed_at:    None,
            tick:            Tick::default(),
            elapsed_seconds: 0.0,
            metrics:         RunMetrics::default(),
            heatmap:         Heatmap::default(),
            timeline:        Vec::new(),
            last_snapshot:   None,
            error:           None,
        }
    }
}
