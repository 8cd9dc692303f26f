//! Scenario configuration.
//!
//! A [`ScenarioConfig`] is a fully formed value: transport layers parse raw
//! input into it, and [`ScenarioConfig::validate`] only checks type-level
//! constraints (positive sizes, ratios in `[0, 1]`, zones on the grid).
//!
//! Every profile has serde defaults, so a JSON scenario may omit whole
//! sections:
//!
//! ```json
//! {
//!   "name": "Smoke",
//!   "layout": { "width": 20, "height": 15, "pickup_zones": [[1, 5]], "dropoff_zones": [[18, 5]] },
//!   "fleet": { "total_robots": 2 },
//!   "demand": { "packages_per_hour": 60 },
//!   "horizon": { "duration_minutes": 5 }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use wh_core::{GridPosition, WarehouseLayout};
use wh_spatial::planner_for;

use crate::{SimError, SimResult};

// ── Layout ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub width:          u32,
    pub height:         u32,
    #[serde(default = "default_cell_size")]
    pub cell_size:      u32,
    pub pickup_zones:   Vec<(u32, u32)>,
    pub dropoff_zones:  Vec<(u32, u32)>,
    #[serde(default)]
    pub obstacles:      Vec<(u32, u32)>,
    #[serde(default)]
    pub charging_zones: Vec<(u32, u32)>,
}

fn default_cell_size() -> u32 {
    32
}

impl LayoutConfig {
    pub fn to_layout(&self) -> WarehouseLayout {
        let cells = |v: &[(u32, u32)]| v.iter().copied().map(GridPosition::from).collect::<Vec<_>>();
        let mut layout = WarehouseLayout::new(self.width, self.height, self.cell_size);
        layout.obstacles = self.obstacles.iter().copied().map(GridPosition::from).collect();
        layout.pickup_zones = cells(&self.pickup_zones);
        layout.dropoff_zones = cells(&self.dropoff_zones);
        layout.charging_zones = cells(&self.charging_zones);
        layout
    }
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

/// Descriptive robot class.  Movement is always one cell per tick; these
/// fields are carried for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetClassConfig {
    pub name:                     String,
    pub speed_cells_per_tick:     f64,
    pub payload_capacity:         u32,
    pub battery_capacity_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    pub total_robots:       usize,
    #[serde(default)]
    pub classes:            Vec<FleetClassConfig>,
    /// Cycled when shorter than the fleet; empty means `(i % 3, i)`.
    #[serde(default)]
    pub starting_positions: Vec<(u32, u32)>,
}

// ── Profiles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandProfile {
    pub packages_per_hour: f64,
    /// Priority class → relative weight at spawn.
    pub priority_mix:      BTreeMap<String, f64>,
    /// Priority class → delivery SLA in minutes.
    pub sla_minutes:       BTreeMap<String, f64>,
}

impl Default for DemandProfile {
    fn default() -> Self {
        Self {
            packages_per_hour: 60.0,
            priority_mix: BTreeMap::from([("standard".into(), 0.7), ("express".into(), 0.3)]),
            sla_minutes:  BTreeMap::from([("standard".into(), 30.0), ("express".into(), 12.0)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsProfile {
    pub shift_minutes:  u32,
    /// Simulated length of one tick.
    pub cadence_ms:     u64,
    pub warmup_minutes: f64,
    /// Wall-clock acceleration: the loop sleeps `cadence_ms / time_scale`.
    pub time_scale:     f64,
}

impl Default for OperationsProfile {
    fn default() -> Self {
        Self { shift_minutes: 480, cadence_ms: 500, warmup_minutes: 2.0, time_scale: 10.0 }
    }
}

impl OperationsProfile {
    /// Simulated seconds per tick.
    #[inline]
    pub fn tick_seconds(&self) -> f64 {
        self.cadence_ms as f64 / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureProfile {
    pub fault_probability_per_hour: f64,
    pub mean_recovery_minutes:      f64,
}

impl Default for FailureProfile {
    fn default() -> Self {
        Self { fault_probability_per_hour: 0.1, mean_recovery_minutes: 5.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationProfile {
    /// Planner name, resolved by `wh_spatial::planner_for`.
    pub planner:             String,
    /// Informational; assignment is always greedy nearest-first.
    pub assignment_policy:   String,
    pub reservation_horizon: u32,
}

impl Default for OptimizationProfile {
    fn default() -> Self {
        Self { planner: "astar".into(), assignment_policy: "hungarian".into(), reservation_horizon: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonProfile {
    pub duration_minutes:   f64,
    #[serde(default)]
    pub stop_on_completion: bool,
}

// ── ScenarioConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name:         String,
    #[serde(default)]
    pub description:  String,
    pub layout:       LayoutConfig,
    pub fleet:        FleetConfig,
    #[serde(default)]
    pub demand:       DemandProfile,
    #[serde(default)]
    pub operations:   OperationsProfile,
    #[serde(default)]
    pub failures:     FailureProfile,
    #[serde(default)]
    pub optimization: OptimizationProfile,
    pub horizon:      HorizonProfile,
    /// Fixes spawn and fault randomness.  `None` seeds from entropy.
    #[serde(default)]
    pub seed:         Option<u64>,
    #[serde(default)]
    pub metadata:     BTreeMap<String, serde_json::Value>,
}

impl ScenarioConfig {
    /// Type-level checks only.
    pub fn validate(&self) -> SimResult<()> {
        self.layout.to_layout().validate()?;

        if self.fleet.total_robots == 0 {
            return Err(config_err("fleet.total_robots must be at least 1"));
        }

        let demand = &self.demand;
        non_negative("demand.packages_per_hour", demand.packages_per_hour)?;
        for (class, &w) in &demand.priority_mix {
            if !(0.0..=1.0).contains(&w) {
                return Err(config_err(format!("priority_mix[{class}] = {w} is outside [0, 1]")));
            }
        }
        for (class, &m) in &demand.sla_minutes {
            positive(&format!("sla_minutes[{class}]"), m)?;
        }

        let ops = &self.operations;
        if ops.cadence_ms == 0 {
            return Err(config_err("operations.cadence_ms must be positive"));
        }
        positive("operations.time_scale", ops.time_scale)?;
        non_negative("operations.warmup_minutes", ops.warmup_minutes)?;

        non_negative("failures.fault_probability_per_hour", self.failures.fault_probability_per_hour)?;
        non_negative("failures.mean_recovery_minutes", self.failures.mean_recovery_minutes)?;

        positive("horizon.duration_minutes", self.horizon.duration_minutes)?;

        planner_for(&self.optimization.planner)?;
        Ok(())
    }
}

fn config_err(msg: impl Into<String>) -> SimError {
    SimError::Config(msg.into())
}

fn positive(field: &str, v: f64) -> SimResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(config_err(format!("{field} must be positive, got {v}")))
    }
}

fn non_negative(field: &str, v: f64) -> SimResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(config_err(format!("{field} must be non-negative, got {v}")))
    }
}
