//! Built-in scenarios registered by every new engine.

use std::collections::BTreeMap;

use wh_sim::{
    DemandProfile, FailureProfile, FleetClassConfig, FleetConfig, HorizonProfile, LayoutConfig,
    OperationsProfile, OptimizationProfile, ScenarioConfig,
};

/// All presets, in catalog order.
pub fn all() -> Vec<ScenarioConfig> {
    vec![peak_hour(), robot_outage(), priority_rush()]
}

/// Dense arrivals on a 24×16 floor split by a central wall.
pub fn peak_hour() -> ScenarioConfig {
    ScenarioConfig {
        name:        "Peak Hour".into(),
        description: "High throughput load with dense arrivals".into(),
        layout: LayoutConfig {
            width:          24,
            height:         16,
            cell_size:      32,
            pickup_zones:   vec![(1, 4), (1, 6), (1, 8), (1, 10)],
            dropoff_zones:  vec![(22, 5), (22, 7), (22, 9)],
            obstacles:      wall(10, 2..14),
            charging_zones: vec![(2, 2), (2, 13)],
        },
        fleet:        fleet(6, class("AGV", 1.0, 240)),
        demand:       demand(120.0, 0.6, 0.4, None),
        operations:   OperationsProfile { shift_minutes: 120, cadence_ms: 400, warmup_minutes: 2.0, time_scale: 12.0 },
        failures:     FailureProfile { fault_probability_per_hour: 0.12, mean_recovery_minutes: 3.0 },
        optimization: OptimizationProfile::default(),
        horizon:      HorizonProfile { duration_minutes: 30.0, stop_on_completion: false },
        seed:         None,
        metadata:     BTreeMap::new(),
    }
}

/// Frequent, slow-to-clear faults on a smaller fleet.
pub fn robot_outage() -> ScenarioConfig {
    ScenarioConfig {
        name:        "Robot Outage".into(),
        description: "Simulate cascading robot failures".into(),
        layout: LayoutConfig {
            width:          20,
            height:         14,
            cell_size:      32,
            pickup_zones:   vec![(1, 3), (1, 6), (1, 9)],
            dropoff_zones:  vec![(18, 4), (18, 8)],
            obstacles:      wall(8, 1..13),
            charging_zones: vec![(3, 12)],
        },
        fleet:        fleet(4, class("Standard", 0.8, 180)),
        demand:       demand(80.0, 0.8, 0.2, None),
        operations:   OperationsProfile { shift_minutes: 90, cadence_ms: 500, warmup_minutes: 1.0, time_scale: 10.0 },
        failures:     FailureProfile { fault_probability_per_hour: 0.35, mean_recovery_minutes: 8.0 },
        optimization: OptimizationProfile::default(),
        horizon:      HorizonProfile { duration_minutes: 20.0, stop_on_completion: false },
        seed:         None,
        metadata:     BTreeMap::new(),
    }
}

/// Express-heavy surge with tight SLAs.
pub fn priority_rush() -> ScenarioConfig {
    ScenarioConfig {
        name:        "Priority Rush".into(),
        description: "Express-heavy surge with tight SLAs".into(),
        layout: LayoutConfig {
            width:          22,
            height:         18,
            cell_size:      32,
            pickup_zones:   vec![(2, 4), (2, 8), (2, 12)],
            dropoff_zones:  vec![(20, 5), (20, 9), (20, 13)],
            obstacles:      wall(11, 3..15),
            charging_zones: vec![(3, 16), (4, 16)],
        },
        fleet:        fleet(5, class("Express", 1.2, 200)),
        demand:       demand(150.0, 0.3, 0.7, Some((25.0, 8.0))),
        operations:   OperationsProfile { shift_minutes: 120, cadence_ms: 350, warmup_minutes: 1.0, time_scale: 14.0 },
        failures:     FailureProfile { fault_probability_per_hour: 0.2, mean_recovery_minutes: 4.0 },
        optimization: OptimizationProfile::default(),
        horizon:      HorizonProfile { duration_minutes: 25.0, stop_on_completion: false },
        seed:         None,
        metadata:     BTreeMap::new(),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Vertical wall in column `x`.
fn wall(x: u32, rows: std::ops::Range<u32>) -> Vec<(u32, u32)> {
    rows.map(|y| (x, y)).collect()
}

fn class(name: &str, speed: f64, battery_minutes: u32) -> FleetClassConfig {
    FleetClassConfig {
        name:                     name.into(),
        speed_cells_per_tick:     speed,
        payload_capacity:         1,
        battery_capacity_minutes: battery_minutes,
    }
}

fn fleet(total_robots: usize, class: FleetClassConfig) -> FleetConfig {
    FleetConfig { total_robots, classes: vec![class], starting_positions: Vec::new() }
}

/// `sla` overrides the default `(standard, express)` minutes.
fn demand(packages_per_hour: f64, standard: f64, express: f64, sla: Option<(f64, f64)>) -> DemandProfile {
    let mut profile = DemandProfile {
        packages_per_hour,
        priority_mix: BTreeMap::from([("standard".into(), standard), ("express".into(), express)]),
        ..DemandProfile::default()
    };
    if let Some((standard, express)) = sla {
        profile.sla_minutes = BTreeMap::from([("standard".into(), standard), ("express".into(), express)]);
    }
    profile
}
