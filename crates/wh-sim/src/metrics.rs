//! Run-level metrics, recomputed every tick from lifetime counters.

use serde::{Deserialize, Serialize};

use wh_agent::RobotAgent;
use wh_core::{RobotState, Tick};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub throughput_per_hour:        f64,
    pub sla_breaches:               u64,
    pub average_cycle_time_seconds: f64,
    /// Robots not IDLE (faulted ones included).
    pub active_robots:              usize,
    /// Working robot-ticks over total robot-ticks.
    pub utilization:                f64,
    pub fault_ratio:                f64,
    /// Undelivered packages.
    pub queue_depth:                usize,
    pub delivered:                  u64,
    pub spawned:                    u64,
}

/// Lifetime counters behind [`RunMetrics`].
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    pub spawned:            u64,
    pub delivered:          u64,
    pub sla_breaches:       u64,
    /// Steps taken so far.
    pub ticks:              Tick,
    pub active_robot_ticks: u64,
    cycle_time_sum:         f64,
    cycle_count:            u64,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished delivery.  `sla_secs` is the package's own
    /// priority SLA, if its class has one.
    pub fn record_delivery(&mut self, cycle_secs: f64, sla_secs: Option<f64>) {
        self.cycle_time_sum += cycle_secs;
        self.cycle_count += 1;
        if sla_secs.is_some_and(|sla| cycle_secs > sla) {
            self.sla_breaches += 1;
        }
    }

    pub fn compute(&self, elapsed_secs: f64, robots: &[RobotAgent], queue_depth: usize) -> RunMetrics {
        let fleet = robots.len();
        let throughput_per_hour = if elapsed_secs > 0.0 {
            self.delivered as f64 / elapsed_secs * 3600.0
        } else {
            0.0
        };
        let average_cycle_time_seconds = if self.cycle_count > 0 {
            self.cycle_time_sum / self.cycle_count as f64
        } else {
            0.0
        };
        let (utilization, fault_ratio) = if fleet > 0 {
            let ticks = self.ticks.0.max(1) as f64;
            let faulted = robots.iter().filter(|r| r.state() == RobotState::Faulted).count();
            (
                self.active_robot_ticks as f64 / (ticks * fleet as f64),
                faulted as f64 / fleet as f64,
            )
        } else {
            (0.0, 0.0)
        };

        RunMetrics {
            throughput_per_hour,
            sla_breaches: self.sla_breaches,
            average_cycle_time_seconds,
            active_robots: robots.iter().filter(|r| r.state() != RobotState::Idle).count(),
            utilization,
            fault_ratio,
            queue_depth,
            delivered: self.delivered,
            spawned: self.spawned,
        }
    }
}
