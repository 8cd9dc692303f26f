//! Unit and integration tests for wh-sim.

use std::sync::{Arc, Mutex};

use wh_core::{GridPosition, Package, PackageId, PackageStatus};

use crate::{
    HorizonProfile, LayoutConfig, PersistenceHooks, RunOutcome, RunTick, ScenarioConfig, TickSink,
    TimelineEvent, TimelineEventKind,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn p(x: u32, y: u32) -> GridPosition {
    GridPosition::new(x, y)
}

/// 20×15 floor, one pickup at (1,5), one dropoff at (18,5), no obstacles.
fn layout_config() -> LayoutConfig {
    LayoutConfig {
        width:          20,
        height:         15,
        cell_size:      32,
        pickup_zones:   vec![(1, 5)],
        dropoff_zones:  vec![(18, 5)],
        obstacles:      vec![],
        charging_zones: vec![],
    }
}

/// Quiet scenario: no random arrivals, no faults, no warm-up.
fn quiet_config(robots: usize, starts: Vec<(u32, u32)>) -> ScenarioConfig {
    let json = serde_json::json!({
        "name": "test",
        "layout": layout_config(),
        "fleet": { "total_robots": robots, "starting_positions": starts },
        "demand": { "packages_per_hour": 0.0 },
        "operations": { "warmup_minutes": 0.0 },
        "failures": { "fault_probability_per_hour": 0.0 },
        "horizon": { "duration_minutes": 0.05 },
        "seed": 7
    });
    serde_json::from_value(json).unwrap()
}

/// Hooks that log every package status change.
#[derive(Clone, Default)]
struct StatusLog(Arc<Mutex<Vec<(PackageId, PackageStatus)>>>);

impl PersistenceHooks for StatusLog {
    fn record_package_spawn(&mut self, package: &Package) {
        self.0.lock().unwrap().push((package.id, package.status()));
    }

    fn update_package_status(&mut self, package: &Package) {
        self.0.lock().unwrap().push((package.id, package.status()));
    }
}

#[derive(Default)]
struct RecordingSink {
    started:  usize,
    events:   Vec<TimelineEventKind>,
    ticks:    Vec<RunTick>,
    finished: Vec<RunOutcome>,
}

impl TickSink for RecordingSink {
    fn on_started(&mut self, _at: chrono::DateTime<chrono::Utc>) {
        self.started += 1;
    }

    fn on_event(&mut self, event: &TimelineEvent) {
        self.events.push(event.kind);
    }

    fn on_tick(&mut self, tick: &RunTick) {
        self.ticks.push(tick.clone());
    }

    fn on_finished(&mut self, outcome: &RunOutcome) {
        self.finished.push(outcome.clone());
    }
}

// ── Stage ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stage_tests {
    use crate::{RunStage, SimError};

    #[test]
    fn forward_path_is_accepted() {
        let mut stage = RunStage::default();
        assert_eq!(stage, RunStage::Queued);
        stage.transition(RunStage::WarmingUp).unwrap();
        stage.transition(RunStage::Running).unwrap();
        stage.transition(RunStage::Completed).unwrap();
        assert!(stage.is_terminal());
    }

    #[test]
    fn backward_and_post_terminal_moves_are_rejected() {
        let mut stage = RunStage::Running;
        let err = stage.transition(RunStage::WarmingUp).unwrap_err();
        assert_eq!(err, SimError::InvalidStage { from: RunStage::Running, to: RunStage::WarmingUp });

        let mut done = RunStage::Cancelled;
        assert!(done.transition(RunStage::Running).is_err());
        assert!(done.transition(RunStage::Failed).is_err());
        assert_eq!(done, RunStage::Cancelled);
    }

    #[test]
    fn runs_may_end_before_the_active_window() {
        let mut stage = RunStage::WarmingUp;
        stage.transition(RunStage::Cancelled).unwrap();
        let mut queued = RunStage::Queued;
        queued.transition(RunStage::Failed).unwrap();
        assert!(!RunStage::WarmingUp.can_transition_to(RunStage::Completed));
    }

    #[test]
    fn serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&RunStage::WarmingUp).unwrap(), "\"WARMING_UP\"");
        assert_eq!(RunStage::Cancelled.to_string(), "CANCELLED");
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use super::*;
    use crate::SimError;

    #[test]
    fn sparse_json_gets_defaults() {
        let raw = r#"{
            "name": "Smoke",
            "layout": { "width": 20, "height": 15, "pickup_zones": [[1, 5]], "dropoff_zones": [[18, 5]] },
            "fleet": { "total_robots": 2 },
            "demand": { "packages_per_hour": 60 },
            "horizon": { "duration_minutes": 5 }
        }"#;
        let config: ScenarioConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.layout.cell_size, 32);
        assert_eq!(config.operations.cadence_ms, 500);
        assert_eq!(config.operations.time_scale, 10.0);
        assert_eq!(config.failures.mean_recovery_minutes, 5.0);
        assert_eq!(config.optimization.planner, "astar");
        assert_eq!(config.demand.priority_mix["express"], 0.3);
        assert_eq!(config.demand.sla_minutes["standard"], 30.0);
        assert!(!config.horizon.stop_on_completion);
        assert_eq!(config.seed, None);
        config.validate().unwrap();
    }

    #[test]
    fn empty_fleet_is_rejected() {
        let config = quiet_config(0, vec![]);
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn ratio_outside_unit_interval_is_rejected() {
        let mut config = quiet_config(1, vec![]);
        config.demand.priority_mix.insert("express".into(), 1.5);
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn unknown_planner_is_rejected() {
        let mut config = quiet_config(1, vec![]);
        config.optimization.planner = "dijkstra".into();
        assert!(matches!(config.validate(), Err(SimError::Spatial(_))));
    }

    #[test]
    fn zone_off_grid_is_rejected() {
        let mut config = quiet_config(1, vec![]);
        config.layout.dropoff_zones.push((25, 5));
        assert!(matches!(config.validate(), Err(SimError::Core(_))));
    }

    #[test]
    fn horizon_must_be_positive() {
        let mut config = quiet_config(1, vec![]);
        config.horizon = HorizonProfile { duration_minutes: 0.0, stop_on_completion: false };
        assert!(config.validate().is_err());
    }
}

// ── Small value types ─────────────────────────────────────────────────────────

#[cfg(test)]
mod value_tests {
    use super::*;
    use crate::{Heatmap, MetricsTracker};

    #[test]
    fn heatmap_serializes_with_coordinate_keys() {
        let mut map = Heatmap::new();
        map.visit(p(3, 4));
        map.visit(p(3, 4));
        map.visit(p(0, 1));
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value, serde_json::json!({ "3:4": 2, "0:1": 1 }));

        let back: Heatmap = serde_json::from_value(value).unwrap();
        assert_eq!(back, map);
        assert_eq!(back.total(), 3);
    }

    #[test]
    fn heatmap_rejects_malformed_keys() {
        let bad = serde_json::json!({ "nope": 1 });
        assert!(serde_json::from_value::<Heatmap>(bad).is_err());
    }

    #[test]
    fn timeline_event_type_is_snake_case() {
        let event = TimelineEvent::new(
            TimelineEventKind::PackageSpawned,
            "Package queued",
            serde_json::json!({ "package_id": 4 }),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "package_spawned");
        assert_eq!(value["payload"]["package_id"], 4);
    }

    #[test]
    fn sla_breach_uses_the_package_class() {
        let mut tracker = MetricsTracker::new();
        tracker.record_delivery(100.0, Some(60.0));
        tracker.record_delivery(30.0, Some(60.0));
        tracker.record_delivery(500.0, None);
        assert_eq!(tracker.sla_breaches, 1);

        tracker.delivered = 3;
        let metrics = tracker.compute(3600.0, &[], 2);
        assert_eq!(metrics.throughput_per_hour, 3.0);
        assert_eq!(metrics.average_cycle_time_seconds, 210.0);
        assert_eq!(metrics.queue_depth, 2);
        assert_eq!(metrics.utilization, 0.0);
    }

    #[test]
    fn metrics_at_time_zero_are_finite() {
        let metrics = MetricsTracker::new().compute(0.0, &[], 0);
        assert_eq!(metrics.throughput_per_hour, 0.0);
        assert_eq!(metrics.average_cycle_time_seconds, 0.0);
    }
}

// ── SimulationService ─────────────────────────────────────────────────────────

#[cfg(test)]
mod service_tests {
    use super::*;
    use wh_agent::{NoopListener, RobotAgent, RobotTelemetry};
    use wh_core::{RobotId, RobotState};

    use crate::{SimError, SimulationService, SimulationSettings};

    fn service(settings: SimulationSettings) -> SimulationService {
        SimulationService::from_config(&quiet_config(1, vec![]), settings).unwrap()
    }

    fn telemetry(id: u32, pos: GridPosition, state: RobotState) -> RobotTelemetry {
        RobotTelemetry {
            robot_id: RobotId(id),
            state,
            position: pos,
            battery_level: 1.0,
            current_job: None,
            path: vec![],
        }
    }

    #[test]
    fn two_idle_robots_get_distinct_packages() {
        let mut svc = service(SimulationSettings::default());
        let a = svc.store_mut().spawn_package_at(p(1, 5), "standard").unwrap();
        let b = svc.store_mut().spawn_package_at(p(10, 5), "standard").unwrap();

        let robots = [telemetry(0, p(9, 5), RobotState::Idle), telemetry(1, p(0, 5), RobotState::Idle)];
        let outcome = svc.assign_jobs(&robots).unwrap();

        assert_eq!(outcome.assigned, vec![(RobotId(0), b.id), (RobotId(1), a.id)]);
        assert!(outcome.deadlocked.is_empty());
        assert_eq!(svc.store().get(a.id).unwrap().status(), PackageStatus::Assigned);
        assert_eq!(svc.store().get(b.id).unwrap().assigned_robot(), Some(RobotId(0)));
    }

    #[test]
    fn working_robots_are_not_offered_work() {
        let mut svc = service(SimulationSettings::default());
        svc.store_mut().spawn_package_at(p(1, 5), "standard").unwrap();
        let outcome = svc.assign_jobs(&[telemetry(0, p(0, 0), RobotState::Delivering)]).unwrap();
        assert!(outcome.assigned.is_empty());
    }

    #[test]
    fn stuck_robot_is_deadlocked_and_package_requeued() {
        let settings = SimulationSettings { deadlock_threshold: 3, ..SimulationSettings::default() };
        let mut svc = service(settings);
        let pkg = svc.store_mut().spawn_package_at(p(1, 5), "standard").unwrap();

        let idle = telemetry(0, p(4, 4), RobotState::Idle);
        assert_eq!(svc.assign_jobs(&[idle]).unwrap().assigned, vec![(RobotId(0), pkg.id)]);
        svc.reserve_next_cell(RobotId(0), p(4, 4)).unwrap();

        let stuck = telemetry(0, p(4, 4), RobotState::Fetching);
        assert!(svc.assign_jobs(&[stuck.clone()]).unwrap().deadlocked.is_empty());
        assert!(svc.assign_jobs(&[stuck.clone()]).unwrap().deadlocked.is_empty());
        let outcome = svc.assign_jobs(&[stuck]).unwrap();

        assert_eq!(outcome.deadlocked, vec![(RobotId(0), Some(pkg.id))]);
        let requeued = svc.store().get(pkg.id).unwrap();
        assert_eq!(requeued.status(), PackageStatus::Queued);
        assert_eq!(requeued.assigned_robot(), None);
        assert!(svc.reservations().is_empty());
        assert!(svc.scheduler().is_empty());
    }

    #[test]
    fn plan_path_excludes_start() {
        let mut svc = service(SimulationSettings::default());
        let path = svc.plan_path(p(0, 0), p(1, 5), &[]).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.last(), Some(&p(1, 5)));
        assert!(!path.contains(&p(0, 0)));

        assert!(svc.plan_path(p(3, 3), p(3, 3), &[]).unwrap().is_empty());
    }

    #[test]
    fn walled_off_target_is_a_planning_failure() {
        let mut config = quiet_config(1, vec![]);
        config.layout.obstacles = vec![(17, 5), (19, 5), (18, 4), (18, 6)];
        let mut svc = SimulationService::from_config(&config, SimulationSettings::default()).unwrap();
        let err = svc.plan_path(p(0, 0), p(18, 5), &[]).unwrap_err();
        assert!(matches!(err, SimError::Spatial(wh_spatial::SpatialError::NoPath { .. })));
    }

    #[test]
    fn own_claim_does_not_block_planning() {
        let mut svc = service(SimulationSettings::default());
        svc.reserve_next_cell(RobotId(0), p(2, 2)).unwrap();
        assert!(svc.reserve_next_cell(RobotId(1), p(2, 2)).is_none());
        let path = svc.plan_path(p(2, 2), p(2, 4), &[]).unwrap();
        assert_eq!(path, vec![p(2, 3), p(2, 4)]);
    }

    /// Robot A runs west→east through (1,1) while B runs north→south
    /// through it.  B plans around A's committed path; stepping both never
    /// puts them on one cell and both arrive.
    #[test]
    fn crossing_robots_never_share_a_cell() {
        let mut svc = service(SimulationSettings::default());
        let mut a = RobotAgent::new(RobotId(0), p(0, 1));
        let mut b = RobotAgent::new(RobotId(1), p(1, 0));

        let a_path = svc.plan_path(p(0, 1), p(2, 1), &[]).unwrap();
        a.set_path(a_path).unwrap();
        let b_path = svc.plan_path(p(1, 0), p(1, 2), &[a.remaining_path()]).unwrap();
        b.set_path(b_path).unwrap();

        let mut listener = NoopListener;
        for _ in 0..20 {
            a.update(svc.reservations_mut(), &mut listener);
            b.update(svc.reservations_mut(), &mut listener);
            assert_ne!(a.position(), b.position());
        }
        assert_eq!(a.position(), p(2, 1));
        assert_eq!(b.position(), p(1, 2));
    }

    #[test]
    fn snapshot_shares_the_layout() {
        let mut svc = service(SimulationSettings::default());
        svc.store_mut().spawn_package_at(p(1, 5), "express").unwrap();
        let snap = svc.snapshot(vec![telemetry(0, p(0, 0), RobotState::Idle)]);
        assert_eq!(snap.packages.len(), 1);
        assert_eq!(snap.robots.len(), 1);
        assert!(Arc::ptr_eq(&snap.layout, svc.layout()));

        svc.reset();
        assert!(svc.store().is_empty());
    }
}

// ── Runner (synchronous steps) ────────────────────────────────────────────────

#[cfg(test)]
mod runner_tests {
    use chrono::Utc;

    use super::*;
    use wh_core::{RobotId, RobotState};

    use crate::{RunnerBuilder, ScenarioRunner, SimulationSettings};

    #[test]
    fn single_robot_delivers_end_to_end() {
        let log = StatusLog::default();
        let mut runner = RunnerBuilder::new(quiet_config(1, vec![(0, 0)]))
            .hooks(Box::new(log.clone()))
            .build()
            .unwrap();
        let pkg = runner.service_mut().store_mut().spawn_package_at(p(1, 5), "standard").unwrap();

        let mut tick = 0;
        while runner.counters().delivered == 0 {
            assert!(tick < 200, "package never delivered");
            runner.step(tick as f64 * 0.5).unwrap();
            tick += 1;
        }

        assert!(runner.service().store().get(pkg.id).is_none());
        assert!(runner.heatmap().total() >= 6 + 17);
        assert_eq!(runner.fleet().get(RobotId(0)).unwrap().state(), RobotState::Idle);
        assert!(runner.recent_events().iter().any(|e| e.kind == TimelineEventKind::PackageDelivered));

        let statuses: Vec<PackageStatus> = log.0.lock().unwrap().iter().map(|&(_, s)| s).collect();
        assert_eq!(
            statuses,
            vec![PackageStatus::Assigned, PackageStatus::InTransit, PackageStatus::Delivered]
        );

        let metrics = runner.metrics(tick as f64 * 0.5);
        assert_eq!(metrics.delivered, 1);
        assert_eq!(metrics.queue_depth, 0);
        assert!(metrics.utilization > 0.0);
    }

    #[test]
    fn forced_faults_requeue_and_recover() {
        let mut config = quiet_config(1, vec![(0, 0)]);
        config.failures.fault_probability_per_hour = 1.0e7;
        config.failures.mean_recovery_minutes = 0.0;
        let mut runner = RunnerBuilder::new(config).build().unwrap();
        let pkg = runner.service_mut().store_mut().spawn_package_at(p(1, 5), "standard").unwrap();

        runner.step(0.0).unwrap();
        assert_eq!(runner.fleet().get(RobotId(0)).unwrap().state(), RobotState::Faulted);
        assert_eq!(runner.service().store().get(pkg.id).unwrap().status(), PackageStatus::Queued);
        assert!(runner.recent_events().iter().any(|e| e.kind == TimelineEventKind::RobotFaulted));
        assert_eq!(runner.metrics(0.5).fault_ratio, 1.0);

        runner.step(0.5).unwrap();
        assert!(runner.recent_events().iter().any(|e| e.kind == TimelineEventKind::RobotRecovered));
        assert_ne!(runner.fleet().get(RobotId(0)).unwrap().state(), RobotState::Faulted);
    }

    /// Robot 0 leaves (0,5) for a package at (3,5); a robot outside the
    /// fleet then holds (2,5) for the rest of the test.
    fn blocked_fetch(settings: SimulationSettings) -> (ScenarioRunner, Package) {
        let mut runner = RunnerBuilder::new(quiet_config(1, vec![(0, 5)])).settings(settings).build().unwrap();
        let pkg = runner.service_mut().store_mut().spawn_package_at(p(3, 5), "standard").unwrap();
        runner.step(0.0).unwrap();
        assert_eq!(runner.fleet().get(RobotId(0)).unwrap().position(), p(1, 5));

        runner.service_mut().reservations_mut().claim_with_ttl(RobotId(9), p(2, 5), 600, Utc::now());
        (runner, pkg)
    }

    #[test]
    fn blocked_robot_is_quarantined_as_stalled() {
        let settings = SimulationSettings { max_stalled_ticks: 2, deadlock_threshold: 100, ..SimulationSettings::default() };
        let (mut runner, pkg) = blocked_fetch(settings);

        for tick in 1..6 {
            runner.step(tick as f64 * 0.5).unwrap();
            if runner.fleet().get(RobotId(0)).unwrap().state() == RobotState::Faulted {
                break;
            }
        }

        let robot = runner.fleet().get(RobotId(0)).unwrap();
        assert_eq!(robot.state(), RobotState::Faulted);
        assert_eq!(robot.position(), p(1, 5));
        let requeued = runner.service().store().get(pkg.id).unwrap();
        assert_eq!(requeued.status(), PackageStatus::Queued);
        assert_eq!(requeued.assigned_robot(), None);
        assert_eq!(runner.service().scheduler().pending_assignment(RobotId(0)), None);

        let kinds: Vec<TimelineEventKind> = runner.recent_events().iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&TimelineEventKind::RobotStalled));
        assert!(!kinds.contains(&TimelineEventKind::RobotFaulted));
        assert!(!kinds.contains(&TimelineEventKind::DeadlockResolved));
    }

    #[test]
    fn waiting_past_the_threshold_resolves_the_deadlock() {
        let settings = SimulationSettings { max_stalled_ticks: 100, deadlock_threshold: 3, ..SimulationSettings::default() };
        let (mut runner, pkg) = blocked_fetch(settings);

        let resolved = |runner: &ScenarioRunner| {
            runner.recent_events().iter().any(|e| e.kind == TimelineEventKind::DeadlockResolved)
        };
        for tick in 1..10 {
            runner.step(tick as f64 * 0.5).unwrap();
            if resolved(&runner) {
                break;
            }
        }

        assert!(resolved(&runner));
        let robot = runner.fleet().get(RobotId(0)).unwrap();
        assert_eq!(robot.state(), RobotState::Idle);
        assert!(!robot.has_path());
        let requeued = runner.service().store().get(pkg.id).unwrap();
        assert_eq!(requeued.status(), PackageStatus::Queued);
        assert_eq!(requeued.assigned_robot(), None);
        assert!(!runner.recent_events().iter().any(|e| e.kind == TimelineEventKind::RobotStalled));
    }

    #[test]
    fn walled_off_pickup_fails_the_assignment() {
        let mut config = quiet_config(1, vec![(0, 0)]);
        config.layout.obstacles = vec![(9, 10), (11, 10), (10, 9), (10, 11)];
        let log = StatusLog::default();
        let mut runner = RunnerBuilder::new(config).hooks(Box::new(log.clone())).build().unwrap();
        let pkg = runner.service_mut().store_mut().spawn_package_at(p(10, 10), "standard").unwrap();

        runner.step(0.0).unwrap();

        let robot = runner.fleet().get(RobotId(0)).unwrap();
        assert_eq!(robot.state(), RobotState::Idle);
        assert_eq!(robot.position(), p(0, 0));
        let requeued = runner.service().store().get(pkg.id).unwrap();
        assert_eq!(requeued.status(), PackageStatus::Queued);
        assert_eq!(requeued.assigned_robot(), None);
        assert_eq!(runner.service().scheduler().pending_assignment(RobotId(0)), None);
        assert!(runner.recent_events().iter().any(|e| e.kind == TimelineEventKind::AssignmentFailed));

        let statuses: Vec<PackageStatus> = log.0.lock().unwrap().iter().map(|&(_, s)| s).collect();
        assert_eq!(statuses, vec![PackageStatus::Assigned, PackageStatus::Queued]);
    }

    #[test]
    fn placed_packages_count_as_arrivals() {
        let log = StatusLog::default();
        let mut runner = RunnerBuilder::new(quiet_config(1, vec![])).hooks(Box::new(log.clone())).build().unwrap();
        let pkg = runner.spawn_package_at(p(4, 4), "express").unwrap();

        assert_eq!(runner.counters().spawned, 1);
        assert_eq!(log.0.lock().unwrap().as_slice(), &[(pkg.id, PackageStatus::Queued)]);
        assert_eq!(runner.recent_events()[0].kind, TimelineEventKind::PackageSpawned);
        assert!(runner.spawn_package_at(p(40, 4), "express").is_err());
        assert_eq!(runner.counters().spawned, 1);
    }

    #[test]
    fn high_demand_always_spawns() {
        let mut config = quiet_config(1, vec![(0, 0)]);
        config.layout.pickup_zones = vec![(1, 1), (1, 3), (1, 5), (1, 7)];
        config.demand.packages_per_hour = 36_000.0;
        let mut runner = RunnerBuilder::new(config).build().unwrap();
        runner.step(0.0).unwrap();
        assert!(runner.counters().spawned >= 1);
        assert!(runner.service().store().len() as u64 <= runner.counters().spawned);
    }

    #[test]
    fn build_tick_drains_recent_events() {
        let mut runner = RunnerBuilder::new(quiet_config(2, vec![])).build().unwrap();
        runner.service_mut().store_mut().spawn_package_at(p(1, 5), "standard").unwrap();
        runner.step(0.0).unwrap();

        let tick = runner.build_tick(0.0);
        assert_eq!(tick.tick, wh_core::Tick(1));
        assert_eq!(tick.snapshot.robots.len(), 2);
        assert_eq!(tick.snapshot.packages.len(), 1);
        assert!(runner.recent_events().is_empty());
    }
}

// ── Runner (async loop) ───────────────────────────────────────────────────────

#[cfg(test)]
mod run_loop_tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{RunStage, RunnerBuilder};

    #[tokio::test(start_paused = true)]
    async fn short_horizon_completes() {
        let mut runner = RunnerBuilder::new(quiet_config(2, vec![])).build().unwrap();
        let mut sink = RecordingSink::default();

        let outcome = runner.run(&mut sink, CancellationToken::new()).await;

        assert_eq!(outcome.stage, RunStage::Completed);
        assert_eq!(outcome.error, None);
        assert_eq!(runner.stage(), RunStage::Completed);
        assert_eq!(sink.started, 1);
        assert_eq!(sink.finished, vec![outcome]);

        let first = sink.ticks.first().unwrap();
        assert_eq!(first.stage, RunStage::Running);
        assert!(first.recent_events.iter().any(|e| e.kind == TimelineEventKind::StageTransition));
        assert_eq!(sink.ticks.last().unwrap().stage, RunStage::Completed);
        assert!(sink.events.contains(&TimelineEventKind::StageTransition));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_with_a_cancelled_tick() {
        let mut config = quiet_config(1, vec![]);
        config.horizon.duration_minutes = 10.0;
        let mut runner = RunnerBuilder::new(config).build().unwrap();
        let mut sink = RecordingSink::default();

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let outcome = runner.run(&mut sink, token).await;

        assert_eq!(outcome.stage, RunStage::Cancelled);
        assert_eq!(sink.ticks.last().unwrap().stage, RunStage::Cancelled);
        assert!(sink.events.contains(&TimelineEventKind::RunCancelled));
        assert_eq!(sink.finished.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn error_inside_a_tick_fails_the_run() {
        let mut runner = RunnerBuilder::new(quiet_config(1, vec![(0, 5)])).build().unwrap();
        let pkg = runner.spawn_package_at(p(1, 5), "standard").unwrap();
        runner.step(0.0).unwrap();
        // The robot reaches the pickup next tick, but its package is no
        // longer ASSIGNED.
        runner.service_mut().store_mut().requeue(pkg.id).unwrap();
        let mut sink = RecordingSink::default();

        let outcome = runner.run(&mut sink, CancellationToken::new()).await;

        assert_eq!(outcome.stage, RunStage::Failed);
        assert!(outcome.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert_eq!(runner.stage(), RunStage::Failed);
        assert_eq!(sink.finished, vec![outcome]);
        assert!(sink.events.contains(&TimelineEventKind::RunFailed));

        let last = sink.ticks.last().unwrap();
        assert_eq!(last.stage, RunStage::Failed);
        assert!(last.recent_events.iter().any(|e| e.kind == TimelineEventKind::RunFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn drained_floor_completes_before_the_horizon() {
        let mut config = quiet_config(1, vec![(0, 5)]);
        config.horizon.duration_minutes = 10.0;
        config.horizon.stop_on_completion = true;
        let mut runner = RunnerBuilder::new(config).build().unwrap();
        runner.spawn_package_at(p(1, 5), "standard").unwrap();
        let mut sink = RecordingSink::default();

        let outcome = runner.run(&mut sink, CancellationToken::new()).await;

        assert_eq!(outcome.stage, RunStage::Completed);
        assert_eq!(runner.counters().delivered, 1);
        assert!(runner.service().store().is_empty());
        let last = sink.ticks.last().unwrap();
        assert_eq!(last.stage, RunStage::Completed);
        assert!(last.elapsed_seconds < 60.0);
    }

    #[tokio::test(start_paused = true)]
    async fn warm_up_precedes_the_active_window() {
        let mut config = quiet_config(1, vec![]);
        config.operations.warmup_minutes = 0.02;
        config.horizon.duration_minutes = 0.04;
        let mut runner = RunnerBuilder::new(config).build().unwrap();
        let mut ticks: Vec<RunTick> = Vec::new();

        runner.run(&mut ticks, CancellationToken::new()).await;

        let stages: Vec<RunStage> = ticks.iter().map(|t| t.stage).collect();
        assert_eq!(stages, vec![RunStage::WarmingUp, RunStage::Running, RunStage::Completed]);
        assert!(ticks.windows(2).all(|w| w[0].elapsed_seconds <= w[1].elapsed_seconds));
    }
}
