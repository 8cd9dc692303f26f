//! Tick loop for one scenario run.
//!
//! # Tick phases
//!
//! ```text
//! step(elapsed):
//!   ① Spawn    — expected arrivals per tick from packages_per_hour; one
//!                Bernoulli trial per whole expected arrival (at least one).
//!   ② Assign   — SimulationService::assign_jobs, then plan each new
//!                robot's leg to its pickup.  Planning failure requeues.
//!   ③ Deliver  — plan a leg to the nearest dropoff for every DELIVERING
//!                robot without a path.
//!   ④ Faults   — recover robots whose deadline passed, then inject faults
//!                into working robots with per-tick probability.
//!   ⑤ Move     — RobotAgent::update for every robot in id order; record
//!                pickups, deliveries, heatmap visits, and stall faults.
//! ```
//!
//! [`ScenarioRunner::run`] wraps `step` in the stage machine and the
//! throttled tick stream; `step` alone is what interactive callers and tests
//! drive.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use wh_agent::{AgentEvent, ClaimListener, Fleet};
use wh_core::{GridPosition, Package, PackageId, RobotId, RobotState, SimRng};

use crate::{
    Heatmap, MetricsTracker, PersistenceHooks, RunMetrics, RunOutcome, RunStage, RunTick, ScenarioConfig,
    SimError, SimResult, SimulationService, SimulationSettings, TickSink, TimelineEvent, TimelineEventKind,
};

/// Why the loop stopped without an error.
enum Finish {
    Completed,
    Cancelled,
}

/// Drives one scenario from QUEUED to a terminal stage.
///
/// Owns its service, fleet, and RNG; nothing is shared with other runs.
/// Build one with [`RunnerBuilder`](crate::RunnerBuilder).
pub struct ScenarioRunner {
    config:   ScenarioConfig,
    settings: SimulationSettings,
    service:  SimulationService,
    fleet:    Fleet,
    rng:      SimRng,
    hooks:    Box<dyn PersistenceHooks>,
    listener: Box<dyn ClaimListener + Send>,
    stage:    RunStage,

    metrics:  MetricsTracker,
    heatmap:  Heatmap,
    /// Elapsed seconds at each package's first assignment.
    cycle_started:      BTreeMap<PackageId, f64>,
    recovery_deadlines: BTreeMap<RobotId, f64>,

    /// Events since the last emitted tick; the first `forwarded` of them have
    /// already gone to the sink's `on_event`.
    recent:             Vec<TimelineEvent>,
    forwarded:          usize,
    last_emit:          Option<Instant>,
    last_emitted_stage: Option<RunStage>,
}

impl ScenarioRunner {
    pub(crate) fn new(
        config:   ScenarioConfig,
        settings: SimulationSettings,
        service:  SimulationService,
        fleet:    Fleet,
        rng:      SimRng,
        hooks:    Box<dyn PersistenceHooks>,
        listener: Box<dyn ClaimListener + Send>,
    ) -> Self {
        Self {
            config,
            settings,
            service,
            fleet,
            rng,
            hooks,
            listener,
            stage: RunStage::Queued,
            metrics: MetricsTracker::new(),
            heatmap: Heatmap::new(),
            cycle_started: BTreeMap::new(),
            recovery_deadlines: BTreeMap::new(),
            recent: Vec::new(),
            forwarded: 0,
            last_emit: None,
            last_emitted_stage: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    #[inline]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    #[inline]
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    #[inline]
    pub fn service(&self) -> &SimulationService {
        &self.service
    }

    #[inline]
    pub fn service_mut(&mut self) -> &mut SimulationService {
        &mut self.service
    }

    #[inline]
    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    #[inline]
    pub fn counters(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Events recorded since the last emitted tick.
    pub fn recent_events(&self) -> &[TimelineEvent] {
        &self.recent
    }

    pub fn metrics(&self, elapsed_secs: f64) -> RunMetrics {
        self.metrics.compute(elapsed_secs, self.fleet.agents(), self.service.store().len())
    }

    // ── Async loop ────────────────────────────────────────────────────────

    /// Run to a terminal stage.
    ///
    /// `cancel` is checked at the top of every tick and raced against the
    /// inter-tick sleep.  Whatever the outcome, a final tick is emitted, the
    /// persistence hooks are finished, and `sink.on_finished` is called once.
    pub async fn run(&mut self, sink: &mut dyn TickSink, cancel: CancellationToken) -> RunOutcome {
        let started = Instant::now();
        sink.on_started(Utc::now());

        let result = self.drive(sink, &cancel, started).await;

        let (target, error) = match result {
            Ok(Finish::Completed) => (RunStage::Completed, None),
            Ok(Finish::Cancelled) => {
                self.record_event(TimelineEventKind::RunCancelled, "Run cancelled by operator", json!({}));
                (RunStage::Cancelled, None)
            }
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                let message = e.to_string();
                self.record_event(TimelineEventKind::RunFailed, "Run failed", json!({ "error": message }));
                (RunStage::Failed, Some(message))
            }
        };

        let stage = match self.stage.transition(target) {
            Ok(()) => target,
            Err(e) => {
                tracing::warn!(error = %e, "run already terminal");
                self.stage
            }
        };
        tracing::info!(stage = %stage, "run finished");

        let elapsed = started.elapsed().as_secs_f64();
        self.flush_events(sink);
        self.emit(sink, elapsed, true);
        self.hooks.finish();

        let outcome = RunOutcome { stage, completed_at: Utc::now(), error };
        sink.on_finished(&outcome);
        outcome
    }

    async fn drive(
        &mut self,
        sink:    &mut dyn TickSink,
        cancel:  &CancellationToken,
        started: Instant,
    ) -> SimResult<Finish> {
        self.stage.transition(RunStage::WarmingUp)?;
        tracing::info!(scenario = %self.config.name, "warm-up started");

        let ops = &self.config.operations;
        let warmup = ops.warmup_minutes * 60.0;
        let horizon = self.config.horizon.duration_minutes * 60.0;
        let pause = Duration::from_secs_f64(ops.tick_seconds() / ops.time_scale.max(1.0));

        loop {
            if cancel.is_cancelled() {
                return Ok(Finish::Cancelled);
            }

            let elapsed = started.elapsed().as_secs_f64();
            let mut stage_changed = false;
            if self.stage == RunStage::WarmingUp && elapsed >= warmup {
                self.stage.transition(RunStage::Running)?;
                stage_changed = true;
                tracing::info!(elapsed, "active window entered");
                self.record_event(
                    TimelineEventKind::StageTransition,
                    "Run entered active window",
                    json!({ "stage": RunStage::Running }),
                );
            }
            if self.stage == RunStage::Running && (elapsed >= horizon || self.drained()) {
                return Ok(Finish::Completed);
            }

            self.step(elapsed)?;
            self.flush_events(sink);
            self.emit(sink, elapsed, stage_changed);

            tokio::select! {
                _ = cancel.cancelled() => return Ok(Finish::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// Every spawned package delivered, with early stop enabled.
    fn drained(&self) -> bool {
        self.config.horizon.stop_on_completion
            && self.metrics.spawned > 0
            && self.metrics.delivered == self.metrics.spawned
            && self.service.store().is_empty()
    }

    // ── Emission ──────────────────────────────────────────────────────────

    fn flush_events(&mut self, sink: &mut dyn TickSink) {
        for event in &self.recent[self.forwarded..] {
            sink.on_event(event);
        }
        self.forwarded = self.recent.len();
    }

    /// Emit unless throttled.  Stage changes and `force` always emit.
    fn emit(&mut self, sink: &mut dyn TickSink, elapsed: f64, force: bool) {
        let now = Instant::now();
        let interval = self.settings.emit_interval();
        let due = force
            || self.last_emitted_stage != Some(self.stage)
            || self.last_emit.is_none_or(|at| now.duration_since(at) >= interval);
        if !due {
            return;
        }
        self.last_emit = Some(now);
        self.last_emitted_stage = Some(self.stage);
        let tick = self.build_tick(elapsed);
        sink.on_tick(&tick);
    }

    /// Assemble a tick from the current state, draining the recent-event
    /// buffer into it.
    pub fn build_tick(&mut self, elapsed: f64) -> RunTick {
        let metrics = self.metrics(elapsed);
        let snapshot = self.service.snapshot(self.fleet.telemetry());
        self.forwarded = 0;
        RunTick {
            stage: self.stage,
            tick: self.metrics.ticks,
            elapsed_seconds: elapsed,
            snapshot,
            metrics,
            heatmap: self.heatmap.clone(),
            recent_events: std::mem::take(&mut self.recent),
        }
    }

    fn record_event(&mut self, kind: TimelineEventKind, message: &str, payload: Value) {
        let event = TimelineEvent::new(kind, message, payload);
        tracing::debug!(event = kind.as_str(), "{message}");
        self.hooks.record_event(&event);
        self.recent.push(event);
    }

    // ── One tick ──────────────────────────────────────────────────────────

    /// Advance the simulation by one tick at `elapsed` seconds into the run.
    pub fn step(&mut self, elapsed: f64) -> SimResult<()> {
        let tick_secs = self.config.operations.tick_seconds();
        self.metrics.ticks.advance();

        self.spawn_packages(tick_secs);
        self.assign_jobs(elapsed)?;
        self.plan_deliveries()?;
        self.update_faults(tick_secs, elapsed)?;
        self.update_robots(elapsed)?;

        let claims = self.service.reservations();
        self.hooks.record_reservations(&claims);
        Ok(())
    }

    // ① Spawn
    fn spawn_packages(&mut self, tick_secs: f64) {
        let expected = self.config.demand.packages_per_hour * tick_secs / 3600.0;
        let probability = expected.min(1.0);
        let trials = (expected.floor() as u64).max(1);

        let mut spawned = 0;
        for _ in 0..trials {
            if self.rng.gen_bool(probability) && self.spawn_one() {
                spawned += 1;
            }
        }
        // Heuristic floor for high rates; not a Poisson process.
        if spawned == 0 && expected > 1.0 {
            self.spawn_one();
        }
    }

    fn spawn_one(&mut self) -> bool {
        let priority = self
            .rng
            .weighted(self.config.demand.priority_mix.iter().map(|(class, &w)| (class, w)))
            .cloned()
            .unwrap_or_else(|| "standard".to_string());
        let Some(package) = self.service.spawn_package(&mut self.rng, &priority) else {
            return false;
        };
        self.admit(&package);
        true
    }

    /// Queue a package at an explicit cell, counted and recorded like a
    /// random arrival.
    pub fn spawn_package_at(&mut self, position: GridPosition, priority: &str) -> SimResult<Package> {
        let package = self.service.store_mut().spawn_package_at(position, priority)?;
        self.admit(&package);
        Ok(package)
    }

    fn admit(&mut self, package: &Package) {
        self.metrics.spawned += 1;
        self.hooks.record_package_spawn(package);
        self.record_event(
            TimelineEventKind::PackageSpawned,
            "Package queued",
            json!({ "package_id": package.id, "priority": package.priority }),
        );
    }

    // ② Assign
    fn assign_jobs(&mut self, elapsed: f64) -> SimResult<()> {
        let telemetry = self.fleet.telemetry();
        let outcome = self.service.assign_jobs(&telemetry)?;

        for (robot, package) in outcome.deadlocked {
            if let Some(agent) = self.fleet.get_mut(robot) {
                agent.abandon_job();
            }
            if let Some(pkg) = package.and_then(|id| self.service.store().get(id)) {
                self.hooks.update_package_status(pkg);
            }
            self.record_event(
                TimelineEventKind::DeadlockResolved,
                "Deadlock resolved by requeueing package",
                json!({ "robot_id": robot, "package_id": package }),
            );
        }

        for (robot, package) in outcome.assigned {
            let Some(pkg) = self.service.store().get(package) else {
                continue;
            };
            let pickup = pkg.position;
            self.hooks.update_package_status(pkg);

            let Some(agent) = self.fleet.get_mut(robot) else {
                continue;
            };
            agent.assign_job(package, pickup)?;
            let start = agent.position();
            self.cycle_started.entry(package).or_insert(elapsed);

            match self.plan_for(robot, start, pickup) {
                Ok(path) => self.commit_path(robot, path)?,
                Err(SimError::Spatial(e)) => {
                    tracing::warn!(robot = %robot, package = %package, error = %e, "no path to pickup");
                    if let Some(agent) = self.fleet.get_mut(robot) {
                        agent.abandon_job();
                    }
                    let pkg = self.service.store_mut().requeue(package)?;
                    self.hooks.update_package_status(pkg);
                    self.service.clear_assignment(robot);
                    self.service.release_reservation(robot);
                    self.record_event(
                        TimelineEventKind::AssignmentFailed,
                        "Unable to plan path to pickup",
                        json!({ "robot_id": robot, "package_id": package }),
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // ③ Deliver
    fn plan_deliveries(&mut self) -> SimResult<()> {
        let waiting: Vec<(RobotId, GridPosition)> = self
            .fleet
            .agents()
            .iter()
            .filter(|a| a.state() == RobotState::Delivering && !a.has_path())
            .map(|a| (a.id(), a.position()))
            .collect();

        for (robot, position) in waiting {
            let planned = match self.service.dropoff_for(position) {
                Some(dropoff) => self.plan_for(robot, position, dropoff),
                None => Err(SimError::Config("layout has no dropoff zone".into())),
            };
            match planned {
                Ok(path) => self.commit_path(robot, path)?,
                Err(SimError::Spatial(e)) => {
                    tracing::warn!(robot = %robot, error = %e, "no path to dropoff");
                    self.record_event(
                        TimelineEventKind::DropoffBlocked,
                        "Unable to plan path to dropoff",
                        json!({ "robot_id": robot }),
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Plan around every other robot's remaining path.
    fn plan_for(&mut self, robot: RobotId, start: GridPosition, end: GridPosition) -> SimResult<Vec<GridPosition>> {
        let others: Vec<&[GridPosition]> = self
            .fleet
            .agents()
            .iter()
            .filter(|a| a.id() != robot && a.has_path())
            .map(|a| a.remaining_path())
            .collect();
        self.service.plan_path(start, end, &others)
    }

    fn commit_path(&mut self, robot: RobotId, path: Vec<GridPosition>) -> SimResult<()> {
        // Empty means the robot already stands on the target.
        if path.is_empty() {
            return Ok(());
        }
        if let Some(agent) = self.fleet.get_mut(robot) {
            agent.set_path(path)?;
        }
        Ok(())
    }

    // ④ Faults
    fn update_faults(&mut self, tick_secs: f64, elapsed: f64) -> SimResult<()> {
        let due: Vec<RobotId> = self
            .recovery_deadlines
            .iter()
            .filter(|&(_, &deadline)| deadline <= elapsed)
            .map(|(&robot, _)| robot)
            .collect();
        for robot in due {
            self.recovery_deadlines.remove(&robot);
            if let Some(agent) = self.fleet.get_mut(robot) {
                agent.recover()?;
            }
            self.service.clear_fault(robot);
            tracing::info!(robot = %robot, "robot recovered");
            self.record_event(
                TimelineEventKind::RobotRecovered,
                "Robot recovered from fault",
                json!({ "robot_id": robot }),
            );
        }

        let probability = self.config.failures.fault_probability_per_hour * tick_secs / 3600.0;
        if probability <= 0.0 {
            return Ok(());
        }
        let working: Vec<RobotId> = self
            .fleet
            .agents()
            .iter()
            .filter(|a| a.state().is_working())
            .map(|a| a.id())
            .collect();
        for robot in working {
            if self.rng.gen_bool(probability) {
                self.quarantine(robot, elapsed, TimelineEventKind::RobotFaulted, "Robot entered fault state")?;
            }
        }
        Ok(())
    }

    /// Fault `robot`, requeue its package, and schedule recovery.
    fn quarantine(&mut self, robot: RobotId, elapsed: f64, kind: TimelineEventKind, message: &str) -> SimResult<()> {
        let Some(agent) = self.fleet.get_mut(robot) else {
            return Ok(());
        };
        let package = agent.mark_faulted()?;
        let deadline = elapsed + self.config.failures.mean_recovery_minutes * 60.0;
        self.recovery_deadlines.insert(robot, deadline);

        self.service.clear_assignment(robot);
        self.service.release_reservation(robot);
        if let Some(id) = package {
            let pkg = self.service.store_mut().requeue(id)?;
            self.hooks.update_package_status(pkg);
        }

        tracing::warn!(robot = %robot, package = ?package, recover_at = deadline, "{message}");
        self.record_event(kind, message, json!({ "robot_id": robot, "package_id": package }));
        Ok(())
    }

    // ⑤ Move
    fn update_robots(&mut self, elapsed: f64) -> SimResult<()> {
        for idx in 0..self.fleet.len() {
            let agent = &mut self.fleet.agents_mut()[idx];
            let event = agent.update(self.service.reservations_mut(), self.listener.as_mut());
            let (robot, state, position) = (agent.id(), agent.state(), agent.position());

            match event {
                AgentEvent::Moved { to, .. } => self.heatmap.visit(to),
                AgentEvent::PickedUp(id) => {
                    let pkg = self.service.store_mut().pick_up(id)?;
                    self.hooks.update_package_status(pkg);
                }
                AgentEvent::Delivered(id) => self.finish_delivery(robot, id, elapsed)?,
                _ => {}
            }

            if state.is_working() {
                self.metrics.active_robot_ticks += 1;
            }
            if state == RobotState::Idle {
                self.service.release_reservation(robot);
            }

            let stalled = self.service.observe_robot(robot, position, state).faulted;
            if stalled && state.is_working() {
                self.quarantine(robot, elapsed, TimelineEventKind::RobotStalled, "Robot stalled in place")?;
            }
        }
        Ok(())
    }

    fn finish_delivery(&mut self, robot: RobotId, id: PackageId, elapsed: f64) -> SimResult<()> {
        let package = self.service.complete_package(id)?;
        self.hooks.update_package_status(&package);
        self.metrics.delivered += 1;

        if let Some(started) = self.cycle_started.remove(&id) {
            let sla = self.config.demand.sla_minutes.get(&package.priority).map(|m| m * 60.0);
            self.metrics.record_delivery(elapsed - started, sla);
        }
        self.record_event(
            TimelineEventKind::PackageDelivered,
            "Package delivered",
            json!({ "package_id": id, "robot_id": robot }),
        );
        Ok(())
    }
}
