//! Per-simulation façade over planning, scheduling, claims, and health.
//!
//! A [`SimulationService`] owns everything one simulation needs apart from
//! the robots themselves: the package store, the [`TaskScheduler`], the
//! [`ReservationManager`], the [`HealthMonitor`], and the configured
//! [`Planner`].  Robot agents stay with the caller (the runner or an
//! interactive step loop) and are passed in as telemetry.

use std::collections::HashMap;
use std::sync::Arc;

use wh_agent::RobotTelemetry;
use wh_core::{GridPosition, Package, PackageId, Reservation, RobotId, RobotState, SimRng, WarehouseLayout};
use wh_schedule::{HealthMonitor, HealthStatus, TaskScheduler};
use wh_spatial::{build_reservation_table, planner_for, CellSet, PlanQuery, Planner, ReservationManager, SpatialError};

use crate::{PackageStore, ScenarioConfig, SimResult, SimulationSettings, WarehouseSnapshot};

/// Result of one [`SimulationService::assign_jobs`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentOutcome {
    /// New commitments, in robot order.  Packages are already ASSIGNED.
    pub assigned:   Vec<(RobotId, PackageId)>,
    /// Robots whose assignment was torn down as deadlocked, with the package
    /// that went back to the queue.
    pub deadlocked: Vec<(RobotId, Option<PackageId>)>,
}

pub struct SimulationService {
    store:        PackageStore,
    scheduler:    TaskScheduler,
    reservations: ReservationManager,
    health:       HealthMonitor,
    planner:      Box<dyn Planner>,
    settings:     SimulationSettings,
    obstacles:    CellSet,
}

impl SimulationService {
    pub fn new(layout: Arc<WarehouseLayout>, planner: Box<dyn Planner>, settings: SimulationSettings) -> Self {
        let obstacles = layout.obstacles.iter().copied().collect();
        Self {
            store:        PackageStore::new(layout),
            scheduler:    TaskScheduler::new(settings.deadlock_threshold),
            reservations: ReservationManager::new(settings.reservation_ttl_secs),
            health:       HealthMonitor::new(settings.max_stalled_ticks),
            planner,
            settings,
            obstacles,
        }
    }

    /// Validate `config` and build a service for its layout and planner.
    pub fn from_config(config: &ScenarioConfig, settings: SimulationSettings) -> SimResult<Self> {
        config.validate()?;
        let planner = planner_for(&config.optimization.planner)?;
        Ok(Self::new(Arc::new(config.layout.to_layout()), planner, settings))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn layout(&self) -> &Arc<WarehouseLayout> {
        self.store.layout()
    }

    #[inline]
    pub fn store(&self) -> &PackageStore {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut PackageStore {
        &mut self.store
    }

    #[inline]
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn reservations_mut(&mut self) -> &mut ReservationManager {
        &mut self.reservations
    }

    #[inline]
    pub fn planner(&self) -> &dyn Planner {
        self.planner.as_ref()
    }

    #[inline]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Live (unexpired) claims.
    pub fn reservations(&mut self) -> Vec<Reservation> {
        self.reservations.reservations()
    }

    // ── Packages ──────────────────────────────────────────────────────────

    pub fn spawn_package(&mut self, rng: &mut SimRng, priority: &str) -> Option<Package> {
        self.store.spawn_package(rng, priority)
    }

    /// Mark a package DELIVERED and drop it from the active set.
    pub fn complete_package(&mut self, id: PackageId) -> SimResult<Package> {
        let package = self.store.complete(id)?;
        tracing::debug!(package = %id, "package delivered");
        Ok(package)
    }

    pub fn dropoff_for(&self, position: GridPosition) -> Option<GridPosition> {
        self.store.nearest_dropoff(position)
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// Run one assignment pass over the fleet.
    ///
    /// Every robot's state is recorded first, then each IDLE robot (in the
    /// given order) is offered the best QUEUED package.  Finally, robots
    /// stuck past the deadlock threshold lose their assignment: the package
    /// is requeued and the robot's claim released.  The caller still owns
    /// the agents and must put deadlocked robots back to IDLE.
    pub fn assign_jobs(&mut self, robots: &[RobotTelemetry]) -> SimResult<AssignmentOutcome> {
        for robot in robots {
            self.scheduler.record_robot_state(robot.robot_id, robot.position, robot.state);
        }

        let mut outcome = AssignmentOutcome::default();
        let mut batch: HashMap<RobotId, PackageId> = HashMap::new();
        for robot in robots.iter().filter(|r| r.state == RobotState::Idle) {
            let chosen = self.scheduler.select_job(
                robot.robot_id,
                robot.position,
                robot.state,
                self.store.iter(),
                &batch,
            );
            if let Some(package) = chosen {
                self.store.assign(package, robot.robot_id)?;
                batch.insert(robot.robot_id, package);
                outcome.assigned.push((robot.robot_id, package));
            }
        }

        for robot in self.scheduler.detect_deadlocks() {
            let package = self.scheduler.pending_assignment(robot);
            if let Some(id) = package.filter(|id| self.store.get(*id).is_some()) {
                self.store.requeue(id)?;
            }
            self.scheduler.clear_assignment(robot);
            self.reservations.release(robot);
            tracing::warn!(robot = %robot, package = ?package, "deadlock resolved by requeue");
            outcome.deadlocked.push((robot, package));
        }

        Ok(outcome)
    }

    pub fn clear_assignment(&mut self, robot: RobotId) {
        self.scheduler.clear_assignment(robot);
    }

    // ── Planning and claims ───────────────────────────────────────────────

    /// Plan a leg from `start` to `end`, avoiding obstacles, the committed
    /// paths of other robots (`reserved_paths`, next move first), and cells
    /// held by live claims.
    ///
    /// Live claims are seeded into the time-expanded table at tick 1 and
    /// also form the forbidden set for the BFS fallback.  A claim on `start`
    /// is the planning robot's own and is ignored.
    ///
    /// The returned path excludes `start`; it is empty when `start == end`.
    pub fn plan_path(
        &mut self,
        start:          GridPosition,
        end:            GridPosition,
        reserved_paths: &[&[GridPosition]],
    ) -> SimResult<Vec<GridPosition>> {
        let mut committed = build_reservation_table(reserved_paths.iter().copied());
        let mut reserved_now = CellSet::default();
        for claim in self.reservations.reservations() {
            if claim.position != start {
                committed.reserve(1, claim.position);
                reserved_now.insert(claim.position);
            }
        }

        let query = PlanQuery {
            start,
            end,
            obstacles: &self.obstacles,
            bounds: self.layout().bounds(),
            committed: Some(&committed),
            reserved_now: &reserved_now,
            max_cost: self.settings.astar_max_cost,
        };
        let mut path = self.planner.plan(&query)?;
        if path.first() != Some(&start) {
            return Err(SpatialError::NoPath { from: start, to: end }.into());
        }
        path.remove(0);
        Ok(path)
    }

    /// Claim `position` for `robot` unless another robot holds it.
    pub fn reserve_next_cell(&mut self, robot: RobotId, position: GridPosition) -> Option<Reservation> {
        if self.reservations.is_reserved(position, Some(robot)) {
            return None;
        }
        Some(self.reservations.claim(robot, position))
    }

    pub fn release_reservation(&mut self, robot: RobotId) {
        self.reservations.release(robot);
    }

    // ── Health ────────────────────────────────────────────────────────────

    pub fn observe_robot(&mut self, robot: RobotId, position: GridPosition, state: RobotState) -> &HealthStatus {
        self.health.observe(robot, position, state)
    }

    pub fn clear_fault(&mut self, robot: RobotId) {
        self.health.clear_fault(robot);
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    // ── Views ─────────────────────────────────────────────────────────────

    pub fn snapshot(&mut self, robots: Vec<RobotTelemetry>) -> WarehouseSnapshot {
        WarehouseSnapshot {
            timestamp:    chrono::Utc::now(),
            packages:     self.store.iter().cloned().collect(),
            reservations: self.reservations.reservations(),
            robots,
            layout:       Arc::clone(self.store.layout()),
        }
    }

    /// Drop packages, claims, assignments, and health history.
    pub fn reset(&mut self) {
        self.store.clear();
        self.reservations.reset();
        self.scheduler = TaskScheduler::new(self.settings.deadlock_threshold);
        self.health = HealthMonitor::new(self.settings.max_stalled_ticks);
    }
}
