//! Scenario catalog, run tasks, and tick fan-out.
//!
//! # Concurrency
//!
//! ```text
//!   callers ──launch/subscribe/cancel──▶ ScenarioEngine ──Arc<Shared>──┐
//!                                                                     │
//!   tokio task per run:  ScenarioRunner::run ──▶ EngineSink ──────────┤
//!                                                  │ on_tick          │
//!                                                  ▼                  │
//!                               unbounded mpsc per subscriber ◀───────┘
//! ```
//!
//! Each run owns its runner outright; the only state shared between runs and
//! callers is the catalog in [`Shared`], guarded by short synchronous locks
//! that are never held across an `.await`.  Tick delivery never blocks the
//! run: every subscriber has its own unbounded queue and closed queues are
//! pruned on the next send.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use wh_agent::{ClaimListener, ReservationClaim};
use wh_core::WarehouseLayout;
use wh_sim::{
    NoopHooks, PersistenceHooks, RunOutcome, RunStage, RunTick, RunnerBuilder, ScenarioConfig,
    SimulationSettings, TickSink, TimelineEvent, TimelineEventKind, WarehouseSnapshot,
};

use crate::{
    presets, EngineError, EngineResult, RunId, RunSubscription, ScenarioDefinition, ScenarioId, ScenarioRun,
};

/// Buffered claims per run before slow claim receivers start lagging.
const CLAIM_CAPACITY: usize = 1024;

// ── Lock helpers ──────────────────────────────────────────────────────────────

// A panicking run task must not take the catalog down with it.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Shared state ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct RunCatalog {
    runs:  HashMap<RunId, ScenarioRun>,
    /// Launch order.
    order: Vec<RunId>,
}

struct RunTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Shared {
    scenarios:   RwLock<Vec<ScenarioDefinition>>,
    runs:        RwLock<RunCatalog>,
    tasks:       Mutex<HashMap<RunId, RunTask>>,
    /// Present exactly while the run's task is alive.
    subscribers: Mutex<HashMap<RunId, Vec<mpsc::UnboundedSender<RunTick>>>>,
    claims:      Mutex<HashMap<RunId, broadcast::Sender<ReservationClaim>>>,
}

impl Shared {
    fn update_run(&self, run_id: RunId, f: impl FnOnce(&mut ScenarioRun)) {
        if let Some(run) = write(&self.runs).runs.get_mut(&run_id) {
            f(run);
        }
    }

    fn broadcast(&self, run_id: RunId, tick: &RunTick) {
        if let Some(senders) = lock(&self.subscribers).get_mut(&run_id) {
            senders.retain(|tx| tx.send(tick.clone()).is_ok());
        }
    }

    /// Mark a run whose task died without finishing as FAILED.
    ///
    /// Returns the terminal tick to send subscribers, rebuilt from the last
    /// recorded state.  `None` if the run had already reached a terminal
    /// stage, in which case its final tick went out normally.
    fn fail(&self, run_id: RunId, reason: String, layout: &Arc<WarehouseLayout>) -> Option<RunTick> {
        let event = TimelineEvent::new(TimelineEventKind::RunFailed, "Run failed", json!({ "error": reason }));

        let mut catalog = write(&self.runs);
        let run = catalog.runs.get_mut(&run_id)?;
        if run.stage.is_terminal() {
            return None;
        }
        run.stage = RunStage::Failed;
        run.completed_at = Some(event.timestamp);
        run.error = Some(reason);
        run.timeline.push(event.clone());

        Some(RunTick {
            stage:           RunStage::Failed,
            tick:            run.tick,
            elapsed_seconds: run.elapsed_seconds,
            snapshot:        run
                .last_snapshot
                .clone()
                .unwrap_or_else(|| WarehouseSnapshot::empty(Arc::clone(layout))),
            metrics:         run.metrics.clone(),
            heatmap:         run.heatmap.clone(),
            recent_events:   vec![event],
        })
    }

    /// Drop the run's task entry and close every stream attached to it.
    fn retire(&self, run_id: RunId) {
        lock(&self.tasks).remove(&run_id);
        lock(&self.subscribers).remove(&run_id);
        lock(&self.claims).remove(&run_id);
    }
}

/// [`TickSink`] that writes a run's progress into the catalog and fans ticks
/// out to subscribers.
struct EngineSink {
    shared: Arc<Shared>,
    run_id: RunId,
}

impl TickSink for EngineSink {
    fn on_started(&mut self, at: DateTime<Utc>) {
        self.shared.update_run(self.run_id, |run| {
            run.started_at = Some(at);
            run.stage = RunStage::WarmingUp;
        });
    }

    fn on_event(&mut self, event: &TimelineEvent) {
        self.shared.update_run(self.run_id, |run| run.timeline.push(event.clone()));
    }

    fn on_tick(&mut self, tick: &RunTick) {
        self.shared.update_run(self.run_id, |run| {
            run.stage = tick.stage;
            run.tick = tick.tick;
            run.elapsed_seconds = tick.elapsed_seconds;
            run.metrics = tick.metrics.clone();
            run.heatmap = tick.heatmap.clone();
            run.last_snapshot = Some(tick.snapshot.clone());
        });
        self.shared.broadcast(self.run_id, tick);
    }

    fn on_finished(&mut self, outcome: &RunOutcome) {
        self.shared.update_run(self.run_id, |run| {
            run.stage = outcome.stage;
            run.completed_at = Some(outcome.completed_at);
            run.error = outcome.error.clone();
        });
    }
}

/// Mirrors cell claims onto a broadcast channel.  Nobody listening is fine.
struct BroadcastListener(broadcast::Sender<ReservationClaim>);

impl ClaimListener for BroadcastListener {
    fn on_claim(&mut self, claim: ReservationClaim) {
        let _ = self.0.send(claim);
    }
}

// ── ScenarioEngine ────────────────────────────────────────────────────────────

/// Manages scenario definitions and concurrently executing runs.
///
/// Cheap to clone; clones share one catalog.  Must be used from within a
/// tokio runtime, since launching spawns tasks.
#[derive(Clone)]
pub struct ScenarioEngine {
    shared:   Arc<Shared>,
    settings: SimulationSettings,
}

impl Default for ScenarioEngine {
    fn default() -> Self {
        Self::new(SimulationSettings::default())
    }
}

impl ScenarioEngine {
    /// An engine with the built-in presets registered.
    pub fn new(settings: SimulationSettings) -> Self {
        let engine = Self { shared: Arc::new(Shared::default()), settings };
        for config in presets::all() {
            engine.register(config);
        }
        engine
    }

    fn register(&self, config: ScenarioConfig) -> ScenarioDefinition {
        let definition = ScenarioDefinition { id: ScenarioId::new(), created_at: Utc::now(), config };
        write(&self.shared.scenarios).push(definition.clone());
        definition
    }

    // ── Scenarios ─────────────────────────────────────────────────────────

    /// Validate and register a scenario.
    pub fn create_scenario(&self, config: ScenarioConfig) -> EngineResult<ScenarioDefinition> {
        config.validate()?;
        let definition = self.register(config);
        tracing::info!(scenario = %definition.id, name = %definition.config.name, "scenario registered");
        Ok(definition)
    }

    /// All scenarios in registration order.
    pub fn list_scenarios(&self) -> Vec<ScenarioDefinition> {
        read(&self.shared.scenarios).clone()
    }

    pub fn get_scenario(&self, id: ScenarioId) -> EngineResult<ScenarioDefinition> {
        read(&self.shared.scenarios)
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(EngineError::ScenarioNotFound(id))
    }

    /// First scenario whose name matches, ignoring case.
    pub fn find_scenario(&self, name: &str) -> Option<ScenarioDefinition> {
        read(&self.shared.scenarios)
            .iter()
            .find(|s| s.config.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    // ── Runs ──────────────────────────────────────────────────────────────

    pub fn launch_run(&self, scenario_id: ScenarioId) -> EngineResult<ScenarioRun> {
        self.launch_run_with_hooks(scenario_id, Box::new(NoopHooks))
    }

    /// Create a QUEUED run record and start its task.
    ///
    /// `hooks` receive the run's persistence side effects.
    pub fn launch_run_with_hooks(
        &self,
        scenario_id: ScenarioId,
        hooks:       Box<dyn PersistenceHooks>,
    ) -> EngineResult<ScenarioRun> {
        let definition = self.get_scenario(scenario_id)?;
        let run_id = RunId::new();

        let (claims_tx, _) = broadcast::channel(CLAIM_CAPACITY);
        let mut runner = RunnerBuilder::new(definition.config.clone())
            .settings(self.settings.clone())
            .hooks(hooks)
            .claim_listener(Box::new(BroadcastListener(claims_tx.clone())))
            .build()?;
        let layout = Arc::clone(runner.service().layout());

        let run = ScenarioRun::queued(run_id, scenario_id);
        {
            let mut catalog = write(&self.shared.runs);
            catalog.runs.insert(run_id, run.clone());
            catalog.order.push(run_id);
        }
        lock(&self.shared.subscribers).insert(run_id, Vec::new());
        lock(&self.shared.claims).insert(run_id, claims_tx);

        let span = tracing::info_span!("run", run_id = %run_id, scenario = %definition.config.name);
        let cancel = CancellationToken::new();

        // Hold the task map while spawning so the supervisor's `retire`
        // cannot run before the entry exists.
        let mut tasks = lock(&self.shared.tasks);

        let mut sink = EngineSink { shared: Arc::clone(&self.shared), run_id };
        let token = cancel.clone();
        let worker = tokio::spawn(
            async move {
                runner.run(&mut sink, token).await;
            }
            .instrument(span.clone()),
        );

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(
            async move {
                if let Err(e) = worker.await {
                    tracing::error!(error = %e, "run task aborted");
                    if let Some(tick) = shared.fail(run_id, e.to_string(), &layout) {
                        shared.broadcast(run_id, &tick);
                    }
                }
                shared.retire(run_id);
            }
            .instrument(span),
        );

        tasks.insert(run_id, RunTask { cancel, handle });
        tracing::info!(run = %run_id, scenario = %scenario_id, "run launched");
        Ok(run)
    }

    pub fn get_run(&self, id: RunId) -> EngineResult<ScenarioRun> {
        read(&self.shared.runs).runs.get(&id).cloned().ok_or(EngineError::RunNotFound(id))
    }

    /// All runs, newest first.
    pub fn list_runs(&self) -> Vec<ScenarioRun> {
        let catalog = read(&self.shared.runs);
        catalog.order.iter().rev().filter_map(|id| catalog.runs.get(id).cloned()).collect()
    }

    pub fn get_timeline(&self, id: RunId) -> EngineResult<Vec<TimelineEvent>> {
        read(&self.shared.runs)
            .runs
            .get(&id)
            .map(|run| run.timeline.clone())
            .ok_or(EngineError::RunNotFound(id))
    }

    /// Attach a new tick stream to a run.
    ///
    /// The stream starts at the next emitted tick.  A run that has already
    /// finished yields a stream that ends immediately.
    pub fn subscribe(&self, id: RunId) -> EngineResult<RunSubscription> {
        if !read(&self.shared.runs).runs.contains_key(&id) {
            return Err(EngineError::RunNotFound(id));
        }
        let mut subscribers = lock(&self.shared.subscribers);
        match subscribers.get_mut(&id) {
            Some(senders) => {
                let (tx, rx) = mpsc::unbounded_channel();
                senders.push(tx);
                Ok(RunSubscription::new(rx))
            }
            None => Ok(RunSubscription::closed()),
        }
    }

    /// Live cell claims of a run, for mirroring onto an external bus.
    pub fn claims(&self, id: RunId) -> EngineResult<broadcast::Receiver<ReservationClaim>> {
        if !read(&self.shared.runs).runs.contains_key(&id) {
            return Err(EngineError::RunNotFound(id));
        }
        match lock(&self.shared.claims).get(&id) {
            Some(tx) => Ok(tx.subscribe()),
            None => Ok(broadcast::channel(1).1),
        }
    }

    /// Request cooperative cancellation and wait for the run to finish.
    ///
    /// Cancelling a finished run is a no-op.
    pub async fn cancel_run(&self, id: RunId) -> EngineResult<()> {
        if !read(&self.shared.runs).runs.contains_key(&id) {
            return Err(EngineError::RunNotFound(id));
        }
        let Some(task) = lock(&self.shared.tasks).remove(&id) else {
            return Ok(());
        };
        tracing::info!(run = %id, "cancellation requested");
        task.cancel.cancel();
        task.handle
            .await
            .map_err(|e| EngineError::Join { run: id, reason: e.to_string() })
    }

    /// Number of runs whose task is still alive.
    pub fn active_runs(&self) -> usize {
        lock(&self.shared.tasks).len()
    }
}
