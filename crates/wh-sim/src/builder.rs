//! Fluent builder for constructing a [`ScenarioRunner`].

use std::sync::Arc;

use wh_agent::{ClaimListener, FleetBuilder, NoopListener};
use wh_core::{GridPosition, SimRng};
use wh_spatial::planner_for;

use crate::{NoopHooks, PersistenceHooks, ScenarioConfig, ScenarioRunner, SimResult, SimulationService, SimulationSettings};

/// Fluent builder for [`ScenarioRunner`].
///
/// # Required inputs
///
/// - [`ScenarioConfig`]: layout, fleet, demand, operations, failures, …
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                          |
/// |------------------------|----------------------------------|
/// | `.settings(s)`         | `SimulationSettings::default()`  |
/// | `.hooks(h)`            | [`NoopHooks`]                    |
/// | `.claim_listener(l)`   | [`NoopListener`]                 |
///
/// # Example
///
/// ```rust,ignore
/// let mut runner = RunnerBuilder::new(config)
///     .hooks(Box::new(recorder))
///     .build()?;
/// let outcome = runner.run(&mut NoopSink, CancellationToken::new()).await;
/// ```
pub struct RunnerBuilder {
    config:   ScenarioConfig,
    settings: SimulationSettings,
    hooks:    Box<dyn PersistenceHooks>,
    listener: Box<dyn ClaimListener + Send>,
}

impl RunnerBuilder {
    pub fn new(config: ScenarioConfig) -> Self {
        Self {
            config,
            settings: SimulationSettings::default(),
            hooks:    Box::new(NoopHooks),
            listener: Box::new(NoopListener),
        }
    }

    pub fn settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Receive spawns, status changes, claims, and timeline events.
    pub fn hooks(mut self, hooks: Box<dyn PersistenceHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Mirror every cell claim, e.g. onto a broadcast channel.
    pub fn claim_listener(mut self, listener: Box<dyn ClaimListener + Send>) -> Self {
        self.listener = listener;
        self
    }

    /// Validate the scenario, place the fleet, and return a runner in
    /// stage QUEUED.
    ///
    /// The RNG is seeded from `config.seed` when present, otherwise from OS
    /// entropy.
    pub fn build(self) -> SimResult<ScenarioRunner> {
        self.config.validate()?;

        let layout = Arc::new(self.config.layout.to_layout());
        let planner = planner_for(&self.config.optimization.planner)?;

        let fleet = FleetBuilder::new(self.config.fleet.total_robots)
            .starting_positions(self.config.fleet.starting_positions.iter().map(|&p| GridPosition::from(p)))
            .build(&layout)?;

        let rng = self.config.seed.map_or_else(SimRng::from_entropy, SimRng::new);
        let service = SimulationService::new(layout, planner, self.settings.clone());

        tracing::debug!(
            scenario = %self.config.name,
            robots = fleet.len(),
            planner = service.planner().name(),
            "runner built"
        );

        Ok(ScenarioRunner::new(self.config, self.settings, service, fleet, rng, self.hooks, self.listener))
    }
}
