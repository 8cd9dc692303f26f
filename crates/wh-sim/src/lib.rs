//! `wh-sim` — scenario configuration, simulation service, and tick loop.
//!
//! # Layers
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`config`]   | `ScenarioConfig` and its profiles (serde, with defaults)     |
//! | [`settings`] | `SimulationSettings` (TTL, thresholds, emit interval)        |
//! | [`store`]    | `PackageStore`: undelivered packages and layout queries      |
//! | [`service`]  | `SimulationService`: planning, scheduling, claims, health    |
//! | [`runner`]   | `ScenarioRunner`: per-tick phases and the async stage loop   |
//! | [`builder`]  | `RunnerBuilder`                                              |
//! | [`hooks`]    | `PersistenceHooks`, `TickSink`, `RunOutcome`                 |
//! | [`snapshot`] | `WarehouseSnapshot`                                          |
//! | [`tick`]     | `RunTick`                                                    |
//! | [`metrics`]  | `RunMetrics`, `MetricsTracker`                               |
//! | [`events`]   | `TimelineEvent`, `TimelineEventKind`                         |
//! | [`heatmap`]  | `Heatmap` (visit counts keyed `"x:y"`)                       |
//! | [`stage`]    | `RunStage`                                                   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use wh_sim::{RunnerBuilder, ScenarioConfig};
//!
//! let config: ScenarioConfig = serde_json::from_str(&json)?;
//! let mut runner = RunnerBuilder::new(config).build()?;
//! let mut ticks = Vec::new();
//! let outcome = runner.run(&mut ticks, CancellationToken::new()).await;
//! println!("{} after {} ticks", outcome.stage, ticks.len());
//! ```
//!
//! # Cargo features
//!
//! | Feature   | Effect                                            |
//! |-----------|---------------------------------------------------|
//! | `fx-hash` | FxHash cell sets in the planner (`wh-spatial`).   |

pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod heatmap;
pub mod hooks;
pub mod metrics;
pub mod runner;
pub mod service;
pub mod settings;
pub mod snapshot;
pub mod stage;
pub mod store;
pub mod tick;

#[cfg(test)]
mod tests;

pub use builder::RunnerBuilder;
pub use config::{
    DemandProfile, FailureProfile, FleetClassConfig, FleetConfig, HorizonProfile, LayoutConfig,
    OperationsProfile, OptimizationProfile, ScenarioConfig,
};
pub use error::{SimError, SimResult};
pub use events::{TimelineEvent, TimelineEventKind};
pub use heatmap::Heatmap;
pub use hooks::{NoopHooks, NoopSink, PersistenceHooks, RunOutcome, TickSink};
pub use metrics::{MetricsTracker, RunMetrics};
pub use runner::ScenarioRunner;
pub use service::{AssignmentOutcome, SimulationService};
pub use settings::SimulationSettings;
pub use snapshot::WarehouseSnapshot;
pub use stage::RunStage;
pub use store::PackageStore;
pub use tick::RunTick;
