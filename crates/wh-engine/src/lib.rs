//! `wh-engine` — scenario catalog and concurrent run management.
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`engine`]       | `ScenarioEngine`: create/list scenarios, launch/cancel runs |
//! | [`run`]          | `ScenarioDefinition`, `ScenarioRun` catalog records       |
//! | [`subscription`] | `RunSubscription`: per-caller tick stream                 |
//! | [`presets`]      | Built-in scenarios registered at start-up                 |
//! | [`ids`]          | `ScenarioId`, `RunId`                                     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use wh_engine::ScenarioEngine;
//!
//! let engine = ScenarioEngine::default();
//! let scenario = engine.find_scenario("Peak Hour").unwrap();
//! let run = engine.launch_run(scenario.id)?;
//!
//! let mut ticks = engine.subscribe(run.id)?;
//! while let Some(tick) = ticks.next_tick().await {
//!     println!("{} delivered={}", tick.stage, tick.metrics.delivered);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod ids;
pub mod presets;
pub mod run;
pub mod subscription;


pub use engine::ScenarioEngine;
pub use error::{EngineError, EngineResult};
pub use ids::{RunId, ScenarioId};
pub use run::{ScenarioDefinition, ScenarioRun};
pub use subscription::RunSubscription;
