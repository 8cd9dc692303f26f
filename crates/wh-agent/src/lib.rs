//! `wh-agent` — robot state machines and fleet storage.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`agent`]     | `RobotAgent`, `Job`                                        |
//! | [`event`]     | `AgentEvent` (result of one `update`)                      |
//! | [`listener`]  | `ClaimListener` trait, `ReservationClaim`, `NoopListener`  |
//! | [`fleet`]     | `Fleet`, `FleetBuilder`                                    |
//! | [`telemetry`] | `RobotTelemetry`                                           |
//! | [`error`]     | `AgentError`, `AgentResult<T>`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                   |
//! |---------|----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on telemetry and claims. |

pub mod agent;
pub mod error;
pub mod event;
pub mod fleet;
pub mod listener;
pub mod telemetry;


pub use agent::{Job, RobotAgent};
pub use error::{AgentError, AgentResult};
pub use event::AgentEvent;
pub use fleet::{Fleet, FleetBuilder};
pub use listener::{ClaimListener, NoopListener, ReservationClaim};
pub use telemetry::RobotTelemetry;
