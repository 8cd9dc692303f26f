//! `wh-core` — foundational types for the warehouse fleet simulator.
//!
//! This crate is a dependency of every other `wh-*` crate.  It intentionally
//! has no `wh-*` dependencies and minimal external ones (`rand`, `chrono`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RobotId`, `PackageId`                                |
//! | [`grid`]        | `GridPosition`, `GridBounds`, Manhattan distance      |
//! | [`layout`]      | `WarehouseLayout` (obstacles, pickup/dropoff zones)   |
//! | [`package`]     | `Package`, `PackageStatus` lifecycle                  |
//! | [`robot`]       | `RobotState`                                          |
//! | [`reservation`] | `Reservation` (cell claim with TTL)                   |
//! | [`time`]        | `Tick`                                                |
//! | [`rng`]         | `SimRng` (seeded, per run)                            |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `wh-sim` for snapshots and scenario configs.   |

pub mod error;
pub mod grid;
pub mod ids;
pub mod layout;
pub mod package;
pub mod reservation;
pub mod rng;
pub mod robot;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use grid::{GridBounds, GridPosition};
pub use ids::{PackageId, RobotId};
pub use layout::WarehouseLayout;
pub use package::{Package, PackageStatus};
pub use reservation::Reservation;
pub use rng::SimRng;
pub use robot::RobotState;
pub use time::Tick;
