//! `wh-spatial` — grid pathfinding, planners, and cell reservations.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`pathfinding`]  | `find_path_bfs`, `find_path_astar`, `ReservationTable`    |
//! | [`planner`]      | `Planner` trait, `AStarPlanner`, `BfsPlanner`             |
//! | [`reservations`] | `ReservationManager` (one TTL claim per robot)            |
//! | [`error`]        | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | FxHash for search-internal cell sets and maps.             |
//! | `serde`   | Derives `Serialize`/`Deserialize` on core types.           |

pub mod error;
pub mod pathfinding;
pub mod planner;
pub mod reservations;


pub use error::{SpatialError, SpatialResult};
pub use pathfinding::{
    build_reservation_table, find_path_astar, find_path_bfs, CellSet, ReservationTable,
    DEFAULT_MAX_COST,
};
pub use planner::{planner_for, AStarPlanner, BfsPlanner, PlanQuery, Planner};
pub use reservations::{ReservationManager, DEFAULT_TTL_SECS};
