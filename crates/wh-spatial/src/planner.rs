//! Planner trait and the built-in grid planners.
//!
//! # Pluggability
//!
//! `wh-sim` plans every leg through the [`Planner`] trait, so the search
//! strategy is chosen by name from the scenario's optimization profile
//! (see [`planner_for`]) rather than hard-wired into the tick loop.
//!
//! # Path convention
//!
//! Planners return the full cell sequence **including** `start`, exactly as
//! the underlying searches do.  Stripping the start cell for robot paths is
//! the caller's job.

use wh_core::{GridBounds, GridPosition};

use crate::pathfinding::{find_path_astar, find_path_bfs, CellSet, ReservationTable};
use crate::{SpatialError, SpatialResult};

// ── PlanQuery ─────────────────────────────────────────────────────────────────

/// Everything a planner may consult for one leg.
#[derive(Debug, Clone, Copy)]
pub struct PlanQuery<'a> {
    pub start:        GridPosition,
    pub end:          GridPosition,
    pub obstacles:    &'a CellSet,
    pub bounds:       GridBounds,
    /// Other robots' committed futures, tick-indexed.
    pub committed:    Option<&'a ReservationTable>,
    /// Cells currently held by live reservations.
    pub reserved_now: &'a CellSet,
    pub max_cost:     u32,
}

// ── Planner trait ─────────────────────────────────────────────────────────────

/// Pluggable path planner.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; runs hold their planner in an
/// `Arc` and move between tokio worker threads.
pub trait Planner: Send + Sync {
    /// Short, stable name used in config and logs.
    fn name(&self) -> &'static str;

    /// Plan a leg from `query.start` to `query.end`.
    ///
    /// Returns [`SpatialError::NoPath`] when no acceptable route exists.
    fn plan(&self, query: &PlanQuery<'_>) -> SpatialResult<Vec<GridPosition>>;
}

/// Look up a built-in planner by its config name (case-insensitive).
pub fn planner_for(name: &str) -> SpatialResult<Box<dyn Planner>> {
    match name.to_ascii_lowercase().as_str() {
        "astar" | "a*" => Ok(Box::new(AStarPlanner)),
        "bfs"          => Ok(Box::new(BfsPlanner)),
        _              => Err(SpatialError::UnknownPlanner(name.to_string())),
    }
}

// ── AStarPlanner ──────────────────────────────────────────────────────────────

/// Time-expanded A* over the committed reservation table, falling back to a
/// BFS that routes around currently reserved cells when A* fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct AStarPlanner;

impl Planner for AStarPlanner {
    fn name(&self) -> &'static str {
        "astar"
    }

    fn plan(&self, q: &PlanQuery<'_>) -> SpatialResult<Vec<GridPosition>> {
        let committed = q.committed.filter(|table| !table.is_empty());
        match find_path_astar(q.start, q.end, q.obstacles, q.bounds, committed, q.max_cost) {
            Ok(path) => Ok(path),
            Err(SpatialError::NoPath { .. }) => {
                tracing::debug!(start = %q.start, end = %q.end, "A* exhausted, falling back to BFS");
                find_path_bfs(q.start, q.end, q.obstacles, q.bounds, Some(q.reserved_now))
            }
            Err(e) => Err(e),
        }
    }
}

// ── BfsPlanner ────────────────────────────────────────────────────────────────

/// Time-blind shortest path that only avoids currently reserved cells.
#[derive(Debug, Default, Clone, Copy)]
pub struct BfsPlanner;

impl Planner for BfsPlanner {
    fn name(&self) -> &'static str {
        "bfs"
    }

    fn plan(&self, q: &PlanQuery<'_>) -> SpatialResult<Vec<GridPosition>> {
        find_path_bfs(q.start, q.end, q.obstacles, q.bounds, Some(q.reserved_now))
    }
}
