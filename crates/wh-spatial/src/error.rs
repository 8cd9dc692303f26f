//! Spatial-subsystem error type.

use thiserror::Error;

use wh_core::{CoreError, GridPosition};

/// Errors produced by `wh-spatial`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpatialError {
    /// Unreachable, blocked by reservations, or pruned by the cost ceiling.
    #[error("no path from {from} to {to}")]
    NoPath { from: GridPosition, to: GridPosition },

    #[error("cell {0} is outside the grid")]
    OutOfBounds(GridPosition),

    #[error("unknown planner {0:?}")]
    UnknownPlanner(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
