use thiserror::Error;

use wh_core::{CoreError, GridPosition, RobotId, RobotState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("{robot}: cannot {action} while {from:?}")]
    InvalidTransition { robot: RobotId, from: RobotState, action: &'static str },

    #[error("{0}: committed path must not be empty")]
    EmptyPath(RobotId),

    #[error("starting cell {0} is an obstacle")]
    StartBlocked(GridPosition),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type AgentResult<T> = Result<T, AgentError>;
