use thiserror::Error;

use wh_sim::SimError;

use crate::{RunId, ScenarioId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("scenario {0} not found")]
    ScenarioNotFound(ScenarioId),

    #[error("run {0} not found")]
    RunNotFound(RunId),

    #[error("run task for {run} did not shut down cleanly: {reason}")]
    Join { run: RunId, reason: String },

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type EngineResult<T> = Result<T, EngineError>;
