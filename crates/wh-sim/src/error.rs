use thiserror::Error;

use wh_agent::AgentError;
use wh_core::{CoreError, PackageId};
use wh_spatial::SpatialError;

use crate::RunStage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("scenario configuration error: {0}")]
    Config(String),

    #[error("run stage cannot move from {from} to {to}")]
    InvalidStage { from: RunStage, to: RunStage },

    #[error("package {0} is not in the active set")]
    UnknownPackage(PackageId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub type SimResult<T> = Result<T, SimError>;
