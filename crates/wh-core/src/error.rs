//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so domain validation failures bubble up unchanged.

use thiserror::Error;

use crate::{GridPosition, PackageId, PackageStatus};

/// The top-level error type for `wh-core` and a common base for sub-crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("package {package} cannot move from {from:?} to {to:?}")]
    InvalidPackageTransition {
        package: PackageId,
        from:    PackageStatus,
        to:      PackageStatus,
    },

    #[error("position {pos} lies outside a {width}x{height} grid")]
    OutOfBounds {
        pos:    GridPosition,
        width:  u32,
        height: u32,
    },

    #[error("layout error: {0}")]
    Layout(String),
}

/// Shorthand result type for `wh-core`.
pub type CoreResult<T> = Result<T, CoreError>;
