//! The `RunRecorder` trait implemented by all backends.

use crate::{EventRow, OutputResult, PackageRow, ReservationRow};

/// Trait implemented by the CSV and SQLite recorders.
///
/// Errors surface here but never reach the run: [`RecorderHooks`] logs them
/// and keeps the first for [`RecorderHooks::take_error`].
///
/// [`RecorderHooks`]: crate::RecorderHooks
/// [`RecorderHooks::take_error`]: crate::RecorderHooks::take_error
pub trait RunRecorder: Send {
    fn write_package(&mut self, row: &PackageRow) -> OutputResult<()>;

    /// Write one tick's batch of live claims.
    fn write_reservations(&mut self, rows: &[ReservationRow]) -> OutputResult<()>;

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
