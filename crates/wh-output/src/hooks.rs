//! `RecorderHooks<R>` bridges `PersistenceHooks` to a `RunRecorder`.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use wh_core::{Package, Reservation};
use wh_sim::{PersistenceHooks, TimelineEvent};

use crate::recorder::RunRecorder;
use crate::row::{EventRow, PackageRow, ReservationRow};
use crate::{OutputError, OutputResult};

/// Shared slot holding the first recorder error of a run.
///
/// The hooks move into the run's task, so callers keep a clone of the slot
/// to inspect the outcome afterwards.
#[derive(Clone, Default)]
pub struct ErrorSlot(Arc<Mutex<Option<OutputError>>>);

impl ErrorSlot {
    /// Take the stored error, if any.
    pub fn take(&self) -> Option<OutputError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn keep_first(&self, e: OutputError) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(e);
        }
    }
}

/// [`PersistenceHooks`] that write every spawn, status change, claim batch,
/// and timeline event to any [`RunRecorder`].
///
/// Hook methods have no return value, so a failed write is logged with
/// `warn!` and the first error is kept in the [`ErrorSlot`].  The run is
/// never interrupted.
pub struct RecorderHooks<R: RunRecorder> {
    recorder: R,
    /// Reservation batches written so far.
    batch:    u64,
    errors:   ErrorSlot,
}

impl<R: RunRecorder> RecorderHooks<R> {
    pub fn new(recorder: R) -> Self {
        Self { recorder, batch: 0, errors: ErrorSlot::default() }
    }

    /// Handle to the error slot; stays valid after the hooks are moved.
    pub fn error_slot(&self) -> ErrorSlot {
        self.errors.clone()
    }

    pub fn take_error(&mut self) -> Option<OutputError> {
        self.errors.take()
    }

    /// Unwrap the inner recorder.
    pub fn into_recorder(self) -> R {
        self.recorder
    }

    fn store_err(&mut self, what: &str, result: OutputResult<()>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, what, "recorder write failed");
            self.errors.keep_first(e);
        }
    }

    fn package(&mut self, package: &Package) {
        let row = PackageRow::new(package, Utc::now());
        let result = self.recorder.write_package(&row);
        self.store_err("package", result);
    }
}

impl<R: RunRecorder> PersistenceHooks for RecorderHooks<R> {
    fn record_package_spawn(&mut self, package: &Package) {
        self.package(package);
    }

    fn update_package_status(&mut self, package: &Package) {
        self.package(package);
    }

    fn record_reservations(&mut self, reservations: &[Reservation]) {
        if reservations.is_empty() {
            return;
        }
        self.batch += 1;
        let rows: Vec<ReservationRow> =
            reservations.iter().map(|r| ReservationRow::new(self.batch, r)).collect();
        let result = self.recorder.write_reservations(&rows);
        self.store_err("reservations", result);
    }

    fn record_event(&mut self, event: &TimelineEvent) {
        let result = self.recorder.write_event(&EventRow::from(event));
        self.store_err("event", result);
    }

    fn finish(&mut self) {
        let result = self.recorder.finish();
        self.store_err("finish", result);
    }
}
