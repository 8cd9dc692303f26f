//! `wh-output` — run recorders for the warehouse fleet simulator.
//!
//! Two backends, the second behind a Cargo feature:
//!
//! | Feature   | Backend | Files created                                      |
//! |-----------|---------|----------------------------------------------------|
//! | *(none)*  | CSV     | `packages.csv`, `reservations.csv`, `events.csv`   |
//! | `sqlite`  | SQLite  | `run.db`                                           |
//!
//! Both implement [`RunRecorder`] and are driven by [`RecorderHooks`], which
//! implements `wh_sim::PersistenceHooks`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wh_output::{CsvRecorder, RecorderHooks};
//!
//! let hooks = RecorderHooks::new(CsvRecorder::new(Path::new("./output"))?);
//! let errors = hooks.error_slot();
//! let run = engine.launch_run_with_hooks(scenario.id, Box::new(hooks))?;
//! // ... once the run has finished:
//! errors.take().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod hooks;
pub mod recorder;
pub mod row;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvRecorder;
pub use error::{OutputError, OutputResult};
pub use hooks::{ErrorSlot, RecorderHooks};
pub use recorder::RunRecorder;
pub use row::{EventRow, PackageRow, ReservationRow};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecorder;
