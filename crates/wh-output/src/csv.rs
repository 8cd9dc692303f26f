//! CSV recorder.
//!
//! Creates three files in the output directory:
//! - `packages.csv`
//! - `reservations.csv`
//! - `events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::recorder::RunRecorder;
use crate::row::timestamp;
use crate::{EventRow, OutputResult, PackageRow, ReservationRow};

pub const PACKAGE_HEADERS: [&str; 8] =
    ["package_id", "status", "priority", "x", "y", "assigned_robot", "created_at", "recorded_at"];
pub const RESERVATION_HEADERS: [&str; 6] = ["batch", "robot_id", "x", "y", "created_at", "ttl_secs"];
pub const EVENT_HEADERS: [&str; 4] = ["timestamp", "type", "message", "payload"];

/// Writes a run's side effects to three CSV files.
pub struct CsvRecorder {
    packages:     Writer<File>,
    reservations: Writer<File>,
    events:       Writer<File>,
    finished:     bool,
}

impl CsvRecorder {
    /// Create (truncating) the three files in `dir` and write the headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut packages = Writer::from_path(dir.join("packages.csv"))?;
        packages.write_record(PACKAGE_HEADERS)?;

        let mut reservations = Writer::from_path(dir.join("reservations.csv"))?;
        reservations.write_record(RESERVATION_HEADERS)?;

        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(EVENT_HEADERS)?;

        Ok(Self { packages, reservations, events, finished: false })
    }
}

impl RunRecorder for CsvRecorder {
    fn write_package(&mut self, row: &PackageRow) -> OutputResult<()> {
        self.packages.write_record(&[
            row.package_id.to_string(),
            row.status.to_string(),
            row.priority.clone(),
            row.x.to_string(),
            row.y.to_string(),
            row.assigned_robot.map(|r| r.to_string()).unwrap_or_default(),
            timestamp(row.created_at),
            timestamp(row.recorded_at),
        ])?;
        Ok(())
    }

    fn write_reservations(&mut self, rows: &[ReservationRow]) -> OutputResult<()> {
        for row in rows {
            self.reservations.write_record(&[
                row.batch.to_string(),
                row.robot_id.to_string(),
                row.x.to_string(),
                row.y.to_string(),
                timestamp(row.created_at),
                row.ttl_secs.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.events.write_record([
            timestamp(row.timestamp).as_str(),
            row.kind,
            row.message.as_str(),
            row.payload.as_str(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.packages.flush()?;
        self.reservations.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
