//! SQLite recorder (feature `sqlite`).
//!
//! Creates `run.db` in the output directory with three tables carrying the
//! same columns as the CSV files: `packages`, `reservations`, `events`.

use std::path::Path;

use rusqlite::Connection;

use crate::recorder::RunRecorder;
use crate::row::timestamp;
use crate::{EventRow, OutputResult, PackageRow, ReservationRow};

/// Writes a run's side effects to an SQLite database.
pub struct SqliteRecorder {
    conn:     Connection,
    finished: bool,
}

impl SqliteRecorder {
    /// Open (or create) `run.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("run.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS packages (
                 package_id     INTEGER NOT NULL,
                 status         TEXT    NOT NULL,
                 priority       TEXT    NOT NULL,
                 x              INTEGER NOT NULL,
                 y              INTEGER NOT NULL,
                 assigned_robot INTEGER,
                 created_at     TEXT    NOT NULL,
                 recorded_at    TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS reservations (
                 batch      INTEGER NOT NULL,
                 robot_id   INTEGER NOT NULL,
                 x          INTEGER NOT NULL,
                 y          INTEGER NOT NULL,
                 created_at TEXT    NOT NULL,
                 ttl_secs   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS events (
                 timestamp TEXT NOT NULL,
                 type      TEXT NOT NULL,
                 message   TEXT NOT NULL,
                 payload   TEXT NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl RunRecorder for SqliteRecorder {
    fn write_package(&mut self, row: &PackageRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO packages \
             (package_id, status, priority, x, y, assigned_robot, created_at, recorded_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                row.package_id as i64,
                row.status,
                row.priority,
                row.x,
                row.y,
                row.assigned_robot,
                timestamp(row.created_at),
                timestamp(row.recorded_at),
            ],
        )?;
        Ok(())
    }

    fn write_reservations(&mut self, rows: &[ReservationRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO reservations (batch, robot_id, x, y, created_at, ttl_secs) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.batch as i64,
                    row.robot_id,
                    row.x,
                    row.y,
                    timestamp(row.created_at),
                    row.ttl_secs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO events (timestamp, type, message, payload) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![timestamp(row.timestamp), row.kind, row.message, row.payload],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
