//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine never writes here; callers persist a finished run in one
//! batch through `ResultSink`.

mod results;

use crate::{
    error::{SimError, SimResult},
    results::{RunMetadata, SimulationOutput},
    sink::ResultSink,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SimStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_simulation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, meta: &RunMetadata, version: &str, cancelled: bool) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, num_users, cost_per_visit, sampler,
                              segment_rates, version, started_at, cancelled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                meta.run_id,
                meta.seed as i64,
                meta.num_users as i64,
                meta.cost_per_visit,
                meta.sampler.as_str(),
                serde_json::to_string(&meta.segment_rates)?,
                version,
                meta.started_at.to_rfc3339(),
                if cancelled { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    /// Fails with `RunNotInitialized` if the run was never recorded.
    pub fn run_metadata(&self, run_id: &str) -> SimResult<RunMetadata> {
        let raw = self
            .conn
            .query_row(
                "SELECT seed, num_users, cost_per_visit, sampler, segment_rates, started_at
                 FROM run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        let Some((seed, num_users, cost_per_visit, sampler, rates, started_at)) = raw else {
            return Err(SimError::RunNotInitialized);
        };
        let started_at = DateTime::parse_from_rfc3339(&started_at)
            .map_err(|e| anyhow::anyhow!("bad started_at for run {run_id}: {e}"))?
            .with_timezone(&Utc);
        Ok(RunMetadata {
            run_id: run_id.to_string(),
            seed: seed as u64,
            num_users: num_users as usize,
            cost_per_visit,
            sampler: sampler.parse()?,
            segment_rates: serde_json::from_str(&rates)?,
            started_at,
        })
    }

    pub fn run_ids(&self) -> SimResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT run_id FROM run ORDER BY started_at ASC, run_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

impl ResultSink for SimStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    /// Run record and every row in one transaction: all or nothing.
    fn write_run(&mut self, output: &SimulationOutput) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.insert_run(&output.metadata, env!("CARGO_PKG_VERSION"), output.cancelled)?;
        self.insert_results(&output.metadata.run_id, &output.rows)?;
        tx.commit()?;
        log::debug!(
            "sqlite: stored run {} ({} rows)",
            output.metadata.run_id,
            output.rows.len()
        );
        Ok(())
    }
}
