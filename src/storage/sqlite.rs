//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::StopReason;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordSink, Storage, StorageError, StorageResult};
use crate::storage::{RunOutcome, RunRecord, RunStatus, StoredRecord, UpsertStats};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, source, started_at, finished_at, config_hash, status, stop_reason,
     collected, inserted, batches";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let stop_reason: Option<String> = row.get(6)?;
    Ok(RunRecord {
        id: row.get(0)?,
        source: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Failed),
        stop_reason: stop_reason.as_deref().and_then(StopReason::from_db_string),
        collected: row.get::<_, i64>(7)? as u64,
        inserted: row.get::<_, i64>(8)? as u64,
        batches: row.get(9)?,
    })
}

impl RecordSink for SqliteStorage {
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut stats = UpsertStats::default();

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO reviews (id, source, rating, date, content, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for record in records {
                let changed = stmt.execute(params![
                    record.key,
                    record.source,
                    record.rating,
                    record.date,
                    record.content,
                    now
                ])?;

                if changed > 0 {
                    stats.inserted += 1;
                } else {
                    stats.already_present += 1;
                }
            }
        }

        tx.commit()?;
        Ok(stats)
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, source: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (source, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![source, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        outcome: &RunOutcome,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, stop_reason = ?3,
             collected = ?4, inserted = ?5, batches = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                outcome.stop_reason.to_db_string(),
                outcome.collected as i64,
                outcome.inserted as i64,
                outcome.batches,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self, source: &str) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE source = ?1 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![source],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Records =====

    fn load_records(&self, source: &str) -> StorageResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, rating, date, content FROM reviews
             WHERE source = ?1 ORDER BY rowid ASC",
        )?;

        let records = stmt
            .query_map(params![source], |row| {
                Ok(StoredRecord {
                    key: row.get(0)?,
                    source: row.get(1)?,
                    rating: row.get(2)?,
                    date: row.get(3)?,
                    content: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Statistics =====

    fn count_total_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_records_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM reviews GROUP BY source ORDER BY source")?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
