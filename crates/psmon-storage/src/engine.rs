use crate::database::Database;
use crate::error::{Result, StorageError};
use crate::DiskUsageRepository;
use chrono::{DateTime, Utc};
use psmon_common::types::{DiskReading, DiskSample};
use rusqlite::{params, Row};
use std::path::Path;

const INSERT_SAMPLE: &str = "INSERT INTO disk_usage
    (device, mountpoint, total, used, free, percent_used, percent_free, timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

// Per mountpoint, the newest row wins; equal timestamps fall back to the
// highest id.
const SELECT_LATEST_PER_MOUNT: &str = "
SELECT id, device, mountpoint, total, used, free, percent_used, percent_free, timestamp
FROM disk_usage d
WHERE d.id = (
    SELECT x.id FROM disk_usage x
    WHERE x.mountpoint = d.mountpoint
    ORDER BY x.timestamp DESC, x.id DESC
    LIMIT 1
)
ORDER BY d.percent_used DESC, d.mountpoint ASC";

const SELECT_HISTORY: &str = "
SELECT id, device, mountpoint, total, used, free, percent_used, percent_free, timestamp
FROM disk_usage
WHERE mountpoint = ?1
ORDER BY timestamp DESC, id DESC
LIMIT ?2";

pub struct SqliteDiskUsageStore {
    db: Database,
}

impl SqliteDiskUsageStore {
    /// Opens (creating if needed) `data_dir/file_name` and initializes the
    /// schema. Fails if the directory or schema cannot be created.
    pub fn open(data_dir: &Path, file_name: &str) -> Result<Self> {
        let db = Database::new(data_dir, file_name)?;
        db.initialize_schema()?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn to_sql_int(name: &'static str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| StorageError::InvalidArgument {
        name,
        reason: format!("{value} exceeds the SQLite integer range"),
    })
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<DiskSample> {
    let total: i64 = row.get(3)?;
    let used: i64 = row.get(4)?;
    let free: i64 = row.get(5)?;
    let ts_ms: i64 = row.get(8)?;
    Ok(DiskSample {
        id: row.get(0)?,
        device: row.get(1)?,
        mountpoint: row.get(2)?,
        total: total.max(0) as u64,
        used: used.max(0) as u64,
        free: free.max(0) as u64,
        percent_used: row.get(6)?,
        percent_free: row.get(7)?,
        timestamp: DateTime::from_timestamp_millis(ts_ms).unwrap_or_default(),
    })
}

impl DiskUsageRepository for SqliteDiskUsageStore {
    fn append_at(&self, readings: &[DiskReading], timestamp: DateTime<Utc>) -> Result<usize> {
        if readings.is_empty() {
            return Ok(0);
        }
        let ts_ms = timestamp.timestamp_millis();
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare_cached(INSERT_SAMPLE)?;
            for r in readings {
                stmt.execute(params![
                    &r.device,
                    &r.mountpoint,
                    to_sql_int("total", r.total)?,
                    to_sql_int("used", r.used)?,
                    to_sql_int("free", r.free)?,
                    r.percent_used,
                    r.percent_free,
                    ts_ms,
                ])?;
                inserted += 1;
            }
        }
        // An early return above drops `tx`, which rolls the whole batch back.
        tx.commit()?;
        Ok(inserted)
    }

    fn latest_per_mount(&self) -> Result<Vec<DiskSample>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(SELECT_LATEST_PER_MOUNT)?;
        let rows = stmt.query_map([], sample_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn history(&self, mountpoint: &str, limit: usize) -> Result<Vec<DiskSample>> {
        if limit == 0 {
            return Err(StorageError::InvalidArgument {
                name: "limit",
                reason: "must be positive".to_string(),
            });
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(SELECT_HISTORY)?;
        let rows = stmt.query_map(params![mountpoint, limit], sample_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_older_than(&self, days: u32) -> Result<usize> {
        if days == 0 {
            return Err(StorageError::InvalidArgument {
                name: "days",
                reason: "must be positive".to_string(),
            });
        }
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        let conn = self.db.connect()?;
        let deleted = conn.execute(
            "DELETE FROM disk_usage WHERE timestamp < ?1",
            params![cutoff.timestamp_millis()],
        )?;
        tracing::debug!(deleted, days, cutoff = %cutoff, "Deleted expired disk usage samples");
        Ok(deleted)
    }

    fn count(&self) -> Result<u64> {
        let conn = self.db.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM disk_usage", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
