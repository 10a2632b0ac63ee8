use crate::error::{Result, StorageError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DISK_USAGE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS disk_usage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    device TEXT NOT NULL,
    mountpoint TEXT NOT NULL,
    total INTEGER NOT NULL,
    used INTEGER NOT NULL,
    free INTEGER NOT NULL,
    percent_used REAL NOT NULL CHECK (percent_used >= 0 AND percent_used <= 100),
    percent_free REAL NOT NULL CHECK (percent_free >= 0 AND percent_free <= 100),
    timestamp INTEGER NOT NULL
        DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
);
CREATE INDEX IF NOT EXISTS idx_disk_usage_mount_time
    ON disk_usage(mountpoint, timestamp);
CREATE INDEX IF NOT EXISTS idx_disk_usage_time
    ON disk_usage(timestamp);
";

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the SQLite file plus connection setup.
///
/// No connection is cached: every call to [`Database::connect`] opens a fresh
/// one, so each repository operation owns its connection for exactly the
/// duration of the call.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Prepares `data_dir` (mode 0700 on unix) and remembers the database
    /// file path. Does not touch the schema.
    pub fn new(data_dir: &Path, file_name: &str) -> Result<Self> {
        ensure_private_dir(data_dir)?;
        Ok(Self {
            path: data_dir.join(file_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(conn)
    }

    /// Creates the `disk_usage` table and its indexes if missing.
    /// Safe to call any number of times.
    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(DISK_USAGE_SCHEMA)?;
        tracing::info!(path = %self.path.display(), "Database schema initialized");
        Ok(())
    }
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    let io_err = |source| StorageError::Io {
        path: dir.display().to_string(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).map_err(io_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_count(db: &Database) -> i64 {
        let conn = db.connect().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'disk_usage'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn schema_initialization_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let db = Database::new(tmp.path(), "psmon.db").unwrap();
        db.initialize_schema().unwrap();
        db.initialize_schema().unwrap();
        assert_eq!(table_count(&db), 1);
    }

    #[test]
    fn creates_missing_nested_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("db");
        let db = Database::new(&dir, "psmon.db").unwrap();
        db.initialize_schema().unwrap();
        assert!(db.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn data_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        Database::new(&dir, "psmon.db").unwrap();
        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn timestamp_defaults_to_insertion_time() {
        let tmp = TempDir::new().unwrap();
        let db = Database::new(tmp.path(), "psmon.db").unwrap();
        db.initialize_schema().unwrap();
        let conn = db.connect().unwrap();
        conn.execute(
            "INSERT INTO disk_usage (device, mountpoint, total, used, free, percent_used, percent_free)
             VALUES ('sda', '/', 10, 5, 5, 50.0, 50.0)",
            [],
        )
        .unwrap();
        let ts: i64 = conn
            .query_row("SELECT timestamp FROM disk_usage", [], |row| row.get(0))
            .unwrap();
        let now = chrono::Utc::now().timestamp_millis();
        assert!((now - ts).abs() < 60_000, "default timestamp {ts} too far from {now}");
    }
}
