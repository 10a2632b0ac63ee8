//! Disk-usage time-series storage.
//!
//! The default implementation ([`engine::SqliteDiskUsageStore`]) keeps every
//! sample in a single SQLite table (`disk_usage`) opened in WAL mode, so the
//! HTTP handlers can read while the sampler writes. Each operation opens its
//! own short-lived connection and transaction.

pub mod database;
pub mod engine;
pub mod error;


pub use engine::SqliteDiskUsageStore;
pub use error::{Result, StorageError};

use chrono::{DateTime, Utc};
use psmon_common::types::{DiskReading, DiskSample};

/// Persistence backend for disk-usage samples.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because the store is written by the sampler and read by the REST API
/// concurrently.
pub trait DiskUsageRepository: Send + Sync {
    /// Inserts all readings as one transaction stamped with the current
    /// time. Either every row commits or none does. Returns the number of
    /// rows inserted.
    fn append(&self, readings: &[DiskReading]) -> Result<usize> {
        self.append_at(readings, Utc::now())
    }

    /// Like [`append`](Self::append) with an explicit timestamp.
    fn append_at(&self, readings: &[DiskReading], timestamp: DateTime<Utc>) -> Result<usize>;

    /// Returns the most recent sample of every mountpoint, most-full first.
    /// Equal timestamps resolve to the row with the highest id.
    fn latest_per_mount(&self) -> Result<Vec<DiskSample>>;

    /// Returns up to `limit` samples for `mountpoint`, newest first. An
    /// unknown mountpoint yields an empty vector.
    fn history(&self, mountpoint: &str, limit: usize) -> Result<Vec<DiskSample>>;

    /// Deletes samples strictly older than `days` days. Returns the number
    /// of rows removed.
    fn delete_older_than(&self, days: u32) -> Result<usize>;

    /// Returns the total number of stored samples.
    fn count(&self) -> Result<u64>;
}
