//! Host metric collection for psmon.
//!
//! [`DiskUsageProvider`] is the seam between the sampler and the operating
//! system: [`disk::DiskCollector`] implements it with `sysinfo`, tests swap
//! in scripted fakes. Memory and platform identity are read on demand by the
//! HTTP layer through [`memory`] and [`system`].

pub mod disk;
pub mod memory;
pub mod system;

use anyhow::Result;
use psmon_common::types::DiskReading;

/// Source of per-mount disk usage readings.
///
/// Implementations skip mounts that cannot be read instead of failing the
/// whole call, and return at most one reading per mountpoint. The trait
/// requires `Send` so the sampler can drive it from the blocking pool.
pub trait DiskUsageProvider: Send {
    /// Provider name, used for logging.
    fn name(&self) -> &str;

    /// Reads the current usage of every mounted filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error only when the mount table itself cannot be read.
    fn collect(&mut self) -> Result<Vec<DiskReading>>;
}
