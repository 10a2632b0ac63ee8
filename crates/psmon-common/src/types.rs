use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rounds a percentage to two decimal places.
fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One disk-usage reading for one mount, as returned by a provider and
/// before it has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiskReading {
    /// Filesystem source, e.g. `/dev/sda1` or `C:\`
    pub device: String,
    /// Mount path; the grouping key for history queries
    pub mountpoint: String,
    /// Total size in bytes
    pub total: u64,
    /// Used bytes
    pub used: u64,
    /// Bytes available to unprivileged users
    pub free: u64,
    pub percent_used: f64,
    pub percent_free: f64,
}

impl DiskReading {
    /// Builds a reading from total and available space.
    ///
    /// Returns `None` for zero-sized filesystems, which carry no usable
    /// percentage. `percent_free` is derived from the rounded
    /// `percent_used` so the two always sum to 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use psmon_common::types::DiskReading;
    ///
    /// let r = DiskReading::from_space("/dev/sda1", "/", 1000, 250).unwrap();
    /// assert_eq!(r.used, 750);
    /// assert_eq!(r.percent_used, 75.0);
    /// assert_eq!(r.percent_free, 25.0);
    /// assert!(DiskReading::from_space("none", "/empty", 0, 0).is_none());
    /// ```
    pub fn from_space(
        device: impl Into<String>,
        mountpoint: impl Into<String>,
        total: u64,
        available: u64,
    ) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let free = available.min(total);
        let used = total - free;
        let percent_used = round_percent(used as f64 / total as f64 * 100.0);
        Some(Self {
            device: device.into(),
            mountpoint: mountpoint.into(),
            total,
            used,
            free,
            percent_used,
            percent_free: round_percent(100.0 - percent_used),
        })
    }
}

/// A persisted disk-usage row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiskSample {
    /// Store-assigned surrogate key, strictly increasing
    pub id: i64,
    pub device: String,
    pub mountpoint: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent_used: f64,
    pub percent_free: f64,
    /// Insertion time
    pub timestamp: DateTime<Utc>,
}

impl DiskSample {
    /// The reading this row was created from.
    pub fn reading(&self) -> DiskReading {
        DiskReading {
            device: self.device.clone(),
            mountpoint: self.mountpoint.clone(),
            total: self.total,
            used: self.used,
            free: self.free,
            percent_used: self.percent_used,
            percent_free: self.percent_free,
        }
    }
}

/// Physical memory and swap usage, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    /// Memory available for new allocations without swapping
    pub free: u64,
    pub percent_used: f64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
    pub swap_percent_used: f64,
    /// Always `"bytes"`
    pub units: String,
}

impl MemoryUsage {
    /// Builds a usage record, computing both percentages.
    ///
    /// ```
    /// use psmon_common::types::MemoryUsage;
    ///
    /// let m = MemoryUsage::from_totals(8000, 2000, 0, 0);
    /// assert_eq!(m.used, 6000);
    /// assert_eq!(m.percent_used, 75.0);
    /// assert_eq!(m.swap_percent_used, 0.0);
    /// ```
    pub fn from_totals(total: u64, available: u64, swap_total: u64, swap_free: u64) -> Self {
        let free = available.min(total);
        let used = total - free;
        let swap_free = swap_free.min(swap_total);
        let swap_used = swap_total - swap_free;
        Self {
            total,
            used,
            free,
            percent_used: percent_of(used, total),
            swap_total,
            swap_used,
            swap_free,
            swap_percent_used: percent_of(swap_used, swap_total),
            units: "bytes".to_string(),
        }
    }
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_percent(part as f64 / whole as f64 * 100.0)
    }
}

/// Platform identity of the monitored host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SystemInfo {
    /// OS family, e.g. `unix` or `windows`
    pub os_family: String,
    /// OS name, e.g. `Ubuntu`
    pub system: String,
    pub release: String,
    pub version: String,
    pub kernel: String,
    pub hostname: String,
    /// CPU architecture, e.g. `x86_64`
    pub machine: String,
    pub processor: String,
    /// Version of the running psmon server
    pub server_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_always_sum_to_hundred() {
        let r = DiskReading::from_space("/dev/sdb1", "/data", 3, 1).unwrap();
        assert_eq!(r.percent_used, 66.67);
        assert!((r.percent_used + r.percent_free - 100.0).abs() < 1e-9);
        assert_eq!(r.used + r.free, r.total);
    }

    #[test]
    fn available_larger_than_total_is_clamped() {
        let r = DiskReading::from_space("tmpfs", "/tmp", 100, 500).unwrap();
        assert_eq!(r.free, 100);
        assert_eq!(r.used, 0);
        assert_eq!(r.percent_used, 0.0);
        assert_eq!(r.percent_free, 100.0);
    }

    #[test]
    fn disk_sample_serializes_with_flat_fields() {
        let sample = DiskSample {
            id: 7,
            device: "/dev/sda1".into(),
            mountpoint: "/".into(),
            total: 100,
            used: 40,
            free: 60,
            percent_used: 40.0,
            percent_free: 60.0,
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["mountpoint"], "/");
        assert_eq!(json["percent_used"], 40.0);
        assert_eq!(json["id"], 7);
        assert_eq!(sample.reading().mountpoint, "/");
    }

    #[test]
    fn memory_without_swap_reports_zero_percent() {
        let m = MemoryUsage::from_totals(1024, 1024, 0, 0);
        assert_eq!(m.used, 0);
        assert_eq!(m.percent_used, 0.0);
        assert_eq!(m.swap_used, 0);
        assert_eq!(m.units, "bytes");
    }
}
