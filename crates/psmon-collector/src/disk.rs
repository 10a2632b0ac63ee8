use crate::DiskUsageProvider;
use anyhow::Result;
use psmon_common::types::DiskReading;
use std::collections::HashSet;
use sysinfo::{Disk, Disks};

pub struct DiskCollector {
    disks: Disks,
}

impl DiskCollector {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskUsageProvider for DiskCollector {
    fn name(&self) -> &str {
        "disk"
    }

    fn collect(&mut self) -> Result<Vec<DiskReading>> {
        // Picks up mounts added or removed since the last tick.
        self.disks.refresh_list();
        let readings = self.disks.iter().map(read_disk);
        let deduped = dedup_by_mountpoint(readings);
        tracing::debug!(count = deduped.len(), "Collected disk usage");
        Ok(deduped)
    }
}

fn read_disk(disk: &Disk) -> Option<DiskReading> {
    let mountpoint = disk.mount_point().to_string_lossy().to_string();
    let device = disk.name().to_string_lossy().to_string();
    let reading = DiskReading::from_space(
        device,
        mountpoint.as_str(),
        disk.total_space(),
        disk.available_space(),
    );
    if reading.is_none() {
        tracing::debug!(mount = %mountpoint, "Skipping zero-sized or unreadable mount");
    }
    reading
}

/// Keeps the first successful reading for each mountpoint, preserving the
/// order in which mounts were reported. Failed reads (`None`) are skipped.
pub fn dedup_by_mountpoint<I>(readings: I) -> Vec<DiskReading>
where
    I: IntoIterator<Item = Option<DiskReading>>,
{
    let mut seen = HashSet::new();
    readings
        .into_iter()
        .flatten()
        .filter(|r| seen.insert(r.mountpoint.clone()))
        .collect()
}
