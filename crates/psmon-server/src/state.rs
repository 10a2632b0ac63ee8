use crate::config::ServerConfig;
use crate::sampler::DiskSampler;
use chrono::{DateTime, Utc};
use psmon_collector::memory::MemoryCollector;
use psmon_collector::DiskUsageProvider;
use psmon_common::types::SystemInfo;
use psmon_storage::DiskUsageRepository;
use std::sync::{Arc, Mutex};

/// Shared handler state. Cloned per request, so every field is behind an
/// `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DiskUsageRepository>,
    /// Provider for live readings served by `GET /api/disk/usage`
    pub disk_provider: Arc<Mutex<Box<dyn DiskUsageProvider>>>,
    pub memory: Arc<Mutex<MemoryCollector>>,
    /// Platform identity, read once at startup
    pub system_info: Arc<SystemInfo>,
    /// `None` when sampling is disabled in the config
    pub sampler: Option<Arc<DiskSampler>>,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DiskUsageRepository>,
        disk_provider: Box<dyn DiskUsageProvider>,
        system_info: SystemInfo,
        sampler: Option<Arc<DiskSampler>>,
    ) -> Self {
        Self {
            store,
            disk_provider: Arc::new(Mutex::new(disk_provider)),
            memory: Arc::new(Mutex::new(MemoryCollector::new())),
            system_info: Arc::new(system_info),
            sampler,
            start_time: Utc::now(),
            config: Arc::new(config),
        }
    }

    pub fn sampler_running(&self) -> bool {
        self.sampler.as_ref().is_some_and(|s| s.is_running())
    }
}
