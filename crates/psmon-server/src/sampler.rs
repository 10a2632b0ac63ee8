//! Periodic disk usage sampling.
//!
//! [`DiskSampler`] owns one background tokio task that, on every tick, asks
//! the [`DiskUsageProvider`] for readings, appends them to the
//! [`DiskUsageRepository`] as one batch and, once per local day, deletes
//! samples past the retention horizon. Provider and repository calls are
//! blocking, so each tick runs on the blocking pool; the loop itself only
//! waits for the next tick or for cancellation.

use crate::config::ServerConfig;
use crate::retention::RetentionPolicy;
use chrono::{Local, NaiveDate};
use psmon_collector::DiskUsageProvider;
use psmon_storage::DiskUsageRepository;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Lock a mutex, recovering from poisoning left by a panicked tick.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Validated sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    interval: Duration,
    retention_days: u32,
}

impl SamplerConfig {
    pub fn new(interval: Duration, retention_days: u32) -> anyhow::Result<Self> {
        if interval.is_zero() {
            anyhow::bail!("sampling interval must be positive");
        }
        if retention_days == 0 {
            anyhow::bail!("retention_days must be positive");
        }
        Ok(Self {
            interval,
            retention_days,
        })
    }

    pub fn from_server_config(config: &ServerConfig) -> anyhow::Result<Self> {
        Self::new(config.sample_interval(), config.retention_days)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }
}

/// Outcome of a single tick, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Readings returned by the provider; `None` when collection failed
    pub collected: Option<usize>,
    pub inserted: usize,
    /// Rows removed by the retention sweep; `None` when no sweep completed
    pub swept: Option<usize>,
}

struct SamplerCore {
    provider: Mutex<Box<dyn DiskUsageProvider>>,
    repository: Arc<dyn DiskUsageRepository>,
    retention: Mutex<RetentionPolicy>,
}

impl SamplerCore {
    /// Runs one tick. Never fails: every error is logged and absorbed.
    fn tick(&self, today: NaiveDate) -> TickReport {
        let mut report = TickReport::default();
        self.sample(&mut report);
        self.sweep_if_due(today, &mut report);
        report
    }

    fn sample(&self, report: &mut TickReport) {
        let readings = {
            let mut provider = lock(&self.provider);
            match provider.collect() {
                Ok(readings) => readings,
                Err(e) => {
                    tracing::error!(provider = provider.name(), error = %e, "Disk usage collection failed");
                    return;
                }
            }
        };
        report.collected = Some(readings.len());
        if readings.is_empty() {
            tracing::warn!("Provider returned no disk usage readings");
            return;
        }

        match self.repository.append(&readings) {
            Ok(inserted) => {
                report.inserted = inserted;
                tracing::info!(inserted, "Saved disk usage samples");
            }
            Err(e) => {
                tracing::error!(count = readings.len(), error = %e, "Failed to save disk usage samples");
            }
        }
    }

    fn sweep_if_due(&self, today: NaiveDate, report: &mut TickReport) {
        let mut retention = lock(&self.retention);
        if !retention.is_due(today) {
            return;
        }
        let days = retention.retention_days();
        match self.repository.delete_older_than(days) {
            Ok(deleted) => {
                retention.mark_swept(today);
                report.swept = Some(deleted);
                if deleted > 0 {
                    tracing::info!(deleted, retention_days = days, "Cleaned up old disk usage samples");
                } else {
                    tracing::debug!(retention_days = days, "Retention sweep found nothing to delete");
                }
            }
            Err(e) => {
                tracing::error!(retention_days = days, error = %e, "Retention sweep failed, retrying next tick");
            }
        }
    }
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background disk usage sampler with an explicit `Stopped -> Running ->
/// Stopped` lifecycle.
pub struct DiskSampler {
    core: Arc<SamplerCore>,
    config: SamplerConfig,
    running: Mutex<Option<RunningLoop>>,
}

impl DiskSampler {
    pub fn new(
        repository: Arc<dyn DiskUsageRepository>,
        provider: Box<dyn DiskUsageProvider>,
        config: SamplerConfig,
    ) -> anyhow::Result<Self> {
        let retention = RetentionPolicy::new(config.retention_days())?;
        Ok(Self {
            core: Arc::new(SamplerCore {
                provider: Mutex::new(provider),
                repository,
                retention: Mutex::new(retention),
            }),
            config,
            running: Mutex::new(None),
        })
    }

    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    /// Spawns the sampling loop on the current tokio runtime. The first tick
    /// fires immediately. Returns `false` without side effects when the
    /// sampler is already running.
    pub fn start(&self) -> bool {
        let mut running = lock(&self.running);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::warn!("Disk usage sampler is already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.core.clone(),
            self.config.interval(),
            cancel.clone(),
        ));
        *running = Some(RunningLoop { cancel, handle });

        tracing::info!(
            interval_secs = self.config.interval().as_secs_f64(),
            retention_days = self.config.retention_days(),
            "Disk usage sampler started"
        );
        true
    }

    /// Signals the loop to exit and waits for it. A tick already in
    /// progress is allowed to finish; a pending wait is cut short.
    pub async fn stop(&self) {
        let Some(running) = lock(&self.running).take() else {
            tracing::debug!("Disk usage sampler is not running");
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            tracing::error!(error = %e, "Disk usage sampler task failed");
        }
        tracing::info!("Disk usage sampler stopped");
    }

    pub fn is_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Runs one tick immediately on the blocking pool, outside the schedule.
    pub async fn tick_now(&self) -> TickReport {
        run_tick(self.core.clone()).await
    }
}

async fn run_tick(core: Arc<SamplerCore>) -> TickReport {
    let today = Local::now().date_naive();
    match tokio::task::spawn_blocking(move || core.tick(today)).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Disk usage sampler tick panicked");
            TickReport::default()
        }
    }
}

async fn run_loop(core: Arc<SamplerCore>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let report = run_tick(core.clone()).await;
        tracing::debug!(?report, "Disk usage sampler tick finished");
    }

    tracing::debug!("Disk usage sampler loop exited");
}
