//! Daily retention sweep bookkeeping.
//!
//! The sweep runs on the first sampler tick of every local calendar day that
//! has not been swept yet, including the first tick after startup. A failed
//! sweep is not recorded, so the next tick retries it.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    retention_days: u32,
    last_swept: Option<NaiveDate>,
}

impl RetentionPolicy {
    /// Rejects a zero-day horizon, which would delete every sample.
    pub fn new(retention_days: u32) -> anyhow::Result<Self> {
        if retention_days == 0 {
            anyhow::bail!("retention_days must be positive");
        }
        Ok(Self {
            retention_days,
            last_swept: None,
        })
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    pub fn last_swept(&self) -> Option<NaiveDate> {
        self.last_swept
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.last_swept.map_or(true, |day| day < today)
    }

    pub fn mark_swept(&mut self, today: NaiveDate) {
        self.last_swept = Some(today);
    }
}
