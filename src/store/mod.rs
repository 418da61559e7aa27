//! Append-only record collections for snapshots, alerts, samples and
//! summaries.
//!
//! A store has exactly one writer process. Running two collectors against the
//! same store is unsupported: both would read, modify and rewrite the same
//! collections.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::alerts::Alert;
use crate::errors::StoreError;
use crate::health::HealthSnapshot;
use crate::metrics::{MetricSample, Period, Summary};
use chrono::NaiveDate;

#[async_trait::async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Append and keep only the newest `cap` snapshots.
    async fn append_health_snapshot(
        &self,
        snapshot: &HealthSnapshot,
        cap: usize,
    ) -> Result<(), StoreError>;

    async fn load_health_history(&self) -> Result<Vec<HealthSnapshot>, StoreError>;

    /// Append and keep only the newest `cap` alerts.
    async fn append_alert(&self, alert: &Alert, cap: usize) -> Result<(), StoreError>;

    async fn load_alert_history(&self) -> Result<Vec<Alert>, StoreError>;

    /// Append to the raw collection of the sample's day.
    async fn append_sample(&self, sample: &MetricSample) -> Result<(), StoreError>;

    async fn load_samples(&self, day: NaiveDate) -> Result<Vec<MetricSample>, StoreError>;

    /// Days that have a raw collection, ascending.
    async fn list_sample_days(&self) -> Result<Vec<NaiveDate>, StoreError>;

    async fn delete_samples(&self, day: NaiveDate) -> Result<(), StoreError>;

    /// Append to the summary collection of the summary's period and day.
    async fn append_summary(&self, summary: &Summary) -> Result<(), StoreError>;

    async fn load_summaries(
        &self,
        period: Period,
        day: NaiveDate,
    ) -> Result<Vec<Summary>, StoreError>;
}

/// Keep the newest `cap` items.
pub(crate) fn truncate_front<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}
