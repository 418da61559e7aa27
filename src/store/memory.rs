use super::{truncate_front, PersistenceStore};
use crate::alerts::Alert;
use crate::errors::StoreError;
use crate::health::HealthSnapshot;
use crate::metrics::{MetricSample, Period, Summary};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    health: Vec<HealthSnapshot>,
    alerts: Vec<Alert>,
    samples: BTreeMap<NaiveDate, Vec<MetricSample>>,
    summaries: BTreeMap<(Period, NaiveDate), Vec<Summary>>,
}

/// Process-local store, mostly for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PersistenceStore for MemoryStore {
    async fn append_health_snapshot(
        &self,
        snapshot: &HealthSnapshot,
        cap: usize,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.health.push(snapshot.clone());
        truncate_front(&mut inner.health, cap);
        Ok(())
    }

    async fn load_health_history(&self) -> Result<Vec<HealthSnapshot>, StoreError> {
        Ok(self.inner.read().await.health.clone())
    }

    async fn append_alert(&self, alert: &Alert, cap: usize) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.alerts.push(alert.clone());
        truncate_front(&mut inner.alerts, cap);
        Ok(())
    }

    async fn load_alert_history(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(self.inner.read().await.alerts.clone())
    }

    async fn append_sample(&self, sample: &MetricSample) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .samples
            .entry(sample.day())
            .or_default()
            .push(sample.clone());
        Ok(())
    }

    async fn load_samples(&self, day: NaiveDate) -> Result<Vec<MetricSample>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .samples
            .get(&day)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_sample_days(&self) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self.inner.read().await.samples.keys().copied().collect())
    }

    async fn delete_samples(&self, day: NaiveDate) -> Result<(), StoreError> {
        self.inner.write().await.samples.remove(&day);
        Ok(())
    }

    async fn append_summary(&self, summary: &Summary) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .summaries
            .entry((summary.period, summary.day()))
            .or_default()
            .push(summary.clone());
        Ok(())
    }

    async fn load_summaries(
        &self,
        period: Period,
        day: NaiveDate,
    ) -> Result<Vec<Summary>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .summaries
            .get(&(period, day))
            .cloned()
            .unwrap_or_default())
    }
}
