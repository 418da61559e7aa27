use super::models::{MetricRecord, MetricSample, MetricsExport, Period, Summary};
use super::rollup::{
    day_start, hour_start, merge_summaries, previous_day, previous_hour_start, summarize_samples,
};
use super::sources::MetricSource;
use crate::configuration::MetricsSettings;
use crate::errors::{MonitorError, SourceError};
use crate::scheduler::{LifecycleState, Scheduler};
use crate::store::PersistenceStore;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

/// Periodic sampling of every metric source plus the hourly and daily
/// rollups and raw-data retention.
pub struct MetricsCollector {
    settings: MetricsSettings,
    sources: Vec<Arc<dyn MetricSource>>,
    store: Arc<dyn PersistenceStore>,
    current: RwLock<Option<MetricSample>>,
    cycle_guard: Mutex<()>,
    // hourly and daily rollups must not interleave
    rollup_guard: Mutex<()>,
    scheduler: Scheduler,
}

impl MetricsCollector {
    pub fn new(
        settings: MetricsSettings,
        sources: Vec<Arc<dyn MetricSource>>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self {
            settings,
            sources,
            store,
            current: RwLock::new(None),
            cycle_guard: Mutex::new(()),
            rollup_guard: Mutex::new(()),
            scheduler: Scheduler::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.scheduler.state()
    }

    pub async fn collect_once(&self) -> MetricSample {
        self.collect_at(Utc::now()).await
    }

    /// Fetch every source, store the sample and apply retention. A failing
    /// source leaves its category empty.
    #[tracing::instrument(name = "Metrics collection", skip(self))]
    pub async fn collect_at(&self, now: DateTime<Utc>) -> MetricSample {
        let _cycle = self.cycle_guard.lock().await;
        let source_timeout = self.settings.source_timeout();

        let fetches = self.sources.iter().map(|source| async move {
            let record = match timeout(source_timeout, source.fetch()).await {
                Ok(Ok(record)) => record,
                Ok(Err(err)) => {
                    tracing::warn!(category = source.category(), "Metric source failed: {}", err);
                    MetricRecord::new()
                }
                Err(_) => {
                    let err = SourceError::Timeout(source_timeout.as_millis() as u64);
                    tracing::warn!(category = source.category(), "Metric source failed: {}", err);
                    MetricRecord::new()
                }
            };
            (source.category().to_string(), record)
        });

        let sample = join_all(fetches)
            .await
            .into_iter()
            .fold(MetricSample::new(now), |sample, (category, record)| {
                sample.with_category(&category, record)
            });

        if let Err(err) = self.store.append_sample(&sample).await {
            tracing::error!("Failed to store metrics sample: {}", err);
        }
        *self.current.write().await = Some(sample.clone());

        if let Err(err) = self.cleanup_old_metrics_at(now.date_naive()).await {
            tracing::error!("Metrics retention failed: {}", err);
        }

        tracing::info!(categories = sample.categories.len(), "Metrics collection complete");
        sample
    }

    pub async fn generate_hourly_summary(&self) -> Result<Option<Summary>, MonitorError> {
        self.generate_hourly_summary_at(Utc::now()).await
    }

    /// Summarize the last full hour before `now`. `None` when the hour is
    /// empty or was summarized already.
    #[tracing::instrument(name = "Hourly rollup", skip(self))]
    pub async fn generate_hourly_summary_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Summary>, MonitorError> {
        let _rollup = self.rollup_guard.lock().await;
        let start = previous_hour_start(now);
        let end = start + Period::Hour.length();
        let day = start.date_naive();

        let existing = self.store.load_summaries(Period::Hour, day).await?;
        if existing.iter().any(|s| s.start_time == start) {
            tracing::debug!("Hour starting {} already summarized", start);
            return Ok(None);
        }

        let samples: Vec<MetricSample> = self
            .store
            .load_samples(day)
            .await?
            .into_iter()
            .filter(|s| s.timestamp >= start && s.timestamp < end)
            .collect();
        if samples.is_empty() {
            tracing::debug!("No samples for hour starting {}", start);
            return Ok(None);
        }

        let summary = Summary {
            period: Period::Hour,
            start_time: start,
            aggregates: summarize_samples(&samples),
        };
        self.store.append_summary(&summary).await?;
        tracing::info!(samples = samples.len(), "Hourly summary written for {}", start);
        Ok(Some(summary))
    }

    pub async fn generate_daily_summary(&self) -> Result<Option<Summary>, MonitorError> {
        self.generate_daily_summary_at(Utc::now()).await
    }

    /// Merge the hourly summaries of the UTC day before `now`. Hours of that
    /// day still missing a summary are summarized first.
    #[tracing::instrument(name = "Daily rollup", skip(self))]
    pub async fn generate_daily_summary_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Summary>, MonitorError> {
        let _rollup = self.rollup_guard.lock().await;
        self.write_day(previous_day(now)).await
    }

    pub async fn run_rollups(&self) -> Result<Vec<Summary>, MonitorError> {
        self.run_rollups_at(Utc::now()).await
    }

    /// Catch up on every complete hour that has raw samples but no summary,
    /// then on every complete day without a daily summary. Returns what was
    /// written, hours first.
    #[tracing::instrument(name = "Metrics rollup", skip(self))]
    pub async fn run_rollups_at(&self, now: DateTime<Utc>) -> Result<Vec<Summary>, MonitorError> {
        let _rollup = self.rollup_guard.lock().await;
        let until = hour_start(now);
        let today = now.date_naive();

        let mut days: BTreeSet<NaiveDate> = self
            .store
            .list_sample_days()
            .await?
            .into_iter()
            .filter(|day| *day <= today)
            .collect();

        let mut written = Vec::new();
        for day in &days {
            written.extend(self.write_missing_hours(*day, until).await?);
        }

        days.insert(previous_day(now));
        for day in days.into_iter().filter(|day| *day < today) {
            if let Some(summary) = self.write_day(day).await? {
                written.push(summary);
            }
        }
        Ok(written)
    }

    /// Hourly summaries for every hour of `day` that ends by `until` and has
    /// none yet. Caller holds the rollup guard.
    async fn write_missing_hours(
        &self,
        day: NaiveDate,
        until: DateTime<Utc>,
    ) -> Result<Vec<Summary>, MonitorError> {
        let done: HashSet<DateTime<Utc>> = self
            .store
            .load_summaries(Period::Hour, day)
            .await?
            .into_iter()
            .map(|s| s.start_time)
            .collect();

        let mut buckets: BTreeMap<DateTime<Utc>, Vec<MetricSample>> = BTreeMap::new();
        for sample in self.store.load_samples(day).await? {
            let start = hour_start(sample.timestamp);
            if start + Period::Hour.length() <= until && !done.contains(&start) {
                buckets.entry(start).or_default().push(sample);
            }
        }

        let mut written = Vec::with_capacity(buckets.len());
        for (start, samples) in buckets {
            let summary = Summary {
                period: Period::Hour,
                start_time: start,
                aggregates: summarize_samples(&samples),
            };
            self.store.append_summary(&summary).await?;
            tracing::info!(samples = samples.len(), "Hourly summary written for {}", start);
            written.push(summary);
        }
        Ok(written)
    }

    /// Daily summary of `day`. Caller holds the rollup guard.
    async fn write_day(&self, day: NaiveDate) -> Result<Option<Summary>, MonitorError> {
        let start = day_start(day);

        let existing = self.store.load_summaries(Period::Day, day).await?;
        if existing.iter().any(|s| s.start_time == start) {
            tracing::debug!("Day {} already summarized", day);
            return Ok(None);
        }

        self.write_missing_hours(day, start + Period::Day.length())
            .await?;

        let hourly = self.store.load_summaries(Period::Hour, day).await?;
        if hourly.is_empty() {
            tracing::debug!("No hourly summaries for {}", day);
            return Ok(None);
        }

        let summary = Summary {
            period: Period::Day,
            start_time: start,
            aggregates: merge_summaries(&hourly),
        };
        self.store.append_summary(&summary).await?;
        tracing::info!(hours = hourly.len(), "Daily summary written for {}", day);
        Ok(Some(summary))
    }

    pub async fn cleanup_old_metrics(&self) -> Result<usize, MonitorError> {
        self.cleanup_old_metrics_at(Utc::now().date_naive()).await
    }

    /// Delete raw day collections older than the retention window.
    /// Summaries are kept.
    pub async fn cleanup_old_metrics_at(&self, today: NaiveDate) -> Result<usize, MonitorError> {
        let cutoff = today - Duration::days(self.settings.retention_days as i64);
        let mut removed = 0;
        for day in self.store.list_sample_days().await? {
            if day < cutoff {
                self.store.delete_samples(day).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "Deleted raw metrics older than {}", cutoff);
        }
        Ok(removed)
    }

    /// Sampling and rollups both run right away, then on their intervals.
    /// The first rollup run catches up on whatever a restart missed.
    pub fn start(self: &Arc<Self>) {
        if !self.scheduler.begin() {
            tracing::warn!("Metrics collector already {:?}, start ignored", self.state());
            return;
        }

        let collector = Arc::clone(self);
        self.scheduler.spawn_every(
            "metrics-collection",
            std::time::Duration::from_secs(self.settings.collection_interval_secs),
            true,
            move || {
                let collector = Arc::clone(&collector);
                async move {
                    collector.collect_once().await;
                }
            },
        );

        let collector = Arc::clone(self);
        self.scheduler.spawn_every(
            "metrics-rollup",
            std::time::Duration::from_secs(self.settings.hourly_interval_secs),
            true,
            move || {
                let collector = Arc::clone(&collector);
                async move {
                    if let Err(err) = collector.run_rollups().await {
                        tracing::error!("Metrics rollup failed: {}", err);
                    }
                }
            },
        );

        tracing::info!(sources = self.sources.len(), "Metrics collector started");
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
        tracing::info!("Metrics collector stopped");
    }

    pub async fn get_current_metrics(&self) -> Option<MetricSample> {
        self.current.read().await.clone()
    }

    /// Raw samples with `start <= timestamp <= end`. Only days that have a
    /// raw collection are read.
    pub async fn get_metrics_for_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MetricSample>, MonitorError> {
        let mut samples = Vec::new();
        if start > end {
            return Ok(samples);
        }

        let (first, last) = (start.date_naive(), end.date_naive());
        for day in self.store.list_sample_days().await? {
            if day < first || day > last {
                continue;
            }
            samples.extend(
                self.store
                    .load_samples(day)
                    .await?
                    .into_iter()
                    .filter(|s| s.timestamp >= start && s.timestamp <= end),
            );
        }
        Ok(samples)
    }

    /// Raw samples, health snapshots and alerts recorded in `[start, end]`,
    /// plus the current sample.
    #[tracing::instrument(name = "Metrics export", skip(self))]
    pub async fn export(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<MetricsExport, MonitorError> {
        let in_range = |at: DateTime<Utc>| at >= start && at <= end;
        let metrics = self.get_metrics_for_range(start, end).await?;
        let health = self
            .store
            .load_health_history()
            .await?
            .into_iter()
            .filter(|s| in_range(s.timestamp))
            .collect();
        let alerts = self
            .store
            .load_alert_history()
            .await?
            .into_iter()
            .filter(|a| in_range(a.timestamp))
            .collect();

        Ok(MetricsExport {
            timestamp: Utc::now(),
            start,
            end,
            current: self.get_current_metrics().await,
            metrics,
            health,
            alerts,
        })
    }

    pub async fn get_summaries(
        &self,
        period: Period,
        day: NaiveDate,
    ) -> Result<Vec<Summary>, MonitorError> {
        Ok(self.store.load_summaries(period, day).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::models::MetricValue;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PriceSource {
        prices: Vec<f64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricSource for PriceSource {
        fn category(&self) -> &str {
            "token"
        }

        async fn fetch(&self) -> Result<MetricRecord, SourceError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut record = MetricRecord::new();
            record.insert("price".into(), MetricValue::Number(self.prices[i % self.prices.len()]));
            Ok(record)
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl MetricSource for BrokenSource {
        fn category(&self) -> &str {
            "social"
        }

        async fn fetch(&self) -> Result<MetricRecord, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }

    fn collector(store: Arc<MemoryStore>) -> MetricsCollector {
        MetricsCollector::new(
            MetricsSettings::default(),
            vec![
                Arc::new(PriceSource {
                    prices: vec![10.0, 11.0, 12.0],
                    calls: AtomicUsize::new(0),
                }),
                Arc::new(BrokenSource),
            ],
            store,
        )
    }

    #[tokio::test]
    async fn failed_source_leaves_empty_category() {
        let collector = collector(Arc::new(MemoryStore::new()));
        let sample = collector.collect_at(at(1, 10, 0)).await;
        assert_eq!(sample.number("token", "price"), Some(10.0));
        assert!(sample.categories["social"].is_empty());
        assert_eq!(collector.get_current_metrics().await, Some(sample));
    }

    #[tokio::test]
    async fn hourly_rollup_summarizes_previous_hour_once() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store.clone());
        for minute in [0, 1, 2] {
            collector.collect_at(at(1, 10, minute)).await;
        }
        // outside the window
        collector.collect_at(at(1, 11, 5)).await;

        let summary = collector
            .generate_hourly_summary_at(at(1, 11, 30))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.start_time, at(1, 10, 0));
        let price = summary.aggregates.numeric["token.price"];
        assert_eq!(price.count, 3);
        assert_eq!(price.mean, 11.0);
        assert_eq!(price.min, 10.0);
        assert_eq!(price.max, 12.0);

        assert!(collector
            .generate_hourly_summary_at(at(1, 11, 45))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            collector.get_summaries(Period::Hour, at(1, 0, 0).date_naive()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn empty_windows_write_nothing() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store.clone());
        assert!(collector.generate_hourly_summary_at(at(1, 5, 0)).await.unwrap().is_none());
        assert!(collector.generate_daily_summary_at(at(2, 1, 0)).await.unwrap().is_none());
        assert!(store
            .load_summaries(Period::Hour, at(1, 0, 0).date_naive())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn daily_rollup_merges_hourly_summaries() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store.clone());
        for (hour, minute) in [(10, 0), (10, 1), (11, 0)] {
            collector.collect_at(at(1, hour, minute)).await;
        }
        collector.generate_hourly_summary_at(at(1, 11, 10)).await.unwrap();
        collector.generate_hourly_summary_at(at(1, 12, 10)).await.unwrap();

        let daily = collector
            .generate_daily_summary_at(at(2, 0, 5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(daily.period, Period::Day);
        assert_eq!(daily.start_time, at(1, 0, 0));
        assert_eq!(daily.aggregates.count, 3);
        assert_eq!(daily.aggregates.numeric["token.price"].mean, 11.0);
        assert!(collector.generate_daily_summary_at(at(2, 6, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn retention_drops_old_raw_days_only() {
        let store = Arc::new(MemoryStore::new());
        let old = MetricSample::new(Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap());
        store.append_sample(&old).await.unwrap();
        let collector = collector(store.clone());

        collector.collect_at(at(1, 10, 0)).await;
        let days = store.list_sample_days().await.unwrap();
        assert_eq!(days, vec![at(1, 0, 0).date_naive()]);
        assert_eq!(collector.cleanup_old_metrics_at(at(1, 0, 0).date_naive()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn range_query_spans_days_inclusively() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store);
        collector.collect_at(at(1, 23, 59)).await;
        collector.collect_at(at(2, 0, 1)).await;
        collector.collect_at(at(2, 8, 0)).await;

        let samples = collector
            .get_metrics_for_range(at(1, 23, 59), at(2, 0, 1))
            .await
            .unwrap();
        assert_eq!(samples.len(), 2);
        assert!(collector
            .get_metrics_for_range(at(2, 0, 0), at(1, 0, 0))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn daily_rollup_includes_hour_not_yet_summarized() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store.clone());
        collector.collect_at(at(1, 22, 10)).await;
        collector.collect_at(at(1, 23, 50)).await;
        collector.generate_hourly_summary_at(at(1, 23, 5)).await.unwrap();

        // the daily job fires before the 23:00 hour has a summary
        let daily = collector
            .generate_daily_summary_at(at(2, 0, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(daily.aggregates.count, 2);
        assert_eq!(daily.aggregates.numeric["token.price"].max, 11.0);

        assert!(collector
            .generate_hourly_summary_at(at(2, 0, 5))
            .await
            .unwrap()
            .is_none());
        let hourly = store.load_summaries(Period::Hour, at(1, 0, 0).date_naive()).await.unwrap();
        let starts: Vec<_> = hourly.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![at(1, 22, 0), at(1, 23, 0)]);
    }

    #[tokio::test]
    async fn concurrent_rollups_write_each_summary_once() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store.clone());
        collector.collect_at(at(1, 22, 10)).await;
        collector.collect_at(at(1, 23, 10)).await;

        let (daily, hourly, all) = tokio::join!(
            collector.generate_daily_summary_at(at(2, 0, 1)),
            collector.generate_hourly_summary_at(at(2, 0, 1)),
            collector.run_rollups_at(at(2, 0, 1)),
        );
        assert_eq!(daily.unwrap().unwrap().aggregates.count, 2);
        assert!(hourly.unwrap().is_none());
        assert!(all.unwrap().is_empty());

        let day = at(1, 0, 0).date_naive();
        assert_eq!(store.load_summaries(Period::Hour, day).await.unwrap().len(), 2);
        assert_eq!(store.load_summaries(Period::Day, day).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollups_catch_up_after_downtime() {
        let store = Arc::new(MemoryStore::new());
        let collector = collector(store.clone());
        for hour in [8, 9, 10] {
            collector.collect_at(at(1, hour, 15)).await;
        }
        collector.collect_at(at(2, 0, 30)).await;
        // still open
        collector.collect_at(at(2, 1, 2)).await;

        let written = collector.run_rollups_at(at(2, 1, 5)).await.unwrap();
        let hours: Vec<_> = written
            .iter()
            .filter(|s| s.period == Period::Hour)
            .map(|s| s.start_time)
            .collect();
        assert_eq!(hours, vec![at(1, 8, 0), at(1, 9, 0), at(1, 10, 0), at(2, 0, 0)]);
        let daily: Vec<_> = written.iter().filter(|s| s.period == Period::Day).collect();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].start_time, at(1, 0, 0));
        assert_eq!(daily[0].aggregates.count, 3);

        assert!(collector.run_rollups_at(at(2, 1, 20)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retention_boundary_keeps_cutoff_day_and_summaries() {
        let store = Arc::new(MemoryStore::new());
        let today = at(1, 0, 0).date_naive();
        let days: Vec<NaiveDate> = [91, 90, 89].iter().map(|n| today - Duration::days(*n)).collect();
        for day in &days {
            store
                .append_sample(&MetricSample::new(day_start(*day) + Duration::hours(12)))
                .await
                .unwrap();
        }
        let summary = Summary {
            period: Period::Day,
            start_time: day_start(days[0]),
            aggregates: Default::default(),
        };
        store.append_summary(&summary).await.unwrap();

        let settings = MetricsSettings {
            retention_days: 90,
            ..MetricsSettings::default()
        };
        let collector = MetricsCollector::new(settings, vec![], store.clone());

        assert_eq!(collector.cleanup_old_metrics_at(today).await.unwrap(), 1);
        assert_eq!(store.list_sample_days().await.unwrap(), days[1..].to_vec());
        assert_eq!(store.load_summaries(Period::Day, days[0]).await.unwrap(), vec![summary]);
    }

    struct CountingStore {
        inner: MemoryStore,
        sample_reads: AtomicUsize,
    }

    #[async_trait]
    impl PersistenceStore for CountingStore {
        async fn append_health_snapshot(
            &self,
            snapshot: &crate::health::HealthSnapshot,
            cap: usize,
        ) -> Result<(), crate::errors::StoreError> {
            self.inner.append_health_snapshot(snapshot, cap).await
        }

        async fn load_health_history(
            &self,
        ) -> Result<Vec<crate::health::HealthSnapshot>, crate::errors::StoreError> {
            self.inner.load_health_history().await
        }

        async fn append_alert(
            &self,
            alert: &crate::alerts::Alert,
            cap: usize,
        ) -> Result<(), crate::errors::StoreError> {
            self.inner.append_alert(alert, cap).await
        }

        async fn load_alert_history(
            &self,
        ) -> Result<Vec<crate::alerts::Alert>, crate::errors::StoreError> {
            self.inner.load_alert_history().await
        }

        async fn append_sample(&self, sample: &MetricSample) -> Result<(), crate::errors::StoreError> {
            self.inner.append_sample(sample).await
        }

        async fn load_samples(
            &self,
            day: NaiveDate,
        ) -> Result<Vec<MetricSample>, crate::errors::StoreError> {
            self.sample_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_samples(day).await
        }

        async fn list_sample_days(&self) -> Result<Vec<NaiveDate>, crate::errors::StoreError> {
            self.inner.list_sample_days().await
        }

        async fn delete_samples(&self, day: NaiveDate) -> Result<(), crate::errors::StoreError> {
            self.inner.delete_samples(day).await
        }

        async fn append_summary(&self, summary: &Summary) -> Result<(), crate::errors::StoreError> {
            self.inner.append_summary(summary).await
        }

        async fn load_summaries(
            &self,
            period: Period,
            day: NaiveDate,
        ) -> Result<Vec<Summary>, crate::errors::StoreError> {
            self.inner.load_summaries(period, day).await
        }
    }

    #[tokio::test]
    async fn wide_range_reads_only_stored_days() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            sample_reads: AtomicUsize::new(0),
        });
        store.append_sample(&MetricSample::new(at(1, 9, 0))).await.unwrap();
        store.append_sample(&MetricSample::new(at(3, 9, 0))).await.unwrap();
        let collector = MetricsCollector::new(MetricsSettings::default(), vec![], store.clone());

        let samples = collector
            .get_metrics_for_range(DateTime::<Utc>::MIN_UTC, at(3, 23, 0))
            .await
            .unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(store.sample_reads.load(Ordering::SeqCst), 2);
    }
}
