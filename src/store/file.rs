use super::{truncate_front, PersistenceStore};
use crate::alerts::Alert;
use crate::errors::StoreError;
use crate::health::HealthSnapshot;
use crate::metrics::{MetricSample, Period, Summary};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize, Deserialize, Default)]
struct HealthFile {
    checks: Vec<HealthSnapshot>,
}

#[derive(Serialize, Deserialize, Default)]
struct AlertFile {
    alerts: Vec<Alert>,
}

#[derive(Serialize, Deserialize, Default)]
struct SampleFile {
    metrics: Vec<MetricSample>,
}

#[derive(Serialize, Deserialize, Default)]
struct SummaryFile {
    summaries: Vec<Summary>,
}

/// JSON documents on disk:
///
/// ```text
/// <root>/health-history.json
/// <root>/alert-history.json
/// <root>/metrics/minute/YYYY-MM-DD.json
/// <root>/metrics/hourly/YYYY-MM-DD.json
/// <root>/metrics/daily/YYYY-MM-DD.json
/// ```
///
/// Every append rewrites its document through a temp file and a rename.
pub struct JsonFileStore {
    root: PathBuf,
    // read-modify-write of one document must not interleave within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn health_path(&self) -> PathBuf {
        self.root.join("health-history.json")
    }

    fn alert_path(&self) -> PathBuf {
        self.root.join("alert-history.json")
    }

    fn raw_dir(&self) -> PathBuf {
        self.root.join("metrics").join("minute")
    }

    fn day_file(dir: &Path, day: NaiveDate) -> PathBuf {
        dir.join(format!("{}.json", day.format(DAY_FORMAT)))
    }

    fn summary_dir(&self, period: Period) -> PathBuf {
        self.root.join("metrics").join(period.as_str())
    }

    async fn read_doc<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(StoreError::io(path.display().to_string(), e)),
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::malformed(path.display().to_string(), e))
    }

    async fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
        let display = path.display().to_string();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent.display().to_string(), e))?;
        }
        let body =
            serde_json::to_vec_pretty(doc).map_err(|e| StoreError::malformed(display.clone(), e))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::io(tmp.display().to_string(), e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::io(display, e))
    }
}

#[async_trait::async_trait]
impl PersistenceStore for JsonFileStore {
    async fn append_health_snapshot(
        &self,
        snapshot: &HealthSnapshot,
        cap: usize,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.health_path();
        let mut doc: HealthFile = Self::read_doc(&path).await?;
        doc.checks.push(snapshot.clone());
        truncate_front(&mut doc.checks, cap);
        Self::write_doc(&path, &doc).await
    }

    async fn load_health_history(&self) -> Result<Vec<HealthSnapshot>, StoreError> {
        let doc: HealthFile = Self::read_doc(&self.health_path()).await?;
        Ok(doc.checks)
    }

    async fn append_alert(&self, alert: &Alert, cap: usize) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.alert_path();
        let mut doc: AlertFile = Self::read_doc(&path).await?;
        doc.alerts.push(alert.clone());
        truncate_front(&mut doc.alerts, cap);
        Self::write_doc(&path, &doc).await
    }

    async fn load_alert_history(&self) -> Result<Vec<Alert>, StoreError> {
        let doc: AlertFile = Self::read_doc(&self.alert_path()).await?;
        Ok(doc.alerts)
    }

    async fn append_sample(&self, sample: &MetricSample) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = Self::day_file(&self.raw_dir(), sample.day());
        let mut doc: SampleFile = Self::read_doc(&path).await?;
        doc.metrics.push(sample.clone());
        Self::write_doc(&path, &doc).await
    }

    async fn load_samples(&self, day: NaiveDate) -> Result<Vec<MetricSample>, StoreError> {
        let doc: SampleFile = Self::read_doc(&Self::day_file(&self.raw_dir(), day)).await?;
        Ok(doc.metrics)
    }

    async fn list_sample_days(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let dir = self.raw_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir.display().to_string(), e)),
        };

        let mut days = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(dir.display().to_string(), e))?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                match NaiveDate::parse_from_str(stem, DAY_FORMAT) {
                    Ok(day) => days.push(day),
                    Err(_) => tracing::debug!("Ignoring unexpected file in metrics dir: {}", name),
                }
            }
        }
        days.sort();
        Ok(days)
    }

    async fn delete_samples(&self, day: NaiveDate) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = Self::day_file(&self.raw_dir(), day);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path.display().to_string(), e)),
        }
    }

    async fn append_summary(&self, summary: &Summary) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = Self::day_file(&self.summary_dir(summary.period), summary.day());
        let mut doc: SummaryFile = Self::read_doc(&path).await?;
        doc.summaries.push(summary.clone());
        Self::write_doc(&path, &doc).await
    }

    async fn load_summaries(
        &self,
        period: Period,
        day: NaiveDate,
    ) -> Result<Vec<Summary>, StoreError> {
        let doc: SummaryFile = Self::read_doc(&Self::day_file(&self.summary_dir(period), day)).await?;
        Ok(doc.summaries)
    }
}
