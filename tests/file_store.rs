use chrono::{NaiveDate, TimeZone, Utc};
use watchtower::health::{CheckResult, HealthSnapshot, OverallStatus};
use watchtower::metrics::{Aggregates, MetricRecord, MetricSample, Period, Summary};
use watchtower::store::{JsonFileStore, PersistenceStore};

fn snapshot(score: u8) -> HealthSnapshot {
    HealthSnapshot {
        timestamp: Utc::now(),
        results: vec![CheckResult::healthy("API", 12)],
        overall_score: score,
        overall_status: OverallStatus::Healthy,
        issues: Vec::new(),
    }
}

fn sample(day: u32, hour: u32, price: f64) -> MetricSample {
    let mut record = MetricRecord::new();
    record.insert("price".into(), price.into());
    MetricSample::new(Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap())
        .with_category("token", record)
}

#[tokio::test]
async fn missing_documents_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    assert!(store.load_health_history().await.unwrap().is_empty());
    assert!(store.load_alert_history().await.unwrap().is_empty());
    assert!(store.list_sample_days().await.unwrap().is_empty());
    let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    assert!(store.load_samples(day).await.unwrap().is_empty());
    assert!(store.load_summaries(Period::Hour, day).await.unwrap().is_empty());
    store.delete_samples(day).await.unwrap();
}

#[tokio::test]
async fn health_history_keeps_the_newest_entries() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    for score in [10, 20, 30, 40] {
        store.append_health_snapshot(&snapshot(score), 3).await.unwrap();
    }

    let scores: Vec<u8> = store
        .load_health_history()
        .await
        .unwrap()
        .iter()
        .map(|s| s.overall_score)
        .collect();
    assert_eq!(scores, vec![20, 30, 40]);
    assert!(dir.path().join("health-history.json").exists());
}

#[tokio::test]
async fn samples_are_partitioned_by_day() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    store.append_sample(&sample(2, 10, 1.0)).await.unwrap();
    store.append_sample(&sample(1, 23, 2.0)).await.unwrap();
    store.append_sample(&sample(2, 11, 3.0)).await.unwrap();

    let days = store.list_sample_days().await.unwrap();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        ]
    );

    let second = store.load_samples(days[1]).await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].number("token", "price"), Some(3.0));

    store.delete_samples(days[0]).await.unwrap();
    assert_eq!(store.list_sample_days().await.unwrap(), vec![days[1]]);
}

#[tokio::test]
async fn stray_files_are_not_listed_as_days() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.append_sample(&sample(5, 0, 1.0)).await.unwrap();

    let raw_dir = dir.path().join("metrics").join("minute");
    std::fs::write(raw_dir.join("notes.json"), "{}").unwrap();
    std::fs::write(raw_dir.join("README"), "x").unwrap();

    assert_eq!(store.list_sample_days().await.unwrap().len(), 1);
}

#[tokio::test]
async fn summaries_are_stored_per_period() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();

    store
        .append_summary(&Summary {
            period: Period::Hour,
            start_time: start,
            aggregates: Aggregates::default(),
        })
        .await
        .unwrap();

    let day = start.date_naive();
    let hourly = store.load_summaries(Period::Hour, day).await.unwrap();
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].start_time, start);
    assert!(store.load_summaries(Period::Day, day).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_document_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("alert-history.json"), "not json").unwrap();
    let store = JsonFileStore::new(dir.path());

    assert!(store.load_alert_history().await.is_err());
}
