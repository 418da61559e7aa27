use super::models::{CheckStatus, HealthSnapshot};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::RwLock;

/// Per-probe figures derived from the snapshots in memory.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeStats {
    pub total_checks: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub down_count: usize,
    pub uptime_percentage: f64,
    pub avg_response_time_ms: u64,
    pub min_response_time_ms: Option<u64>,
    pub max_response_time_ms: Option<u64>,
}

/// Bounded ring of the most recent snapshots.
pub struct HealthHistory {
    snapshots: RwLock<VecDeque<HealthSnapshot>>,
    max_snapshots: usize,
}

impl HealthHistory {
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            snapshots: RwLock::new(VecDeque::with_capacity(max_snapshots)),
            max_snapshots,
        }
    }

    pub async fn record(&self, snapshot: HealthSnapshot) {
        let mut snapshots = self.snapshots.write().await;
        snapshots.push_back(snapshot);
        while snapshots.len() > self.max_snapshots {
            snapshots.pop_front();
        }
    }

    /// Replace the ring content, keeping only the newest entries.
    pub async fn restore(&self, persisted: Vec<HealthSnapshot>) {
        let skip = persisted.len().saturating_sub(self.max_snapshots);
        let mut snapshots = self.snapshots.write().await;
        snapshots.clear();
        snapshots.extend(persisted.into_iter().skip(skip));
    }

    pub async fn latest(&self) -> Option<HealthSnapshot> {
        self.snapshots.read().await.back().cloned()
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> Vec<HealthSnapshot> {
        self.snapshots
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }

    /// Share of snapshots in the last `hours` whose status counts as up.
    /// 100 when the window holds no snapshot.
    pub async fn uptime(&self, hours: u32, now: DateTime<Utc>) -> f64 {
        let cutoff = now - Duration::hours(hours as i64);
        let snapshots = self.snapshots.read().await;
        let (total, up) = snapshots
            .iter()
            .filter(|s| s.timestamp > cutoff)
            .fold((0usize, 0usize), |(total, up), s| {
                (total + 1, up + s.overall_status.is_up() as usize)
            });

        if total == 0 {
            return 100.0;
        }
        up as f64 / total as f64 * 100.0
    }

    pub async fn probe_stats(&self, probe: &str) -> Option<ProbeStats> {
        let snapshots = self.snapshots.read().await;
        let results: Vec<_> = snapshots
            .iter()
            .filter_map(|s| s.result(probe))
            .filter(|r| r.status != CheckStatus::Skipped)
            .collect();

        if results.is_empty() {
            return None;
        }

        let total = results.len();
        let count = |status: CheckStatus| results.iter().filter(|r| r.status == status).count();
        let healthy = count(CheckStatus::Healthy);

        let times: Vec<u64> = results.iter().map(|r| r.response_time_ms).collect();
        let avg = times.iter().sum::<u64>() / times.len() as u64;

        Some(ProbeStats {
            total_checks: total,
            healthy_count: healthy,
            degraded_count: count(CheckStatus::Degraded),
            down_count: count(CheckStatus::Down),
            uptime_percentage: healthy as f64 / total as f64 * 100.0,
            avg_response_time_ms: avg,
            min_response_time_ms: times.iter().min().copied(),
            max_response_time_ms: times.iter().max().copied(),
        })
    }

    pub async fn all_probe_stats(&self) -> BTreeMap<String, ProbeStats> {
        let names: Vec<String> = {
            let snapshots = self.snapshots.read().await;
            let mut names: Vec<String> = snapshots
                .iter()
                .flat_map(|s| s.results.iter().map(|r| r.name.clone()))
                .collect();
            names.sort();
            names.dedup();
            names
        };

        let mut all = BTreeMap::new();
        for name in names {
            if let Some(stats) = self.probe_stats(&name).await {
                all.insert(name, stats);
            }
        }
        all
    }
}
