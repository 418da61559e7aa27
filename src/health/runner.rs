use super::history::{HealthHistory, ProbeStats};
use super::models::{CheckResult, HealthSnapshot, OverallStatus};
use super::probes::Probe;
use super::scorer::HealthScorer;
use crate::alerts::{AlertDispatcher, AlertRequest, Priority};
use crate::configuration::HealthSettings;
use crate::errors::{MonitorError, ProbeError};
use crate::scheduler::{LifecycleState, Scheduler};
use crate::store::PersistenceStore;
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Runs every registered probe once per interval, scores the results and
/// raises alerts for critical or degraded snapshots.
pub struct HealthCheckRunner {
    settings: HealthSettings,
    probes: Vec<Arc<dyn Probe>>,
    scorer: HealthScorer,
    history: HealthHistory,
    store: Arc<dyn PersistenceStore>,
    alerts: Option<Arc<AlertDispatcher>>,
    cycle_guard: Mutex<()>,
    scheduler: Scheduler,
}

impl HealthCheckRunner {
    pub fn new(
        settings: HealthSettings,
        probes: Vec<Arc<dyn Probe>>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self {
            scorer: HealthScorer::new(settings.critical_score_floor),
            history: HealthHistory::new(settings.history_size),
            settings,
            probes,
            store,
            alerts: None,
            cycle_guard: Mutex::new(()),
            scheduler: Scheduler::new(),
        }
    }

    pub fn with_alerts(mut self, alerts: Arc<AlertDispatcher>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.scheduler.state()
    }

    pub async fn restore_history(&self) -> Result<usize, MonitorError> {
        let persisted = self.store.load_health_history().await?;
        self.history.restore(persisted).await;
        Ok(self.history.len().await)
    }

    /// One full cycle. Cycles never overlap: a call made while another cycle
    /// is running waits for it to finish.
    #[tracing::instrument(name = "Health check cycle", skip(self))]
    pub async fn run(&self) -> Result<HealthSnapshot, MonitorError> {
        if self.probes.is_empty() {
            return Err(MonitorError::Configuration(
                "no health probes registered".to_string(),
            ));
        }
        let _cycle = self.cycle_guard.lock().await;

        let results = self.check_all().await;
        let score = self.scorer.score(&results);
        let snapshot = HealthSnapshot {
            timestamp: Utc::now(),
            results,
            overall_score: score.score,
            overall_status: score.status,
            issues: score.issues,
        };

        tracing::info!(
            score = snapshot.overall_score,
            status = ?snapshot.overall_status,
            "Health check completed"
        );

        self.history.record(snapshot.clone()).await;
        if let Err(err) = self
            .store
            .append_health_snapshot(&snapshot, self.settings.persisted_history_size)
            .await
        {
            tracing::error!("Failed to persist health snapshot: {}", err);
        }

        if let (Some(alerts), Some(request)) = (&self.alerts, health_alert(&snapshot)) {
            alerts.send_alert(request).await;
        }

        Ok(snapshot)
    }

    async fn check_all(&self) -> Vec<CheckResult> {
        let probe_timeout = self.settings.probe_timeout();

        let checks = self.probes.iter().map(|probe| {
            let probe = Arc::clone(probe);
            async move {
                let start = Instant::now();
                let task = {
                    let probe = Arc::clone(&probe);
                    tokio::spawn(async move { probe.check().await })
                };

                // on timeout the JoinHandle is dropped and the task keeps
                // running detached
                let outcome = match timeout(probe_timeout, task).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_err)) => Err(ProbeError::Task(join_err.to_string())),
                    Err(_) => Err(ProbeError::Timeout(probe_timeout.as_millis() as u64)),
                };

                match outcome {
                    Ok(result) => result.with_critical(probe.critical()),
                    Err(err) => {
                        tracing::warn!(probe = probe.name(), "Probe failed: {}", err);
                        CheckResult::down(
                            probe.name(),
                            err.to_string(),
                            start.elapsed().as_millis() as u64,
                        )
                        .with_critical(probe.critical())
                    }
                }
            }
        });

        join_all(checks).await
    }

    /// Immediate cycle, then one per interval until [`Self::stop`].
    pub fn start(self: &Arc<Self>) -> Result<(), MonitorError> {
        if self.probes.is_empty() {
            return Err(MonitorError::Configuration(
                "no health probes registered".to_string(),
            ));
        }
        if !self.scheduler.begin() {
            tracing::warn!("Health runner already {:?}, start ignored", self.state());
            return Ok(());
        }

        let runner = Arc::clone(self);
        self.scheduler
            .spawn_every("health-check", self.settings.interval(), true, move || {
                let runner = Arc::clone(&runner);
                async move {
                    if let Err(err) = runner.run().await {
                        tracing::error!("Health check cycle failed: {}", err);
                    }
                }
            });
        tracing::info!(
            probes = self.probes.len(),
            interval_secs = self.settings.interval_secs,
            "Health monitoring started"
        );
        Ok(())
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
        tracing::info!("Health monitoring stopped");
    }

    pub async fn get_current_health(&self) -> Option<HealthSnapshot> {
        self.history.latest().await
    }

    pub async fn get_health_history(&self, limit: usize) -> Vec<HealthSnapshot> {
        self.history.recent(limit).await
    }

    pub async fn get_uptime(&self, hours: u32) -> f64 {
        self.history.uptime(hours, Utc::now()).await
    }

    pub async fn get_probe_stats(&self) -> BTreeMap<String, ProbeStats> {
        self.history.all_probe_stats().await
    }
}

/// Alert raised for a snapshot, if any.
pub fn health_alert(snapshot: &HealthSnapshot) -> Option<AlertRequest> {
    let (priority, title) = match snapshot.overall_status {
        OverallStatus::Critical => (Priority::P0, "CRITICAL: System Health Alert"),
        OverallStatus::Degraded => (Priority::P2, "WARNING: System Degraded"),
        OverallStatus::Healthy | OverallStatus::Warning => return None,
    };
    let message = format!(
        "Overall health score: {}/100\nIssues: {}",
        snapshot.overall_score,
        snapshot.issues.join(", ")
    );
    let data = serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null);

    Some(
        AlertRequest::new(priority, title, message)
            .with_data(data)
            .with_tags(vec!["health".to_string()]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::AlertSettings;
    use crate::health::models::CheckStatus;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Mode {
        Healthy,
        Fail,
        Panic,
        Hang,
        Down,
    }

    struct StubProbe {
        name: String,
        critical: bool,
        mode: Mode,
        in_flight: Arc<AtomicUsize>,
        max_seen: Arc<AtomicUsize>,
    }

    impl StubProbe {
        fn new(name: &str, critical: bool, mode: Mode) -> Self {
            Self {
                name: name.to_string(),
                critical,
                mode,
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_seen: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl Probe for StubProbe {
        fn name(&self) -> &str {
            &self.name
        }

        fn critical(&self) -> bool {
            self.critical
        }

        async fn check(&self) -> Result<CheckResult, ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.mode {
                Mode::Healthy => Ok(CheckResult::healthy(&self.name, 20)),
                Mode::Down => Ok(CheckResult::down(&self.name, "refused".into(), 20)),
                Mode::Fail => Err(ProbeError::Connection("refused".into())),
                Mode::Panic => panic!("probe exploded"),
                Mode::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(CheckResult::healthy(&self.name, 0))
                }
            }
        }
    }

    fn settings() -> HealthSettings {
        HealthSettings {
            probe_timeout_secs: 1,
            ..Default::default()
        }
    }

    fn runner(probes: Vec<Arc<dyn Probe>>) -> HealthCheckRunner {
        HealthCheckRunner::new(settings(), probes, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn run_without_probes_is_a_configuration_error() {
        let err = runner(vec![]).run().await.unwrap_err();
        assert!(matches!(err, MonitorError::Configuration(_)));
    }

    #[tokio::test]
    async fn failing_probes_become_down_results() {
        let runner = runner(vec![
            Arc::new(StubProbe::new("ok", false, Mode::Healthy)),
            Arc::new(StubProbe::new("err", false, Mode::Fail)),
            Arc::new(StubProbe::new("panic", false, Mode::Panic)),
            Arc::new(StubProbe::new("hang", false, Mode::Hang)),
        ]);

        let snapshot = runner.run().await.unwrap();
        let status: Vec<CheckStatus> = snapshot.results.iter().map(|r| r.status).collect();
        assert_eq!(
            status,
            vec![CheckStatus::Healthy, CheckStatus::Down, CheckStatus::Down, CheckStatus::Down]
        );
        assert!(snapshot.result("hang").unwrap().error.as_ref().unwrap().contains("timeout"));
        assert_eq!(snapshot.overall_score, 70);
        assert_eq!(snapshot.overall_status, OverallStatus::Degraded);
    }

    #[tokio::test]
    async fn critical_snapshot_raises_p0_alert() {
        let store = Arc::new(MemoryStore::new());
        let alerts = Arc::new(AlertDispatcher::new(AlertSettings::default(), store.clone()));
        let runner = HealthCheckRunner::new(
            settings(),
            vec![
                Arc::new(StubProbe::new("api", true, Mode::Down)),
                Arc::new(StubProbe::new("site", false, Mode::Healthy)),
            ],
            store.clone(),
        )
        .with_alerts(alerts.clone());

        let snapshot = runner.run().await.unwrap();
        assert_eq!(snapshot.overall_status, OverallStatus::Critical);
        assert!(snapshot.results[0].critical);

        let sent = alerts.get_alert_history(10).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].priority, Priority::P0);
        assert!(sent[0].message.contains("70/100"));
        assert_eq!(store.load_health_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_runs_are_serialized() {
        let probe = Arc::new(StubProbe::new("ok", false, Mode::Healthy));
        let max_seen = probe.max_seen.clone();
        let runner = Arc::new(runner(vec![probe]));

        let (a, b) = tokio::join!(runner.run(), runner.run());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(runner.get_health_history(10).await.len(), 2);
    }

    #[tokio::test]
    async fn start_runs_immediately_and_stop_is_final() {
        let runner = Arc::new(runner(vec![Arc::new(StubProbe::new("ok", false, Mode::Healthy))]));
        runner.start().unwrap();
        assert_eq!(runner.state(), LifecycleState::Running);

        tokio::time::sleep(Duration::from_millis(200)).await;
        runner.stop().await;
        assert_eq!(runner.state(), LifecycleState::Stopped);
        assert!(runner.get_current_health().await.is_some());
        assert_eq!(runner.get_uptime(24).await, 100.0);

        runner.start().unwrap();
        assert_eq!(runner.state(), LifecycleState::Stopped);
    }

    #[test]
    fn healthy_and_warning_snapshots_raise_nothing() {
        let snapshot = HealthSnapshot {
            timestamp: Utc::now(),
            results: vec![],
            overall_score: 90,
            overall_status: OverallStatus::Warning,
            issues: vec![],
        };
        assert!(health_alert(&snapshot).is_none());

        let degraded = HealthSnapshot {
            overall_status: OverallStatus::Degraded,
            ..snapshot
        };
        let request = health_alert(&degraded).unwrap();
        assert_eq!(request.priority.as_deref(), Some("P2"));
        assert_eq!(request.title.as_deref(), Some("WARNING: System Degraded"));
    }
}
