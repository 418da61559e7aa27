use super::channels::{self, AlertChannel};
use super::limiter::{Admission, Rejection};
use super::models::{
    Alert, AlertOutcome, AlertRequest, AlertStatistics, ChannelKind, ChannelResult, DeliveryStatus,
    DispatchResult, Priority, Recipients,
};
use super::recipients;
use crate::configuration::AlertSettings;
use crate::errors::MonitorError;
use crate::store::PersistenceStore;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

const UNTITLED: &str = "Untitled Alert";

/// Routes alerts to notification channels by priority.
///
/// Duplicate and rate-limited alerts are recorded in history but never reach
/// a channel. Channel failures end up in the per-channel results; `send_alert`
/// itself does not fail.
pub struct AlertDispatcher {
    settings: AlertSettings,
    channels: HashMap<ChannelKind, Arc<dyn AlertChannel>>,
    admission: Mutex<Admission>,
    history: RwLock<VecDeque<Alert>>,
    store: Arc<dyn PersistenceStore>,
}

impl AlertDispatcher {
    /// Dispatcher without channels. Register them with [`Self::with_channel`].
    pub fn new(settings: AlertSettings, store: Arc<dyn PersistenceStore>) -> Self {
        let admission = Admission::new(
            settings.max_alerts_per_hour,
            settings.dedup_window(),
            Utc::now(),
        );
        Self {
            settings,
            channels: HashMap::new(),
            admission: Mutex::new(admission),
            history: RwLock::new(VecDeque::new()),
            store,
        }
    }

    /// Dispatcher with every channel that has credentials configured.
    pub fn from_settings(
        settings: AlertSettings,
        store: Arc<dyn PersistenceStore>,
        client: reqwest::Client,
    ) -> Self {
        let configured = channels::from_settings(&settings, client);
        configured
            .into_iter()
            .fold(Self::new(settings, store), |dispatcher, channel| {
                dispatcher.with_channel(channel)
            })
    }

    pub fn with_channel(mut self, channel: Arc<dyn AlertChannel>) -> Self {
        self.channels.insert(channel.kind(), channel);
        self
    }

    pub fn configured_channels(&self) -> Vec<ChannelKind> {
        let mut kinds: Vec<ChannelKind> = self.channels.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Warm the in-memory ring from the persisted history.
    pub async fn restore_history(&self) -> Result<usize, MonitorError> {
        let persisted = self.store.load_alert_history().await?;
        let mut history = self.history.write().await;
        history.clear();
        let skip = persisted.len().saturating_sub(self.settings.history_size);
        history.extend(persisted.into_iter().skip(skip));
        Ok(history.len())
    }

    pub async fn send_alert(&self, request: AlertRequest) -> DispatchResult {
        self.send_alert_at(request, Utc::now()).await
    }

    /// Same as [`Self::send_alert`] with an explicit clock for admission.
    #[tracing::instrument(name = "Dispatch alert", skip_all, fields(alert_id = tracing::field::Empty))]
    pub async fn send_alert_at(&self, request: AlertRequest, now: DateTime<Utc>) -> DispatchResult {
        let mut alert = normalize(request, now);
        tracing::Span::current().record("alert_id", alert.id.as_str());

        let admitted = self
            .admission
            .lock()
            .await
            .admit((alert.priority, alert.title.clone()), now);

        match admitted {
            Err(Rejection::Duplicate) => {
                tracing::info!(
                    "Duplicate alert suppressed: [{}] {}",
                    alert.priority,
                    alert.title
                );
                alert.outcome = AlertOutcome::Duplicate;
            }
            Err(Rejection::RateLimited) => {
                tracing::warn!(
                    "Alert rate limit reached ({} per hour), dropping [{}] {}",
                    self.settings.max_alerts_per_hour,
                    alert.priority,
                    alert.title
                );
                alert.outcome = AlertOutcome::RateLimited;
            }
            Ok(()) => {
                alert.recipients = recipients::resolve(
                    alert.priority,
                    &self.settings.recipients,
                    &self.settings.on_call_rotation,
                    now,
                );
                alert.delivery_results = self.fan_out(&alert).await;
                alert.outcome = if alert
                    .delivery_results
                    .iter()
                    .any(|r| r.status == DeliveryStatus::Failed)
                {
                    AlertOutcome::PartialFailure
                } else {
                    AlertOutcome::Delivered
                };
                tracing::info!(
                    "Alert [{}] {} dispatched: {}",
                    alert.priority,
                    alert.title,
                    alert.outcome.as_str()
                );
            }
        }

        self.record(&alert).await;
        DispatchResult::from_alert(&alert)
    }

    async fn fan_out(&self, alert: &Alert) -> Vec<ChannelResult> {
        let timeout = self.settings.channel_timeout();
        let deliveries = alert.priority.channels().iter().map(|kind| {
            let channel = self.channels.get(kind).cloned();
            let recipients = &alert.recipients;
            async move {
                let channel = match channel {
                    Some(channel) => channel,
                    None => return ChannelResult::skipped(*kind, "channel not configured".into()),
                };
                match tokio::time::timeout(timeout, channel.send(alert, recipients)).await {
                    Ok(Ok(reached)) => ChannelResult::delivered(*kind, reached),
                    Ok(Err(err)) => {
                        tracing::error!("{} delivery failed for alert {}: {}", kind.as_str(), alert.id, err);
                        ChannelResult::failed(*kind, err.to_string())
                    }
                    Err(_) => {
                        tracing::error!("{} delivery timed out for alert {}", kind.as_str(), alert.id);
                        ChannelResult::failed(
                            *kind,
                            format!("timeout after {} ms", timeout.as_millis()),
                        )
                    }
                }
            }
        });
        join_all(deliveries).await
    }

    async fn record(&self, alert: &Alert) {
        {
            let mut history = self.history.write().await;
            history.push_back(alert.clone());
            while history.len() > self.settings.history_size {
                history.pop_front();
            }
        }
        if let Err(err) = self
            .store
            .append_alert(alert, self.settings.persisted_history_size)
            .await
        {
            tracing::error!("Failed to persist alert {}: {}", alert.id, err);
        }
    }

    /// Most recent alerts first.
    pub async fn get_alert_history(&self, limit: usize) -> Vec<Alert> {
        self.history
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_alerts_by_priority(&self, priority: Priority, limit: usize) -> Vec<Alert> {
        self.history
            .read()
            .await
            .iter()
            .rev()
            .filter(|alert| alert.priority == priority)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_statistics(&self, hours: u32) -> AlertStatistics {
        self.statistics_at(hours, Utc::now()).await
    }

    pub async fn statistics_at(&self, hours: u32, now: DateTime<Utc>) -> AlertStatistics {
        let cutoff = now - Duration::hours(hours as i64);
        let history = self.history.read().await;

        let mut stats = AlertStatistics {
            total: 0,
            by_priority: Priority::ALL.iter().map(|p| (*p, 0)).collect(),
            by_outcome: HashMap::new(),
            by_channel: HashMap::new(),
            avg_per_hour: 0.0,
        };

        for alert in history.iter().filter(|a| a.timestamp > cutoff) {
            stats.total += 1;
            *stats.by_priority.entry(alert.priority).or_insert(0) += 1;
            *stats.by_outcome.entry(alert.outcome).or_insert(0) += 1;
            for result in &alert.delivery_results {
                if result.status == DeliveryStatus::Delivered {
                    *stats.by_channel.entry(result.channel).or_insert(0) += 1;
                }
            }
        }
        if hours > 0 {
            stats.avg_per_hour = stats.total as f64 / hours as f64;
        }
        stats
    }
}

/// Fill defaults for a loosely typed request.
pub fn normalize(request: AlertRequest, now: DateTime<Utc>) -> Alert {
    let priority = match request.priority.as_deref() {
        Some(raw) => Priority::parse(raw).unwrap_or_else(|| {
            tracing::debug!("Unknown alert priority {:?}, using P3", raw);
            Priority::P3
        }),
        None => Priority::P3,
    };
    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    Alert {
        id: uuid::Uuid::new_v4().to_string(),
        priority,
        title,
        message: request.message.unwrap_or_default(),
        data: request.data.unwrap_or(serde_json::Value::Null),
        tags: request.tags,
        timestamp: request.timestamp.unwrap_or(now),
        recipients: Recipients::default(),
        outcome: AlertOutcome::Delivered,
        delivery_results: Vec::new(),
    }
}
