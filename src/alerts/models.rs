use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
    P4,
}

impl Priority {
    pub const ALL: [Priority; 5] = [Self::P0, Self::P1, Self::P2, Self::P3, Self::P4];

    /// Lenient parse used at the system boundary. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "P0" => Some(Self::P0),
            "P1" => Some(Self::P1),
            "P2" => Some(Self::P2),
            "P3" => Some(Self::P3),
            "P4" => Some(Self::P4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }

    /// Urgent alerts page the on-call responder.
    pub fn pages_on_call(&self) -> bool {
        matches!(self, Self::P0 | Self::P1)
    }

    pub fn channels(&self) -> &'static [ChannelKind] {
        match self {
            Self::P0 | Self::P1 => &[ChannelKind::Chat, ChannelKind::Email, ChannelKind::Sms],
            Self::P2 => &[ChannelKind::Chat],
            Self::P3 | Self::P4 => &[],
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::P0 => "#dc3545",
            Self::P1 => "#fd7e14",
            Self::P2 => "#ffc107",
            Self::P3 => "#17a2b8",
            Self::P4 => "#6c757d",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::P0 => "🚨",
            Self::P1 => "⚠️",
            Self::P2 => "⚡",
            Self::P3 => "ℹ️",
            Self::P4 => "📝",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Chat,
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

/// Loosely typed trigger as it arrives from callers. Normalized into an
/// [`Alert`] by the dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AlertRequest {
    pub priority: Option<String>,
    #[validate(min_length = 1)]
    #[validate(max_length = 200)]
    pub title: Option<String>,
    #[validate(max_length = 5000)]
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    #[validate(max_items = 20)]
    pub tags: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl AlertRequest {
    pub fn new(priority: Priority, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            priority: Some(priority.as_str().to_string()),
            title: Some(title.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Recipients {
    pub email: Vec<String>,
    pub phone: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Skipped,
}

/// Result of one channel for one alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelResult {
    pub channel: ChannelKind,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

impl ChannelResult {
    pub fn delivered(channel: ChannelKind, recipients: Vec<String>) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Delivered,
            detail: None,
            recipients,
        }
    }

    pub fn failed(channel: ChannelKind, error: String) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Failed,
            detail: Some(error),
            recipients: Vec::new(),
        }
    }

    pub fn skipped(channel: ChannelKind, reason: String) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Skipped,
            detail: Some(reason),
            recipients: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertOutcome {
    /// Every attempted channel delivered or was skipped
    Delivered,
    /// At least one channel failed
    PartialFailure,
    Duplicate,
    RateLimited,
}

impl AlertOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered | Self::PartialFailure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::PartialFailure => "partial_failure",
            Self::Duplicate => "duplicate",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// One dispatch attempt as kept in alert history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub recipients: Recipients,
    pub outcome: AlertOutcome,
    #[serde(alias = "delivery_results")]
    pub delivery_results: Vec<ChannelResult>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    Duplicate,
    RateLimited,
}

/// Answer of `send_alert`. Serializes as `{success, reason?, alertId, results}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SuppressionReason>,
    pub alert_id: String,
    pub results: Vec<ChannelResult>,
}

impl DispatchResult {
    pub fn from_alert(alert: &Alert) -> Self {
        let reason = match alert.outcome {
            AlertOutcome::Duplicate => Some(SuppressionReason::Duplicate),
            AlertOutcome::RateLimited => Some(SuppressionReason::RateLimited),
            _ => None,
        };
        Self {
            success: alert.outcome.is_success(),
            reason,
            alert_id: alert.id.clone(),
            results: alert.delivery_results.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatistics {
    pub total: usize,
    pub by_priority: HashMap<Priority, usize>,
    pub by_outcome: HashMap<AlertOutcome, usize>,
    /// Successful deliveries per channel
    pub by_channel: HashMap<ChannelKind, usize>,
    pub avg_per_hour: f64,
}
