use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CheckStatus {
    Healthy,
    Degraded,
    Down,
    Warning,
    RateLimited,
    Skipped,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
            Self::Warning => "warning",
            Self::RateLimited => "rate-limited",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Degraded,
    Critical,
}

impl OverallStatus {
    /// Statuses that count as "up" for uptime reporting.
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Healthy | Self::Warning)
    }
}

/// Outcome of one probe in one cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub critical: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CheckResult {
    fn with_status(name: &str, status: CheckStatus, response_time_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            status,
            critical: false,
            response_time_ms,
            error: None,
            data: None,
        }
    }

    pub fn healthy(name: &str, response_time_ms: u64) -> Self {
        Self::with_status(name, CheckStatus::Healthy, response_time_ms)
    }

    pub fn degraded(name: &str, message: String, response_time_ms: u64) -> Self {
        Self::with_status(name, CheckStatus::Degraded, response_time_ms).with_error(message)
    }

    pub fn down(name: &str, error: String, response_time_ms: u64) -> Self {
        Self::with_status(name, CheckStatus::Down, response_time_ms).with_error(error)
    }

    pub fn warning(name: &str, message: String, response_time_ms: u64) -> Self {
        Self::with_status(name, CheckStatus::Warning, response_time_ms).with_error(message)
    }

    pub fn rate_limited(name: &str, response_time_ms: u64) -> Self {
        Self::with_status(name, CheckStatus::RateLimited, response_time_ms)
            .with_error("Rate limit exceeded".to_string())
    }

    pub fn skipped(name: &str, reason: String) -> Self {
        Self::with_status(name, CheckStatus::Skipped, 0).with_error(reason)
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Scored result of one health cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub results: Vec<CheckResult>,
    pub overall_score: u8,
    pub overall_status: OverallStatus,
    pub issues: Vec<String>,
}

impl HealthSnapshot {
    pub fn result(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }
}
