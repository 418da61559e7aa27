use crate::alerts::Alert;
use crate::health::HealthSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field of a metric record. Numbers are aggregated, text is counted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Fields reported by one source, e.g. `{"price": 10.5, "volume24h": 1e6}`.
pub type MetricRecord = BTreeMap<String, MetricValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    /// category name (`token`, `social`, `bots`, ...) -> fields
    pub categories: BTreeMap<String, MetricRecord>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            categories: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: &str, record: MetricRecord) -> Self {
        self.categories.insert(category.to_string(), record);
        self
    }

    /// Day key of the raw collection this sample belongs to.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn number(&self, category: &str, field: &str) -> Option<f64> {
        match self.categories.get(category)?.get(field)? {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }

    /// `(category.field, value)` pairs across all categories.
    pub fn fields(&self) -> impl Iterator<Item = (String, &MetricValue)> {
        self.categories.iter().flat_map(|(category, record)| {
            record
                .iter()
                .map(move |(field, value)| (format!("{}.{}", category, field), value))
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Hour,
    Day,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hourly",
            Self::Day => "daily",
        }
    }

    pub fn length(&self) -> chrono::Duration {
        match self {
            Self::Hour => chrono::Duration::hours(1),
            Self::Day => chrono::Duration::days(1),
        }
    }
}

/// count/mean/min/max/sum over one numeric field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldStats {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Aggregates {
    /// Number of raw samples behind this summary
    pub count: u64,
    pub numeric: BTreeMap<String, FieldStats>,
    /// field -> value -> occurrences
    pub text: BTreeMap<String, BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub period: Period,
    pub start_time: DateTime<Utc>,
    pub aggregates: Aggregates,
}

impl Summary {
    pub fn day(&self) -> NaiveDate {
        self.start_time.date_naive()
    }
}

/// Everything recorded in one time window, served as a downloadable file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsExport {
    /// When the export was produced
    pub timestamp: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub current: Option<MetricSample>,
    pub metrics: Vec<MetricSample>,
    pub health: Vec<HealthSnapshot>,
    pub alerts: Vec<Alert>,
}
