mod collector;
mod models;
pub mod rollup;
pub mod sources;

pub use collector::MetricsCollector;
pub use models::{
    Aggregates, FieldStats, MetricRecord, MetricSample, MetricValue, MetricsExport, Period, Summary,
};
pub use sources::{sources_from_settings, MetricSource};
