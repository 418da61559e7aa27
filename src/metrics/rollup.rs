//! Summary computation for the hourly and daily rollups.
//!
//! Both functions are deterministic and independent of input order: values
//! are sorted before they are summed so float rounding cannot depend on the
//! order samples were collected in.

use super::models::{Aggregates, FieldStats, MetricSample, MetricValue, Summary};
use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use std::collections::BTreeMap;

fn stats_from_values(mut values: Vec<f64>) -> Option<FieldStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let count = values.len() as u64;
    let sum: f64 = values.iter().sum();
    Some(FieldStats {
        count,
        sum,
        mean: sum / count as f64,
        min: values[0],
        max: values[values.len() - 1],
    })
}

/// Aggregate raw samples into one set of statistics.
pub fn summarize_samples(samples: &[MetricSample]) -> Aggregates {
    let mut numbers: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut text: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for sample in samples {
        for (field, value) in sample.fields() {
            match value {
                MetricValue::Number(n) if n.is_finite() => {
                    numbers.entry(field).or_default().push(*n);
                }
                MetricValue::Number(_) => {}
                MetricValue::Text(t) => {
                    *text.entry(field).or_default().entry(t.clone()).or_default() += 1;
                }
            }
        }
    }

    Aggregates {
        count: samples.len() as u64,
        numeric: numbers
            .into_iter()
            .filter_map(|(field, values)| stats_from_values(values).map(|s| (field, s)))
            .collect(),
        text,
    }
}

/// Merge finer summaries (hourly) into a coarser one (daily). Means are
/// weighted by the number of values behind each input.
pub fn merge_summaries(summaries: &[Summary]) -> Aggregates {
    let mut parts: BTreeMap<&str, Vec<&FieldStats>> = BTreeMap::new();
    let mut text: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    let mut count = 0;

    for summary in summaries {
        count += summary.aggregates.count;
        for (field, stats) in &summary.aggregates.numeric {
            parts.entry(field.as_str()).or_default().push(stats);
        }
        for (field, values) in &summary.aggregates.text {
            let merged = text.entry(field.clone()).or_default();
            for (value, occurrences) in values {
                *merged.entry(value.clone()).or_default() += occurrences;
            }
        }
    }

    let numeric = parts
        .into_iter()
        .filter_map(|(field, mut stats)| {
            stats.sort_by(|a, b| {
                a.sum
                    .total_cmp(&b.sum)
                    .then(a.count.cmp(&b.count))
                    .then(a.min.total_cmp(&b.min))
                    .then(a.max.total_cmp(&b.max))
            });
            let count: u64 = stats.iter().map(|s| s.count).sum();
            if count == 0 {
                return None;
            }
            let sum: f64 = stats.iter().map(|s| s.sum).sum();
            let min = stats.iter().map(|s| s.min).fold(f64::INFINITY, f64::min);
            let max = stats.iter().map(|s| s.max).fold(f64::NEG_INFINITY, f64::max);
            Some((
                field.to_string(),
                FieldStats {
                    count,
                    sum,
                    mean: sum / count as f64,
                    min,
                    max,
                },
            ))
        })
        .collect();

    Aggregates {
        count,
        numeric,
        text,
    }
}

/// Start of the hour containing `at`.
pub fn hour_start(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::hours(1)).unwrap_or(at)
}

/// Start of the last full hour before `now`.
pub fn previous_hour_start(now: DateTime<Utc>) -> DateTime<Utc> {
    hour_start(now) - Duration::hours(1)
}

/// The calendar day (UTC) before `now`.
pub fn previous_day(now: DateTime<Utc>) -> NaiveDate {
    (now - Duration::days(1)).date_naive()
}

pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC)
}
