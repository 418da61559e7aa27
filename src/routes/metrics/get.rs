use crate::helpers::JsonResponse;
use crate::metrics::{MetricSample, MetricsCollector, Period, Summary};
use actix_web::{get, web, Responder, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[tracing::instrument(name = "Get current metrics.", skip(collector))]
#[get("")]
pub async fn current_handler(collector: web::Data<Arc<MetricsCollector>>) -> Result<impl Responder> {
    collector
        .get_current_metrics()
        .await
        .map(|sample| JsonResponse::build().set_item(sample).ok("OK"))
        .ok_or_else(|| {
            JsonResponse::<MetricSample>::build().not_found("No metrics collected yet")
        })
}

/// Raw samples in `[start, end]`. Defaults to the last hour.
#[tracing::instrument(name = "Get metrics range.", skip(collector))]
#[get("/range")]
pub async fn range_handler(
    query: web::Query<RangeQuery>,
    collector: web::Data<Arc<MetricsCollector>>,
) -> Result<impl Responder> {
    let end = query.end.unwrap_or_else(Utc::now);
    let start = query.start.unwrap_or(end - Duration::hours(1));
    if start > end {
        return Err(JsonResponse::<MetricSample>::build().bad_request("start must not be after end"));
    }

    collector
        .get_metrics_for_range(start, end)
        .await
        .map(|samples| JsonResponse::build().set_list(samples).ok("OK"))
        .map_err(|err| {
            tracing::error!("Failed to load metrics range: {}", err);
            JsonResponse::<MetricSample>::build().internal_server_error("")
        })
}

#[tracing::instrument(name = "Get metric summaries.", skip(collector))]
#[get("/summaries/{period}/{day}")]
pub async fn summaries_handler(
    path: web::Path<(String, NaiveDate)>,
    collector: web::Data<Arc<MetricsCollector>>,
) -> Result<impl Responder> {
    let (period, day) = path.into_inner();
    let period = match period.as_str() {
        "hourly" | "hour" => Period::Hour,
        "daily" | "day" => Period::Day,
        other => {
            return Err(JsonResponse::<Summary>::build()
                .bad_request(&format!("Unknown period {}, use hourly or daily", other)))
        }
    };

    collector
        .get_summaries(period, day)
        .await
        .map(|summaries| JsonResponse::build().set_list(summaries).ok("OK"))
        .map_err(|err| {
            tracing::error!("Failed to load summaries: {}", err);
            JsonResponse::<Summary>::build().internal_server_error("")
        })
}
