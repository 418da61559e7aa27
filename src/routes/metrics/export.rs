use super::RangeQuery;
use crate::helpers::JsonResponse;
use crate::metrics::{MetricsCollector, MetricsExport};
use actix_web::http::header;
use actix_web::{get, web, Responder, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Metrics, health history and alerts in `[start, end]` as one JSON file.
/// Defaults to the last 24 hours.
#[tracing::instrument(name = "Export metrics.", skip(collector))]
#[get("/export")]
pub async fn export_handler(
    query: web::Query<RangeQuery>,
    collector: web::Data<Arc<MetricsCollector>>,
) -> Result<impl Responder> {
    let end = query.end.unwrap_or_else(Utc::now);
    let start = query.start.unwrap_or(end - Duration::hours(24));
    if start > end {
        return Err(JsonResponse::<MetricsExport>::build().bad_request("start must not be after end"));
    }

    let export = collector.export(start, end).await.map_err(|err| {
        tracing::error!("Failed to export metrics: {}", err);
        JsonResponse::<MetricsExport>::build().internal_server_error("")
    })?;

    let disposition = format!(
        "attachment; filename=\"watchtower-metrics-{}.json\"",
        export.timestamp.timestamp_millis()
    );
    Ok(JsonResponse::build()
        .set_item(export)
        .ok("OK")
        .customize()
        .insert_header((header::CONTENT_DISPOSITION, disposition)))
}
