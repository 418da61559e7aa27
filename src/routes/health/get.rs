use crate::health::{HealthCheckRunner, HealthSnapshot, ProbeStats};
use crate::helpers::JsonResponse;
use actix_web::{get, web, Responder, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UptimeQuery {
    pub hours: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Uptime {
    pub hours: u32,
    pub percentage: f64,
}

#[tracing::instrument(name = "Get current health.", skip(runner))]
#[get("")]
pub async fn current_handler(runner: web::Data<Arc<HealthCheckRunner>>) -> Result<impl Responder> {
    runner
        .get_current_health()
        .await
        .map(|snapshot| JsonResponse::build().set_item(snapshot).ok("OK"))
        .ok_or_else(|| {
            JsonResponse::<HealthSnapshot>::build().not_found("No health check has completed yet")
        })
}

#[tracing::instrument(name = "Get health history.", skip(runner))]
#[get("/history")]
pub async fn history_handler(
    query: web::Query<HistoryQuery>,
    runner: web::Data<Arc<HealthCheckRunner>>,
) -> Result<impl Responder> {
    let history = runner.get_health_history(query.limit.unwrap_or(100)).await;
    Ok(JsonResponse::build().set_list(history).ok("OK"))
}

#[tracing::instrument(name = "Get uptime.", skip(runner))]
#[get("/uptime")]
pub async fn uptime_handler(
    query: web::Query<UptimeQuery>,
    runner: web::Data<Arc<HealthCheckRunner>>,
) -> Result<impl Responder> {
    let hours = query.hours.unwrap_or(24);
    let percentage = runner.get_uptime(hours).await;
    Ok(JsonResponse::build()
        .set_item(Uptime { hours, percentage })
        .ok("OK"))
}

#[tracing::instrument(name = "Get probe statistics.", skip(runner))]
#[get("/probes")]
pub async fn probes_handler(runner: web::Data<Arc<HealthCheckRunner>>) -> Result<impl Responder> {
    let stats: BTreeMap<String, ProbeStats> = runner.get_probe_stats().await;
    Ok(JsonResponse::build().set_item(stats).ok("OK"))
}
