use crate::alerts::{Alert, AlertDispatcher, Priority};
use crate::helpers::JsonResponse;
use actix_web::{get, web, Responder, Result};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub hours: Option<u32>,
}

#[tracing::instrument(name = "List alerts.", skip(dispatcher))]
#[get("")]
pub async fn list_handler(
    query: web::Query<LimitQuery>,
    dispatcher: web::Data<Arc<AlertDispatcher>>,
) -> Result<impl Responder> {
    let alerts = dispatcher
        .get_alert_history(query.limit.unwrap_or(50))
        .await;
    Ok(JsonResponse::build().set_list(alerts).ok("OK"))
}

#[tracing::instrument(name = "List alerts by priority.", skip(dispatcher))]
#[get("/priority/{priority}")]
pub async fn priority_handler(
    path: web::Path<(String,)>,
    query: web::Query<LimitQuery>,
    dispatcher: web::Data<Arc<AlertDispatcher>>,
) -> Result<impl Responder> {
    let raw = &path.0;
    let priority = Priority::parse(raw).ok_or_else(|| {
        JsonResponse::<Alert>::build().bad_request(&format!("Unknown priority {}", raw))
    })?;
    let alerts = dispatcher
        .get_alerts_by_priority(priority, query.limit.unwrap_or(50))
        .await;
    Ok(JsonResponse::build().set_list(alerts).ok("OK"))
}

#[tracing::instrument(name = "Alert statistics.", skip(dispatcher))]
#[get("/stats")]
pub async fn stats_handler(
    query: web::Query<StatsQuery>,
    dispatcher: web::Data<Arc<AlertDispatcher>>,
) -> Result<impl Responder> {
    let stats = dispatcher.get_statistics(query.hours.unwrap_or(24)).await;
    Ok(JsonResponse::build().set_item(stats).ok("OK"))
}
