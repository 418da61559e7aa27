use actix_web::{get, HttpResponse};

/// Liveness of the monitor process itself.
#[get("")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
