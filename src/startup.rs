use crate::alerts::AlertDispatcher;
use crate::configuration::Settings;
use crate::errors::MonitorError;
use crate::health::{probes_from_settings, HealthCheckRunner};
use crate::metrics::{sources_from_settings, MetricsCollector};
use crate::routes;
use crate::store::PersistenceStore;
use actix_web::{dev::Server, error, http, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

/// The three monitoring components wired to one store.
#[derive(Clone)]
pub struct Services {
    pub health: Arc<HealthCheckRunner>,
    pub alerts: Arc<AlertDispatcher>,
    pub metrics: Arc<MetricsCollector>,
}

impl Services {
    pub fn build(settings: &Settings, store: Arc<dyn PersistenceStore>) -> Result<Self, MonitorError> {
        settings.validate()?;

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("watchtower/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| MonitorError::Internal(format!("http client: {}", err)))?;

        let alerts = Arc::new(AlertDispatcher::from_settings(
            settings.alerts.clone(),
            store.clone(),
            http_client.clone(),
        ));
        tracing::info!(channels = ?alerts.configured_channels(), "Alert channels configured");

        let health = Arc::new(
            HealthCheckRunner::new(
                settings.health.clone(),
                probes_from_settings(&settings.health, http_client.clone()),
                store.clone(),
            )
            .with_alerts(alerts.clone()),
        );

        let metrics = Arc::new(MetricsCollector::new(
            settings.metrics.clone(),
            sources_from_settings(&settings.metrics, http_client),
            store,
        ));

        Ok(Self {
            health,
            alerts,
            metrics,
        })
    }

    /// Reload in-memory history from the store. Failures are logged and
    /// leave history empty.
    pub async fn restore(&self) {
        match self.health.restore_history().await {
            Ok(count) => tracing::info!(count, "Health history restored"),
            Err(err) => tracing::warn!("Could not restore health history: {}", err),
        }
        match self.alerts.restore_history().await {
            Ok(count) => tracing::info!(count, "Alert history restored"),
            Err(err) => tracing::warn!("Could not restore alert history: {}", err),
        }
    }

    pub fn start(&self) -> Result<(), MonitorError> {
        self.health.start()?;
        self.metrics.start();
        Ok(())
    }

    pub async fn stop(&self) {
        self.health.stop().await;
        self.metrics.stop().await;
    }
}

pub async fn run(listener: TcpListener, services: Services) -> Result<Server, std::io::Error> {
    let health = web::Data::new(services.health);
    let alerts = web::Data::new(services.alerts);
    let metrics = web::Data::new(services.metrics);

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let msg: String = match err {
            error::JsonPayloadError::Deserialize(err) => format!(
                "{{\"kind\":\"deserialize\",\"line\":{}, \"column\":{}, \"msg\":\"{}\"}}",
                err.line(),
                err.column(),
                err
            ),
            _ => format!("{{\"kind\":\"other\",\"msg\":\"{}\"}}", err),
        };
        error::InternalError::new(msg, http::StatusCode::BAD_REQUEST).into()
    });

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(json_config.clone())
            .app_data(health.clone())
            .app_data(alerts.clone())
            .app_data(metrics.clone())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(
                web::scope("/api/health")
                    .service(routes::health::current_handler)
                    .service(routes::health::history_handler)
                    .service(routes::health::uptime_handler)
                    .service(routes::health::probes_handler),
            )
            .service(
                web::scope("/api/alerts")
                    .service(routes::alerts::list_handler)
                    .service(routes::alerts::priority_handler)
                    .service(routes::alerts::stats_handler)
                    .service(routes::alerts::add_handler),
            )
            .service(
                web::scope("/api/metrics")
                    .service(routes::metrics::current_handler)
                    .service(routes::metrics::range_handler)
                    .service(routes::metrics::summaries_handler)
                    .service(routes::metrics::export_handler),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
