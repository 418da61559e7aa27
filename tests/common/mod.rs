#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use watchtower::configuration::{NamedEndpoint, Settings};
use watchtower::startup::{run, Services};
use watchtower::store::MemoryStore;

pub struct TestApp {
    pub address: String,
    pub services: Services,
    pub store: Arc<MemoryStore>,
}

/// Settings with no outbound endpoints besides the given services.
pub fn test_settings(services: Vec<NamedEndpoint>) -> Settings {
    let mut settings = Settings::default();
    settings.health.services = services;
    settings.health.external_apis = Vec::new();
    settings.health.probe_timeout_secs = 2;
    settings.metrics.social = Vec::new();
    settings.metrics.bots = Vec::new();
    settings.metrics.website = None;
    settings.metrics.apis = Vec::new();
    settings.alerts.chat = None;
    settings.alerts.email = None;
    settings.alerts.sms = None;
    settings
}

// Schedulers are not started: tests drive cycles explicitly.
pub async fn spawn_app_with_configuration(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(MemoryStore::new());
    let services = Services::build(&settings, store.clone()).expect("Failed to build services");

    let server = run(listener, services.clone())
        .await
        .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        services,
        store,
    }
}

pub async fn spawn_app(services: Vec<NamedEndpoint>) -> TestApp {
    spawn_app_with_configuration(test_settings(services)).await
}
