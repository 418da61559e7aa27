use std::net::TcpListener;
use std::sync::Arc;
use watchtower::configuration::get_configuration;
use watchtower::startup::{run, Services};
use watchtower::store::JsonFileStore;
use watchtower::telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("watchtower".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let settings = get_configuration()?;
    tracing::info!(data_dir = %settings.data_dir.display(), "Using JSON file store");
    let store = Arc::new(JsonFileStore::new(settings.data_dir.clone()));

    let services = Services::build(&settings, store)?;
    services.restore().await;
    services.start()?;

    let address = format!("{}:{}", settings.app_host, settings.app_port);
    tracing::info!("Start server at {:?}", &address);
    let listener = TcpListener::bind(&address)?;

    run(listener, services.clone()).await?.await?;

    tracing::info!("Server stopped, shutting down monitors");
    services.stop().await;
    Ok(())
}
