//! One-shot operations against the same store the server uses.
//!
//! ```text
//! watchtower check
//! watchtower collect
//! watchtower alert --priority P1 --title "Disk full" --message "db1 at 98%"
//! watchtower rollup hourly
//! watchtower rollup all
//! watchtower cleanup
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use watchtower::alerts::{AlertDispatcher, AlertRequest};
use watchtower::configuration::{get_configuration_from, Settings};
use watchtower::health::{probes_from_settings, HealthCheckRunner};
use watchtower::metrics::{sources_from_settings, MetricsCollector};
use watchtower::store::{JsonFileStore, PersistenceStore};
use watchtower::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser, Debug)]
#[command(
    name = "watchtower",
    version,
    about = "Health checks, alerting and metrics rollups from the command line"
)]
struct Cli {
    /// Configuration file name without extension
    #[arg(long, global = true, default_value = "configuration")]
    config: String,
    /// Override the data directory of the JSON store
    #[arg(long, global = true, env = "WATCHTOWER_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one health check cycle
    Check {
        /// Do not raise alerts for a critical or degraded result
        #[arg(long)]
        no_alerts: bool,
    },
    /// Take one metrics sample
    Collect,
    /// Send one alert through the configured channels
    Alert {
        #[arg(long, default_value = "P3")]
        priority: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Write the summary for the previous hour or day, or catch up on every
    /// missing one
    Rollup {
        #[arg(value_enum)]
        period: RollupPeriod,
    },
    /// Delete raw metrics older than the retention window
    Cleanup,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RollupPeriod {
    Hourly,
    Daily,
    All,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("watchtower/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

fn collector(settings: &Settings, store: Arc<dyn PersistenceStore>) -> anyhow::Result<MetricsCollector> {
    Ok(MetricsCollector::new(
        settings.metrics.clone(),
        sources_from_settings(&settings.metrics, http_client()?),
        store,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = get_subscriber("watchtower-cli".into(), "warn".into(), std::io::stderr);
    init_subscriber(subscriber);

    let mut settings = get_configuration_from(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }
    settings.validate()?;
    let store: Arc<dyn PersistenceStore> = Arc::new(JsonFileStore::new(settings.data_dir.clone()));

    match cli.command {
        Command::Check { no_alerts } => {
            let client = http_client()?;
            let mut runner = HealthCheckRunner::new(
                settings.health.clone(),
                probes_from_settings(&settings.health, client.clone()),
                store.clone(),
            );
            if !no_alerts {
                let alerts = AlertDispatcher::from_settings(settings.alerts.clone(), store, client);
                runner = runner.with_alerts(Arc::new(alerts));
            }
            let snapshot = runner.run().await?;
            print_json(&snapshot)?;
        }
        Command::Collect => {
            let sample = collector(&settings, store)?.collect_once().await;
            print_json(&sample)?;
        }
        Command::Alert {
            priority,
            title,
            message,
            tags,
        } => {
            let dispatcher = AlertDispatcher::from_settings(settings.alerts.clone(), store, http_client()?);
            let request = AlertRequest {
                priority: Some(priority),
                title: Some(title),
                message: Some(message),
                tags,
                ..Default::default()
            };
            let result = dispatcher.send_alert(request).await;
            print_json(&result)?;
        }
        Command::Rollup { period } => {
            let collector = collector(&settings, store)?;
            let summary = match period {
                RollupPeriod::Hourly => collector.generate_hourly_summary().await?,
                RollupPeriod::Daily => collector.generate_daily_summary().await?,
                RollupPeriod::All => {
                    print_json(&collector.run_rollups().await?)?;
                    return Ok(());
                }
            };
            match summary {
                Some(summary) => print_json(&summary)?,
                None => eprintln!("Nothing to summarize"),
            }
        }
        Command::Cleanup => {
            let removed = collector(&settings, store)?.cleanup_old_metrics().await?;
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
    }

    Ok(())
}
