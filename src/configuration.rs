use crate::errors::MonitorError;
use serde::Deserialize;
use serde_valid::Validate;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Fully typed service configuration. Built once at startup; every component
/// receives a copy of its own section.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub app_host: String,
    pub app_port: u16,
    /// Root directory of the JSON-file store
    pub data_dir: PathBuf,
    #[validate]
    pub health: HealthSettings,
    #[validate]
    pub alerts: AlertSettings,
    #[validate]
    pub metrics: MetricsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_host: "127.0.0.1".to_string(),
            app_port: 3005,
            data_dir: PathBuf::from("data"),
            health: HealthSettings::default(),
            alerts: AlertSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

/// An HTTP endpoint polled by a probe or a metric source.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NamedEndpoint {
    #[validate(min_length = 1)]
    pub name: String,
    #[validate(min_length = 1)]
    pub url: String,
    #[serde(default)]
    pub critical: bool,
}

impl NamedEndpoint {
    pub fn new(name: &str, url: &str, critical: bool) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            critical,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct HealthSettings {
    #[validate(minimum = 1)]
    pub interval_secs: u64,
    #[validate(minimum = 1)]
    pub probe_timeout_secs: u64,
    /// Responses slower than this mark an HTTP probe as degraded
    pub slow_response_ms: u64,
    #[validate(minimum = 1)]
    pub history_size: usize,
    #[validate(minimum = 1)]
    pub persisted_history_size: usize,
    /// Scores strictly below this floor are critical
    #[validate(maximum = 100)]
    pub critical_score_floor: u8,
    #[validate]
    pub services: Vec<NamedEndpoint>,
    #[validate]
    pub external_apis: Vec<NamedEndpoint>,
    #[validate]
    pub status_file: Option<StatusFileSettings>,
    pub chain: Option<ChainSettings>,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            probe_timeout_secs: 10,
            slow_response_ms: 1000,
            history_size: 100,
            persisted_history_size: 1000,
            critical_score_floor: 50,
            services: vec![
                NamedEndpoint::new("Discord Bot", "http://localhost:3001/health", true),
                NamedEndpoint::new("Telegram Bot", "http://localhost:3002/health", true),
                NamedEndpoint::new("Twitter Bot", "http://localhost:3003/health", true),
                NamedEndpoint::new(
                    "Analytics Dashboard",
                    "http://localhost:3004/health",
                    false,
                ),
                NamedEndpoint::new("Website", "http://localhost:3000", true),
            ],
            external_apis: vec![NamedEndpoint::new(
                "CoinGecko",
                "https://api.coingecko.com/api/v3/ping",
                false,
            )],
            status_file: None,
            chain: None,
        }
    }
}

impl HealthSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Liveness of bot processes that publish their state into a shared file.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusFileSettings {
    pub path: PathBuf,
    /// Keys inside the status file, one probe each
    pub bots: Vec<String>,
    #[serde(default = "default_staleness_secs")]
    #[validate(minimum = 1)]
    pub staleness_secs: u64,
    #[serde(default)]
    pub critical: bool,
}

fn default_staleness_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    pub rpc_url: Option<String>,
    /// Wallet that pays gas; its balance is compared to `min_balance_eth`
    pub watched_address: Option<String>,
    #[serde(default = "default_min_balance_eth")]
    pub min_balance_eth: f64,
    #[serde(default = "default_true")]
    pub critical: bool,
}

fn default_min_balance_eth() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize, PartialEq)]
pub struct OnCallResponder {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipientSettings {
    pub email: Vec<String>,
    pub phone: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub webhook_url: String,
    #[serde(default = "default_chat_username")]
    pub username: String,
}

fn default_chat_username() -> String {
    "Watchtower Alerts".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// HTTP mail relay accepting `{from, to, subject, html}` JSON
    pub relay_url: String,
    pub from: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsSettings {
    #[serde(default = "default_sms_api_base")]
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    /// Used when no phone recipient was resolved
    pub default_to: Option<String>,
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct AlertSettings {
    #[validate(minimum = 1)]
    pub max_alerts_per_hour: u32,
    pub dedup_window_secs: u64,
    #[validate(minimum = 1)]
    pub channel_timeout_secs: u64,
    #[validate(minimum = 1)]
    pub history_size: usize,
    #[validate(minimum = 1)]
    pub persisted_history_size: usize,
    pub recipients: RecipientSettings,
    pub on_call_rotation: Vec<OnCallResponder>,
    pub chat: Option<ChatSettings>,
    pub email: Option<EmailSettings>,
    pub sms: Option<SmsSettings>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            max_alerts_per_hour: 20,
            dedup_window_secs: 900,
            channel_timeout_secs: 10,
            history_size: 1000,
            persisted_history_size: 10000,
            recipients: RecipientSettings::default(),
            on_call_rotation: Vec::new(),
            chat: None,
            email: None,
            sms: None,
        }
    }
}

impl AlertSettings {
    /// Fill channel secrets from the environment. Values already present in
    /// the configuration file win.
    pub fn apply_env(&mut self) {
        if self.chat.is_none() {
            if let Ok(webhook_url) = std::env::var("SLACK_WEBHOOK_URL") {
                self.chat = Some(ChatSettings {
                    webhook_url,
                    username: default_chat_username(),
                });
            }
        }

        if self.email.is_none() {
            if let (Ok(relay_url), Ok(from)) = (
                std::env::var("ALERT_EMAIL_RELAY_URL"),
                std::env::var("ALERT_EMAIL_FROM"),
            ) {
                self.email = Some(EmailSettings {
                    relay_url,
                    from,
                    api_key: std::env::var("ALERT_EMAIL_API_KEY").ok(),
                });
            }
        }
        if self.recipients.email.is_empty() {
            if let Ok(to) = std::env::var("ALERT_EMAIL_TO") {
                self.recipients.email = to
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }

        if self.sms.is_none() {
            if let (Ok(account_sid), Ok(auth_token), Ok(from_number)) = (
                std::env::var("TWILIO_ACCOUNT_SID"),
                std::env::var("TWILIO_AUTH_TOKEN"),
                std::env::var("TWILIO_FROM_NUMBER"),
            ) {
                self.sms = Some(SmsSettings {
                    api_base: default_sms_api_base(),
                    account_sid,
                    auth_token,
                    from_number,
                    default_to: std::env::var("TWILIO_TO_NUMBER").ok(),
                });
            }
        }
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.dedup_window_secs as i64)
    }

    pub fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct MetricsSettings {
    #[validate(minimum = 1)]
    pub collection_interval_secs: u64,
    /// Period of the rollup job; daily summaries are written by the same job
    #[validate(minimum = 1)]
    pub hourly_interval_secs: u64,
    #[validate(minimum = 1)]
    pub retention_days: u32,
    #[validate(minimum = 1)]
    pub source_timeout_secs: u64,
    /// Market data endpoint (CoinGecko `coins/{id}` shape)
    pub market_url: Option<String>,
    /// Bot `/metrics` endpoints reporting community counters
    pub social: Vec<NamedEndpoint>,
    /// Bot `/health` endpoints
    pub bots: Vec<NamedEndpoint>,
    pub website: Option<NamedEndpoint>,
    pub apis: Vec<NamedEndpoint>,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            collection_interval_secs: 60,
            hourly_interval_secs: 3600,
            retention_days: 90,
            source_timeout_secs: 10,
            market_url: None,
            social: vec![
                NamedEndpoint::new("discord", "http://localhost:3001/metrics", false),
                NamedEndpoint::new("telegram", "http://localhost:3002/metrics", false),
            ],
            bots: vec![
                NamedEndpoint::new("discord", "http://localhost:3001/health", false),
                NamedEndpoint::new("telegram", "http://localhost:3002/health", false),
                NamedEndpoint::new("twitter", "http://localhost:3003/health", false),
            ],
            website: Some(NamedEndpoint::new(
                "website",
                "http://localhost:3004/metrics",
                false,
            )),
            apis: vec![
                NamedEndpoint::new("CoinGecko", "https://api.coingecko.com/api/v3/ping", false),
                NamedEndpoint::new(
                    "Etherscan",
                    "https://api.etherscan.io/api?module=stats&action=ethprice",
                    false,
                ),
            ],
        }
    }
}

impl MetricsSettings {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl Settings {
    /// Reject values that would make a component spin or never fire, and
    /// probe names that would collide in a snapshot.
    pub fn validate(&self) -> Result<(), MonitorError> {
        Validate::validate(self)
            .map_err(|errors| MonitorError::Configuration(errors.to_string()))?;

        let mut seen = HashSet::new();
        let status_bots = self
            .health
            .status_file
            .iter()
            .flat_map(|s| s.bots.iter().map(|b| status_probe_name(b)));
        let names = self
            .health
            .services
            .iter()
            .chain(self.health.external_apis.iter())
            .map(|e| e.name.clone())
            .chain(status_bots)
            .chain(
                self.health
                    .chain
                    .iter()
                    .map(|_| CHAIN_PROBE_NAME.to_string()),
            );
        for name in names {
            if name.trim().is_empty() {
                return Err(MonitorError::Configuration(
                    "probe name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(MonitorError::Configuration(format!(
                    "duplicate probe name: {}",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Name under which the blockchain probe is reported.
pub const CHAIN_PROBE_NAME: &str = "Blockchain";

/// Name under which a status-file bot is reported.
pub fn status_probe_name(bot: &str) -> String {
    format!("{} status", bot)
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_from("configuration")
}

pub fn get_configuration_from(file: &str) -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // `configuration.{yaml,toml,json}` is optional, every field has a default
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix("WATCHTOWER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Settings = settings.try_deserialize()?;

    // Channel secrets come from the environment
    config.alerts.apply_env();

    Ok(config)
}
