use super::models::{MetricRecord, MetricValue};
use crate::configuration::{MetricsSettings, NamedEndpoint};
use crate::errors::SourceError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// One category of the periodic metrics sample.
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn category(&self) -> &str;

    async fn fetch(&self) -> Result<MetricRecord, SourceError>;
}

fn number_at(doc: &Value, pointer: &str) -> f64 {
    doc.pointer(pointer).and_then(Value::as_f64).unwrap_or(0.0)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_millis() as f64
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<(reqwest::StatusCode, Value), SourceError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let body = if status.is_success() {
        response.json().await?
    } else {
        Value::Null
    };
    Ok((status, body))
}

/// Token market data from a CoinGecko style `/coins/{id}` document.
pub struct MarketSource {
    url: String,
    client: reqwest::Client,
}

impl MarketSource {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl MetricSource for MarketSource {
    fn category(&self) -> &str {
        "token"
    }

    async fn fetch(&self) -> Result<MetricRecord, SourceError> {
        let doc: Value = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let market = doc
            .get("market_data")
            .ok_or_else(|| SourceError::InvalidPayload("missing market_data".into()))?;

        let mut record = MetricRecord::new();
        for (field, pointer) in [
            ("price", "/current_price/usd"),
            ("priceChange24h", "/price_change_percentage_24h"),
            ("volume24h", "/total_volume/usd"),
            ("marketCap", "/market_cap/usd"),
            ("circulatingSupply", "/circulating_supply"),
            ("totalSupply", "/total_supply"),
        ] {
            record.insert(field.to_string(), number_at(market, pointer).into());
        }
        Ok(record)
    }
}

/// Community counters published by each bot on its `/metrics` endpoint.
pub struct SocialSource {
    endpoints: Vec<NamedEndpoint>,
    client: reqwest::Client,
}

impl SocialSource {
    pub fn new(endpoints: Vec<NamedEndpoint>, client: reqwest::Client) -> Self {
        Self { endpoints, client }
    }
}

#[async_trait]
impl MetricSource for SocialSource {
    fn category(&self) -> &str {
        "social"
    }

    async fn fetch(&self) -> Result<MetricRecord, SourceError> {
        let mut record = MetricRecord::new();
        for endpoint in &self.endpoints {
            match get_json(&self.client, &endpoint.url).await {
                Ok((status, doc)) if status.is_success() => {
                    for (field, key) in [
                        ("members", "/memberCount"),
                        ("online", "/onlineCount"),
                        ("messages24h", "/messages24h"),
                    ] {
                        if doc.pointer(key).is_some() {
                            record.insert(
                                format!("{}.{}", endpoint.name, field),
                                number_at(&doc, key).into(),
                            );
                        }
                    }
                }
                Ok((status, _)) => {
                    tracing::debug!("{} metrics answered {}", endpoint.name, status)
                }
                Err(err) => tracing::debug!("{} metrics not available: {}", endpoint.name, err),
            }
        }
        Ok(record)
    }
}

/// Liveness and latency of the bots' `/health` endpoints.
pub struct BotSource {
    endpoints: Vec<NamedEndpoint>,
    client: reqwest::Client,
}

impl BotSource {
    pub fn new(endpoints: Vec<NamedEndpoint>, client: reqwest::Client) -> Self {
        Self { endpoints, client }
    }
}

#[async_trait]
impl MetricSource for BotSource {
    fn category(&self) -> &str {
        "bots"
    }

    async fn fetch(&self) -> Result<MetricRecord, SourceError> {
        let mut record = MetricRecord::new();
        for endpoint in &self.endpoints {
            let start = Instant::now();
            let (status, uptime, response_time) = match get_json(&self.client, &endpoint.url).await {
                Ok((code, doc)) if code.is_success() => {
                    ("healthy", number_at(&doc, "/uptime"), elapsed_ms(start))
                }
                Ok(_) => ("degraded", 0.0, elapsed_ms(start)),
                Err(_) => ("down", 0.0, 0.0),
            };
            record.insert(format!("{}.status", endpoint.name), status.into());
            record.insert(format!("{}.uptime", endpoint.name), uptime.into());
            record.insert(format!("{}.responseTime", endpoint.name), response_time.into());
        }
        Ok(record)
    }
}

/// Website analytics endpoint: responsiveness plus traffic counters.
pub struct WebsiteSource {
    endpoint: NamedEndpoint,
    client: reqwest::Client,
}

impl WebsiteSource {
    pub fn new(endpoint: NamedEndpoint, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }
}

#[async_trait]
impl MetricSource for WebsiteSource {
    fn category(&self) -> &str {
        "website"
    }

    async fn fetch(&self) -> Result<MetricRecord, SourceError> {
        let start = Instant::now();
        let mut record = MetricRecord::new();
        match get_json(&self.client, &self.endpoint.url).await {
            Ok((code, doc)) => {
                let status = if code.is_success() { "healthy" } else { "degraded" };
                record.insert("status".into(), status.into());
                record.insert("responseTime".into(), elapsed_ms(start).into());
                record.insert("pageViews24h".into(), number_at(&doc, "/pageViews24h").into());
                record.insert(
                    "uniqueVisitors24h".into(),
                    number_at(&doc, "/uniqueVisitors24h").into(),
                );
            }
            Err(err) => {
                tracing::debug!("Website metrics not available: {}", err);
                record.insert("status".into(), "down".into());
                record.insert("responseTime".into(), MetricValue::Number(0.0));
            }
        }
        Ok(record)
    }
}

/// Reachability and latency of third-party APIs.
pub struct ApiLatencySource {
    endpoints: Vec<NamedEndpoint>,
    client: reqwest::Client,
}

impl ApiLatencySource {
    pub fn new(endpoints: Vec<NamedEndpoint>, client: reqwest::Client) -> Self {
        Self { endpoints, client }
    }
}

#[async_trait]
impl MetricSource for ApiLatencySource {
    fn category(&self) -> &str {
        "apis"
    }

    async fn fetch(&self) -> Result<MetricRecord, SourceError> {
        let mut record = MetricRecord::new();
        for endpoint in &self.endpoints {
            let start = Instant::now();
            let (status, response_time) = match self.client.get(&endpoint.url).send().await {
                Ok(response) if response.status().is_success() => ("healthy", elapsed_ms(start)),
                Ok(_) => ("degraded", elapsed_ms(start)),
                Err(_) => ("down", 0.0),
            };
            record.insert(format!("{}.status", endpoint.name), status.into());
            record.insert(format!("{}.responseTime", endpoint.name), response_time.into());
        }
        Ok(record)
    }
}

pub fn sources_from_settings(
    settings: &MetricsSettings,
    client: reqwest::Client,
) -> Vec<Arc<dyn MetricSource>> {
    let mut sources: Vec<Arc<dyn MetricSource>> = Vec::new();
    if let Some(url) = &settings.market_url {
        sources.push(Arc::new(MarketSource::new(url.clone(), client.clone())));
    }
    sources.push(Arc::new(SocialSource::new(settings.social.clone(), client.clone())));
    sources.push(Arc::new(BotSource::new(settings.bots.clone(), client.clone())));
    if let Some(website) = &settings.website {
        sources.push(Arc::new(WebsiteSource::new(website.clone(), client.clone())));
    }
    sources.push(Arc::new(ApiLatencySource::new(settings.apis.clone(), client)));
    sources
}
