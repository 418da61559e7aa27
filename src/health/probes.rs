use super::models::CheckResult;
use crate::configuration::{status_probe_name, HealthSettings, CHAIN_PROBE_NAME};
use crate::errors::ProbeError;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A named capability yielding one check result.
///
/// Implementations report their own failures through the returned status.
/// An `Err` is treated as the service being down.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    /// A critical probe that is down forces the overall status to critical
    fn critical(&self) -> bool;

    async fn check(&self) -> Result<CheckResult, ProbeError>;
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// GET an HTTP endpoint and classify the response.
pub struct HttpProbe {
    name: String,
    url: String,
    critical: bool,
    slow_response_ms: u64,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        critical: bool,
        slow_response_ms: u64,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            critical,
            slow_response_ms,
            client,
        }
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    #[tracing::instrument(name = "HTTP probe", skip(self), fields(probe = %self.name))]
    async fn check(&self) -> Result<CheckResult, ProbeError> {
        let start = Instant::now();

        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} health check failed: {:?}", self.name, e);
                let err = ProbeError::from(e);
                return Ok(CheckResult::down(&self.name, err.to_string(), elapsed_ms(start)));
            }
        };

        let elapsed = elapsed_ms(start);
        let status = response.status();

        let result = if status.as_u16() == 429 {
            CheckResult::rate_limited(&self.name, elapsed)
        } else if status.is_success() || status.is_redirection() {
            let body = response.json::<serde_json::Value>().await.ok();
            let mut result = if elapsed > self.slow_response_ms {
                CheckResult::degraded(
                    &self.name,
                    format!("{} slow ({} ms)", self.name, elapsed),
                    elapsed,
                )
            } else {
                CheckResult::healthy(&self.name, elapsed)
            };
            if let Some(body) = body {
                result = result.with_data(body);
            }
            result
        } else {
            CheckResult::degraded(&self.name, format!("HTTP {}", status.as_u16()), elapsed)
        };

        Ok(result)
    }
}

/// Observe a bot process through the status file it keeps up to date.
///
/// Expected layout: `{"<key>": {"status": "online", "lastSeen": "<rfc3339>", ...}}`.
pub struct StatusFileProbe {
    name: String,
    path: PathBuf,
    key: String,
    staleness: chrono::Duration,
    critical: bool,
}

impl StatusFileProbe {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        staleness: Duration,
        critical: bool,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            key: key.into(),
            staleness: chrono::Duration::from_std(staleness)
                .unwrap_or_else(|_| chrono::Duration::seconds(120)),
            critical,
        }
    }

    fn evaluate(&self, doc: &serde_json::Value, now: DateTime<Utc>) -> CheckResult {
        let entry = match doc.get(&self.key) {
            Some(entry) => entry,
            None => {
                return CheckResult::down(
                    &self.name,
                    format!("no status entry for {}", self.key),
                    0,
                )
            }
        };

        let status = entry
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let last_seen = entry
            .get("lastSeen")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let data = json!({
            "status": status,
            "lastSeen": last_seen,
            "metrics": entry.get("metrics").cloned().unwrap_or(serde_json::Value::Null),
        });

        match last_seen {
            Some(seen) if status == "online" && now - seen < self.staleness => {
                CheckResult::healthy(&self.name, 0).with_data(data)
            }
            Some(seen) if status == "online" => CheckResult::down(
                &self.name,
                format!("last seen {} seconds ago", (now - seen).num_seconds()),
                0,
            )
            .with_data(data),
            _ => CheckResult::down(&self.name, format!("reported status {}", status), 0)
                .with_data(data),
        }
    }
}

#[async_trait::async_trait]
impl Probe for StatusFileProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    #[tracing::instrument(name = "Status file probe", skip(self), fields(probe = %self.name))]
    async fn check(&self) -> Result<CheckResult, ProbeError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProbeError::Connection(format!("{}: {}", self.path.display(), e))
        })?;
        let doc: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ProbeError::InvalidResponse(e.to_string()))?;

        Ok(self.evaluate(&doc, Utc::now()))
    }
}

/// Chain liveness through JSON-RPC.
///
/// `eth_blockNumber` must answer; when a wallet is watched its balance is
/// compared against a minimum and a shortfall is reported as a warning.
pub struct JsonRpcProbe {
    name: String,
    rpc_url: Option<String>,
    watched_address: Option<String>,
    min_balance_eth: f64,
    critical: bool,
    client: reqwest::Client,
}

const WEI_PER_ETH: f64 = 1e18;

impl JsonRpcProbe {
    pub fn new(
        name: impl Into<String>,
        rpc_url: Option<String>,
        watched_address: Option<String>,
        min_balance_eth: f64,
        critical: bool,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            rpc_url,
            watched_address,
            min_balance_eth,
            critical,
            client,
        }
    }

    async fn call(
        &self,
        url: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, ProbeError> {
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
        let response: serde_json::Value = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(ProbeError::InvalidResponse(format!("{} failed: {}", method, error)));
        }
        response
            .get("result")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProbeError::InvalidResponse(format!("{}: missing result", method)))
    }
}

/// Parse a `0x`-prefixed quantity.
pub fn parse_hex_quantity(raw: &str) -> Result<u128, ProbeError> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ProbeError::InvalidResponse(format!("bad quantity {}: {}", raw, e)))
}

#[async_trait::async_trait]
impl Probe for JsonRpcProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    #[tracing::instrument(name = "JSON-RPC probe", skip(self), fields(probe = %self.name))]
    async fn check(&self) -> Result<CheckResult, ProbeError> {
        let url = match &self.rpc_url {
            Some(url) => url,
            None => {
                return Ok(CheckResult::skipped(
                    &self.name,
                    "RPC URL not configured".to_string(),
                ))
            }
        };

        let start = Instant::now();
        let raw_block = self.call(url, "eth_blockNumber", json!([])).await?;
        let block_number = u64::try_from(parse_hex_quantity(&raw_block)?).map_err(|_| {
            ProbeError::InvalidResponse(format!("block number out of range: {}", raw_block))
        })?;
        let mut data = json!({ "blockNumber": block_number });

        let mut result = CheckResult::healthy(&self.name, 0);
        if let Some(address) = &self.watched_address {
            let raw = self
                .call(url, "eth_getBalance", json!([address, "latest"]))
                .await?;
            let balance_eth = parse_hex_quantity(&raw)? as f64 / WEI_PER_ETH;
            data["gasBalance"] = json!(balance_eth);
            if balance_eth < self.min_balance_eth {
                result = CheckResult::warning(&self.name, "Low gas balance".to_string(), 0);
            }
        }

        result.response_time_ms = elapsed_ms(start);
        Ok(result.with_data(data))
    }
}

/// Every probe described by the health settings, in check order: services,
/// external APIs, status-file bots, then the chain probe.
pub fn probes_from_settings(
    settings: &HealthSettings,
    client: reqwest::Client,
) -> Vec<Arc<dyn Probe>> {
    let mut probes: Vec<Arc<dyn Probe>> = Vec::new();

    for endpoint in settings.services.iter().chain(settings.external_apis.iter()) {
        probes.push(Arc::new(HttpProbe::new(
            endpoint.name.as_str(),
            endpoint.url.as_str(),
            endpoint.critical,
            settings.slow_response_ms,
            client.clone(),
        )));
    }

    if let Some(status_file) = &settings.status_file {
        for bot in &status_file.bots {
            probes.push(Arc::new(StatusFileProbe::new(
                status_probe_name(bot),
                status_file.path.clone(),
                bot.as_str(),
                Duration::from_secs(status_file.staleness_secs),
                status_file.critical,
            )));
        }
    }

    if let Some(chain) = &settings.chain {
        probes.push(Arc::new(JsonRpcProbe::new(
            CHAIN_PROBE_NAME,
            chain.rpc_url.clone(),
            chain.watched_address.clone(),
            chain.min_balance_eth,
            chain.critical,
            client,
        )));
    }

    probes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::models::CheckStatus;

    fn status_probe() -> StatusFileProbe {
        StatusFileProbe::new(
            "discord status",
            "/nonexistent",
            "discord",
            Duration::from_secs(120),
            true,
        )
    }

    #[test]
    fn fresh_online_entry_is_healthy() {
        let now = Utc::now();
        let doc = json!({"discord": {"status": "online", "lastSeen": (now - chrono::Duration::seconds(30)).to_rfc3339()}});
        let result = status_probe().evaluate(&doc, now);
        assert_eq!(result.status, CheckStatus::Healthy);
    }

    #[test]
    fn stale_entry_is_down() {
        let now = Utc::now();
        let doc = json!({"discord": {"status": "online", "lastSeen": (now - chrono::Duration::seconds(600)).to_rfc3339()}});
        let result = status_probe().evaluate(&doc, now);
        assert_eq!(result.status, CheckStatus::Down);
        assert!(result.error.unwrap().contains("600"));
    }

    #[test]
    fn offline_or_missing_entry_is_down() {
        let now = Utc::now();
        let offline = json!({"discord": {"status": "offline", "lastSeen": now.to_rfc3339()}});
        assert_eq!(status_probe().evaluate(&offline, now).status, CheckStatus::Down);
        let missing = json!({"telegram": {}});
        assert_eq!(status_probe().evaluate(&missing, now).status, CheckStatus::Down);
    }

    #[tokio::test]
    async fn unreadable_status_file_is_an_error() {
        let err = status_probe().check().await.unwrap_err();
        assert!(matches!(err, ProbeError::Connection(_)));
    }

    #[test]
    fn hex_quantities() {
        assert_eq!(parse_hex_quantity("0x10").unwrap(), 16);
        assert_eq!(parse_hex_quantity("0x").unwrap(), 0);
        assert!(parse_hex_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn rpc_probe_without_url_is_skipped() {
        let probe = JsonRpcProbe::new("chain", None, None, 0.1, true, reqwest::Client::new());
        let result = probe.check().await.unwrap();
        assert_eq!(result.status, CheckStatus::Skipped);
    }

    #[test]
    fn default_settings_build_one_probe_per_endpoint() {
        let settings = HealthSettings::default();
        let probes = probes_from_settings(&settings, reqwest::Client::new());
        assert_eq!(
            probes.len(),
            settings.services.len() + settings.external_apis.len()
        );
        assert_eq!(probes[0].name(), settings.services[0].name);
    }
}
