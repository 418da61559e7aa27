mod history;
mod models;
pub mod probes;
mod runner;
mod scorer;

pub use history::{HealthHistory, ProbeStats};
pub use models::{CheckResult, CheckStatus, HealthSnapshot, OverallStatus};
pub use probes::{probes_from_settings, HttpProbe, JsonRpcProbe, Probe, StatusFileProbe};
pub use runner::{health_alert, HealthCheckRunner};
pub use scorer::{HealthScore, HealthScorer};
