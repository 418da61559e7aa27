pub mod alerts;
pub mod configuration;
pub mod errors;
pub mod health;
mod helpers;
pub mod metrics;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod store;
pub mod telemetry;
