pub(crate) mod alerts;
pub(crate) mod health;
pub mod health_checks;
pub(crate) mod metrics;

pub use health_checks::*;
