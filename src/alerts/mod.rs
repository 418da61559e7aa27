pub mod channels;
mod dispatcher;
mod limiter;
mod models;
pub mod recipients;

pub use channels::AlertChannel;
pub use dispatcher::{normalize, AlertDispatcher};
pub use limiter::{Admission, Deduplicator, RateLimiter, Rejection};
pub use models::{
    Alert, AlertOutcome, AlertRequest, AlertStatistics, ChannelKind, ChannelResult, DeliveryStatus,
    DispatchResult, Priority, Recipients, SuppressionReason,
};
