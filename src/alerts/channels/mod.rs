//! Outbound notification channels.
//!
//! Every provider sits behind [`AlertChannel`] so the dispatcher never depends
//! on HTTP details and tests can swap in a [`mock::MockChannel`].

use super::models::{Alert, ChannelKind, Recipients};
use crate::configuration::AlertSettings;
use crate::errors::ChannelError;
use async_trait::async_trait;
use std::sync::Arc;

pub mod chat;
pub mod email;
#[cfg(test)]
pub mod mock;
pub mod sms;

pub use chat::ChatChannel;
pub use email::EmailChannel;
pub use sms::SmsChannel;

#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Deliver one alert. Returns the addresses that were reached.
    async fn send(&self, alert: &Alert, recipients: &Recipients)
        -> Result<Vec<String>, ChannelError>;
}

/// Build a channel for every provider that has credentials configured.
pub fn from_settings(settings: &AlertSettings, client: reqwest::Client) -> Vec<Arc<dyn AlertChannel>> {
    let mut channels: Vec<Arc<dyn AlertChannel>> = Vec::new();
    if let Some(chat) = &settings.chat {
        channels.push(Arc::new(ChatChannel::new(chat.clone(), client.clone())));
    }
    if let Some(email) = &settings.email {
        channels.push(Arc::new(EmailChannel::new(email.clone(), client.clone())));
    }
    if let Some(sms) = &settings.sms {
        channels.push(Arc::new(SmsChannel::new(sms.clone(), client)));
    }
    channels
}
