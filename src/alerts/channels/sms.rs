use super::AlertChannel;
use crate::alerts::models::{Alert, ChannelKind, Recipients};
use crate::configuration::SmsSettings;
use crate::errors::ChannelError;
use async_trait::async_trait;

const MAX_SMS_LEN: usize = 160;

/// Twilio compatible messages API.
pub struct SmsChannel {
    settings: SmsSettings,
    client: reqwest::Client,
}

impl SmsChannel {
    pub fn new(settings: SmsSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.account_sid
        )
    }

    pub fn body(alert: &Alert) -> String {
        let text = format!("[{}] {}: {}", alert.priority, alert.title, alert.message);
        if text.chars().count() <= MAX_SMS_LEN {
            return text;
        }
        let mut truncated: String = text.chars().take(MAX_SMS_LEN - 3).collect();
        truncated.push_str("...");
        truncated
    }

    fn numbers<'a>(&'a self, recipients: &'a Recipients) -> Vec<&'a str> {
        if recipients.phone.is_empty() {
            self.settings.default_to.iter().map(String::as_str).collect()
        } else {
            recipients.phone.iter().map(String::as_str).collect()
        }
    }

    async fn send_one(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .form(&[("To", to), ("From", self.settings.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChannelError::from_status(status, &text));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    #[tracing::instrument(name = "SMS alert", skip_all, fields(alert_id = %alert.id))]
    async fn send(&self, alert: &Alert, recipients: &Recipients) -> Result<Vec<String>, ChannelError> {
        let numbers = self.numbers(recipients);
        if numbers.is_empty() {
            return Err(ChannelError::NoRecipients("no phone recipients configured".into()));
        }

        // every number gets its attempt; the channel fails only if none was reached
        let body = Self::body(alert);
        let mut reached = Vec::with_capacity(numbers.len());
        let mut first_error = None;
        for to in numbers {
            match self.send_one(to, &body).await {
                Ok(()) => reached.push(to.to_string()),
                Err(err) => {
                    tracing::warn!(to, "SMS delivery failed: {}", err);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) if reached.is_empty() => Err(err),
            _ => Ok(reached),
        }
    }
}
