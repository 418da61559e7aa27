use super::AlertChannel;
use crate::alerts::models::{Alert, ChannelKind, Recipients};
use crate::configuration::ChatSettings;
use crate::errors::ChannelError;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Incoming-webhook chat integration (Slack compatible payload).
pub struct ChatChannel {
    settings: ChatSettings,
    client: reqwest::Client,
}

impl ChatChannel {
    pub fn new(settings: ChatSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    fn payload(&self, alert: &Alert) -> Value {
        let mut fields = vec![
            json!({"title": "Priority", "value": alert.priority.as_str(), "short": true}),
            json!({"title": "Time", "value": alert.timestamp.to_rfc3339(), "short": true}),
        ];
        if !alert.tags.is_empty() {
            fields.push(json!({"title": "Tags", "value": alert.tags.join(", "), "short": false}));
        }
        if !alert.data.is_null() {
            fields.push(json!({
                "title": "Details",
                "value": format!("```{}```", alert.data),
                "short": false
            }));
        }

        json!({
            "username": self.settings.username,
            "text": format!("{} *{}*", alert.priority.emoji(), alert.title),
            "attachments": [{
                "color": alert.priority.color(),
                "text": alert.message,
                "fields": fields,
                "footer": format!("alert {}", alert.id),
            }]
        })
    }
}

#[async_trait]
impl AlertChannel for ChatChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Chat
    }

    #[tracing::instrument(name = "Chat alert", skip_all, fields(alert_id = %alert.id))]
    async fn send(&self, alert: &Alert, _recipients: &Recipients) -> Result<Vec<String>, ChannelError> {
        let response = self
            .client
            .post(&self.settings.webhook_url)
            .json(&self.payload(alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::from_status(status, &body));
        }
        Ok(vec!["webhook".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::models::{AlertOutcome, Priority};

    #[test]
    fn payload_carries_priority_color_and_fields() {
        let channel = ChatChannel::new(
            ChatSettings {
                webhook_url: "http://localhost".into(),
                username: "Watchtower".into(),
            },
            reqwest::Client::new(),
        );
        let alert = Alert {
            id: "abc".into(),
            priority: Priority::P0,
            title: "DB down".into(),
            message: "primary unreachable".into(),
            data: json!({"host": "db1"}),
            tags: vec!["db".into()],
            timestamp: chrono::Utc::now(),
            recipients: Recipients::default(),
            outcome: AlertOutcome::Delivered,
            delivery_results: vec![],
        };
        let payload = channel.payload(&alert);
        assert_eq!(payload["username"], "Watchtower");
        assert_eq!(payload["attachments"][0]["color"], "#dc3545");
        assert_eq!(payload["attachments"][0]["fields"].as_array().unwrap().len(), 4);
    }
}
