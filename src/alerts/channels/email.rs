use super::AlertChannel;
use crate::alerts::models::{Alert, ChannelKind, Recipients};
use crate::configuration::EmailSettings;
use crate::errors::ChannelError;
use async_trait::async_trait;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

const ALERT_TEMPLATE: &str = r#"<div style="font-family: sans-serif;">
<h2 style="color: {{ color }};">{{ emoji }} {{ title }}</h2>
<p><strong>Priority:</strong> {{ priority }}</p>
<p><strong>Time:</strong> {{ time }}</p>
<p>{{ message }}</p>
{% if tags %}<p><strong>Tags:</strong> {{ tags | join(sep=", ") }}</p>
{% endif %}{% if data %}<pre>{{ data }}</pre>
{% endif %}<p style="color: #888;">Alert ID: {{ id }}</p>
</div>
"#;

/// Sends mail through an HTTP relay.
pub struct EmailChannel {
    settings: EmailSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: String,
    html: String,
}

impl EmailChannel {
    pub fn new(settings: EmailSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    pub fn subject(alert: &Alert) -> String {
        format!("[{}] {}", alert.priority, alert.title)
    }

    /// HTML body. User supplied text is escaped by the template engine.
    pub fn render_html(alert: &Alert) -> Result<String, ChannelError> {
        let data = if alert.data.is_null() {
            String::new()
        } else {
            serde_json::to_string_pretty(&alert.data).unwrap_or_default()
        };

        let mut context = TeraContext::new();
        context.insert("id", &alert.id);
        context.insert("title", &alert.title);
        context.insert("message", &alert.message);
        context.insert("priority", alert.priority.as_str());
        context.insert("color", alert.priority.color());
        context.insert("emoji", alert.priority.emoji());
        context.insert("time", &alert.timestamp.to_rfc3339());
        context.insert("tags", &alert.tags);
        context.insert("data", &data);

        Tera::one_off(ALERT_TEMPLATE, &context, true)
            .map_err(|err| ChannelError::Template(err.to_string()))
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    #[tracing::instrument(name = "Email alert", skip_all, fields(alert_id = %alert.id))]
    async fn send(&self, alert: &Alert, recipients: &Recipients) -> Result<Vec<String>, ChannelError> {
        if recipients.email.is_empty() {
            return Err(ChannelError::NoRecipients("no email recipients configured".into()));
        }

        let body = MailRequest {
            from: &self.settings.from,
            to: &recipients.email,
            subject: Self::subject(alert),
            html: Self::render_html(alert)?,
        };
        let mut request = self.client.post(&self.settings.relay_url).json(&body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChannelError::from_status(status, &text));
        }
        Ok(recipients.email.clone())
    }
}
