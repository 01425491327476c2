//! Mailer implementations: SendGrid over HTTP, and a disabled no-op.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::MailConfig;
use crate::domain::{HomecueError, Result};
use crate::ports::{EmailMessage, Mailer};

/// Used when no API key is configured. Never sends anything.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::debug!(to = %message.to, "mailer disabled, dropping message");
        Ok(())
    }
}

/// SendGrid v3 `mail/send` client.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>, config: &MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn body(message: &EmailMessage) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": message.from },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&Self::body(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(HomecueError::Mail(format!("sendgrid returned {status}: {detail}")))
    }
}

/// SendGrid when an API key is present, otherwise the disabled mailer.
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(Arc::new(SendGridMailer::new(key, config)?)),
        _ => {
            tracing::warn!("SendGrid API key not configured, email reminders disabled");
            Ok(Arc::new(DisabledMailer))
        }
    }
}
