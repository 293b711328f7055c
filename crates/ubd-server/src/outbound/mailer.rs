//! Email transports.
//!
//! Production posts to an HTTP mail relay; without relay configuration the
//! server falls back to [`LogMailer`], which writes the message to the log
//! and reports success. The workflow treats both the same way.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use ubd_core::notify::EmailMessage;
use ubd_core::ports::{Mailer, Result};

use crate::config::MailRelayConfig;

/// HTTP mail relay client.
pub struct RelayMailer {
    http: Client,
    url: String,
    api_key: String,
}

impl RelayMailer {
    pub fn new(config: &MailRelayConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(RelayMailer {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "to": message.to,
                "subject": message.subject,
                "text": message.body,
            }))
            .send()
            .await
            .context("mail relay unreachable")
            .map_err(ubd_core::error::WorkflowError::Internal)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ubd_core::error::WorkflowError::Internal(anyhow!(
                "mail relay error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        tracing::debug!(to = %message.to, subject = %message.subject, "email relayed");
        Ok(())
    }
}

/// Development stand-in: logs the message instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "email (log only, no relay configured)"
        );
        Ok(())
    }
}
