//! WhatsApp Business Cloud API client.
//!
//! Sends the plain-text quote notification. Configured only when all three
//! `UBD_WHATSAPP_*` variables are present; otherwise the workflow reports
//! WhatsApp sends as skipped.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use ubd_core::notify::WhatsAppMessage;
use ubd_core::ports::{Result, WhatsAppSender};

use crate::config::WhatsAppConfig;

pub struct WhatsAppApiClient {
    http: Client,
    api_url: String,
    token: String,
    phone_id: String,
}

impl WhatsAppApiClient {
    pub fn new(config: &WhatsAppConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(WhatsAppApiClient {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            phone_id: config.phone_id.clone(),
        })
    }
}

#[async_trait]
impl WhatsAppSender for WhatsAppApiClient {
    async fn send(&self, message: &WhatsAppMessage) -> Result<()> {
        let url = format!("{}/{}/messages", self.api_url, self.phone_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "messaging_product": "whatsapp",
                "to": message.to_phone,
                "type": "text",
                "text": { "body": message.body },
            }))
            .send()
            .await
            .context("whatsapp API unreachable")
            .map_err(ubd_core::error::WorkflowError::Internal)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ubd_core::error::WorkflowError::Internal(anyhow!(
                "whatsapp API error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        tracing::debug!(to = %message.to_phone, "whatsapp message sent");
        Ok(())
    }
}
