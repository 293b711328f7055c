//! Server configuration from environment variables.
//!
//! Required: `UBD_DATABASE_URL`, `UBD_ADMIN_PASSWORD`, `UBD_MASTER_RESET_KEY`,
//! `UBD_CRON_SECRET`. Everything else has a development default or switches a
//! feature on when present (mail relay, WhatsApp).

use anyhow::{anyhow, Result};
use ubd_core::agent::AgentRouting;
use ubd_core::Environment;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4600";
const DEFAULT_BASE_URL: &str = "http://localhost:4600";
const DEFAULT_ADMIN_EMAIL: &str = "admin@ubd.ae";

#[derive(Debug, Clone)]
pub struct MailRelayConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub token: String,
    pub phone_id: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Public base URL customer links are built against.
    pub base_url: String,
    pub environment: Environment,
    pub token_secret: Option<String>,
    pub admin_password: String,
    pub master_reset_key: String,
    pub cron_secret: String,
    pub admin_email: String,
    pub mail_relay: Option<MailRelayConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
    pub routing: AgentRouting,
}

fn required(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{name} must be set"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let environment = optional("UBD_ENV")
            .map(|v| v.parse::<Environment>().unwrap_or(Environment::Development))
            .unwrap_or(Environment::Development);

        let mail_relay = match (optional("UBD_MAIL_RELAY_URL"), optional("UBD_MAIL_RELAY_KEY")) {
            (Some(url), Some(api_key)) => Some(MailRelayConfig { url, api_key }),
            (Some(_), None) | (None, Some(_)) => {
                return Err(anyhow!(
                    "UBD_MAIL_RELAY_URL and UBD_MAIL_RELAY_KEY must be set together"
                ))
            }
            (None, None) => None,
        };

        let whatsapp = match (
            optional("UBD_WHATSAPP_API_URL"),
            optional("UBD_WHATSAPP_TOKEN"),
            optional("UBD_WHATSAPP_PHONE_ID"),
        ) {
            (Some(api_url), Some(token), Some(phone_id)) => Some(WhatsAppConfig {
                api_url,
                token,
                phone_id,
            }),
            (None, None, None) => None,
            _ => {
                return Err(anyhow!(
                    "UBD_WHATSAPP_API_URL, UBD_WHATSAPP_TOKEN and UBD_WHATSAPP_PHONE_ID must be set together"
                ))
            }
        };

        let mut routing = AgentRouting::default();
        if let Some(agent) = optional("UBD_DEFAULT_COMPANY_AGENT") {
            routing.company_agent = agent;
        }
        if let Some(agent) = optional("UBD_DEFAULT_BANK_AGENT") {
            routing.bank_agent = agent;
        }

        Ok(ServerConfig {
            database_url: required("UBD_DATABASE_URL")?,
            bind_addr: optional("UBD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            base_url: optional("UBD_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            environment,
            token_secret: optional("UBD_TOKEN_SECRET"),
            admin_password: required("UBD_ADMIN_PASSWORD")?,
            master_reset_key: required("UBD_MASTER_RESET_KEY")?,
            cron_secret: required("UBD_CRON_SECRET")?,
            admin_email: optional("UBD_ADMIN_EMAIL")
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            mail_relay,
            whatsapp,
            routing,
        })
    }
}
