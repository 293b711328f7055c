//! Outbound message transports behind the core sender ports.

pub mod mailer;
pub mod whatsapp;

pub use mailer::{LogMailer, RelayMailer};
pub use whatsapp::WhatsAppApiClient;
