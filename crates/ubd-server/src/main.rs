//! ubd-server — REST server for the UBD lead-management back office.
//!
//! Configuration comes from env vars (a `.env` file is loaded first when
//! present). Required: UBD_DATABASE_URL, UBD_ADMIN_PASSWORD,
//! UBD_MASTER_RESET_KEY, UBD_CRON_SECRET. See `config.rs` for the rest.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use ubd_core::ports::Mailer;
use ubd_core::service::{WorkflowService, WorkflowServiceImpl};
use ubd_core::token::TokenSigner;
use ubd_postgres::{
    PgActivityLog, PgAssignmentStore, PgInvoiceRevisionStore, PgLeadStore, PgReminderRunStore,
};
use ubd_server::auth::AuthKeys;
use ubd_server::config::ServerConfig;
use ubd_server::outbound::{LogMailer, RelayMailer, WhatsAppApiClient};
use ubd_server::router::build_router;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ubd_server=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env().expect("configuration error");
    ubd_server::error::set_environment(config.environment);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    tracing::info!("Connected to database");

    // Production refuses to start without a real token secret.
    let signer = TokenSigner::from_secret(config.token_secret.clone(), config.environment)
        .expect("token secret rejected");

    let mailer: Arc<dyn Mailer> = match &config.mail_relay {
        Some(relay) => {
            tracing::info!(url = %relay.url, "using HTTP mail relay");
            Arc::new(RelayMailer::new(relay).expect("failed to build mail client"))
        }
        None => {
            tracing::warn!("no mail relay configured; emails go to the log");
            Arc::new(LogMailer)
        }
    };

    let mut workflow = WorkflowServiceImpl::new(
        Arc::new(PgLeadStore::new(pool.clone())),
        Arc::new(PgAssignmentStore::new(pool.clone())),
        Arc::new(PgActivityLog::new(pool.clone())),
        Arc::new(PgInvoiceRevisionStore::new(pool.clone())),
        Arc::new(PgReminderRunStore::new(pool)),
        mailer,
        signer,
        config.base_url.clone(),
        config.admin_email.clone(),
    )
    .with_routing(config.routing.clone());

    if let Some(whatsapp) = &config.whatsapp {
        let client = WhatsAppApiClient::new(whatsapp).expect("failed to build whatsapp client");
        workflow = workflow.with_whatsapp(Arc::new(client));
        tracing::info!("whatsapp sender configured");
    }
    let service: Arc<dyn WorkflowService> = Arc::new(workflow);

    let auth = AuthKeys::new(
        config.admin_password.clone(),
        config.master_reset_key.clone(),
        config.cron_secret.clone(),
    );
    let app = build_router(service, auth);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {}: {e}", config.bind_addr));
    tracing::info!("ubd-server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
