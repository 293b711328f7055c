//! Router construction for the back-office server.

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use ubd_core::service::WorkflowService;

use crate::auth::AuthKeys;
use crate::handlers;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<dyn WorkflowService>, auth: AuthKeys) -> Router {
    // The admin and customer frontends live on other origins and send the
    // session cookie, so origins are mirrored instead of wildcarded.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(handlers::health::health))
        // Lead intake is public; the list behind the same path is admin-only.
        .route(
            "/api/leads",
            get(handlers::leads::list).post(handlers::leads::create),
        )
        .route("/api/leads/bulk-delete", post(handlers::leads::bulk_delete))
        .route("/api/leads/:id", get(handlers::leads::detail))
        .route(
            "/api/leads/:id/agents/:assignment_id/status",
            post(handlers::leads::agent_status),
        )
        // Admin workflow actions
        .route(
            "/api/leads/:id/quote/send",
            post(handlers::workflow::send_quote),
        )
        .route(
            "/api/leads/:id/invoice/send",
            post(handlers::workflow::send_invoice),
        )
        .route(
            "/api/leads/:id/reminder",
            post(handlers::workflow::send_reminder),
        )
        .route(
            "/api/leads/:id/decision",
            post(handlers::workflow::override_decision),
        )
        .route(
            "/api/leads/:id/feasibility",
            post(handlers::workflow::set_feasibility),
        )
        .route(
            "/api/leads/:id/quote-amount",
            post(handlers::workflow::set_quote_amount),
        )
        .route(
            "/api/leads/:id/payment-received",
            post(handlers::workflow::payment_received),
        )
        .route(
            "/api/leads/:id/complete",
            post(handlers::workflow::complete),
        )
        .route(
            "/api/leads/:id/reset-quote",
            post(handlers::workflow::reset_quote),
        )
        .route(
            "/api/leads/:id/reset-bank",
            post(handlers::workflow::reset_bank),
        )
        .route(
            "/api/leads/:id/reset-master",
            post(handlers::workflow::reset_master),
        )
        // Customer-facing, token-gated
        .route("/api/quote/view", post(handlers::quote::view))
        .route("/api/quote/details", post(handlers::quote::details))
        .route("/api/quote/decision", post(handlers::quote::decision))
        .route("/api/quote/proceed", post(handlers::quote::proceed))
        .route("/api/quote/decline", post(handlers::quote::decline))
        .route("/api/invoice/view", post(handlers::invoice::view))
        .route("/api/invoice/link", get(handlers::invoice::link))
        // Session and scheduler
        .route("/api/admin/login", post(handlers::admin::login))
        .route(
            "/api/cron/payment-reminders",
            post(handlers::cron::payment_reminders),
        )
        .layer(Extension(service))
        .layer(Extension(auth))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
