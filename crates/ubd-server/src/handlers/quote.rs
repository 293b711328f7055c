//! Public quote endpoints, all gated by signed tokens from emailed links.
//!
//! POST /api/quote/view      — record the first view
//! POST /api/quote/details   — payload for the customer quote page
//! POST /api/quote/decision  — proceed | decline | questions
//! POST /api/quote/proceed   — legacy single-purpose link
//! POST /api/quote/decline   — legacy single-purpose link

use std::sync::Arc;

use axum::{Extension, Json};
use ubd_core::proto::{
    DecisionRequest, LegacyDecisionRequest, QuoteDecisionResponse, QuoteDetailsResponse,
    QuoteViewResponse, TokenRequest,
};
use ubd_core::service::WorkflowService;
use ubd_core::transitions::QuoteDecision;

use crate::error::AppError;

pub async fn view(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<QuoteViewResponse>, AppError> {
    Ok(Json(service.record_quote_view(&req.token).await?))
}

pub async fn details(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<QuoteDetailsResponse>, AppError> {
    Ok(Json(service.quote_details(&req.token).await?))
}

pub async fn decision(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<QuoteDecisionResponse>, AppError> {
    Ok(Json(
        service
            .decide_quote(&req.token, req.decision, req.reason)
            .await?,
    ))
}

pub async fn proceed(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<LegacyDecisionRequest>,
) -> Result<Json<QuoteDecisionResponse>, AppError> {
    Ok(Json(
        service
            .decide_quote(&req.token, QuoteDecision::Proceed, req.reason)
            .await?,
    ))
}

pub async fn decline(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<LegacyDecisionRequest>,
) -> Result<Json<QuoteDecisionResponse>, AppError> {
    Ok(Json(
        service
            .decide_quote(&req.token, QuoteDecision::Decline, req.reason)
            .await?,
    ))
}
