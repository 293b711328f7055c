//! Admin workflow actions on one lead.
//!
//! POST /api/leads/:id/quote/send        — send (or re-send) the quote
//! POST /api/leads/:id/invoice/send      — issue invoice, or remind if unpaid
//! POST /api/leads/:id/reminder          — manual payment reminder
//! POST /api/leads/:id/decision          — force a decision state
//! POST /api/leads/:id/feasibility       — mark feasible / not feasible
//! POST /api/leads/:id/quote-amount      — set the quoted amount
//! POST /api/leads/:id/payment-received  — record payment
//! POST /api/leads/:id/complete          — record completion
//! POST /api/leads/:id/reset-quote       — reset the company track
//! POST /api/leads/:id/reset-bank        — reset the bank track
//! POST /api/leads/:id/reset-master      — wipe all tracks, key-gated

use std::sync::Arc;

use axum::extract::Path;
use axum::{Extension, Json};
use ubd_core::error::WorkflowError;
use ubd_core::lead::ProjectKind;
use ubd_core::proto::{
    CompletionResponse, FeasibilityRequest, InvoiceSendResponse, MasterResetRequest,
    OverrideDecisionRequest, OverrideDecisionResponse, PaymentResponse, ProjectRequest,
    QuoteAmountRequest, QuoteSendResponse, ResetResponse, SendInvoiceRequest, SendQuoteRequest,
    TrackUpdateResponse,
};
use ubd_core::service::WorkflowService;
use uuid::Uuid;

use crate::auth::{AdminSession, AuthKeys};
use crate::error::AppError;

pub async fn send_quote(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendQuoteRequest>,
) -> Result<Json<QuoteSendResponse>, AppError> {
    Ok(Json(service.send_quote(id, req.project, req.amount).await?))
}

pub async fn send_invoice(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendInvoiceRequest>,
) -> Result<Json<InvoiceSendResponse>, AppError> {
    Ok(Json(
        service
            .send_invoice(id, req.project, req.amount, req.payment_link)
            .await?,
    ))
}

pub async fn send_reminder(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<InvoiceSendResponse>, AppError> {
    Ok(Json(service.send_payment_reminder(id, req.project).await?))
}

pub async fn override_decision(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideDecisionRequest>,
) -> Result<Json<OverrideDecisionResponse>, AppError> {
    Ok(Json(
        service
            .override_decision(id, req.project, req.decision, req.reason)
            .await?,
    ))
}

pub async fn set_feasibility(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeasibilityRequest>,
) -> Result<Json<TrackUpdateResponse>, AppError> {
    Ok(Json(
        service.set_feasibility(id, req.project, req.feasible).await?,
    ))
}

pub async fn set_quote_amount(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<QuoteAmountRequest>,
) -> Result<Json<TrackUpdateResponse>, AppError> {
    Ok(Json(
        service.set_quote_amount(id, req.project, req.amount).await?,
    ))
}

pub async fn payment_received(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    Ok(Json(service.mark_payment_received(id, req.project).await?))
}

pub async fn complete(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<CompletionResponse>, AppError> {
    Ok(Json(service.mark_completed(id, req.project).await?))
}

pub async fn reset_quote(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResetResponse>, AppError> {
    Ok(Json(service.reset_project(id, ProjectKind::Company).await?))
}

pub async fn reset_bank(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResetResponse>, AppError> {
    Ok(Json(service.reset_project(id, ProjectKind::Bank).await?))
}

pub async fn reset_master(
    _session: AdminSession,
    Extension(auth): Extension<AuthKeys>,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MasterResetRequest>,
) -> Result<Json<ResetResponse>, AppError> {
    if req.password != auth.master_reset_key {
        return Err(AppError(WorkflowError::Forbidden(
            "master reset key mismatch".to_string(),
        )));
    }
    Ok(Json(service.master_reset(id).await?))
}
