//! Invoice endpoints.
//!
//! POST /api/invoice/view — public, token-gated payload for the view page
//! GET  /api/invoice/link — admin, mints a fresh signed view URL

use std::sync::Arc;

use axum::extract::Query;
use axum::{Extension, Json};
use serde::Deserialize;
use ubd_core::lead::ProjectKind;
use ubd_core::proto::{InvoiceLinkResponse, InvoiceViewResponse, TokenRequest};
use ubd_core::service::WorkflowService;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::error::AppError;

pub async fn view(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<InvoiceViewResponse>, AppError> {
    Ok(Json(service.invoice_details(&req.token).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLinkQuery {
    pub lead_id: Uuid,
    #[serde(default)]
    pub project: Option<ProjectKind>,
    #[serde(default)]
    pub version: Option<i32>,
}

pub async fn link(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Query(query): Query<InvoiceLinkQuery>,
) -> Result<Json<InvoiceLinkResponse>, AppError> {
    let project = query.project.unwrap_or(ProjectKind::Company);
    Ok(Json(
        service
            .invoice_link(query.lead_id, project, query.version)
            .await?,
    ))
}
