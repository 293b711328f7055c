//! Lead intake and admin reads.
//!
//! POST /api/leads                                   — public capture form
//! GET  /api/leads                                   — admin list
//! GET  /api/leads/:id                               — admin detail
//! POST /api/leads/bulk-delete                       — admin cleanup
//! POST /api/leads/:id/agents/:assignment_id/status  — agent progress

use std::sync::Arc;

use axum::extract::Path;
use axum::{Extension, Json};
use ubd_core::agent::AgentAssignment;
use ubd_core::proto::{
    AssignmentStatusRequest, BulkDeleteRequest, BulkDeleteResponse, LeadCreatedResponse,
    LeadDetailResponse, LeadSummary, NewLeadRequest,
};
use ubd_core::service::WorkflowService;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::error::AppError;

pub async fn create(
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<NewLeadRequest>,
) -> Result<Json<LeadCreatedResponse>, AppError> {
    Ok(Json(service.create_lead(req).await?))
}

pub async fn list(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
) -> Result<Json<Vec<LeadSummary>>, AppError> {
    Ok(Json(service.list_leads().await?))
}

pub async fn detail(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeadDetailResponse>, AppError> {
    Ok(Json(service.lead_detail(id).await?))
}

pub async fn bulk_delete(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    Ok(Json(service.bulk_delete(&req.ids).await?))
}

pub async fn agent_status(
    _session: AdminSession,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    Path((id, assignment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AssignmentStatusRequest>,
) -> Result<Json<AgentAssignment>, AppError> {
    Ok(Json(
        service
            .update_assignment(id, assignment_id, req.status, req.make_current)
            .await?,
    ))
}
