//! POST /api/cron/payment-reminders — scheduled reminder batch.
//!
//! Called by an external scheduler. Auth is `Authorization: Bearer <secret>`
//! or `?secret=` for schedulers that cannot set headers.

use std::sync::Arc;

use axum::extract::Query;
use axum::http::{header, HeaderMap};
use axum::{Extension, Json};
use serde::Deserialize;
use ubd_core::error::WorkflowError;
use ubd_core::proto::ReminderReport;
use ubd_core::service::WorkflowService;

use crate::auth::{self, AuthKeys};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CronQuery {
    #[serde(default)]
    pub secret: Option<String>,
}

pub async fn payment_reminders(
    Extension(keys): Extension<AuthKeys>,
    Extension(service): Extension<Arc<dyn WorkflowService>>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Result<Json<ReminderReport>, AppError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if !auth::cron_authorized(&keys, bearer, query.secret.as_deref()) {
        return Err(AppError(WorkflowError::Unauthorized(
            "cron secret required".to_string(),
        )));
    }

    let run = service.run_payment_reminders().await?;
    Ok(Json(ReminderReport::from(&run)))
}
