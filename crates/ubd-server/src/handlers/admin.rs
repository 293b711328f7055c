//! POST /api/admin/login — shared-password login, sets the session cookie.

use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use ubd_core::error::WorkflowError;

use crate::auth::{self, AuthKeys};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn login(
    Extension(auth): Extension<AuthKeys>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.password != auth.admin_password {
        return Err(AppError(WorkflowError::Unauthorized(
            "wrong password".to_string(),
        )));
    }
    tracing::info!("admin logged in");
    Ok((
        [(
            header::SET_COOKIE,
            auth::session_cookie(&auth.session_token),
        )],
        Json(serde_json::json!({ "ok": true })),
    ))
}
