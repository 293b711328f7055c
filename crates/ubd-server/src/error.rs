//! HTTP error mapping.
//!
//! Handlers return [`AppError`]; the response body is always
//! `{"ok": false, "error": "..."}` with the status from
//! [`WorkflowError::http_status`]. Internal errors keep their detail out of
//! production responses.

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ubd_core::error::WorkflowError;
use ubd_core::Environment;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Record the deployment environment once at startup. Unset (as in tests)
/// behaves as development.
pub fn set_environment(environment: Environment) {
    let _ = ENVIRONMENT.set(environment);
}

fn environment() -> Environment {
    ENVIRONMENT
        .get()
        .copied()
        .unwrap_or(Environment::Development)
}

#[derive(Debug)]
pub struct AppError(pub WorkflowError);

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let detail = if self.0.is_client_fault() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, "request failed");
            if environment().is_production() {
                "internal error".to_string()
            } else {
                self.0.to_string()
            }
        };
        (
            status,
            Json(serde_json::json!({ "ok": false, "error": detail })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_faults_keep_their_message() {
        let (status, body) =
            body_of(AppError(WorkflowError::Precondition("quote not sent".into()))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "precondition failed: quote not sent");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let (status, body) =
            body_of(AppError(WorkflowError::Unauthorized("bad token".into()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("bad token"));
    }

    #[tokio::test]
    async fn internal_detail_shows_outside_production() {
        // Environment unset in tests, so development rules apply.
        let (status, body) =
            body_of(AppError(WorkflowError::Internal(anyhow::anyhow!("db gone")))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "db gone");
    }
}
