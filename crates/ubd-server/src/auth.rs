//! Admin session and shared-secret checks.
//!
//! The admin frontend logs in with one shared password and gets back an
//! `ubd_admin` cookie holding the session token (a SHA-256 digest of the
//! password). Admin handlers take the [`AdminSession`] extractor, which
//! rejects requests without a matching cookie before the handler body runs.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use ubd_core::error::WorkflowError;

use crate::error::AppError;

pub const ADMIN_COOKIE: &str = "ubd_admin";

/// Session cookies live half a day; admins log in each morning.
pub const SESSION_MAX_AGE_SECS: i64 = 43_200;

/// Shared secrets the HTTP layer checks against. Injected as an Extension
/// at router build.
#[derive(Clone)]
pub struct AuthKeys {
    pub admin_password: String,
    pub session_token: String,
    pub master_reset_key: String,
    pub cron_secret: String,
}

impl AuthKeys {
    pub fn new(
        admin_password: impl Into<String>,
        master_reset_key: impl Into<String>,
        cron_secret: impl Into<String>,
    ) -> Self {
        let admin_password = admin_password.into();
        AuthKeys {
            session_token: session_token_for(&admin_password),
            admin_password,
            master_reset_key: master_reset_key.into(),
            cron_secret: cron_secret.into(),
        }
    }
}

/// The cookie value handed out on login.
pub fn session_token_for(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// `Set-Cookie` header value for a fresh admin session.
pub fn session_cookie(token: &str) -> String {
    format!("{ADMIN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}")
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

/// Proof that the request carried a valid admin session cookie.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let keys = parts.extensions.get::<AuthKeys>().ok_or_else(|| {
            AppError(WorkflowError::Internal(anyhow::anyhow!(
                "AuthKeys extension missing from router"
            )))
        })?;
        let presented = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| cookie_value(h, ADMIN_COOKIE));
        match presented {
            Some(token) if token == keys.session_token => Ok(AdminSession),
            _ => Err(AppError(WorkflowError::Unauthorized(
                "admin session required".to_string(),
            ))),
        }
    }
}

/// Cron endpoint auth: `Authorization: Bearer <secret>` or a `?secret=`
/// query parameter.
pub fn cron_authorized(
    keys: &AuthKeys,
    bearer: Option<&str>,
    query_secret: Option<&str>,
) -> bool {
    bearer == Some(keys.cron_secret.as_str()) || query_secret == Some(keys.cron_secret.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_parsing() {
        let header = "theme=dark; ubd_admin=abc123; lang=en";
        assert_eq!(cookie_value(header, ADMIN_COOKIE), Some("abc123"));
        assert_eq!(cookie_value("theme=dark", ADMIN_COOKIE), None);
        assert_eq!(cookie_value("", ADMIN_COOKIE), None);
    }

    #[test]
    fn session_token_is_a_hex_digest() {
        let token = session_token_for("hunter2");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, session_token_for("hunter2"));
        assert_ne!(token, session_token_for("hunter3"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc");
        assert!(cookie.starts_with("ubd_admin=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=43200"));
    }

    #[test]
    fn cron_accepts_either_credential() {
        let keys = AuthKeys::new("pw", "reset", "cron-secret");
        assert!(cron_authorized(&keys, Some("cron-secret"), None));
        assert!(cron_authorized(&keys, None, Some("cron-secret")));
        assert!(!cron_authorized(&keys, Some("wrong"), None));
        assert!(!cron_authorized(&keys, None, None));
    }
}
