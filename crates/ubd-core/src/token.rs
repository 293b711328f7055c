//! Signed single-purpose links for customer actions.
//!
//! Quote decision pages and invoice views are reached through HS256 tokens
//! carried in emailed URLs. A token binds one lead, one project track and
//! one action; verification fails closed, so any decode problem surfaces as
//! an authorization error rather than a fallback to a default lead.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::lead::ProjectKind;
use crate::Environment;

/// Links stay valid this long; customers often sit on quotes for weeks.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Built-in secret for local development only. Production refuses to start
/// with this value.
const DEV_FALLBACK_SECRET: &str = "ubd-dev-only-token-secret";

/// What a token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenAction {
    #[serde(rename = "quote-decision")]
    QuoteDecision,
    #[serde(rename = "invoice-view")]
    InvoiceView,
}

impl TokenAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAction::QuoteDecision => "quote-decision",
            TokenAction::InvoiceView => "invoice-view",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    /// Absent on tokens minted before the bank track existed; treated as
    /// the company track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project: Option<ProjectKind>,
    action: TokenAction,
    iat: i64,
    exp: i64,
}

/// A verified token's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionToken {
    pub lead_id: Uuid,
    pub project: ProjectKind,
    pub action: TokenAction,
}

/// Issues and verifies customer-link tokens.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        TokenSigner {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Build a signer from configuration.
    ///
    /// Production requires a real secret. Development falls back to a
    /// built-in one and says so once.
    pub fn from_secret(
        secret: Option<String>,
        environment: Environment,
    ) -> Result<Self, WorkflowError> {
        let secret = secret.filter(|s| !s.trim().is_empty());
        match (secret, environment) {
            (Some(s), Environment::Production) if s == DEV_FALLBACK_SECRET => {
                Err(WorkflowError::InvalidInput(
                    "UBD_TOKEN_SECRET must not be the development default in production"
                        .to_string(),
                ))
            }
            (None, Environment::Production) => Err(WorkflowError::InvalidInput(
                "UBD_TOKEN_SECRET must be set in production".to_string(),
            )),
            (Some(s), _) => Ok(TokenSigner::new(&s)),
            (None, Environment::Development) => {
                static WARN_ONCE: std::sync::Once = std::sync::Once::new();
                WARN_ONCE.call_once(|| {
                    tracing::warn!(
                        "UBD_TOKEN_SECRET not set; using the built-in development secret"
                    );
                });
                Ok(TokenSigner::new(DEV_FALLBACK_SECRET))
            }
        }
    }

    pub fn issue(
        &self,
        lead_id: Uuid,
        project: ProjectKind,
        action: TokenAction,
    ) -> Result<String, WorkflowError> {
        let now = Utc::now();
        let claims = Claims {
            sub: lead_id.to_string(),
            project: Some(project),
            action,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| WorkflowError::Internal(anyhow::anyhow!("token encode failed: {e}")))
    }

    /// Decode and validate. Expired, tampered or malformed tokens all come
    /// back as `Unauthorized` with no further detail.
    pub fn verify(&self, token: &str) -> Result<TransitionToken, WorkflowError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| WorkflowError::Unauthorized("invalid or expired token".to_string()))?;
        let lead_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| WorkflowError::Unauthorized("invalid or expired token".to_string()))?;
        Ok(TransitionToken {
            lead_id,
            project: data.claims.project.unwrap_or(ProjectKind::Company),
            action: data.claims.action,
        })
    }

    /// Verify and additionally require the expected action.
    pub fn verify_for(
        &self,
        token: &str,
        action: TokenAction,
    ) -> Result<TransitionToken, WorkflowError> {
        let verified = self.verify(token)?;
        if verified.action != action {
            return Err(WorkflowError::Unauthorized(
                "token not valid for this action".to_string(),
            ));
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("unit-test-secret")
    }

    #[test]
    fn round_trip() {
        let lead_id = Uuid::new_v4();
        let token = signer()
            .issue(lead_id, ProjectKind::Bank, TokenAction::QuoteDecision)
            .unwrap();
        let verified = signer().verify(&token).unwrap();
        assert_eq!(verified.lead_id, lead_id);
        assert_eq!(verified.project, ProjectKind::Bank);
        assert_eq!(verified.action, TokenAction::QuoteDecision);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = signer()
            .issue(Uuid::new_v4(), ProjectKind::Company, TokenAction::InvoiceView)
            .unwrap();
        let other = TokenSigner::new("a-different-secret");
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            signer().verify("not-a-token").unwrap_err(),
            WorkflowError::Unauthorized(_)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            project: Some(ProjectKind::Company),
            action: TokenAction::QuoteDecision,
            iat: (now - Duration::days(40)).timestamp(),
            exp: (now - Duration::days(10)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert!(matches!(
            signer().verify(&token).unwrap_err(),
            WorkflowError::Unauthorized(_)
        ));
    }

    #[test]
    fn missing_project_claim_defaults_to_company() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            project: None,
            action: TokenAction::QuoteDecision,
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        let verified = signer().verify(&token).unwrap();
        assert_eq!(verified.project, ProjectKind::Company);
    }

    #[test]
    fn action_scope_is_enforced() {
        let token = signer()
            .issue(Uuid::new_v4(), ProjectKind::Company, TokenAction::InvoiceView)
            .unwrap();
        assert!(signer()
            .verify_for(&token, TokenAction::InvoiceView)
            .is_ok());
        assert!(matches!(
            signer()
                .verify_for(&token, TokenAction::QuoteDecision)
                .unwrap_err(),
            WorkflowError::Unauthorized(_)
        ));
    }

    #[test]
    fn production_refuses_missing_or_default_secret() {
        assert!(TokenSigner::from_secret(None, Environment::Production).is_err());
        assert!(TokenSigner::from_secret(
            Some(DEV_FALLBACK_SECRET.to_string()),
            Environment::Production
        )
        .is_err());
        assert!(TokenSigner::from_secret(
            Some("a-real-secret".to_string()),
            Environment::Production
        )
        .is_ok());
    }

    #[test]
    fn development_falls_back() {
        assert!(TokenSigner::from_secret(None, Environment::Development).is_ok());
        assert!(TokenSigner::from_secret(Some("  ".to_string()), Environment::Development).is_ok());
    }
}
