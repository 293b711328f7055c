//! Request and response shapes shared between the service and the HTTP
//! layer. All JSON is camelCase to match the existing admin and customer
//! frontends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AssignmentStatus;
use crate::invoice::InvoiceRevision;
use crate::lead::{ActivityEntry, Lead, ProjectKind, ServiceType};
use crate::notify::DispatchStatus;
use crate::reminder::ReminderRun;
use crate::status::ProjectStatusView;
use crate::transitions::QuoteDecision;

fn default_project() -> ProjectKind {
    ProjectKind::Company
}

// ── Requests ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeadRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub service_type: ServiceType,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub token: String,
    pub decision: QuoteDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of the older single-purpose proceed/decline endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDecisionRequest {
    pub token: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendQuoteRequest {
    #[serde(default = "default_project")]
    pub project: ProjectKind,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceRequest {
    #[serde(default = "default_project")]
    pub project: ProjectKind,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub payment_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDecisionRequest {
    #[serde(default = "default_project")]
    pub project: ProjectKind,
    pub decision: QuoteDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityRequest {
    #[serde(default = "default_project")]
    pub project: ProjectKind,
    pub feasible: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteAmountRequest {
    #[serde(default = "default_project")]
    pub project: ProjectKind,
    pub amount: Decimal,
}

/// Body for endpoints that only need to name a track.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(default = "default_project")]
    pub project: ProjectKind,
}

/// The wire field is `password` for compatibility with the existing admin
/// frontend; the value is checked against the configured master reset key.
#[derive(Debug, Clone, Deserialize)]
pub struct MasterResetRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatusRequest {
    pub status: AssignmentStatus,
    #[serde(default)]
    pub make_current: bool,
}

// ── Responses ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCreatedResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteViewResponse {
    pub viewed_at: DateTime<Utc>,
    pub already_viewed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDecisionResponse {
    pub success: bool,
    pub decision: QuoteDecision,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_proceeded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_declined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_asked: Option<bool>,
}

/// Everything the customer quote page needs to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetailsResponse {
    pub customer_name: String,
    pub project: ProjectKind,
    pub coverage: &'static str,
    pub amount: Option<Decimal>,
    pub quote_sent_at: Option<DateTime<Utc>>,
    pub quote_viewed_at: Option<DateTime<Utc>>,
    pub proceed_confirmed_at: Option<DateTime<Utc>>,
    pub approved: Option<bool>,
    pub quote_declined_at: Option<DateTime<Utc>>,
    pub quote_questions_at: Option<DateTime<Utc>>,
    pub invoice_sent_at: Option<DateTime<Utc>>,
    pub payment_received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSendResponse {
    pub sent_at: DateTime<Utc>,
    pub amount: Decimal,
    pub email: DispatchStatus,
    pub whatsapp: DispatchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceSendOutcome {
    /// A fresh invoice was issued.
    Issued,
    /// An unpaid invoice was outstanding; a reminder went out instead.
    Reminder,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSendResponse {
    pub outcome: InvoiceSendOutcome,
    pub invoice_number: String,
    pub version: i32,
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_count: Option<i32>,
    pub email: DispatchStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceViewResponse {
    pub customer_name: String,
    pub project: ProjectKind,
    pub invoice_number: String,
    pub version: i32,
    pub amount: Option<Decimal>,
    pub payment_link: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub payment_received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLinkResponse {
    pub url: String,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub received_at: DateTime<Utc>,
    pub already_paid: bool,
    pub status: ProjectStatusView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub completed_at: DateTime<Utc>,
    pub already_completed: bool,
    pub status: ProjectStatusView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDecisionResponse {
    pub decision: QuoteDecision,
    pub applied_at: DateTime<Utc>,
    pub status: ProjectStatusView,
}

/// Generic acknowledgement plus the refreshed status of the touched track.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUpdateResponse {
    pub ok: bool,
    pub status: ProjectStatusView,
}

/// Status of all three tracks, as shown in the admin list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSet {
    pub company: ProjectStatusView,
    pub bank: ProjectStatusView,
    pub bank_deal: ProjectStatusView,
}

impl StatusSet {
    pub fn for_lead(lead: &Lead) -> Self {
        StatusSet {
            company: ProjectStatusView::for_project(lead, ProjectKind::Company),
            bank: ProjectStatusView::for_project(lead, ProjectKind::Bank),
            bank_deal: ProjectStatusView::for_project(lead, ProjectKind::BankDeal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub ok: bool,
    pub statuses: StatusSet,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_type: ServiceType,
    pub source: Option<String>,
    pub statuses: StatusSet,
    pub created_at: DateTime<Utc>,
}

impl LeadSummary {
    pub fn from_lead(lead: &Lead) -> Self {
        LeadSummary {
            id: lead.id,
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            service_type: lead.service_type,
            source: lead.source.clone(),
            statuses: StatusSet::for_lead(lead),
            created_at: lead.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetailResponse {
    pub lead: Lead,
    pub statuses: StatusSet,
    pub activity: Vec<ActivityEntry>,
    pub invoice_revisions: Vec<InvoiceRevision>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Cron endpoint summary of one reminder batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
    pub processed: i32,
    pub sent: i32,
    pub skipped: i32,
    pub errors: Vec<String>,
}

impl From<&ReminderRun> for ReminderReport {
    fn from(run: &ReminderRun) -> Self {
        ReminderReport {
            processed: run.processed,
            sent: run.sent,
            skipped: run.skipped,
            errors: run.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::ServiceType;

    #[test]
    fn project_defaults_to_company() {
        let req: SendQuoteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.project, ProjectKind::Company);
        assert!(req.amount.is_none());

        let req: SendQuoteRequest =
            serde_json::from_str(r#"{"project":"bank","amount":"9500"}"#).unwrap();
        assert_eq!(req.project, ProjectKind::Bank);
        assert_eq!(req.amount, Some(Decimal::from(9500)));
    }

    #[test]
    fn decision_response_omits_absent_flags() {
        let resp = QuoteDecisionResponse {
            success: true,
            decision: QuoteDecision::Proceed,
            date: Utc::now(),
            already_proceeded: None,
            already_declined: None,
            already_asked: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("alreadyProceeded").is_none());
        assert_eq!(json["decision"], "proceed");

        let resp = QuoteDecisionResponse {
            already_proceeded: Some(true),
            ..resp
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["alreadyProceeded"], true);
    }

    #[test]
    fn summary_uses_camel_case_keys() {
        let lead = Lead::new("A", "a@example.com", None, ServiceType::CompanyFormation);
        let json = serde_json::to_value(LeadSummary::from_lead(&lead)).unwrap();
        assert!(json.get("serviceType").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json["statuses"].get("bankDeal").is_some());
        assert_eq!(json["statuses"]["company"]["stage"], "new");
    }
}
