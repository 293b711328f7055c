//! Lead and project workflow data model.
//!
//! A lead is one inbound prospect. Each lead carries up to three parallel
//! project workflows (company formation, bank account, legacy bank deal),
//! each a flat record of nullable milestone fields. Pipeline position is
//! never stored; it is derived from these fields by [`crate::stage`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentAssignment, ServiceKind};
use crate::error::WorkflowError;

// ── Project kinds ──────────────────────────────────────────────────────────

/// The three per-lead workflow tracks.
///
/// `BankDeal` is a legacy track kept for older leads; new bank work goes on
/// the `Bank` track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    Company,
    Bank,
    BankDeal,
}

impl ProjectKind {
    pub const ALL: [ProjectKind; 3] = [ProjectKind::Company, ProjectKind::Bank, ProjectKind::BankDeal];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Company => "company",
            ProjectKind::Bank => "bank",
            ProjectKind::BankDeal => "bank-deal",
        }
    }

    /// Human-facing name used in status labels and notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectKind::Company => "Company",
            ProjectKind::Bank => "Bank",
            ProjectKind::BankDeal => "Bank Deal",
        }
    }

    /// The agent service line this track is handled by.
    pub fn service(&self) -> ServiceKind {
        match self {
            ProjectKind::Company => ServiceKind::CompanyFormation,
            ProjectKind::Bank | ProjectKind::BankDeal => ServiceKind::BankAccount,
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectKind {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(ProjectKind::Company),
            "bank" => Ok(ProjectKind::Bank),
            "bank-deal" | "bank_deal" => Ok(ProjectKind::BankDeal),
            other => Err(WorkflowError::InvalidInput(format!(
                "unknown project kind: {other}"
            ))),
        }
    }
}

// ── Requested services ─────────────────────────────────────────────────────

/// What the prospect asked for on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    CompanyFormation,
    BankAccount,
    Both,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::CompanyFormation => "company_formation",
            ServiceType::BankAccount => "bank_account",
            ServiceType::Both => "both",
        }
    }

    /// The service lines an intake of this type should be routed to.
    pub fn service_lines(&self) -> Vec<ServiceKind> {
        match self {
            ServiceType::CompanyFormation => vec![ServiceKind::CompanyFormation],
            ServiceType::BankAccount => vec![ServiceKind::BankAccount],
            ServiceType::Both => vec![ServiceKind::CompanyFormation, ServiceKind::BankAccount],
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company_formation" => Ok(ServiceType::CompanyFormation),
            "bank_account" => Ok(ServiceType::BankAccount),
            "both" => Ok(ServiceType::Both),
            other => Err(WorkflowError::InvalidInput(format!(
                "unknown service type: {other}"
            ))),
        }
    }
}

// ── Project record ─────────────────────────────────────────────────────────

/// One project workflow track, stored flat.
///
/// Every milestone is a nullable timestamp (or amount/reason). `approved` is
/// tri-state: `None` means no decision yet. Decline is recorded twice, once
/// at quote level (`quote_declined_at`) and once at project level
/// (`declined_at` plus `decline_stage`), so a later quote re-send can clear
/// both layers together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub feasible: Option<bool>,
    pub quoted_amount: Option<Decimal>,
    pub quote_sent_at: Option<DateTime<Utc>>,
    pub quote_viewed_at: Option<DateTime<Utc>>,
    pub proceed_confirmed_at: Option<DateTime<Utc>>,
    pub quote_approved_at: Option<DateTime<Utc>>,
    pub approved: Option<bool>,
    pub quote_declined_at: Option<DateTime<Utc>>,
    pub quote_decline_reason: Option<String>,
    pub quote_questions_at: Option<DateTime<Utc>>,
    pub quote_questions_reason: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_sent_at: Option<DateTime<Utc>>,
    pub invoice_amount: Option<Decimal>,
    pub payment_link: Option<String>,
    pub payment_received_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub declined_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub decline_stage: Option<String>,
    pub payment_reminder_sent_at: Option<DateTime<Utc>>,
    pub payment_reminder_count: i32,
    pub invoice_version: i32,
}

impl Default for ProjectRecord {
    fn default() -> Self {
        ProjectRecord {
            feasible: None,
            quoted_amount: None,
            quote_sent_at: None,
            quote_viewed_at: None,
            proceed_confirmed_at: None,
            quote_approved_at: None,
            approved: None,
            quote_declined_at: None,
            quote_decline_reason: None,
            quote_questions_at: None,
            quote_questions_reason: None,
            invoice_number: None,
            invoice_sent_at: None,
            invoice_amount: None,
            payment_link: None,
            payment_received_at: None,
            completed_at: None,
            declined_at: None,
            decline_reason: None,
            decline_stage: None,
            payment_reminder_sent_at: None,
            payment_reminder_count: 0,
            invoice_version: 1,
        }
    }
}

impl ProjectRecord {
    /// Declined on either layer: explicit project decline, a recorded
    /// customer quote decline, or `approved` forced to `false`.
    pub fn is_declined(&self) -> bool {
        self.declined_at.is_some()
            || self.quote_declined_at.is_some()
            || self.approved == Some(false)
    }

    /// An invoice has gone out and payment has not been recorded.
    pub fn has_unpaid_invoice(&self) -> bool {
        self.invoice_sent_at.is_some() && self.payment_received_at.is_none()
    }

    /// Payment or completion recorded; destructive resets are refused.
    pub fn is_locked(&self) -> bool {
        self.payment_received_at.is_some() || self.completed_at.is_some()
    }

    /// A quote went out and the customer has not proceeded or declined.
    pub fn is_awaiting_decision(&self) -> bool {
        self.quote_sent_at.is_some() && self.approved.is_none() && !self.is_declined()
    }
}

// ── Lead ───────────────────────────────────────────────────────────────────

/// One inbound prospect with its parallel project tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_type: ServiceType,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub company: ProjectRecord,
    pub bank: ProjectRecord,
    pub bank_deal: ProjectRecord,
    #[serde(default)]
    pub assignments: Vec<AgentAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
        service_type: ServiceType,
    ) -> Self {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone,
            service_type,
            source: None,
            notes: None,
            company: ProjectRecord::default(),
            bank: ProjectRecord::default(),
            bank_deal: ProjectRecord::default(),
            assignments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn project(&self, kind: ProjectKind) -> &ProjectRecord {
        match kind {
            ProjectKind::Company => &self.company,
            ProjectKind::Bank => &self.bank,
            ProjectKind::BankDeal => &self.bank_deal,
        }
    }

    pub fn project_mut(&mut self, kind: ProjectKind) -> &mut ProjectRecord {
        match kind {
            ProjectKind::Company => &mut self.company,
            ProjectKind::Bank => &mut self.bank,
            ProjectKind::BankDeal => &mut self.bank_deal,
        }
    }

    /// True once an agent on the matching service line has made contact
    /// (or progressed further) for this track.
    pub fn agent_contacted(&self, kind: ProjectKind) -> bool {
        let line = kind.service();
        self.assignments
            .iter()
            .any(|a| a.service == line && a.status.counts_as_contact())
    }

    /// Current assignment for a service line, if any.
    pub fn current_assignment(&self, line: ServiceKind) -> Option<&AgentAssignment> {
        self.assignments
            .iter()
            .find(|a| a.service == line && a.is_current)
    }
}

// ── Activity log ───────────────────────────────────────────────────────────

/// One audit trail entry. Append-only; replayed no-op transitions are never
/// logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub action: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(lead_id: Uuid, action: impl Into<String>, message: impl Into<String>) -> Self {
        ActivityEntry {
            id: Uuid::new_v4(),
            lead_id,
            action: action.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
