//! Ports to the outside world.
//!
//! The core depends only on these traits; Postgres adapters live in
//! `ubd-postgres` and outbound senders in the server crate. Tests swap in
//! in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::{AgentAssignment, AssignmentStatus};
use crate::error::WorkflowError;
use crate::invoice::InvoiceRevision;
use crate::lead::{ActivityEntry, Lead, ProjectKind, ProjectRecord};
use crate::notify::{EmailMessage, WhatsAppMessage};
use crate::reminder::ReminderRun;

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Lead rows and their project tracks.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert a new lead together with its initial assignments.
    async fn create(&self, lead: &Lead) -> Result<()>;

    /// Load one lead with assignments. `NotFound` when missing.
    async fn load(&self, id: Uuid) -> Result<Lead>;

    /// All leads, newest first, assignments included.
    async fn list(&self) -> Result<Vec<Lead>>;

    /// Persist one project track.
    async fn update_project(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        record: &ProjectRecord,
    ) -> Result<()>;

    /// Persist all three tracks in one write. Used by the master reset.
    async fn update_all_projects(
        &self,
        lead_id: Uuid,
        company: &ProjectRecord,
        bank: &ProjectRecord,
        bank_deal: &ProjectRecord,
    ) -> Result<()>;

    /// Leads with an unpaid, undeclined invoice on the given track whose
    /// last reminder is older than `cutoff` (or absent), oldest invoice
    /// first, capped at `limit`.
    async fn reminder_candidates(
        &self,
        kind: ProjectKind,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Lead>>;

    /// Delete leads and every dependent row. Returns how many leads went.
    async fn delete_cascade(&self, ids: &[Uuid]) -> Result<u64>;
}

/// Agent assignment rows. Creation happens together with the lead through
/// [`LeadStore::create`].
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Update status, optionally making this the current assignment for its
    /// service line (clearing the flag on its siblings).
    async fn update_status(
        &self,
        lead_id: Uuid,
        assignment_id: Uuid,
        status: AssignmentStatus,
        make_current: bool,
    ) -> Result<AgentAssignment>;

    async fn delete_for_lead(&self, lead_id: Uuid) -> Result<u64>;
}

/// Append-only audit trail.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, entry: &ActivityEntry) -> Result<()>;
    async fn for_lead(&self, lead_id: Uuid) -> Result<Vec<ActivityEntry>>;
}

/// Issued-invoice history.
#[async_trait]
pub trait InvoiceRevisionStore: Send + Sync {
    async fn append(&self, revision: &InvoiceRevision) -> Result<()>;
    async fn for_project(&self, lead_id: Uuid, kind: ProjectKind) -> Result<Vec<InvoiceRevision>>;
}

/// Reminder batch run records.
#[async_trait]
pub trait ReminderRunStore: Send + Sync {
    async fn record(&self, run: &ReminderRun) -> Result<()>;
}

/// Outbound email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Outbound WhatsApp. Optional; the workflow reports sends as skipped when
/// no sender is configured.
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    async fn send(&self, message: &WhatsAppMessage) -> Result<()>;
}
