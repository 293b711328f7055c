//! Shared harness for the HTTP integration tests.
//!
//! Builds the real router and service on top of in-memory stores, so the
//! tests exercise routing, extractors, serialization and workflow rules
//! without a database. Outbound mail and WhatsApp are captured for
//! inspection instead of sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use hyper::Request;
use tower::ServiceExt;
use uuid::Uuid;

use ubd_core::agent::{AgentAssignment, AssignmentStatus};
use ubd_core::error::WorkflowError;
use ubd_core::invoice::InvoiceRevision;
use ubd_core::lead::{ActivityEntry, Lead, ProjectKind, ProjectRecord};
use ubd_core::notify::{EmailMessage, WhatsAppMessage};
use ubd_core::ports::{
    ActivityLog, AssignmentStore, InvoiceRevisionStore, LeadStore, Mailer, ReminderRunStore,
    Result, WhatsAppSender,
};
use ubd_core::reminder::ReminderRun;
use ubd_core::service::{WorkflowService, WorkflowServiceImpl};
use ubd_core::token::TokenSigner;
use ubd_server::auth::{self, AuthKeys};
use ubd_server::router::build_router;

pub const TOKEN_SECRET: &str = "integration-test-token-secret";
pub const ADMIN_PASSWORD: &str = "test-admin-pw";
pub const MASTER_RESET_KEY: &str = "test-master-key";
pub const CRON_SECRET: &str = "test-cron-secret";
pub const BASE_URL: &str = "http://test.local";
pub const ADMIN_EMAIL: &str = "ops@test.local";

// ── In-memory stores ───────────────────────────────────────────

/// Leads and their assignments live in one map, like one database.
pub type SharedLeads = Arc<Mutex<HashMap<Uuid, Lead>>>;

pub struct MemoryLeadStore {
    leads: SharedLeads,
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn create(&self, lead: &Lead) -> Result<()> {
        self.leads.lock().unwrap().insert(lead.id, lead.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Lead> {
        self.leads
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(format!("lead {id} not found")))
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        let mut all: Vec<Lead> = self.leads.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_project(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        record: &ProjectRecord,
    ) -> Result<()> {
        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .get_mut(&lead_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("lead {lead_id} not found")))?;
        *lead.project_mut(kind) = record.clone();
        lead.updated_at = Utc::now();
        Ok(())
    }

    async fn update_all_projects(
        &self,
        lead_id: Uuid,
        company: &ProjectRecord,
        bank: &ProjectRecord,
        bank_deal: &ProjectRecord,
    ) -> Result<()> {
        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .get_mut(&lead_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("lead {lead_id} not found")))?;
        lead.company = company.clone();
        lead.bank = bank.clone();
        lead.bank_deal = bank_deal.clone();
        lead.updated_at = Utc::now();
        Ok(())
    }

    async fn reminder_candidates(
        &self,
        kind: ProjectKind,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Lead>> {
        let mut due: Vec<Lead> = self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|lead| {
                let p = lead.project(kind);
                p.has_unpaid_invoice()
                    && !p.is_declined()
                    && p.payment_reminder_sent_at.map_or(true, |at| at <= cutoff)
            })
            .cloned()
            .collect();
        due.sort_by_key(|lead| lead.project(kind).invoice_sent_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn delete_cascade(&self, ids: &[Uuid]) -> Result<u64> {
        let mut leads = self.leads.lock().unwrap();
        let mut deleted = 0;
        for id in ids {
            if leads.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

pub struct MemoryAssignmentStore {
    leads: SharedLeads,
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn update_status(
        &self,
        lead_id: Uuid,
        assignment_id: Uuid,
        status: AssignmentStatus,
        make_current: bool,
    ) -> Result<AgentAssignment> {
        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .get_mut(&lead_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("lead {lead_id} not found")))?;
        let service = lead
            .assignments
            .iter()
            .find(|a| a.id == assignment_id)
            .map(|a| a.service)
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("assignment {assignment_id} not found"))
            })?;

        let now = Utc::now();
        let mut updated = None;
        for a in &mut lead.assignments {
            if a.id == assignment_id {
                a.status = status;
                a.updated_at = now;
                if make_current {
                    a.is_current = true;
                }
                updated = Some(a.clone());
            } else if make_current && a.service == service {
                a.is_current = false;
            }
        }
        updated.ok_or_else(|| {
            WorkflowError::NotFound(format!("assignment {assignment_id} not found"))
        })
    }

    async fn delete_for_lead(&self, lead_id: Uuid) -> Result<u64> {
        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .get_mut(&lead_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("lead {lead_id} not found")))?;
        let count = lead.assignments.len() as u64;
        lead.assignments.clear();
        Ok(count)
    }
}

#[derive(Default)]
pub struct MemoryActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn append(&self, entry: &ActivityEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn for_lead(&self, lead_id: Uuid) -> Result<Vec<ActivityEntry>> {
        // Newest first, like the database ordering.
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.lead_id == lead_id)
            .rev()
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryRevisionStore {
    revisions: Mutex<Vec<InvoiceRevision>>,
}

#[async_trait]
impl InvoiceRevisionStore for MemoryRevisionStore {
    async fn append(&self, revision: &InvoiceRevision) -> Result<()> {
        self.revisions.lock().unwrap().push(revision.clone());
        Ok(())
    }

    async fn for_project(&self, lead_id: Uuid, kind: ProjectKind) -> Result<Vec<InvoiceRevision>> {
        let mut matching: Vec<InvoiceRevision> = self
            .revisions
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.lead_id == lead_id && r.project == kind)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(matching)
    }
}

#[derive(Default)]
pub struct MemoryRunStore {
    pub runs: Mutex<Vec<ReminderRun>>,
}

#[async_trait]
impl ReminderRunStore for MemoryRunStore {
    async fn record(&self, run: &ReminderRun) -> Result<()> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }
}

// ── Captured outbound channels ─────────────────────────────────

#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl CapturingMailer {
    /// Make every subsequent send fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Drain everything captured so far.
    pub fn take(&self) -> Vec<EmailMessage> {
        std::mem::take(&mut self.sent.lock().unwrap())
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WorkflowError::Internal(anyhow::anyhow!("smtp relay down")));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturingWhatsApp {
    sent: Mutex<Vec<WhatsAppMessage>>,
}

impl CapturingWhatsApp {
    pub fn take(&self) -> Vec<WhatsAppMessage> {
        std::mem::take(&mut self.sent.lock().unwrap())
    }
}

#[async_trait]
impl WhatsAppSender for CapturingWhatsApp {
    async fn send(&self, message: &WhatsAppMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ── Test app ───────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub leads: SharedLeads,
    pub mailer: Arc<CapturingMailer>,
    pub whatsapp: Arc<CapturingWhatsApp>,
    pub runs: Arc<MemoryRunStore>,
}

impl TestApp {
    /// App without a WhatsApp sender; quote sends report the channel as
    /// skipped.
    pub fn build() -> Self {
        TestApp::assemble(false)
    }

    pub fn build_with_whatsapp() -> Self {
        TestApp::assemble(true)
    }

    fn assemble(with_whatsapp: bool) -> Self {
        let leads: SharedLeads = Arc::new(Mutex::new(HashMap::new()));
        let mailer = Arc::new(CapturingMailer::default());
        let whatsapp = Arc::new(CapturingWhatsApp::default());
        let runs = Arc::new(MemoryRunStore::default());

        let mut service = WorkflowServiceImpl::new(
            Arc::new(MemoryLeadStore {
                leads: Arc::clone(&leads),
            }),
            Arc::new(MemoryAssignmentStore {
                leads: Arc::clone(&leads),
            }),
            Arc::new(MemoryActivityLog::default()),
            Arc::new(MemoryRevisionStore::default()),
            Arc::clone(&runs) as Arc<dyn ReminderRunStore>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            TokenSigner::new(TOKEN_SECRET),
            BASE_URL,
            ADMIN_EMAIL,
        );
        if with_whatsapp {
            service = service.with_whatsapp(Arc::clone(&whatsapp) as Arc<dyn WhatsAppSender>);
        }

        let service: Arc<dyn WorkflowService> = Arc::new(service);
        let auth = AuthKeys::new(ADMIN_PASSWORD, MASTER_RESET_KEY, CRON_SECRET);
        TestApp {
            router: build_router(service, auth),
            leads,
            mailer,
            whatsapp,
            runs,
        }
    }

    // ── Requests ───────────────────────────────────────────────

    pub async fn post(&self, uri: &str, body: &serde_json::Value) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_admin(
        &self,
        uri: &str,
        body: &serde_json::Value,
    ) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("cookie", admin_cookie())
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> axum::response::Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get_admin(&self, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .uri(uri)
            .header("cookie", admin_cookie())
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_bearer(&self, uri: &str, bearer: &str) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {bearer}"))
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    // ── Direct state access ────────────────────────────────────

    /// Pretend the last reminder on this track went out `hours` ago, so
    /// cooldown scenarios need no sleeping.
    pub fn age_last_reminder(&self, lead_id: Uuid, kind: ProjectKind, hours: i64) {
        let mut leads = self.leads.lock().unwrap();
        let lead = leads.get_mut(&lead_id).expect("lead not seeded");
        lead.project_mut(kind).payment_reminder_sent_at =
            Some(Utc::now() - Duration::hours(hours));
    }

    pub fn project(&self, lead_id: Uuid, kind: ProjectKind) -> ProjectRecord {
        let leads = self.leads.lock().unwrap();
        leads
            .get(&lead_id)
            .expect("lead not seeded")
            .project(kind)
            .clone()
    }
}

/// Cookie header value for an already-logged-in admin.
pub fn admin_cookie() -> String {
    format!(
        "{}={}",
        auth::ADMIN_COOKIE,
        auth::session_token_for(ADMIN_PASSWORD)
    )
}

pub async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::json!({ "raw": String::from_utf8_lossy(&bytes).to_string() })
    })
}

/// Pull the signed token out of a captured email body. Links end the token
/// at the first character outside the JWT alphabet.
pub fn extract_token(body: &str) -> String {
    let start = body.find("token=").expect("no token link in email body") + "token=".len();
    body[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}
