//! Workflow service: the one writer for lead workflow state.
//!
//! Orchestrates token checks, the pure transitions in
//! [`crate::transitions`], persistence through the store ports and
//! best-effort notifications. HTTP handlers stay thin; everything they do
//! goes through [`WorkflowService`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::agent::{AgentAssignment, AgentRouting, AssignmentStatus};
use crate::error::WorkflowError;
use crate::invoice::{self, InvoiceRevision};
use crate::lead::{ActivityEntry, Lead, ProjectKind};
use crate::notify::{self, AdminEvent, DispatchStatus, EmailMessage};
use crate::ports::{
    ActivityLog, AssignmentStore, InvoiceRevisionStore, LeadStore, Mailer, ReminderRunStore,
    Result, WhatsAppSender,
};
use crate::proto::*;
use crate::reminder::{self, ReminderRun, REMINDER_BATCH_LIMIT};
use crate::status::ProjectStatusView;
use crate::token::{TokenAction, TokenSigner};
use crate::transitions::{self, QuoteDecision};

/// Every lead workflow operation the HTTP layer exposes.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    // Intake and admin reads.
    async fn create_lead(&self, req: NewLeadRequest) -> Result<LeadCreatedResponse>;
    async fn list_leads(&self) -> Result<Vec<LeadSummary>>;
    async fn lead_detail(&self, lead_id: Uuid) -> Result<LeadDetailResponse>;

    // Customer actions, gated by signed tokens.
    async fn record_quote_view(&self, token: &str) -> Result<QuoteViewResponse>;
    async fn quote_details(&self, token: &str) -> Result<QuoteDetailsResponse>;
    async fn decide_quote(
        &self,
        token: &str,
        decision: QuoteDecision,
        reason: Option<String>,
    ) -> Result<QuoteDecisionResponse>;
    async fn invoice_details(&self, token: &str) -> Result<InvoiceViewResponse>;

    // Admin workflow actions.
    async fn send_quote(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        amount: Option<Decimal>,
    ) -> Result<QuoteSendResponse>;
    async fn send_invoice(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        amount: Option<Decimal>,
        payment_link: Option<String>,
    ) -> Result<InvoiceSendResponse>;
    async fn send_payment_reminder(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
    ) -> Result<InvoiceSendResponse>;
    async fn invoice_link(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        version: Option<i32>,
    ) -> Result<InvoiceLinkResponse>;
    async fn override_decision(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        decision: QuoteDecision,
        reason: Option<String>,
    ) -> Result<OverrideDecisionResponse>;
    async fn set_feasibility(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        feasible: bool,
    ) -> Result<TrackUpdateResponse>;
    async fn set_quote_amount(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        amount: Decimal,
    ) -> Result<TrackUpdateResponse>;
    async fn mark_payment_received(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
    ) -> Result<PaymentResponse>;
    async fn mark_completed(&self, lead_id: Uuid, kind: ProjectKind)
        -> Result<CompletionResponse>;

    // Resets and housekeeping.
    async fn reset_project(&self, lead_id: Uuid, kind: ProjectKind) -> Result<ResetResponse>;
    async fn master_reset(&self, lead_id: Uuid) -> Result<ResetResponse>;
    async fn update_assignment(
        &self,
        lead_id: Uuid,
        assignment_id: Uuid,
        status: AssignmentStatus,
        make_current: bool,
    ) -> Result<AgentAssignment>;
    async fn bulk_delete(&self, ids: &[Uuid]) -> Result<BulkDeleteResponse>;

    // Scheduler.
    async fn run_payment_reminders(&self) -> Result<ReminderRun>;
}

/// Production implementation wired to real stores and senders.
pub struct WorkflowServiceImpl {
    leads: Arc<dyn LeadStore>,
    assignments: Arc<dyn AssignmentStore>,
    activity: Arc<dyn ActivityLog>,
    revisions: Arc<dyn InvoiceRevisionStore>,
    reminder_runs: Arc<dyn ReminderRunStore>,
    mailer: Arc<dyn Mailer>,
    whatsapp: Option<Arc<dyn WhatsAppSender>>,
    signer: TokenSigner,
    base_url: String,
    admin_email: String,
    routing: AgentRouting,
}

impl WorkflowServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        leads: Arc<dyn LeadStore>,
        assignments: Arc<dyn AssignmentStore>,
        activity: Arc<dyn ActivityLog>,
        revisions: Arc<dyn InvoiceRevisionStore>,
        reminder_runs: Arc<dyn ReminderRunStore>,
        mailer: Arc<dyn Mailer>,
        signer: TokenSigner,
        base_url: impl Into<String>,
        admin_email: impl Into<String>,
    ) -> Self {
        WorkflowServiceImpl {
            leads,
            assignments,
            activity,
            revisions,
            reminder_runs,
            mailer,
            whatsapp: None,
            signer,
            base_url: base_url.into(),
            admin_email: admin_email.into(),
            routing: AgentRouting::default(),
        }
    }

    pub fn with_whatsapp(mut self, sender: Arc<dyn WhatsAppSender>) -> Self {
        self.whatsapp = Some(sender);
        self
    }

    pub fn with_routing(mut self, routing: AgentRouting) -> Self {
        self.routing = routing;
        self
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn decision_url(&self, token: &str) -> String {
        format!(
            "{}/quote/decision?token={}",
            self.base_url.trim_end_matches('/'),
            token
        )
    }

    fn invoice_url(&self, token: &str, version: Option<i32>) -> String {
        let mut url = format!(
            "{}/invoice/view?token={}",
            self.base_url.trim_end_matches('/'),
            token
        );
        if let Some(v) = version {
            url.push_str(&format!("&version={v}"));
        }
        url
    }

    async fn log(&self, lead_id: Uuid, action: &str, message: String) -> Result<()> {
        self.activity
            .append(&ActivityEntry::new(lead_id, action, message))
            .await
    }

    /// Send one email, mapping the result into a dispatch status. Failures
    /// are logged and reported, never propagated.
    async fn send_email(&self, message: &EmailMessage) -> DispatchStatus {
        match self.mailer.send(message).await {
            Ok(()) => DispatchStatus::sent(),
            Err(e) => {
                tracing::warn!(to = %message.to, error = %e, "email send failed");
                DispatchStatus::failed(e.to_string())
            }
        }
    }

    /// Admin inbox alert for customer-triggered events. Best effort.
    async fn notify_admin(&self, lead: &Lead, track: Option<ProjectKind>, event: AdminEvent) {
        let message = notify::admin_email(&self.admin_email, lead, track, &event);
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!(lead_id = %lead.id, error = %e, "admin notification failed");
        }
    }

    /// Email a payment reminder and, on success, bump the counters and
    /// persist. Returns the dispatch status and the resulting count.
    async fn dispatch_reminder(
        &self,
        lead: &mut Lead,
        kind: ProjectKind,
        now: chrono::DateTime<Utc>,
    ) -> Result<(DispatchStatus, i32)> {
        let invoice_number = lead
            .project(kind)
            .invoice_number
            .clone()
            .ok_or_else(|| {
                WorkflowError::Internal(anyhow::anyhow!(
                    "invoice sent without a number on lead {}",
                    lead.id
                ))
            })?;
        let token = self
            .signer
            .issue(lead.id, kind, TokenAction::InvoiceView)?;
        let url = self.invoice_url(&token, None);
        let message = notify::reminder_email(
            lead,
            kind,
            &invoice_number,
            lead.project(kind).invoice_amount,
            &url,
            lead.project(kind).payment_link.as_deref(),
        );

        let status = self.send_email(&message).await;
        if !status.ok {
            return Ok((status, lead.project(kind).payment_reminder_count));
        }

        transitions::record_reminder(lead.project_mut(kind), now);
        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        let count = lead.project(kind).payment_reminder_count;
        self.log(
            lead.id,
            "payment_reminder",
            format!(
                "Payment reminder #{count} sent for {} invoice {invoice_number}",
                kind.display_name()
            ),
        )
        .await?;
        Ok((status, count))
    }
}

fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(WorkflowError::InvalidInput(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl WorkflowService for WorkflowServiceImpl {
    async fn create_lead(&self, req: NewLeadRequest) -> Result<LeadCreatedResponse> {
        let name = req.name.trim();
        let email = req.email.trim();
        if name.is_empty() {
            return Err(WorkflowError::InvalidInput("name is required".to_string()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(WorkflowError::InvalidInput(
                "a valid email is required".to_string(),
            ));
        }

        let mut lead = Lead::new(name, email, req.phone, req.service_type);
        lead.source = req.source;
        lead.notes = req.notes;
        for line in req.service_type.service_lines() {
            lead.assignments.push(AgentAssignment::new(
                lead.id,
                line,
                self.routing.agent_for(line),
                1,
            ));
        }

        self.leads.create(&lead).await?;
        self.log(
            lead.id,
            "lead_created",
            format!("Lead captured for {}", lead.service_type),
        )
        .await?;
        self.notify_admin(&lead, None, AdminEvent::LeadCaptured).await;
        tracing::info!(lead_id = %lead.id, service = %lead.service_type, "lead captured");

        Ok(LeadCreatedResponse {
            id: lead.id,
            created_at: lead.created_at,
        })
    }

    async fn list_leads(&self) -> Result<Vec<LeadSummary>> {
        let leads = self.leads.list().await?;
        Ok(leads.iter().map(LeadSummary::from_lead).collect())
    }

    async fn lead_detail(&self, lead_id: Uuid) -> Result<LeadDetailResponse> {
        let lead = self.leads.load(lead_id).await?;
        let activity = self.activity.for_lead(lead_id).await?;
        let mut invoice_revisions = Vec::new();
        for kind in ProjectKind::ALL {
            invoice_revisions.extend(self.revisions.for_project(lead_id, kind).await?);
        }
        invoice_revisions.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));

        Ok(LeadDetailResponse {
            statuses: StatusSet::for_lead(&lead),
            lead,
            activity,
            invoice_revisions,
        })
    }

    async fn record_quote_view(&self, token: &str) -> Result<QuoteViewResponse> {
        let claims = self.signer.verify_for(token, TokenAction::QuoteDecision)?;
        let mut lead = self.leads.load(claims.lead_id).await?;
        let kind = claims.project;

        let outcome = transitions::record_quote_view(lead.project_mut(kind), Utc::now())?;
        if !outcome.already_viewed {
            self.leads
                .update_project(lead.id, kind, lead.project(kind))
                .await?;
            self.log(
                lead.id,
                "quote_viewed",
                format!("{} quote viewed by customer", kind.display_name()),
            )
            .await?;
            self.notify_admin(&lead, Some(kind), AdminEvent::QuoteViewed)
                .await;
        }

        Ok(QuoteViewResponse {
            viewed_at: outcome.viewed_at,
            already_viewed: outcome.already_viewed,
        })
    }

    async fn quote_details(&self, token: &str) -> Result<QuoteDetailsResponse> {
        let claims = self.signer.verify_for(token, TokenAction::QuoteDecision)?;
        let lead = self.leads.load(claims.lead_id).await?;
        let p = lead.project(claims.project);

        Ok(QuoteDetailsResponse {
            customer_name: lead.name.clone(),
            project: claims.project,
            coverage: notify::coverage_description(claims.project),
            amount: p.quoted_amount,
            quote_sent_at: p.quote_sent_at,
            quote_viewed_at: p.quote_viewed_at,
            proceed_confirmed_at: p.proceed_confirmed_at,
            approved: p.approved,
            quote_declined_at: p.quote_declined_at,
            quote_questions_at: p.quote_questions_at,
            invoice_sent_at: p.invoice_sent_at,
            payment_received_at: p.payment_received_at,
        })
    }

    async fn decide_quote(
        &self,
        token: &str,
        decision: QuoteDecision,
        reason: Option<String>,
    ) -> Result<QuoteDecisionResponse> {
        let claims = self.signer.verify_for(token, TokenAction::QuoteDecision)?;
        let mut lead = self.leads.load(claims.lead_id).await?;
        let kind = claims.project;
        let now = Utc::now();

        let outcome = match decision {
            QuoteDecision::Proceed => transitions::proceed(lead.project_mut(kind), now),
            QuoteDecision::Decline => {
                transitions::decline(lead.project_mut(kind), now, reason.clone())
            }
            QuoteDecision::Questions => {
                transitions::questions(lead.project_mut(kind), now, reason.clone())
            }
        };

        if !outcome.replayed {
            self.leads
                .update_project(lead.id, kind, lead.project(kind))
                .await?;
            let track = kind.display_name();
            let (action, message, event) = match decision {
                QuoteDecision::Proceed => (
                    "quote_proceeded",
                    format!("Customer accepted the {track} quote"),
                    AdminEvent::CustomerProceeded,
                ),
                QuoteDecision::Decline => (
                    "quote_declined",
                    format!("Customer declined the {track} quote"),
                    AdminEvent::CustomerDeclined {
                        reason: reason.clone(),
                    },
                ),
                QuoteDecision::Questions => (
                    "quote_questions",
                    format!("Customer raised questions on the {track} quote"),
                    AdminEvent::QuestionsRaised {
                        reason: reason.clone(),
                    },
                ),
            };
            self.log(lead.id, action, message).await?;
            self.notify_admin(&lead, Some(kind), event).await;
            tracing::info!(lead_id = %lead.id, project = %kind, decision = %decision, "quote decision recorded");
        }

        Ok(QuoteDecisionResponse {
            success: true,
            decision,
            date: outcome.decided_at,
            already_proceeded: (outcome.replayed && decision == QuoteDecision::Proceed)
                .then_some(true),
            already_declined: (outcome.replayed && decision == QuoteDecision::Decline)
                .then_some(true),
            already_asked: (outcome.replayed && decision == QuoteDecision::Questions)
                .then_some(true),
        })
    }

    async fn invoice_details(&self, token: &str) -> Result<InvoiceViewResponse> {
        let claims = self.signer.verify_for(token, TokenAction::InvoiceView)?;
        let lead = self.leads.load(claims.lead_id).await?;
        let p = lead.project(claims.project);

        let (invoice_number, sent_at) = match (&p.invoice_number, p.invoice_sent_at) {
            (Some(number), Some(sent_at)) => (number.clone(), sent_at),
            _ => {
                return Err(WorkflowError::NotFound(
                    "no invoice has been issued for this project".to_string(),
                ))
            }
        };

        Ok(InvoiceViewResponse {
            customer_name: lead.name.clone(),
            project: claims.project,
            invoice_number,
            version: p.invoice_version,
            amount: p.invoice_amount,
            payment_link: p.payment_link.clone(),
            sent_at,
            payment_received_at: p.payment_received_at,
        })
    }

    async fn send_quote(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        amount: Option<Decimal>,
    ) -> Result<QuoteSendResponse> {
        if let Some(amount) = amount {
            require_positive(amount)?;
        }
        let mut lead = self.leads.load(lead_id).await?;
        let now = Utc::now();

        let outcome = transitions::send_quote(lead.project_mut(kind), now, amount)?;
        let token = self.signer.issue(lead.id, kind, TokenAction::QuoteDecision)?;
        let url = self.decision_url(&token);

        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        self.log(
            lead.id,
            "quote_sent",
            format!(
                "{} quote sent for AED {}",
                kind.display_name(),
                outcome.amount
            ),
        )
        .await?;

        let email = self
            .send_email(&notify::quote_email(&lead, kind, outcome.amount, &url))
            .await;
        let whatsapp = match (
            &self.whatsapp,
            notify::quote_whatsapp(&lead, kind, outcome.amount, &url),
        ) {
            (Some(sender), Some(message)) => match sender.send(&message).await {
                Ok(()) => DispatchStatus::sent(),
                Err(e) => {
                    tracing::warn!(lead_id = %lead.id, error = %e, "whatsapp send failed");
                    DispatchStatus::failed(e.to_string())
                }
            },
            _ => DispatchStatus::skipped(),
        };
        tracing::info!(lead_id = %lead.id, project = %kind, amount = %outcome.amount, "quote sent");

        Ok(QuoteSendResponse {
            sent_at: outcome.sent_at,
            amount: outcome.amount,
            email,
            whatsapp,
        })
    }

    async fn send_invoice(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        amount: Option<Decimal>,
        payment_link: Option<String>,
    ) -> Result<InvoiceSendResponse> {
        if let Some(amount) = amount {
            require_positive(amount)?;
        }
        let mut lead = self.leads.load(lead_id).await?;
        let now = Utc::now();

        // An outstanding unpaid invoice turns this into a reminder.
        if lead.project(kind).has_unpaid_invoice() {
            let last = lead.project(kind).payment_reminder_sent_at;
            if !reminder::cooldown_elapsed(last, now) {
                return Err(WorkflowError::Precondition(
                    "a reminder went out within the last 48 hours".to_string(),
                ));
            }
            let (email, count) = self.dispatch_reminder(&mut lead, kind, now).await?;
            let p = lead.project(kind);
            return Ok(InvoiceSendResponse {
                outcome: InvoiceSendOutcome::Reminder,
                invoice_number: p.invoice_number.clone().unwrap_or_default(),
                version: p.invoice_version,
                sent_at: now,
                reminder_count: Some(count),
                email,
            });
        }

        let number = invoice::invoice_number(now);
        let outcome = transitions::issue_invoice(
            lead.project_mut(kind),
            now,
            number,
            amount,
            payment_link,
        )?;
        let token = self.signer.issue(lead.id, kind, TokenAction::InvoiceView)?;
        let url = self.invoice_url(&token, None);

        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        self.revisions
            .append(&InvoiceRevision::new(
                lead.id,
                kind,
                outcome.version,
                &outcome.invoice_number,
                Some(outcome.amount),
                now,
            ))
            .await?;
        self.log(
            lead.id,
            "invoice_sent",
            format!(
                "Invoice {} (v{}) sent for {}",
                outcome.invoice_number,
                outcome.version,
                kind.display_name()
            ),
        )
        .await?;

        let email = self
            .send_email(&notify::invoice_email(
                &lead,
                kind,
                &outcome.invoice_number,
                outcome.amount,
                &url,
                lead.project(kind).payment_link.as_deref(),
            ))
            .await;
        tracing::info!(
            lead_id = %lead.id,
            project = %kind,
            invoice = %outcome.invoice_number,
            version = outcome.version,
            "invoice issued"
        );

        Ok(InvoiceSendResponse {
            outcome: InvoiceSendOutcome::Issued,
            invoice_number: outcome.invoice_number,
            version: outcome.version,
            sent_at: outcome.sent_at,
            reminder_count: None,
            email,
        })
    }

    async fn send_payment_reminder(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
    ) -> Result<InvoiceSendResponse> {
        let mut lead = self.leads.load(lead_id).await?;
        let now = Utc::now();
        let p = lead.project(kind);

        if !p.has_unpaid_invoice() {
            return Err(WorkflowError::Precondition(
                "no unpaid invoice outstanding for this project".to_string(),
            ));
        }
        if !reminder::cooldown_elapsed(p.payment_reminder_sent_at, now) {
            return Err(WorkflowError::Precondition(
                "a reminder went out within the last 48 hours".to_string(),
            ));
        }

        let (email, count) = self.dispatch_reminder(&mut lead, kind, now).await?;
        let p = lead.project(kind);
        Ok(InvoiceSendResponse {
            outcome: InvoiceSendOutcome::Reminder,
            invoice_number: p.invoice_number.clone().unwrap_or_default(),
            version: p.invoice_version,
            sent_at: now,
            reminder_count: Some(count),
            email,
        })
    }

    async fn invoice_link(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        version: Option<i32>,
    ) -> Result<InvoiceLinkResponse> {
        let lead = self.leads.load(lead_id).await?;
        let p = lead.project(kind);
        if p.invoice_number.is_none() {
            return Err(WorkflowError::NotFound(
                "no invoice has been issued for this project".to_string(),
            ));
        }
        if let Some(v) = version {
            if v < 1 || v > p.invoice_version {
                return Err(WorkflowError::InvalidInput(format!(
                    "invoice version {v} does not exist"
                )));
            }
        }

        let token = self.signer.issue(lead.id, kind, TokenAction::InvoiceView)?;
        Ok(InvoiceLinkResponse {
            url: self.invoice_url(&token, version),
            version: version.unwrap_or(p.invoice_version),
        })
    }

    async fn override_decision(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        decision: QuoteDecision,
        reason: Option<String>,
    ) -> Result<OverrideDecisionResponse> {
        let mut lead = self.leads.load(lead_id).await?;
        let now = Utc::now();

        transitions::override_decision(lead.project_mut(kind), now, decision, reason);
        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        self.log(
            lead.id,
            "decision_override",
            format!(
                "Decision forced to '{decision}' on the {} track",
                kind.display_name()
            ),
        )
        .await?;
        tracing::info!(lead_id = %lead.id, project = %kind, decision = %decision, "decision override applied");

        Ok(OverrideDecisionResponse {
            decision,
            applied_at: now,
            status: ProjectStatusView::for_project(&lead, kind),
        })
    }

    async fn set_feasibility(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        feasible: bool,
    ) -> Result<TrackUpdateResponse> {
        let mut lead = self.leads.load(lead_id).await?;
        lead.project_mut(kind).feasible = Some(feasible);
        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        self.log(
            lead.id,
            "feasibility_set",
            format!(
                "{} track marked {}",
                kind.display_name(),
                if feasible { "feasible" } else { "not feasible" }
            ),
        )
        .await?;

        Ok(TrackUpdateResponse {
            ok: true,
            status: ProjectStatusView::for_project(&lead, kind),
        })
    }

    async fn set_quote_amount(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        amount: Decimal,
    ) -> Result<TrackUpdateResponse> {
        require_positive(amount)?;
        let mut lead = self.leads.load(lead_id).await?;
        lead.project_mut(kind).quoted_amount = Some(amount);
        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        self.log(
            lead.id,
            "quote_amount_set",
            format!("{} quote amount set to AED {amount}", kind.display_name()),
        )
        .await?;

        Ok(TrackUpdateResponse {
            ok: true,
            status: ProjectStatusView::for_project(&lead, kind),
        })
    }

    async fn mark_payment_received(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
    ) -> Result<PaymentResponse> {
        let mut lead = self.leads.load(lead_id).await?;
        let outcome = transitions::mark_payment_received(lead.project_mut(kind), Utc::now())?;

        if !outcome.already_paid {
            self.leads
                .update_project(lead.id, kind, lead.project(kind))
                .await?;
            self.log(
                lead.id,
                "payment_received",
                format!("Payment received on the {} track", kind.display_name()),
            )
            .await?;
            self.notify_admin(&lead, Some(kind), AdminEvent::PaymentReceived)
                .await;
            tracing::info!(lead_id = %lead.id, project = %kind, "payment recorded");
        }

        Ok(PaymentResponse {
            received_at: outcome.received_at,
            already_paid: outcome.already_paid,
            status: ProjectStatusView::for_project(&lead, kind),
        })
    }

    async fn mark_completed(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
    ) -> Result<CompletionResponse> {
        let mut lead = self.leads.load(lead_id).await?;
        let outcome = transitions::mark_completed(lead.project_mut(kind), Utc::now());

        if !outcome.already_completed {
            self.leads
                .update_project(lead.id, kind, lead.project(kind))
                .await?;
            self.log(
                lead.id,
                "work_completed",
                format!("{} work completed", kind.display_name()),
            )
            .await?;
        }

        Ok(CompletionResponse {
            completed_at: outcome.completed_at,
            already_completed: outcome.already_completed,
            status: ProjectStatusView::for_project(&lead, kind),
        })
    }

    async fn reset_project(&self, lead_id: Uuid, kind: ProjectKind) -> Result<ResetResponse> {
        let mut lead = self.leads.load(lead_id).await?;
        transitions::reset_project(lead.project_mut(kind))?;
        self.leads
            .update_project(lead.id, kind, lead.project(kind))
            .await?;
        self.log(
            lead.id,
            "project_reset",
            format!("{} workflow reset", kind.display_name()),
        )
        .await?;
        tracing::info!(lead_id = %lead.id, project = %kind, "track reset");

        Ok(ResetResponse {
            ok: true,
            statuses: StatusSet::for_lead(&lead),
        })
    }

    async fn master_reset(&self, lead_id: Uuid) -> Result<ResetResponse> {
        let mut lead = self.leads.load(lead_id).await?;

        lead.company = Default::default();
        lead.bank = Default::default();
        lead.bank_deal = Default::default();
        self.leads
            .update_all_projects(lead.id, &lead.company, &lead.bank, &lead.bank_deal)
            .await?;
        self.assignments.delete_for_lead(lead.id).await?;
        lead.assignments.clear();

        self.log(
            lead.id,
            "master_reset",
            "All workflow tracks and agent assignments reset".to_string(),
        )
        .await?;
        tracing::info!(lead_id = %lead.id, "master reset applied");

        Ok(ResetResponse {
            ok: true,
            statuses: StatusSet::for_lead(&lead),
        })
    }

    async fn update_assignment(
        &self,
        lead_id: Uuid,
        assignment_id: Uuid,
        status: AssignmentStatus,
        make_current: bool,
    ) -> Result<AgentAssignment> {
        let updated = self
            .assignments
            .update_status(lead_id, assignment_id, status, make_current)
            .await?;
        self.log(
            lead_id,
            "agent_status",
            format!(
                "Agent {} ({}) moved to '{}'",
                updated.agent_name, updated.service, updated.status
            ),
        )
        .await?;
        Ok(updated)
    }

    async fn bulk_delete(&self, ids: &[Uuid]) -> Result<BulkDeleteResponse> {
        if ids.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "no lead ids given".to_string(),
            ));
        }
        let deleted = self.leads.delete_cascade(ids).await?;
        tracing::info!(requested = ids.len(), deleted, "bulk delete");
        Ok(BulkDeleteResponse { deleted })
    }

    async fn run_payment_reminders(&self) -> Result<ReminderRun> {
        let started_at = Utc::now();
        let mut processed = 0;
        let mut sent = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for kind in ProjectKind::ALL {
            let candidates = match self
                .leads
                .reminder_candidates(
                    kind,
                    reminder::cooldown_cutoff(started_at),
                    REMINDER_BATCH_LIMIT,
                )
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    errors.push(format!("{kind}: candidate query failed: {e}"));
                    continue;
                }
            };

            for mut lead in candidates {
                processed += 1;
                let now = Utc::now();
                if !reminder::reminder_due(lead.project(kind), now) {
                    skipped += 1;
                    continue;
                }
                match self.dispatch_reminder(&mut lead, kind, now).await {
                    Ok((status, count)) if status.ok => {
                        sent += 1;
                        let invoice_number = lead
                            .project(kind)
                            .invoice_number
                            .clone()
                            .unwrap_or_default();
                        self.notify_admin(
                            &lead,
                            Some(kind),
                            AdminEvent::ReminderSent {
                                invoice_number,
                                count,
                            },
                        )
                        .await;
                    }
                    Ok((status, _)) => errors.push(format!(
                        "{kind} lead {}: {}",
                        lead.id,
                        status.error.unwrap_or_else(|| "send failed".to_string())
                    )),
                    Err(e) => errors.push(format!("{kind} lead {}: {e}", lead.id)),
                }
            }
        }

        let run = ReminderRun {
            id: Uuid::new_v4(),
            processed,
            sent,
            skipped,
            errors,
            started_at,
            finished_at: Utc::now(),
        };
        if let Err(e) = self.reminder_runs.record(&run).await {
            tracing::warn!(error = %e, "failed to persist reminder run record");
        }
        tracing::info!(
            processed = run.processed,
            sent = run.sent,
            skipped = run.skipped,
            errors = run.errors.len(),
            "payment reminder batch finished"
        );
        Ok(run)
    }
}
