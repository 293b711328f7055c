//! Workflow transitions as pure record mutations.
//!
//! Each function takes the project record and a caller-supplied `now`, checks
//! its preconditions, mutates the record and reports what happened. Replays
//! of one-shot transitions succeed without mutating, flagged in the outcome
//! so callers can skip persistence, logging and notifications.
//!
//! Persistence, token checks and notifications live in [`crate::service`];
//! everything here is synchronous and deterministic, which is what makes the
//! decision rules testable without a database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::lead::ProjectRecord;

/// `decline_stage` value written when a decline comes out of the quote flow.
pub const DECLINE_STAGE_QUOTE: &str = "quote";

// ── Customer decisions ─────────────────────────────────────────────────────

/// What the customer chose on the quote page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteDecision {
    Proceed,
    Decline,
    Questions,
}

impl QuoteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteDecision::Proceed => "proceed",
            QuoteDecision::Decline => "decline",
            QuoteDecision::Questions => "questions",
        }
    }
}

impl fmt::Display for QuoteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteDecision {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proceed" => Ok(QuoteDecision::Proceed),
            "decline" => Ok(QuoteDecision::Decline),
            "questions" => Ok(QuoteDecision::Questions),
            other => Err(WorkflowError::InvalidInput(format!(
                "unknown quote decision: {other}"
            ))),
        }
    }
}

/// Result of recording a customer decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    pub decision: QuoteDecision,
    pub decided_at: DateTime<Utc>,
    /// The decision was already on record; nothing was changed.
    pub replayed: bool,
}

/// Result of recording a quote-page open.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOutcome {
    pub viewed_at: DateTime<Utc>,
    pub already_viewed: bool,
}

/// First open wins; later opens keep the original timestamp.
pub fn record_quote_view(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
) -> Result<ViewOutcome, WorkflowError> {
    if p.quote_sent_at.is_none() {
        return Err(WorkflowError::Precondition(
            "no quote has been sent".to_string(),
        ));
    }
    if let Some(viewed_at) = p.quote_viewed_at {
        return Ok(ViewOutcome {
            viewed_at,
            already_viewed: true,
        });
    }
    p.quote_viewed_at = Some(now);
    Ok(ViewOutcome {
        viewed_at: now,
        already_viewed: false,
    })
}

/// Customer accepts the quote.
///
/// Clears any earlier decline (both layers) so a change of heart after a
/// re-sent quote lands cleanly. Timestamps are only written where still
/// null; a replay returns the original confirmation time untouched.
pub fn proceed(p: &mut ProjectRecord, now: DateTime<Utc>) -> DecisionOutcome {
    if let Some(confirmed_at) = p.proceed_confirmed_at {
        return DecisionOutcome {
            decision: QuoteDecision::Proceed,
            decided_at: confirmed_at,
            replayed: true,
        };
    }
    p.approved = Some(true);
    p.proceed_confirmed_at = Some(now);
    if p.quote_approved_at.is_none() {
        p.quote_approved_at = Some(now);
    }
    clear_decline(p);
    DecisionOutcome {
        decision: QuoteDecision::Proceed,
        decided_at: now,
        replayed: false,
    }
}

/// Customer declines the quote.
///
/// Writes the quote-layer decline and mirrors it onto the project layer with
/// `decline_stage = "quote"`, so both the quote page and the admin pipeline
/// read declined from a single pass.
pub fn decline(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
    reason: Option<String>,
) -> DecisionOutcome {
    if let Some(declined_at) = p.quote_declined_at {
        return DecisionOutcome {
            decision: QuoteDecision::Decline,
            decided_at: declined_at,
            replayed: true,
        };
    }
    p.approved = Some(false);
    p.quote_declined_at = Some(now);
    p.quote_decline_reason = reason.clone();
    if p.declined_at.is_none() {
        p.declined_at = Some(now);
    }
    if p.decline_reason.is_none() {
        p.decline_reason = reason;
    }
    p.decline_stage = Some(DECLINE_STAGE_QUOTE.to_string());
    p.proceed_confirmed_at = None;
    p.quote_approved_at = None;
    DecisionOutcome {
        decision: QuoteDecision::Decline,
        decided_at: now,
        replayed: false,
    }
}

/// Customer raises questions. Records only the question fields; the pending
/// decision stays open and no approval or decline state is touched.
pub fn questions(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
    reason: Option<String>,
) -> DecisionOutcome {
    if let Some(asked_at) = p.quote_questions_at {
        return DecisionOutcome {
            decision: QuoteDecision::Questions,
            decided_at: asked_at,
            replayed: true,
        };
    }
    p.quote_questions_at = Some(now);
    p.quote_questions_reason = reason;
    DecisionOutcome {
        decision: QuoteDecision::Questions,
        decided_at: now,
        replayed: false,
    }
}

// ── Admin quote / invoice actions ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSendOutcome {
    pub sent_at: DateTime<Utc>,
    pub amount: Decimal,
}

/// Send (or re-send) the quote.
///
/// A re-send starts a fresh decision cycle: every view, proceed, decline and
/// question field from the previous cycle is cleared first. Refused while an
/// unpaid invoice is outstanding; cancel the invoice by resetting the track
/// before quoting again.
pub fn send_quote(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
    amount: Option<Decimal>,
) -> Result<QuoteSendOutcome, WorkflowError> {
    if let Some(amount) = amount {
        p.quoted_amount = Some(amount);
    }
    let amount = p.quoted_amount.ok_or_else(|| {
        WorkflowError::Precondition("quote amount has not been set".to_string())
    })?;
    if p.has_unpaid_invoice() {
        return Err(WorkflowError::Precondition(
            "an unpaid invoice is outstanding for this project".to_string(),
        ));
    }

    p.quote_viewed_at = None;
    p.proceed_confirmed_at = None;
    p.quote_approved_at = None;
    p.approved = None;
    p.quote_questions_at = None;
    p.quote_questions_reason = None;
    clear_decline(p);

    p.quote_sent_at = Some(now);
    Ok(QuoteSendOutcome { sent_at: now, amount })
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceIssueOutcome {
    pub invoice_number: String,
    pub version: i32,
    pub sent_at: DateTime<Utc>,
    pub amount: Decimal,
}

/// Issue a fresh invoice on an approved quote.
///
/// The amount falls back to the quoted amount when not given. Re-issuing
/// after a reset-free cycle bumps `invoice_version`; callers append the
/// superseded number to the revision history.
pub fn issue_invoice(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
    invoice_number: String,
    amount: Option<Decimal>,
    payment_link: Option<String>,
) -> Result<InvoiceIssueOutcome, WorkflowError> {
    if p.approved != Some(true) {
        return Err(WorkflowError::Precondition(
            "quote has not been approved".to_string(),
        ));
    }
    let amount = amount.or(p.quoted_amount).ok_or_else(|| {
        WorkflowError::Precondition("invoice amount has not been set".to_string())
    })?;

    if p.invoice_number.is_some() {
        p.invoice_version += 1;
    }
    p.invoice_number = Some(invoice_number.clone());
    p.invoice_sent_at = Some(now);
    p.invoice_amount = Some(amount);
    if payment_link.is_some() {
        p.payment_link = payment_link;
    }
    Ok(InvoiceIssueOutcome {
        invoice_number,
        version: p.invoice_version,
        sent_at: now,
        amount,
    })
}

/// Record one payment reminder going out.
pub fn record_reminder(p: &mut ProjectRecord, now: DateTime<Utc>) {
    p.payment_reminder_sent_at = Some(now);
    p.payment_reminder_count += 1;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub received_at: DateTime<Utc>,
    pub already_paid: bool,
}

pub fn mark_payment_received(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
) -> Result<PaymentOutcome, WorkflowError> {
    if p.invoice_sent_at.is_none() {
        return Err(WorkflowError::Precondition(
            "no invoice has been sent".to_string(),
        ));
    }
    if let Some(received_at) = p.payment_received_at {
        return Ok(PaymentOutcome {
            received_at,
            already_paid: true,
        });
    }
    p.payment_received_at = Some(now);
    Ok(PaymentOutcome {
        received_at: now,
        already_paid: false,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub completed_at: DateTime<Utc>,
    pub already_completed: bool,
}

pub fn mark_completed(p: &mut ProjectRecord, now: DateTime<Utc>) -> CompletionOutcome {
    if let Some(completed_at) = p.completed_at {
        return CompletionOutcome {
            completed_at,
            already_completed: true,
        };
    }
    p.completed_at = Some(now);
    CompletionOutcome {
        completed_at: now,
        already_completed: false,
    }
}

// ── Admin overrides ────────────────────────────────────────────────────────

/// Force a decision on the customer's behalf.
///
/// Unlike the customer paths this always applies with fresh timestamps.
/// Forcing `Questions` reopens the decision: approval and decline are both
/// cleared and `approved` returns to undecided.
pub fn override_decision(
    p: &mut ProjectRecord,
    now: DateTime<Utc>,
    decision: QuoteDecision,
    reason: Option<String>,
) {
    match decision {
        QuoteDecision::Proceed => {
            p.approved = Some(true);
            p.proceed_confirmed_at = Some(now);
            p.quote_approved_at = Some(now);
            clear_decline(p);
        }
        QuoteDecision::Decline => {
            p.approved = Some(false);
            p.quote_declined_at = Some(now);
            p.quote_decline_reason = reason.clone();
            p.declined_at = Some(now);
            p.decline_reason = reason;
            p.decline_stage = Some(DECLINE_STAGE_QUOTE.to_string());
            p.proceed_confirmed_at = None;
            p.quote_approved_at = None;
        }
        QuoteDecision::Questions => {
            p.approved = None;
            p.proceed_confirmed_at = None;
            p.quote_approved_at = None;
            clear_decline(p);
            p.quote_questions_at = Some(now);
            p.quote_questions_reason = reason;
        }
    }
}

// ── Resets ─────────────────────────────────────────────────────────────────

/// Wind one track back to the pre-quote state.
///
/// Refused once payment or completion is on record. Feasibility and the
/// quoted amount survive so the track can be re-sent in one step.
pub fn reset_project(p: &mut ProjectRecord) -> Result<(), WorkflowError> {
    if p.is_locked() {
        return Err(WorkflowError::Precondition(
            "payment received or work completed; reset is blocked".to_string(),
        ));
    }
    p.quote_sent_at = None;
    p.quote_viewed_at = None;
    p.proceed_confirmed_at = None;
    p.quote_approved_at = None;
    p.approved = None;
    p.quote_questions_at = None;
    p.quote_questions_reason = None;
    p.invoice_number = None;
    p.invoice_sent_at = None;
    p.invoice_amount = None;
    p.payment_link = None;
    p.payment_reminder_sent_at = None;
    p.payment_reminder_count = 0;
    p.invoice_version = 1;
    clear_decline(p);
    Ok(())
}

fn clear_decline(p: &mut ProjectRecord) {
    p.quote_declined_at = None;
    p.quote_decline_reason = None;
    p.declined_at = None;
    p.decline_reason = None;
    p.decline_stage = None;
}
