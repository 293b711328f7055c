//! Derived pipeline stage.
//!
//! Stage is a pure function of a project's milestone fields plus the lead's
//! agent assignments. Nothing here is persisted: admin list, detail view,
//! customer quote page and notifications all call [`ProjectStage::derive`]
//! and therefore always agree.
//!
//! Precedence is a single first-match-wins chain. Terminal and negative
//! outcomes are checked before progress, so a declined project reads as
//! declined even if an invoice or payment was recorded earlier.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::lead::{Lead, ProjectKind};

/// Where one project track currently stands.
///
/// Variants carry the fields that justify them, so callers can render dates
/// and reasons without reaching back into the raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectStage {
    /// No agent contact, no quote activity.
    New,
    /// An agent on the matching service line has made contact.
    Contacted,
    /// Agent contact happened but feasibility has not been recorded.
    FeasibilityReview,
    /// Feasibility was assessed and the answer was no.
    NotFeasible,
    /// A quote amount exists. `sent_at` is `None` while it is still a draft.
    Quoted {
        amount: Option<Decimal>,
        sent_at: Option<DateTime<Utc>>,
        viewed_at: Option<DateTime<Utc>>,
    },
    /// The customer answered the quote with questions and no decision yet.
    Questioned {
        at: DateTime<Utc>,
        reason: Option<String>,
    },
    /// Approved but not yet invoiced.
    Approved { at: Option<DateTime<Utc>> },
    /// Invoice out, no approval on record and no quote cycle behind it.
    InvoiceSent { sent_at: DateTime<Utc> },
    /// Invoice out on the back of an approval or a quote cycle; unpaid.
    AwaitingPayment { sent_at: DateTime<Utc> },
    /// Paid and being worked.
    InProgress { paid_at: DateTime<Utc> },
    /// Work finished.
    Completed { at: DateTime<Utc> },
    /// Declined on either the quote or the project layer.
    Declined {
        at: Option<DateTime<Utc>>,
        reason: Option<String>,
    },
}

impl ProjectStage {
    /// Compute the stage for one project track. First match wins.
    pub fn derive(lead: &Lead, kind: ProjectKind) -> ProjectStage {
        let p = lead.project(kind);

        if p.is_declined() {
            return ProjectStage::Declined {
                at: p.declined_at.or(p.quote_declined_at),
                reason: p
                    .decline_reason
                    .clone()
                    .or_else(|| p.quote_decline_reason.clone()),
            };
        }
        if p.feasible == Some(false) {
            return ProjectStage::NotFeasible;
        }
        if let Some(at) = p.completed_at {
            return ProjectStage::Completed { at };
        }
        if let Some(paid_at) = p.payment_received_at {
            return ProjectStage::InProgress { paid_at };
        }
        if let Some(sent_at) = p.invoice_sent_at {
            // Unpaid from here down.
            if p.approved == Some(true) || p.quote_sent_at.is_some() {
                return ProjectStage::AwaitingPayment { sent_at };
            }
            return ProjectStage::InvoiceSent { sent_at };
        }
        if p.approved == Some(true) {
            return ProjectStage::Approved {
                at: p.quote_approved_at,
            };
        }
        if p.quote_sent_at.is_some() {
            if let Some(at) = p.quote_questions_at {
                return ProjectStage::Questioned {
                    at,
                    reason: p.quote_questions_reason.clone(),
                };
            }
            return ProjectStage::Quoted {
                amount: p.quoted_amount,
                sent_at: p.quote_sent_at,
                viewed_at: p.quote_viewed_at,
            };
        }
        if p.quoted_amount.is_some() {
            return ProjectStage::Quoted {
                amount: p.quoted_amount,
                sent_at: None,
                viewed_at: None,
            };
        }

        let contacted = lead.agent_contacted(kind);
        if contacted && p.feasible.is_none() {
            return ProjectStage::FeasibilityReview;
        }
        if contacted {
            return ProjectStage::Contacted;
        }
        ProjectStage::New
    }

    /// Stable machine-readable tag, used on the wire and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ProjectStage::New => "new",
            ProjectStage::Contacted => "contacted",
            ProjectStage::FeasibilityReview => "feasibility_review",
            ProjectStage::NotFeasible => "not_feasible",
            ProjectStage::Quoted { .. } => "quoted",
            ProjectStage::Questioned { .. } => "questioned",
            ProjectStage::Approved { .. } => "approved",
            ProjectStage::InvoiceSent { .. } => "invoice_sent",
            ProjectStage::AwaitingPayment { .. } => "awaiting_payment",
            ProjectStage::InProgress { .. } => "in_progress",
            ProjectStage::Completed { .. } => "completed",
            ProjectStage::Declined { .. } => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStage::NotFeasible | ProjectStage::Completed { .. } | ProjectStage::Declined { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentAssignment, AssignmentStatus, ServiceKind};
    use crate::lead::ServiceType;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn lead() -> Lead {
        Lead::new("Test", "test@example.com", None, ServiceType::Both)
    }

    fn contacted_lead() -> Lead {
        let mut l = lead();
        let mut a = AgentAssignment::new(l.id, ServiceKind::CompanyFormation, "Athar", 1);
        a.status = AssignmentStatus::Contacted;
        l.assignments.push(a);
        l
    }

    fn stage(l: &Lead) -> ProjectStage {
        ProjectStage::derive(l, ProjectKind::Company)
    }

    #[test]
    fn empty_record_is_new() {
        assert_eq!(stage(&lead()), ProjectStage::New);
    }

    #[test]
    fn assignment_alone_is_not_contact() {
        let mut l = lead();
        l.assignments.push(AgentAssignment::new(
            l.id,
            ServiceKind::CompanyFormation,
            "Athar",
            1,
        ));
        assert_eq!(stage(&l), ProjectStage::New);
    }

    #[test]
    fn contact_without_feasibility_is_feasibility_review() {
        let l = contacted_lead();
        assert_eq!(stage(&l), ProjectStage::FeasibilityReview);
    }

    #[test]
    fn contact_with_feasibility_confirmed_is_contacted() {
        let mut l = contacted_lead();
        l.company.feasible = Some(true);
        assert_eq!(stage(&l), ProjectStage::Contacted);
    }

    #[test]
    fn not_feasible_wins_over_contact() {
        let mut l = contacted_lead();
        l.company.feasible = Some(false);
        assert_eq!(stage(&l), ProjectStage::NotFeasible);
    }

    #[test]
    fn draft_amount_is_quoted_unsent() {
        let mut l = contacted_lead();
        l.company.feasible = Some(true);
        l.company.quoted_amount = Some(Decimal::from(12_500));
        assert_eq!(
            stage(&l),
            ProjectStage::Quoted {
                amount: Some(Decimal::from(12_500)),
                sent_at: None,
                viewed_at: None,
            }
        );
    }

    #[test]
    fn sent_quote_is_quoted_with_sent_at() {
        let mut l = lead();
        let now = Utc::now();
        l.company.quoted_amount = Some(Decimal::from(9000));
        l.company.quote_sent_at = Some(now);
        assert_eq!(
            stage(&l),
            ProjectStage::Quoted {
                amount: Some(Decimal::from(9000)),
                sent_at: Some(now),
                viewed_at: None,
            }
        );
    }

    #[test]
    fn questions_park_the_quote() {
        let mut l = lead();
        let now = Utc::now();
        l.company.quote_sent_at = Some(now);
        l.company.quote_questions_at = Some(now);
        l.company.quote_questions_reason = Some("what about visas?".into());
        assert_eq!(
            stage(&l),
            ProjectStage::Questioned {
                at: now,
                reason: Some("what about visas?".into()),
            }
        );
    }

    #[test]
    fn approval_without_invoice_is_approved() {
        let mut l = lead();
        let now = Utc::now();
        l.company.quote_sent_at = Some(now);
        l.company.approved = Some(true);
        l.company.quote_approved_at = Some(now);
        assert_eq!(stage(&l), ProjectStage::Approved { at: Some(now) });
    }

    #[test]
    fn approval_beats_open_questions() {
        let mut l = lead();
        let now = Utc::now();
        l.company.quote_sent_at = Some(now);
        l.company.quote_questions_at = Some(now);
        l.company.approved = Some(true);
        assert_eq!(stage(&l), ProjectStage::Approved { at: None });
    }

    #[test]
    fn unpaid_invoice_after_quote_cycle_awaits_payment() {
        let mut l = lead();
        let sent = Utc::now();
        l.company.quote_sent_at = Some(sent);
        l.company.approved = Some(true);
        l.company.invoice_sent_at = Some(sent);
        assert_eq!(stage(&l), ProjectStage::AwaitingPayment { sent_at: sent });
    }

    #[test]
    fn unpaid_invoice_without_any_decision_is_invoice_sent() {
        let mut l = lead();
        let sent = Utc::now();
        l.company.invoice_sent_at = Some(sent);
        assert_eq!(stage(&l), ProjectStage::InvoiceSent { sent_at: sent });
    }

    #[test]
    fn payment_moves_to_in_progress() {
        let mut l = lead();
        let paid = Utc::now();
        l.company.quote_sent_at = Some(paid);
        l.company.approved = Some(true);
        l.company.invoice_sent_at = Some(paid);
        l.company.payment_received_at = Some(paid);
        assert_eq!(stage(&l), ProjectStage::InProgress { paid_at: paid });
    }

    #[test]
    fn completion_beats_payment() {
        let mut l = lead();
        let now = Utc::now();
        l.company.payment_received_at = Some(now);
        l.company.completed_at = Some(now);
        assert_eq!(stage(&l), ProjectStage::Completed { at: now });
    }

    #[test]
    fn decline_beats_everything_else() {
        let mut l = lead();
        let now = Utc::now();
        l.company.quote_sent_at = Some(now);
        l.company.invoice_sent_at = Some(now);
        l.company.payment_received_at = Some(now);
        l.company.completed_at = Some(now);
        l.company.declined_at = Some(now);
        l.company.decline_reason = Some("changed plans".into());
        assert_eq!(
            stage(&l),
            ProjectStage::Declined {
                at: Some(now),
                reason: Some("changed plans".into()),
            }
        );
    }

    #[test]
    fn quote_decline_alone_reads_as_declined() {
        let mut l = lead();
        let now = Utc::now();
        l.company.quote_sent_at = Some(now);
        l.company.quote_declined_at = Some(now);
        l.company.quote_decline_reason = Some("too expensive".into());
        assert_eq!(
            stage(&l),
            ProjectStage::Declined {
                at: Some(now),
                reason: Some("too expensive".into()),
            }
        );
    }

    #[test]
    fn approved_false_alone_reads_as_declined() {
        let mut l = lead();
        l.company.approved = Some(false);
        assert_eq!(
            stage(&l),
            ProjectStage::Declined { at: None, reason: None }
        );
    }

    #[test]
    fn not_feasible_beats_stale_quote_fields() {
        let mut l = lead();
        l.company.feasible = Some(false);
        l.company.quoted_amount = Some(Decimal::from(5000));
        l.company.quote_sent_at = Some(Utc::now());
        assert_eq!(stage(&l), ProjectStage::NotFeasible);
    }

    #[test]
    fn tracks_are_independent() {
        let mut l = lead();
        let now = Utc::now();
        l.company.payment_received_at = Some(now);
        l.bank.quote_sent_at = Some(now);
        assert_eq!(
            ProjectStage::derive(&l, ProjectKind::Company),
            ProjectStage::InProgress { paid_at: now }
        );
        assert_eq!(
            ProjectStage::derive(&l, ProjectKind::Bank).name(),
            "quoted"
        );
        assert_eq!(ProjectStage::derive(&l, ProjectKind::BankDeal), ProjectStage::New);
    }

    #[test]
    fn stage_names_are_stable() {
        assert_eq!(ProjectStage::New.name(), "new");
        assert_eq!(ProjectStage::NotFeasible.name(), "not_feasible");
        assert_eq!(
            ProjectStage::Declined { at: None, reason: None }.name(),
            "declined"
        );
    }

    #[test]
    fn terminal_stages() {
        assert!(ProjectStage::NotFeasible.is_terminal());
        assert!(ProjectStage::Completed { at: Utc::now() }.is_terminal());
        assert!(!ProjectStage::New.is_terminal());
        assert!(!ProjectStage::InProgress { paid_at: Utc::now() }.is_terminal());
    }
}
