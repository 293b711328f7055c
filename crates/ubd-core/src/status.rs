//! Status labels and suggested next actions.
//!
//! Labels are presentation over [`ProjectStage`]; they never look at the raw
//! record, so every surface that shows a status shows the same one.

use serde::Serialize;

use crate::lead::{Lead, ProjectKind};
use crate::stage::ProjectStage;

impl ProjectStage {
    /// Human-facing status label for the admin list and detail views.
    pub fn status_label(&self, kind: ProjectKind) -> String {
        match self {
            ProjectStage::New => "New".to_string(),
            ProjectStage::Contacted => "Agent Contacted".to_string(),
            ProjectStage::FeasibilityReview => "Feasibility Review".to_string(),
            ProjectStage::NotFeasible => "Not Feasible".to_string(),
            ProjectStage::Quoted { .. } => "Quoted".to_string(),
            ProjectStage::Questioned { .. } => "Questions Raised".to_string(),
            ProjectStage::Approved { .. } => "Quote Approved".to_string(),
            ProjectStage::InvoiceSent { .. } => "Invoice Sent".to_string(),
            ProjectStage::AwaitingPayment { .. } => "Awaiting Payment".to_string(),
            ProjectStage::InProgress { .. } => {
                format!("{} In Progress", kind.display_name())
            }
            ProjectStage::Completed { .. } => "Completed".to_string(),
            ProjectStage::Declined { .. } => "Declined".to_string(),
        }
    }

    /// What the admin should do next, or `None` for terminal stages.
    pub fn next_action(&self, kind: ProjectKind) -> Option<String> {
        let action = match self {
            ProjectStage::New => "Contact customer".to_string(),
            ProjectStage::Contacted => "Prepare quote".to_string(),
            ProjectStage::FeasibilityReview => "Record feasibility".to_string(),
            ProjectStage::NotFeasible => return None,
            ProjectStage::Quoted { sent_at: None, .. } => "Send quote".to_string(),
            ProjectStage::Quoted { .. } => "Awaiting customer approval".to_string(),
            ProjectStage::Questioned { .. } => "Answer questions and re-send quote".to_string(),
            ProjectStage::Approved { .. } => "Send invoice".to_string(),
            ProjectStage::InvoiceSent { .. } | ProjectStage::AwaitingPayment { .. } => {
                "Follow up payment".to_string()
            }
            ProjectStage::InProgress { .. } => {
                format!("Complete {} work", kind.display_name().to_lowercase())
            }
            ProjectStage::Completed { .. } => return None,
            ProjectStage::Declined { .. } => return None,
        };
        Some(action)
    }
}

/// Stage, label and next action for one track, as shown on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusView {
    pub stage: &'static str,
    pub status: String,
    pub next_action: Option<String>,
}

impl ProjectStatusView {
    pub fn for_project(lead: &Lead, kind: ProjectKind) -> Self {
        let stage = ProjectStage::derive(lead, kind);
        ProjectStatusView {
            stage: stage.name(),
            status: stage.status_label(kind),
            next_action: stage.next_action(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::ServiceType;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn in_progress_label_names_the_track() {
        let paid = ProjectStage::InProgress { paid_at: Utc::now() };
        assert_eq!(paid.status_label(ProjectKind::Company), "Company In Progress");
        assert_eq!(paid.status_label(ProjectKind::Bank), "Bank In Progress");
        assert_eq!(
            paid.status_label(ProjectKind::BankDeal),
            "Bank Deal In Progress"
        );
    }

    #[test]
    fn quoted_label_is_the_same_sent_or_not() {
        let draft = ProjectStage::Quoted {
            amount: Some(Decimal::from(5000)),
            sent_at: None,
            viewed_at: None,
        };
        let sent = ProjectStage::Quoted {
            amount: Some(Decimal::from(5000)),
            sent_at: Some(Utc::now()),
            viewed_at: None,
        };
        assert_eq!(draft.status_label(ProjectKind::Company), "Quoted");
        assert_eq!(sent.status_label(ProjectKind::Company), "Quoted");
        assert_eq!(
            draft.next_action(ProjectKind::Company).as_deref(),
            Some("Send quote")
        );
        assert_eq!(
            sent.next_action(ProjectKind::Company).as_deref(),
            Some("Awaiting customer approval")
        );
    }

    #[test]
    fn terminal_stages_have_no_next_action() {
        assert_eq!(ProjectStage::NotFeasible.next_action(ProjectKind::Company), None);
        assert_eq!(
            ProjectStage::Completed { at: Utc::now() }.next_action(ProjectKind::Company),
            None
        );
        assert_eq!(
            ProjectStage::Declined { at: None, reason: None }.next_action(ProjectKind::Bank),
            None
        );
    }

    #[test]
    fn approved_leads_to_invoice() {
        let stage = ProjectStage::Approved { at: Some(Utc::now()) };
        assert_eq!(stage.status_label(ProjectKind::Company), "Quote Approved");
        assert_eq!(
            stage.next_action(ProjectKind::Company).as_deref(),
            Some("Send invoice")
        );
    }

    #[test]
    fn view_carries_stage_tag_and_label() {
        let mut lead = Lead::new("Test", "t@example.com", None, ServiceType::CompanyFormation);
        lead.company.quote_sent_at = Some(Utc::now());
        let view = ProjectStatusView::for_project(&lead, ProjectKind::Company);
        assert_eq!(view.stage, "quoted");
        assert_eq!(view.status, "Quoted");
        assert_eq!(view.next_action.as_deref(), Some("Awaiting customer approval"));
    }
}
