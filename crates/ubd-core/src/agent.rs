//! Agent assignments and service routing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkflowError;

/// The service lines agents work on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    CompanyFormation,
    BankAccount,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::CompanyFormation => "company_formation",
            ServiceKind::BankAccount => "bank_account",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company_formation" => Ok(ServiceKind::CompanyFormation),
            "bank_account" => Ok(ServiceKind::BankAccount),
            other => Err(WorkflowError::InvalidInput(format!(
                "unknown service line: {other}"
            ))),
        }
    }
}

/// Where a single agent assignment stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Contacted,
    Accepted,
    Working,
    Completed,
    Declined,
    OnHold,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::Contacted => "contacted",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Working => "working",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Declined => "declined",
            AssignmentStatus::OnHold => "on_hold",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses that count as "the agent has contacted the customer" when
    /// deriving pipeline stage.
    pub fn counts_as_contact(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Contacted
                | AssignmentStatus::Accepted
                | AssignmentStatus::Working
                | AssignmentStatus::Completed
        )
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(AssignmentStatus::Assigned),
            "contacted" => Ok(AssignmentStatus::Contacted),
            "accepted" => Ok(AssignmentStatus::Accepted),
            "working" => Ok(AssignmentStatus::Working),
            "completed" => Ok(AssignmentStatus::Completed),
            "declined" => Ok(AssignmentStatus::Declined),
            "on_hold" => Ok(AssignmentStatus::OnHold),
            "cancelled" => Ok(AssignmentStatus::Cancelled),
            other => Err(WorkflowError::InvalidInput(format!(
                "unknown assignment status: {other}"
            ))),
        }
    }
}

/// One agent working one service line for one lead.
///
/// The service line is stored explicitly; nothing is ever inferred from the
/// agent's name. `position` orders multiple agents on the same line, and at
/// most one of them is `is_current`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAssignment {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub service: ServiceKind,
    pub agent_name: String,
    pub bank_name: Option<String>,
    pub position: i32,
    pub status: AssignmentStatus,
    pub is_current: bool,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentAssignment {
    pub fn new(
        lead_id: Uuid,
        service: ServiceKind,
        agent_name: impl Into<String>,
        position: i32,
    ) -> Self {
        let now = Utc::now();
        AgentAssignment {
            id: Uuid::new_v4(),
            lead_id,
            service,
            agent_name: agent_name.into(),
            bank_name: None,
            position,
            status: AssignmentStatus::Assigned,
            is_current: true,
            assigned_at: now,
            updated_at: now,
        }
    }
}

/// Default agent per service line, used when a new lead is captured.
#[derive(Debug, Clone)]
pub struct AgentRouting {
    pub company_agent: String,
    pub bank_agent: String,
}

impl Default for AgentRouting {
    fn default() -> Self {
        AgentRouting {
            company_agent: "Athar".to_string(),
            bank_agent: "Anoop".to_string(),
        }
    }
}

impl AgentRouting {
    pub fn agent_for(&self, line: ServiceKind) -> &str {
        match line {
            ServiceKind::CompanyFormation => &self.company_agent,
            ServiceKind::BankAccount => &self.bank_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            AssignmentStatus::Assigned,
            AssignmentStatus::Contacted,
            AssignmentStatus::Accepted,
            AssignmentStatus::Working,
            AssignmentStatus::Completed,
            AssignmentStatus::Declined,
            AssignmentStatus::OnHold,
            AssignmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AssignmentStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<AssignmentStatus>().is_err());
    }

    #[test]
    fn contact_statuses() {
        assert!(!AssignmentStatus::Assigned.counts_as_contact());
        assert!(AssignmentStatus::Contacted.counts_as_contact());
        assert!(AssignmentStatus::Working.counts_as_contact());
        assert!(!AssignmentStatus::Declined.counts_as_contact());
        assert!(!AssignmentStatus::OnHold.counts_as_contact());
    }

    #[test]
    fn routing_picks_agent_by_service_line() {
        let routing = AgentRouting {
            company_agent: "Fatima".into(),
            bank_agent: "Ravi".into(),
        };
        assert_eq!(routing.agent_for(ServiceKind::CompanyFormation), "Fatima");
        assert_eq!(routing.agent_for(ServiceKind::BankAccount), "Ravi");
    }

    #[test]
    fn new_assignment_defaults() {
        let lead_id = Uuid::new_v4();
        let a = AgentAssignment::new(lead_id, ServiceKind::BankAccount, "Anoop", 1);
        assert_eq!(a.lead_id, lead_id);
        assert_eq!(a.status, AssignmentStatus::Assigned);
        assert!(a.is_current);
        assert!(a.bank_name.is_none());
    }
}
