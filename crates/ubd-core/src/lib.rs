//! Core domain for the UBD lead-management back office.
//!
//! Leads carry three parallel project workflows (company formation, bank
//! account, legacy bank deal). This crate owns the data model, the derived
//! pipeline stage, the transition rules, signed customer-link tokens and the
//! orchestrating [`service::WorkflowService`]. Persistence and HTTP live in
//! `ubd-postgres` and `ubd-server` behind the traits in [`ports`].

pub mod agent;
pub mod error;
pub mod invoice;
pub mod lead;
pub mod notify;
pub mod ports;
pub mod proto;
pub mod reminder;
pub mod service;
pub mod stage;
pub mod status;
pub mod token;
pub mod transitions;

use std::str::FromStr;

/// Deployment environment. Controls the token secret policy and how much
/// error detail leaves the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Anything that is not explicitly production counts as development.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            _ => Ok(Environment::Development),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Development);
        assert!(!Environment::Development.is_production());
        assert!(Environment::Production.is_production());
    }
}
