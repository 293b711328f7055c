//! HTTP layer for the UBD lead-management back office.
//!
//! Exposed as a library so the integration tests can build the router with
//! in-memory ports; `main.rs` wires the real Postgres and outbound clients.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod router;
