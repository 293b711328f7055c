//! HTTP handlers. Thin: extract, call the workflow service, wrap the
//! response. All policy lives in `ubd-core`.

pub mod admin;
pub mod cron;
pub mod health;
pub mod invoice;
pub mod leads;
pub mod quote;
pub mod workflow;
