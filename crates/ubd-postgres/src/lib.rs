//! Postgres implementations of the ubd-core port traits.
//!
//! All SQL is runtime-checked (sqlx::query, not sqlx::query!) so builds
//! never need a database. Schema lives in `schema.sql` under the
//! `backoffice` schema; the three project tracks are flattened onto the
//! leads row as `company_`, `bank_` and `bank_deal_` column groups.

pub mod store;

pub use store::{
    PgActivityLog, PgAssignmentStore, PgInvoiceRevisionStore, PgLeadStore, PgReminderRunStore,
};
