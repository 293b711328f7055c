//! Invoice numbering and revision history.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::ProjectKind;

pub const INVOICE_PREFIX: &str = "UBD-INV";

/// Mint an invoice number: `UBD-INV-YYYYMMDD-NNNN` with a random 4-digit
/// suffix. Numbers are labels, not a gapless sequence.
pub fn invoice_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{}-{:04}", INVOICE_PREFIX, now.format("%Y%m%d"), suffix)
}

/// One issued invoice, kept even after it is superseded by a re-issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRevision {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub project: ProjectKind,
    pub version: i32,
    pub invoice_number: String,
    pub amount: Option<Decimal>,
    pub issued_at: DateTime<Utc>,
}

impl InvoiceRevision {
    pub fn new(
        lead_id: Uuid,
        project: ProjectKind,
        version: i32,
        invoice_number: impl Into<String>,
        amount: Option<Decimal>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        InvoiceRevision {
            id: Uuid::new_v4(),
            lead_id,
            project,
            version,
            invoice_number: invoice_number.into(),
            amount,
            issued_at,
        }
    }
}
