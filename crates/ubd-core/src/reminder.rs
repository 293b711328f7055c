//! Payment reminder scheduling rules.
//!
//! The cron batch and the manual admin reminder button share these rules, so
//! the cooldown and eligibility checks can never drift apart.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::ProjectRecord;

/// Minimum gap between reminders for one project track.
pub const REMINDER_COOLDOWN_HOURS: i64 = 48;

/// Per-track cap on leads processed in a single batch run.
pub const REMINDER_BATCH_LIMIT: i64 = 50;

/// True when enough time has passed since the last reminder (or none was
/// ever sent).
pub fn cooldown_elapsed(last_sent: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_sent {
        None => true,
        Some(at) => now - at >= Duration::hours(REMINDER_COOLDOWN_HOURS),
    }
}

/// A track is owed a reminder: unpaid invoice outstanding, not declined,
/// cooldown elapsed.
pub fn reminder_due(p: &ProjectRecord, now: DateTime<Utc>) -> bool {
    p.has_unpaid_invoice() && !p.is_declined() && cooldown_elapsed(p.payment_reminder_sent_at, now)
}

/// Cutoff timestamp for store-side candidate filtering: last reminder at or
/// before this instant means the cooldown has passed.
pub fn cooldown_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(REMINDER_COOLDOWN_HOURS)
}

/// Record of one finished batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRun {
    pub id: Uuid,
    pub processed: i32,
    pub sent: i32,
    pub skipped: i32,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
