//! Postgres adapters for the lead store, assignments, activity log,
//! invoice revisions and reminder runs.
//!
//! Each adapter is a newtype wrapping PgPool. The three project tracks sit
//! on the leads row as prefixed column groups; the prefix is spliced into
//! SQL built with `format!`, while every value still goes through a bind.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use ubd_core::agent::{AgentAssignment, AssignmentStatus};
use ubd_core::error::WorkflowError;
use ubd_core::invoice::InvoiceRevision;
use ubd_core::lead::{ActivityEntry, Lead, ProjectKind, ProjectRecord};
use ubd_core::ports::{
    ActivityLog, AssignmentStore, InvoiceRevisionStore, LeadStore, ReminderRunStore, Result,
};
use ubd_core::reminder::ReminderRun;

/// Per-track columns, in bind order. `bind_project` must stay in step.
const PROJECT_FIELDS: [&str; 23] = [
    "feasible",
    "quoted_amount",
    "quote_sent_at",
    "quote_viewed_at",
    "proceed_confirmed_at",
    "quote_approved_at",
    "approved",
    "quote_declined_at",
    "quote_decline_reason",
    "quote_questions_at",
    "quote_questions_reason",
    "invoice_number",
    "invoice_sent_at",
    "invoice_amount",
    "payment_link",
    "payment_received_at",
    "completed_at",
    "declined_at",
    "decline_reason",
    "decline_stage",
    "payment_reminder_sent_at",
    "payment_reminder_count",
    "invoice_version",
];

const LEAD_BASE_COLUMNS: &str = "id, name, email, phone, service_type, source, notes, created_at, updated_at";

fn column_prefix(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::Company => "company_",
        ProjectKind::Bank => "bank_",
        ProjectKind::BankDeal => "bank_deal_",
    }
}

fn prefixed_columns(prefix: &str) -> String {
    PROJECT_FIELDS
        .iter()
        .map(|f| format!("{prefix}{f}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn lead_select_columns() -> String {
    format!(
        "{LEAD_BASE_COLUMNS}, {}, {}, {}",
        prefixed_columns("company_"),
        prefixed_columns("bank_"),
        prefixed_columns("bank_deal_"),
    )
}

/// `{prefix}field = $n` assignments starting at `$start`; returns the SQL
/// fragment and the next free placeholder index.
fn project_set_clause(prefix: &str, start: usize) -> (String, usize) {
    let mut idx = start;
    let sets = PROJECT_FIELDS
        .iter()
        .map(|f| {
            let s = format!("{prefix}{f} = ${idx}");
            idx += 1;
            s
        })
        .collect::<Vec<_>>()
        .join(", ");
    (sets, idx)
}

/// Bind one record's values in `PROJECT_FIELDS` order.
fn bind_project<'q>(
    query: Query<'q, Postgres, PgArguments>,
    p: &'q ProjectRecord,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(p.feasible)
        .bind(p.quoted_amount)
        .bind(p.quote_sent_at)
        .bind(p.quote_viewed_at)
        .bind(p.proceed_confirmed_at)
        .bind(p.quote_approved_at)
        .bind(p.approved)
        .bind(p.quote_declined_at)
        .bind(p.quote_decline_reason.as_deref())
        .bind(p.quote_questions_at)
        .bind(p.quote_questions_reason.as_deref())
        .bind(p.invoice_number.as_deref())
        .bind(p.invoice_sent_at)
        .bind(p.invoice_amount)
        .bind(p.payment_link.as_deref())
        .bind(p.payment_received_at)
        .bind(p.completed_at)
        .bind(p.declined_at)
        .bind(p.decline_reason.as_deref())
        .bind(p.decline_stage.as_deref())
        .bind(p.payment_reminder_sent_at)
        .bind(p.payment_reminder_count)
        .bind(p.invoice_version)
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| anyhow!(e).into())
}

fn project_from_row(row: &PgRow, prefix: &str) -> Result<ProjectRecord> {
    let name = |f: &str| format!("{prefix}{f}");
    Ok(ProjectRecord {
        feasible: col(row, &name("feasible"))?,
        quoted_amount: col(row, &name("quoted_amount"))?,
        quote_sent_at: col(row, &name("quote_sent_at"))?,
        quote_viewed_at: col(row, &name("quote_viewed_at"))?,
        proceed_confirmed_at: col(row, &name("proceed_confirmed_at"))?,
        quote_approved_at: col(row, &name("quote_approved_at"))?,
        approved: col(row, &name("approved"))?,
        quote_declined_at: col(row, &name("quote_declined_at"))?,
        quote_decline_reason: col(row, &name("quote_decline_reason"))?,
        quote_questions_at: col(row, &name("quote_questions_at"))?,
        quote_questions_reason: col(row, &name("quote_questions_reason"))?,
        invoice_number: col(row, &name("invoice_number"))?,
        invoice_sent_at: col(row, &name("invoice_sent_at"))?,
        invoice_amount: col(row, &name("invoice_amount"))?,
        payment_link: col(row, &name("payment_link"))?,
        payment_received_at: col(row, &name("payment_received_at"))?,
        completed_at: col(row, &name("completed_at"))?,
        declined_at: col(row, &name("declined_at"))?,
        decline_reason: col(row, &name("decline_reason"))?,
        decline_stage: col(row, &name("decline_stage"))?,
        payment_reminder_sent_at: col(row, &name("payment_reminder_sent_at"))?,
        payment_reminder_count: col(row, &name("payment_reminder_count"))?,
        invoice_version: col(row, &name("invoice_version"))?,
    })
}

fn lead_from_row(row: &PgRow) -> Result<Lead> {
    let service_type_raw: String = col(row, "service_type")?;
    let service_type = service_type_raw
        .parse()
        .map_err(|e| anyhow!("corrupt service_type on lead row: {e}"))?;
    Ok(Lead {
        id: col(row, "id")?,
        name: col(row, "name")?,
        email: col(row, "email")?,
        phone: col(row, "phone")?,
        service_type,
        source: col(row, "source")?,
        notes: col(row, "notes")?,
        company: project_from_row(row, "company_")?,
        bank: project_from_row(row, "bank_")?,
        bank_deal: project_from_row(row, "bank_deal_")?,
        assignments: Vec::new(),
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

// ── Assignment rows ───────────────────────────────────────────

const ASSIGNMENT_COLUMNS: &str =
    "id, lead_id, service, agent_name, bank_name, position, status, is_current, assigned_at, updated_at";

#[derive(sqlx::FromRow)]
struct PgAssignmentRow {
    id: Uuid,
    lead_id: Uuid,
    service: String,
    agent_name: String,
    bank_name: Option<String>,
    position: i32,
    status: String,
    is_current: bool,
    assigned_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PgAssignmentRow> for AgentAssignment {
    type Error = WorkflowError;

    fn try_from(row: PgAssignmentRow) -> Result<AgentAssignment> {
        Ok(AgentAssignment {
            id: row.id,
            lead_id: row.lead_id,
            service: row
                .service
                .parse()
                .map_err(|e| anyhow!("corrupt assignment service: {e}"))?,
            agent_name: row.agent_name,
            bank_name: row.bank_name,
            position: row.position,
            status: row
                .status
                .parse()
                .map_err(|e| anyhow!("corrupt assignment status: {e}"))?,
            is_current: row.is_current,
            assigned_at: row.assigned_at,
            updated_at: row.updated_at,
        })
    }
}

async fn insert_assignment<'e, E>(executor: E, a: &AgentAssignment) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO backoffice.agent_assignments
            (id, lead_id, service, agent_name, bank_name, position, status, is_current, assigned_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(a.id)
    .bind(a.lead_id)
    .bind(a.service.as_str())
    .bind(&a.agent_name)
    .bind(a.bank_name.as_deref())
    .bind(a.position)
    .bind(a.status.as_str())
    .bind(a.is_current)
    .bind(a.assigned_at)
    .bind(a.updated_at)
    .execute(executor)
    .await
    .map_err(|e| anyhow!(e))?;
    Ok(())
}

// ── PgLeadStore ───────────────────────────────────────────────

/// Postgres-backed lead store.
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn assignments_for(&self, lead_ids: &[Uuid]) -> Result<Vec<AgentAssignment>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM backoffice.agent_assignments \
             WHERE lead_id = ANY($1) ORDER BY service, position, assigned_at"
        );
        let rows = sqlx::query_as::<_, PgAssignmentRow>(&sql)
            .bind(lead_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        rows.into_iter().map(AgentAssignment::try_from).collect()
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn create(&self, lead: &Lead) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            INSERT INTO backoffice.leads
                (id, name, email, phone, service_type, source, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(lead.phone.as_deref())
        .bind(lead.service_type.as_str())
        .bind(lead.source.as_deref())
        .bind(lead.notes.as_deref())
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        for assignment in &lead.assignments {
            insert_assignment(&mut *tx, assignment).await?;
        }
        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Lead> {
        let sql = format!(
            "SELECT {} FROM backoffice.leads WHERE id = $1",
            lead_select_columns()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?
            .ok_or_else(|| WorkflowError::NotFound(format!("lead {id}")))?;

        let mut lead = lead_from_row(&row)?;
        lead.assignments = self.assignments_for(&[id]).await?;
        Ok(lead)
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        let sql = format!(
            "SELECT {} FROM backoffice.leads ORDER BY created_at DESC",
            lead_select_columns()
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;

        let mut leads = rows
            .iter()
            .map(lead_from_row)
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<Uuid> = leads.iter().map(|l| l.id).collect();
        if !ids.is_empty() {
            let mut by_lead: std::collections::HashMap<Uuid, Vec<AgentAssignment>> =
                std::collections::HashMap::new();
            for assignment in self.assignments_for(&ids).await? {
                by_lead.entry(assignment.lead_id).or_default().push(assignment);
            }
            for lead in &mut leads {
                if let Some(assignments) = by_lead.remove(&lead.id) {
                    lead.assignments = assignments;
                }
            }
        }
        Ok(leads)
    }

    async fn update_project(
        &self,
        lead_id: Uuid,
        kind: ProjectKind,
        record: &ProjectRecord,
    ) -> Result<()> {
        let (sets, _) = project_set_clause(column_prefix(kind), 2);
        let sql =
            format!("UPDATE backoffice.leads SET {sets}, updated_at = now() WHERE id = $1");
        let result = bind_project(sqlx::query(&sql).bind(lead_id), record)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound(format!("lead {lead_id}")));
        }
        Ok(())
    }

    async fn update_all_projects(
        &self,
        lead_id: Uuid,
        company: &ProjectRecord,
        bank: &ProjectRecord,
        bank_deal: &ProjectRecord,
    ) -> Result<()> {
        let (company_sets, next) = project_set_clause("company_", 2);
        let (bank_sets, next) = project_set_clause("bank_", next);
        let (bank_deal_sets, _) = project_set_clause("bank_deal_", next);
        let sql = format!(
            "UPDATE backoffice.leads SET {company_sets}, {bank_sets}, {bank_deal_sets}, \
             updated_at = now() WHERE id = $1"
        );

        let query = sqlx::query(&sql).bind(lead_id);
        let query = bind_project(query, company);
        let query = bind_project(query, bank);
        let query = bind_project(query, bank_deal);
        let result = query.execute(&self.pool).await.map_err(|e| anyhow!(e))?;
        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound(format!("lead {lead_id}")));
        }
        Ok(())
    }

    async fn reminder_candidates(
        &self,
        kind: ProjectKind,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Lead>> {
        let prefix = column_prefix(kind);
        let sql = format!(
            r#"
            SELECT {columns}
            FROM backoffice.leads
            WHERE {prefix}invoice_sent_at IS NOT NULL
              AND {prefix}payment_received_at IS NULL
              AND {prefix}declined_at IS NULL
              AND {prefix}quote_declined_at IS NULL
              AND {prefix}approved IS DISTINCT FROM FALSE
              AND ({prefix}payment_reminder_sent_at IS NULL
                   OR {prefix}payment_reminder_sent_at <= $1)
            ORDER BY {prefix}invoice_sent_at ASC
            LIMIT $2
            "#,
            columns = lead_select_columns(),
        );
        let rows = sqlx::query(&sql)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        rows.iter().map(lead_from_row).collect()
    }

    async fn delete_cascade(&self, ids: &[Uuid]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        sqlx::query("DELETE FROM backoffice.activity_log WHERE lead_id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query("DELETE FROM backoffice.invoice_revisions WHERE lead_id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query("DELETE FROM backoffice.agent_assignments WHERE lead_id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        let result = sqlx::query("DELETE FROM backoffice.leads WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected())
    }
}

// ── PgAssignmentStore ─────────────────────────────────────────

pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore {
    async fn update_status(
        &self,
        lead_id: Uuid,
        assignment_id: Uuid,
        status: AssignmentStatus,
        make_current: bool,
    ) -> Result<AgentAssignment> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        if make_current {
            sqlx::query(
                r#"
                UPDATE backoffice.agent_assignments
                SET is_current = FALSE, updated_at = now()
                WHERE lead_id = $1
                  AND service = (SELECT service FROM backoffice.agent_assignments WHERE id = $2)
                "#,
            )
            .bind(lead_id)
            .bind(assignment_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        }

        let sql = format!(
            r#"
            UPDATE backoffice.agent_assignments
            SET status = $3,
                is_current = CASE WHEN $4 THEN TRUE ELSE is_current END,
                updated_at = now()
            WHERE id = $2 AND lead_id = $1
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgAssignmentRow>(&sql)
            .bind(lead_id)
            .bind(assignment_id)
            .bind(status.as_str())
            .bind(make_current)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("assignment {assignment_id} on lead {lead_id}"))
            })?;
        tx.commit().await.map_err(|e| anyhow!(e))?;
        row.try_into()
    }

    async fn delete_for_lead(&self, lead_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM backoffice.agent_assignments WHERE lead_id = $1")
            .bind(lead_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected())
    }
}

// ── PgActivityLog ─────────────────────────────────────────────

pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PgActivityRow {
    id: Uuid,
    lead_id: Uuid,
    action: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<PgActivityRow> for ActivityEntry {
    fn from(row: PgActivityRow) -> Self {
        ActivityEntry {
            id: row.id,
            lead_id: row.lead_id,
            action: row.action,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn append(&self, entry: &ActivityEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO backoffice.activity_log (id, lead_id, action, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id)
        .bind(entry.lead_id)
        .bind(&entry.action)
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn for_lead(&self, lead_id: Uuid) -> Result<Vec<ActivityEntry>> {
        let rows = sqlx::query_as::<_, PgActivityRow>(
            r#"
            SELECT id, lead_id, action, message, created_at
            FROM backoffice.activity_log
            WHERE lead_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(ActivityEntry::from).collect())
    }
}

// ── PgInvoiceRevisionStore ────────────────────────────────────

pub struct PgInvoiceRevisionStore {
    pool: PgPool,
}

impl PgInvoiceRevisionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PgRevisionRow {
    id: Uuid,
    lead_id: Uuid,
    project: String,
    version: i32,
    invoice_number: String,
    amount: Option<rust_decimal::Decimal>,
    issued_at: DateTime<Utc>,
}

impl TryFrom<PgRevisionRow> for InvoiceRevision {
    type Error = WorkflowError;

    fn try_from(row: PgRevisionRow) -> Result<InvoiceRevision> {
        Ok(InvoiceRevision {
            id: row.id,
            lead_id: row.lead_id,
            project: row
                .project
                .parse()
                .map_err(|e| anyhow!("corrupt revision project: {e}"))?,
            version: row.version,
            invoice_number: row.invoice_number,
            amount: row.amount,
            issued_at: row.issued_at,
        })
    }
}

#[async_trait]
impl InvoiceRevisionStore for PgInvoiceRevisionStore {
    async fn append(&self, revision: &InvoiceRevision) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO backoffice.invoice_revisions
                (id, lead_id, project, version, invoice_number, amount, issued_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(revision.id)
        .bind(revision.lead_id)
        .bind(revision.project.as_str())
        .bind(revision.version)
        .bind(&revision.invoice_number)
        .bind(revision.amount)
        .bind(revision.issued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn for_project(&self, lead_id: Uuid, kind: ProjectKind) -> Result<Vec<InvoiceRevision>> {
        let rows = sqlx::query_as::<_, PgRevisionRow>(
            r#"
            SELECT id, lead_id, project, version, invoice_number, amount, issued_at
            FROM backoffice.invoice_revisions
            WHERE lead_id = $1 AND project = $2
            ORDER BY version DESC
            "#,
        )
        .bind(lead_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        rows.into_iter().map(InvoiceRevision::try_from).collect()
    }
}

// ── PgReminderRunStore ────────────────────────────────────────

pub struct PgReminderRunStore {
    pool: PgPool,
}

impl PgReminderRunStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRunStore for PgReminderRunStore {
    async fn record(&self, run: &ReminderRun) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO backoffice.reminder_runs
                (id, processed, sent, skipped, errors, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(run.id)
        .bind(run.processed)
        .bind(run.sent)
        .bind(run.skipped)
        .bind(serde_json::json!(run.errors))
        .bind(run.started_at)
        .bind(run.finished_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

// ── Integration tests ─────────────────────────────────────────
// Require a running PostgreSQL with schema.sql applied and
// UBD_DATABASE_URL set.

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use ubd_core::agent::ServiceKind;
    use ubd_core::lead::ServiceType;

    async fn pool() -> PgPool {
        let url = std::env::var("UBD_DATABASE_URL").expect("UBD_DATABASE_URL must be set");
        PgPool::connect(&url).await.expect("connect")
    }

    #[tokio::test]
    #[ignore] // requires UBD_DATABASE_URL
    async fn lead_round_trip() {
        let pool = pool().await;
        let store = PgLeadStore::new(pool.clone());

        let mut lead = Lead::new(
            "Integration Test",
            "integration@example.com",
            Some("+971500000000".into()),
            ServiceType::Both,
        );
        lead.assignments.push(AgentAssignment::new(
            lead.id,
            ServiceKind::CompanyFormation,
            "Athar",
            1,
        ));
        store.create(&lead).await.expect("create");

        let loaded = store.load(lead.id).await.expect("load");
        assert_eq!(loaded.name, "Integration Test");
        assert_eq!(loaded.service_type, ServiceType::Both);
        assert_eq!(loaded.assignments.len(), 1);
        assert_eq!(loaded.company.invoice_version, 1);

        store.delete_cascade(&[lead.id]).await.expect("cleanup");
    }

    #[tokio::test]
    #[ignore] // requires UBD_DATABASE_URL
    async fn project_update_round_trip() {
        let pool = pool().await;
        let store = PgLeadStore::new(pool.clone());

        let lead = Lead::new("Update Test", "update@example.com", None, ServiceType::BankAccount);
        store.create(&lead).await.expect("create");

        let mut record = lead.bank.clone();
        record.quoted_amount = Some(Decimal::new(95_000, 1));
        record.quote_sent_at = Some(Utc::now());
        store
            .update_project(lead.id, ProjectKind::Bank, &record)
            .await
            .expect("update");

        let loaded = store.load(lead.id).await.expect("load");
        assert_eq!(loaded.bank.quoted_amount, Some(Decimal::new(95_000, 1)));
        assert!(loaded.bank.quote_sent_at.is_some());
        assert!(loaded.company.quote_sent_at.is_none());

        store.delete_cascade(&[lead.id]).await.expect("cleanup");
    }

    #[tokio::test]
    #[ignore] // requires UBD_DATABASE_URL
    async fn reminder_candidates_filter() {
        let pool = pool().await;
        let store = PgLeadStore::new(pool.clone());

        let mut due = Lead::new("Due", "due@example.com", None, ServiceType::CompanyFormation);
        due.company.invoice_sent_at = Some(Utc::now() - chrono::Duration::days(5));
        let mut paid = Lead::new("Paid", "paid@example.com", None, ServiceType::CompanyFormation);
        paid.company.invoice_sent_at = Some(Utc::now() - chrono::Duration::days(5));
        paid.company.payment_received_at = Some(Utc::now());

        store.create(&due).await.expect("create due");
        store.create(&paid).await.expect("create paid");
        store
            .update_project(due.id, ProjectKind::Company, &due.company)
            .await
            .expect("update due");
        store
            .update_project(paid.id, ProjectKind::Company, &paid.company)
            .await
            .expect("update paid");

        let candidates = store
            .reminder_candidates(ProjectKind::Company, Utc::now(), 50)
            .await
            .expect("candidates");
        let ids: Vec<Uuid> = candidates.iter().map(|l| l.id).collect();
        assert!(ids.contains(&due.id));
        assert!(!ids.contains(&paid.id));

        store.delete_cascade(&[due.id, paid.id]).await.expect("cleanup");
    }
}
