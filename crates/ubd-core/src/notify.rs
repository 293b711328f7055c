//! Notification composition.
//!
//! Pure builders for the customer and admin messages the workflow sends.
//! Dispatch goes through the [`crate::ports::Mailer`] and
//! [`crate::ports::WhatsAppSender`] ports; a failed send never fails the
//! transition that triggered it.

use serde::Serialize;

use crate::lead::{Lead, ProjectKind};
use rust_decimal::Decimal;

/// How one outbound message fared. Returned inside API responses so the
/// admin can see a send failure without the transition itself failing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStatus {
    pub attempted: bool,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchStatus {
    pub fn skipped() -> Self {
        DispatchStatus {
            attempted: false,
            ok: false,
            error: None,
        }
    }

    pub fn sent() -> Self {
        DispatchStatus {
            attempted: true,
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        DispatchStatus {
            attempted: true,
            ok: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppMessage {
    pub to_phone: String,
    pub body: String,
}

/// What a quote on this track covers, shown on the customer quote page.
pub fn coverage_description(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::Company => {
            "Company formation package: trade license, establishment card and visa processing support."
        }
        ProjectKind::Bank | ProjectKind::BankDeal => {
            "Bank account opening assistance: bank introductions, documentation support and application follow-up."
        }
    }
}

// ── Customer messages ──────────────────────────────────────────────────────

pub fn quote_email(lead: &Lead, kind: ProjectKind, amount: Decimal, decision_url: &str) -> EmailMessage {
    let track = kind.display_name().to_lowercase();
    EmailMessage {
        to: lead.email.clone(),
        subject: format!("Your {track} quote from UBD"),
        body: format!(
            "Dear {name},\n\n\
             Thank you for your interest in our {track} services.\n\n\
             {coverage}\n\n\
             Quoted amount: AED {amount}\n\n\
             Please review the quote and let us know how you would like to proceed:\n\
             {url}\n\n\
             The link stays valid for 30 days.\n\n\
             Best regards,\nUBD Team",
            name = lead.name,
            coverage = coverage_description(kind),
            amount = amount,
            url = decision_url,
        ),
    }
}

pub fn quote_whatsapp(
    lead: &Lead,
    kind: ProjectKind,
    amount: Decimal,
    decision_url: &str,
) -> Option<WhatsAppMessage> {
    let phone = lead.phone.as_deref()?;
    Some(WhatsAppMessage {
        to_phone: phone.to_string(),
        body: format!(
            "Hi {}, your {} quote from UBD is ready: AED {}. Review and respond here: {}",
            lead.name,
            kind.display_name().to_lowercase(),
            amount,
            decision_url,
        ),
    })
}

pub fn invoice_email(
    lead: &Lead,
    kind: ProjectKind,
    invoice_number: &str,
    amount: Decimal,
    view_url: &str,
    payment_link: Option<&str>,
) -> EmailMessage {
    let mut body = format!(
        "Dear {name},\n\n\
         Please find your invoice for the {track} service below.\n\n\
         Invoice number: {number}\n\
         Amount due: AED {amount}\n\n\
         View your invoice: {url}\n",
        name = lead.name,
        track = kind.display_name().to_lowercase(),
        number = invoice_number,
        amount = amount,
        url = view_url,
    );
    if let Some(link) = payment_link {
        body.push_str(&format!("Pay online: {link}\n"));
    }
    body.push_str("\nBest regards,\nUBD Team");
    EmailMessage {
        to: lead.email.clone(),
        subject: format!("Invoice {invoice_number} from UBD"),
        body,
    }
}

pub fn reminder_email(
    lead: &Lead,
    kind: ProjectKind,
    invoice_number: &str,
    amount: Option<Decimal>,
    view_url: &str,
    payment_link: Option<&str>,
) -> EmailMessage {
    let amount_line = match amount {
        Some(a) => format!("Amount due: AED {a}\n"),
        None => String::new(),
    };
    let mut body = format!(
        "Dear {name},\n\n\
         A friendly reminder that invoice {number} for your {track} service is still unpaid.\n\n\
         {amount_line}\
         View your invoice: {url}\n",
        name = lead.name,
        number = invoice_number,
        track = kind.display_name().to_lowercase(),
        amount_line = amount_line,
        url = view_url,
    );
    if let Some(link) = payment_link {
        body.push_str(&format!("Pay online: {link}\n"));
    }
    body.push_str("\nBest regards,\nUBD Team");
    EmailMessage {
        to: lead.email.clone(),
        subject: format!("Payment reminder: invoice {invoice_number}"),
        body,
    }
}

// ── Admin alerts ───────────────────────────────────────────────────────────

/// Events the admin inbox is told about. Sends the admin triggers directly
/// (quote, invoice, manual reminder) report their outcome in the API
/// response instead of emailing the admin about it.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminEvent {
    LeadCaptured,
    QuoteViewed,
    CustomerProceeded,
    CustomerDeclined { reason: Option<String> },
    QuestionsRaised { reason: Option<String> },
    PaymentReceived,
    /// A scheduler batch sent a reminder while nobody was watching.
    ReminderSent { invoice_number: String, count: i32 },
}

impl AdminEvent {
    fn headline(&self) -> &'static str {
        match self {
            AdminEvent::LeadCaptured => "New lead captured",
            AdminEvent::QuoteViewed => "Quote viewed by customer",
            AdminEvent::CustomerProceeded => "Customer accepted the quote",
            AdminEvent::CustomerDeclined { .. } => "Customer declined the quote",
            AdminEvent::QuestionsRaised { .. } => "Customer raised questions",
            AdminEvent::PaymentReceived => "Payment received",
            AdminEvent::ReminderSent { .. } => "Payment reminder sent",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            AdminEvent::CustomerDeclined { reason } | AdminEvent::QuestionsRaised { reason } => {
                reason.clone().map(|r| format!("Reason: {r}"))
            }
            AdminEvent::ReminderSent {
                invoice_number,
                count,
            } => Some(format!("Invoice {invoice_number}, reminder #{count}")),
            _ => None,
        }
    }
}

pub fn admin_email(
    admin_to: &str,
    lead: &Lead,
    track: Option<ProjectKind>,
    event: &AdminEvent,
) -> EmailMessage {
    let mut body = format!(
        "{headline}\n\n\
         Lead: {name} <{email}>\n",
        headline = event.headline(),
        name = lead.name,
        email = lead.email,
    );
    if let Some(kind) = track {
        body.push_str(&format!("Track: {}\n", kind.display_name()));
    }
    if let Some(phone) = &lead.phone {
        body.push_str(&format!("Phone: {phone}\n"));
    }
    if let Some(detail) = event.detail() {
        body.push('\n');
        body.push_str(&detail);
        body.push('\n');
    }
    EmailMessage {
        to: admin_to.to_string(),
        subject: format!("[UBD] {} - {}", event.headline(), lead.name),
        body,
    }
}
