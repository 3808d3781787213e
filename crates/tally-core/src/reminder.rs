//! # Payment Reminders
//!
//! Renders reminder messages for debtors with an outstanding balance.
//! Delivery happens elsewhere (the user's mail client or WhatsApp); this
//! module only produces the text.
//!
//! ```text
//! Debtor (pending, balance > 0)
//!      │
//!      ├── email_reminder   ──► EmailReminder { to, subject, html, text }
//!      │                         (needs customer_email)
//!      │
//!      └── whatsapp_link    ──► https://wa.me/2348012345678?text=Hello%20Ada...
//!                                (needs customer_phone)
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{DebtStatus, Debtor, UserSettings};
use crate::validation;

/// A rendered reminder email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailReminder {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Escapes text for inclusion in HTML element content or attributes.
///
/// ## Example
/// ```rust
/// use tally_core::reminder::escape_html;
///
/// assert_eq!(escape_html("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn ensure_outstanding(debtor: &Debtor) -> CoreResult<()> {
    if debtor.status == DebtStatus::Paid || !debtor.current_balance().is_positive() {
        return Err(CoreError::NothingOutstanding {
            customer: debtor.customer_name.clone(),
        });
    }
    Ok(())
}

fn missing(debtor: &Debtor, channel: &str) -> CoreError {
    CoreError::MissingContact {
        customer: debtor.customer_name.clone(),
        channel: channel.to_string(),
    }
}

/// Plain text shared by the email text part and the WhatsApp message.
fn reminder_text(debtor: &Debtor, business_name: &str, settings: &UserSettings) -> String {
    format!(
        "Hello {name},\n\n\
         This is a friendly reminder from {business} that you have an outstanding \
         balance of {balance}.\n\
         Total purchased: {total}\n\
         Paid so far: {paid}\n\n\
         Thank you for your business.",
        name = debtor.customer_name,
        business = business_name,
        balance = settings.format(debtor.current_balance()),
        total = settings.format(debtor.grand_total()),
        paid = settings.format(debtor.total_paid()),
    )
}

/// Renders an email reminder for a debtor with an outstanding balance.
///
/// ## Errors
/// - `NothingOutstanding` when the debtor is settled
/// - `MissingContact` when the debtor has no email address
pub fn email_reminder(
    debtor: &Debtor,
    business_name: &str,
    settings: &UserSettings,
) -> CoreResult<EmailReminder> {
    ensure_outstanding(debtor)?;

    let to = debtor
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| missing(debtor, "email"))?;
    validation::validate_email(to)?;

    let balance = settings.format(debtor.current_balance());
    let subject = format!("Payment reminder from {}: {} outstanding", business_name, balance);

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #222;">
  <h2>Payment reminder</h2>
  <p>Hello {name},</p>
  <p>This is a friendly reminder from <strong>{business}</strong> that you have an outstanding balance.</p>
  <table style="border-collapse: collapse;">
    <tr><td>Total purchased</td><td style="text-align: right;">{total}</td></tr>
    <tr><td>Paid so far</td><td style="text-align: right;">{paid}</td></tr>
    <tr><td><strong>Balance due</strong></td><td style="text-align: right;"><strong>{balance}</strong></td></tr>
  </table>
  <p>Thank you for your business.</p>
</body>
</html>
"#,
        name = escape_html(&debtor.customer_name),
        business = escape_html(business_name),
        total = escape_html(&settings.format(debtor.grand_total())),
        paid = escape_html(&settings.format(debtor.total_paid())),
        balance = escape_html(&balance),
    );

    Ok(EmailReminder {
        to: to.to_string(),
        subject,
        html_body,
        text_body: reminder_text(debtor, business_name, settings),
    })
}

/// Renders a WhatsApp click-to-chat link carrying the reminder text.
///
/// The phone number is reduced to its digits, as `wa.me` expects.
pub fn whatsapp_link(
    debtor: &Debtor,
    business_name: &str,
    settings: &UserSettings,
) -> CoreResult<String> {
    ensure_outstanding(debtor)?;

    let phone = debtor
        .customer_phone
        .as_deref()
        .filter(|phone| !phone.trim().is_empty())
        .ok_or_else(|| missing(debtor, "phone"))?;
    validation::validate_phone(phone)?;

    let text = reminder_text(debtor, business_name, settings);
    Ok(format!(
        "https://wa.me/{}?text={}",
        validation::phone_digits(phone),
        urlencoding::encode(&text)
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================
