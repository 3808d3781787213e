//! # Reminder Commands
//!
//! Renders payment reminders. Nothing is sent: the email is printed for
//! the user's mail client and the WhatsApp reminder is a click-to-chat link.

use clap::Subcommand;
use serde_json::json;

use super::{print_json, Context};
use crate::error::ApiError;
use tally_core::reminder;

#[derive(Subcommand, Debug)]
pub enum RemindCommand {
    /// Render an HTML + text email
    Email { id: String },
    /// Render a wa.me link with the reminder text
    Whatsapp { id: String },
}

pub async fn run(ctx: &Context, command: RemindCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let settings = ctx.db.settings().get(&user.id).await?;
    let business = ctx.config.business_name.as_str();

    match command {
        RemindCommand::Email { id } => {
            let debtor = ctx.db.debtors().get(&user.id, &id).await?;
            print_json(&reminder::email_reminder(&debtor, business, &settings)?)
        }
        RemindCommand::Whatsapp { id } => {
            let debtor = ctx.db.debtors().get(&user.id, &id).await?;
            let link = reminder::whatsapp_link(&debtor, business, &settings)?;
            print_json(&json!({ "debtor_id": debtor.id, "link": link }))
        }
    }
}
