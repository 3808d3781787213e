//! # Settings Commands

use clap::Subcommand;

use super::{print_json, Context};
use crate::error::ApiError;
use tally_core::{SettingsUpdate, Theme};

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show current settings (defaults until first saved)
    Show,
    /// Change one or more settings
    Set {
        /// light, dark or system
        #[arg(long)]
        theme: Option<Theme>,
        /// ISO 4217 code, e.g. NGN
        #[arg(long)]
        currency: Option<String>,
        /// Display symbol, e.g. ₦
        #[arg(long)]
        symbol: Option<String>,
        /// Profit margin goal in percent, e.g. 25 or 22.5
        #[arg(long, value_parser = parse_percent_bps)]
        margin_goal: Option<i64>,
    },
}

/// Parses a percentage with up to two decimals into basis points.
fn parse_percent_bps(input: &str) -> Result<i64, String> {
    tally_core::Money::parse_decimal(input.trim().trim_end_matches('%'), "margin goal")
        .map(|m| m.cents())
        .map_err(|e| e.to_string())
}

pub async fn run(ctx: &Context, command: SettingsCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let settings = ctx.db.settings();

    match command {
        SettingsCommand::Show => print_json(&settings.get(&user.id).await?),
        SettingsCommand::Set {
            theme,
            currency,
            symbol,
            margin_goal,
        } => {
            let update = SettingsUpdate {
                theme,
                currency_code: currency,
                currency_symbol: symbol,
                profit_margin_goal_bps: margin_goal,
            };
            print_json(&settings.upsert(&user.id, &update).await?)
        }
    }
}
