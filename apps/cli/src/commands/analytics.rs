//! # Analytics Commands
//!
//! Rows are filtered by date in SQL; aggregation happens in
//! `tally_core::analytics`.

use clap::Subcommand;
use serde_json::json;

use super::{print_json, Context, RangeArgs};
use crate::error::ApiError;
use tally_core::analytics::{self, format_bps};

#[derive(Subcommand, Debug)]
pub enum AnalyticsCommand {
    /// Revenue, profit, expenses, margin and outstanding debt
    Summary(RangeArgs),
    /// Month-by-month figures with revenue change
    Monthly(RangeArgs),
    /// Debtors ranked by amount bought on credit
    TopCustomers {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Products ranked by revenue
    TopProducts {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Expenses grouped by category
    Expenses(RangeArgs),
}

pub async fn run(ctx: &Context, command: AnalyticsCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let today = ctx.today();

    match command {
        AnalyticsCommand::Summary(range) => {
            let range = range.resolve(today)?;
            let sales = ctx.db.sales().list(&user.id, &range).await?;
            let expenses = ctx.db.expenses().list(&user.id, &range, None).await?;
            let debtors = ctx.db.debtors().list(&user.id, None, None).await?;
            let settings = ctx.db.settings().get(&user.id).await?;

            let summary = analytics::summarize(&sales, &expenses, &debtors);
            let alert = summary.margin_alert(settings.profit_margin_goal_bps);
            if let Some(alert) = &alert {
                tracing::warn!("{}", alert);
            }

            print_json(&json!({
                "range": range,
                "currency": settings.currency_code,
                "summary": summary,
                "margin": summary.margin_bps.map(format_bps),
                "margin_alert": alert.map(|a| json!({ "message": a.to_string(), "detail": a })),
            }))
        }
        AnalyticsCommand::Monthly(range) => {
            let range = range.resolve(today)?;
            let sales = ctx.db.sales().list(&user.id, &range).await?;
            let expenses = ctx.db.expenses().list(&user.id, &range, None).await?;
            print_json(&analytics::monthly_comparison(&sales, &expenses))
        }
        AnalyticsCommand::TopCustomers { limit } => {
            let debtors = ctx.db.debtors().list(&user.id, None, None).await?;
            print_json(&analytics::top_customers(&debtors, limit))
        }
        AnalyticsCommand::TopProducts { range, limit } => {
            let range = range.resolve(today)?;
            let sales = ctx.db.sales().list(&user.id, &range).await?;
            print_json(&analytics::top_products(&sales, limit))
        }
        AnalyticsCommand::Expenses(range) => {
            let range = range.resolve(today)?;
            let expenses = ctx.db.expenses().list(&user.id, &range, None).await?;
            print_json(&analytics::expense_breakdown(&expenses))
        }
    }
}
