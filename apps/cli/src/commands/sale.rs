//! # Sale Commands

use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Subcommand};
use serde_json::json;

use super::{parse_money, print_json, Context, RangeArgs};
use crate::error::ApiError;
use tally_core::{Money, NewSale};

#[derive(Subcommand, Debug)]
pub enum SaleCommand {
    /// Record a sale and deduct it from stock
    Record(RecordArgs),
    /// List sales, newest first
    List(RangeArgs),
    /// Show one sale
    Show { id: String },
    /// Delete a sale and put its units back into stock
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Stock item name (case-insensitive)
    #[arg(long)]
    pub product: String,
    #[arg(long)]
    pub quantity: i64,
    /// Unit selling price
    #[arg(long, value_parser = parse_money)]
    pub price: Money,
    /// Unit cost; defaults to the stock item's cost price
    #[arg(long, value_parser = parse_money)]
    pub cost: Option<Money>,
    /// Backdate the sale (YYYY-MM-DD); the time of day is now
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub async fn run(ctx: &Context, command: SaleCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let sales = ctx.db.sales();

    match command {
        SaleCommand::Record(args) => {
            let sold_at = args
                .date
                .map(|day| Utc.from_utc_datetime(&day.and_time(Utc::now().time())));
            let sale = sales
                .record(
                    &user.id,
                    &NewSale {
                        product_name: args.product,
                        quantity: args.quantity,
                        selling_price: args.price,
                        cost_price: args.cost,
                        sold_at,
                    },
                )
                .await?;
            print_json(&sale)
        }
        SaleCommand::List(range) => {
            let range = range.resolve(ctx.today())?;
            let listed = sales.list(&user.id, &range).await?;
            print_json(&json!({ "range": range, "sales": listed }))
        }
        SaleCommand::Show { id } => print_json(&sales.get(&user.id, &id).await?),
        SaleCommand::Delete { id } => {
            let sale = sales.delete(&user.id, &id).await?;
            let restocked = sale.stock_item_id.is_some().then_some(sale.quantity);
            print_json(&json!({ "deleted": sale.id, "restocked": restocked }))
        }
    }
}
