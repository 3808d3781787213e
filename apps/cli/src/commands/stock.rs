//! # Stock Commands

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;

use super::{parse_money, print_json, Context};
use crate::error::ApiError;
use tally_core::{Money, NewStockItem, StockItem, StockUpdate};

#[derive(Subcommand, Debug)]
pub enum StockCommand {
    /// Add a product to the inventory
    Add(AddArgs),
    /// List products by name
    List {
        /// Substring of the product name
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product
    Show { id: String },
    /// Edit name, cost price or quantity
    Update(UpdateArgs),
    /// Add purchased units
    Restock {
        id: String,
        #[arg(long)]
        quantity: i64,
    },
    /// Delete a product; its past sales are kept
    Delete { id: String },
    /// Products at or below the low-stock threshold
    Low {
        /// Defaults to TALLY_LOW_STOCK_THRESHOLD
        #[arg(long)]
        threshold: Option<i64>,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub quantity: i64,
    /// Unit cost, e.g. 4.20
    #[arg(long, value_parser = parse_money)]
    pub cost: Money,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub quantity: Option<i64>,
    #[arg(long, value_parser = parse_money)]
    pub cost: Option<Money>,
}

/// A stock item with its value at cost.
#[derive(Debug, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub item: StockItem,
    pub stock_value: Money,
}

impl From<StockItem> for StockView {
    fn from(item: StockItem) -> Self {
        StockView {
            stock_value: item.stock_value(),
            item,
        }
    }
}

fn views(items: Vec<StockItem>) -> Vec<StockView> {
    items.into_iter().map(StockView::from).collect()
}

pub async fn run(ctx: &Context, command: StockCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let stock = ctx.db.stock();

    match command {
        StockCommand::Add(args) => {
            let item = stock
                .create(
                    &user.id,
                    &NewStockItem {
                        product_name: args.name,
                        quantity: args.quantity,
                        cost_price: args.cost,
                    },
                )
                .await?;
            print_json(&StockView::from(item))
        }
        StockCommand::List { search } => {
            let items = stock.list(&user.id, search.as_deref()).await?;
            print_json(&views(items))
        }
        StockCommand::Show { id } => print_json(&StockView::from(stock.get(&user.id, &id).await?)),
        StockCommand::Update(args) => {
            let update = StockUpdate {
                product_name: args.name,
                quantity: args.quantity,
                cost_price: args.cost,
            };
            if update.product_name.is_none()
                && update.quantity.is_none()
                && update.cost_price.is_none()
            {
                return Err(ApiError::validation(
                    "Nothing to update: pass --name, --quantity or --cost",
                ));
            }
            let item = stock.update(&user.id, &args.id, &update).await?;
            print_json(&StockView::from(item))
        }
        StockCommand::Restock { id, quantity } => {
            let item = stock.restock(&user.id, &id, quantity).await?;
            print_json(&StockView::from(item))
        }
        StockCommand::Delete { id } => {
            stock.delete(&user.id, &id).await?;
            print_json(&json!({ "deleted": id }))
        }
        StockCommand::Low { threshold } => {
            let threshold = threshold.unwrap_or(ctx.config.low_stock_threshold);
            let items = stock.low_stock(&user.id, threshold).await?;
            print_json(&json!({ "threshold": threshold, "items": views(items) }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_view_shows_money_in_major_units() {
        let now = Utc::now();
        let view = StockView::from(StockItem {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            product_name: "Rice 5kg".to_string(),
            quantity: 3,
            cost_price_cents: 1405,
            total_sold: 0,
            created_at: now,
            updated_at: now,
        });

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["stock_value"], "42.15");
        assert_eq!(value["cost_price_cents"], 1405);
        assert_eq!(value["product_name"], "Rice 5kg");
    }
}
