//! # Expense Commands

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde_json::json;

use super::{parse_money, print_json, Context, RangeArgs};
use crate::error::ApiError;
use tally_core::{ExpenseUpdate, Money, NewExpense};

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// Record an expense
    Add(AddArgs),
    /// List expenses, newest first
    List {
        #[command(flatten)]
        range: RangeArgs,
        /// Exact category, ignoring case
        #[arg(long)]
        category: Option<String>,
    },
    /// Edit an expense
    Update(UpdateArgs),
    /// Delete an expense
    Delete { id: String },
    /// Categories used so far
    Categories,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long, value_parser = parse_money)]
    pub amount: Money,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub description: String,
    /// Defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long, value_parser = parse_money)]
    pub amount: Option<Money>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub async fn run(ctx: &Context, command: ExpenseCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let expenses = ctx.db.expenses();

    match command {
        ExpenseCommand::Add(args) => {
            let expense = expenses
                .create(
                    &user.id,
                    &NewExpense {
                        expense_date: args.date.unwrap_or_else(|| ctx.today()),
                        category: args.category,
                        description: args.description,
                        amount: args.amount,
                    },
                )
                .await?;
            print_json(&expense)
        }
        ExpenseCommand::List { range, category } => {
            let range = range.resolve(ctx.today())?;
            let listed = expenses
                .list(&user.id, &range, category.as_deref())
                .await?;
            let total: Money = listed.iter().map(|e| e.amount()).sum();
            print_json(&json!({ "range": range, "total": total, "expenses": listed }))
        }
        ExpenseCommand::Update(args) => {
            let update = ExpenseUpdate {
                expense_date: args.date,
                category: args.category,
                description: args.description,
                amount: args.amount,
            };
            let expense = expenses.update(&user.id, &args.id, &update).await?;
            print_json(&expense)
        }
        ExpenseCommand::Delete { id } => {
            expenses.delete(&user.id, &id).await?;
            print_json(&json!({ "deleted": id }))
        }
        ExpenseCommand::Categories => print_json(&expenses.categories(&user.id).await?),
    }
}
