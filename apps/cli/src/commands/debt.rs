//! # Debt Commands
//!
//! Items are given as `NAME:QUANTITY:PRICE`, e.g. `--item "Rice 5kg:2:50.00"`.

use clap::{Args, Subcommand};
use serde_json::json;

use super::{parse_money, print_json, Context};
use crate::error::ApiError;
use tally_core::{ContactUpdate, DebtStatus, Money, NewDebtItem, NewDebtor};

#[derive(Subcommand, Debug)]
pub enum DebtCommand {
    /// Open a debtor account with its first items
    Open(OpenArgs),
    /// Add an item bought on credit
    AddItem {
        id: String,
        #[arg(long, value_parser = parse_item)]
        item: NewDebtItem,
    },
    /// Record an installment payment
    Pay {
        id: String,
        #[arg(long, value_parser = parse_money)]
        amount: Money,
        #[arg(long)]
        note: Option<String>,
    },
    /// List debtors, largest balance first
    List {
        /// pending or paid
        #[arg(long)]
        status: Option<DebtStatus>,
        /// Substring of name, phone or email
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a debtor with items and payments
    Show { id: String },
    /// Change name, phone or email ("" clears phone/email)
    UpdateContact(ContactArgs),
    /// Delete a debtor with its items and payments
    Delete { id: String },
    /// Check stored totals against items and payments
    Reconcile { id: String },
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// NAME:QUANTITY:PRICE, repeatable
    #[arg(long = "item", value_parser = parse_item, required = true)]
    pub items: Vec<NewDebtItem>,
    /// Paid up front
    #[arg(long, value_parser = parse_money)]
    pub deposit: Option<Money>,
}

#[derive(Args, Debug)]
pub struct ContactArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

/// Parses `NAME:QUANTITY:PRICE`. The name may itself contain colons.
pub fn parse_item(input: &str) -> Result<NewDebtItem, String> {
    let mut parts = input.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected NAME:QUANTITY:PRICE, got '{}'", input));
    };

    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    let selling_price = Money::parse_decimal(price, "price").map_err(|e| e.to_string())?;

    Ok(NewDebtItem {
        item_name: name.trim().to_string(),
        quantity,
        selling_price,
    })
}

pub async fn run(ctx: &Context, command: DebtCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let debtors = ctx.db.debtors();

    match command {
        DebtCommand::Open(args) => {
            let detail = debtors
                .create(
                    &user.id,
                    &NewDebtor {
                        customer_name: args.name,
                        customer_phone: args.phone,
                        customer_email: args.email,
                        items: args.items,
                        deposit: args.deposit,
                    },
                )
                .await?;
            print_json(&detail)
        }
        DebtCommand::AddItem { id, item } => {
            let (debtor, item) = debtors.add_item(&user.id, &id, &item).await?;
            print_json(&json!({ "debtor": debtor, "item": item }))
        }
        DebtCommand::Pay { id, amount, note } => {
            let receipt = debtors
                .record_payment(&user.id, &id, amount, note.as_deref())
                .await?;
            print_json(&receipt)
        }
        DebtCommand::List { status, search } => {
            let listed = debtors.list(&user.id, status, search.as_deref()).await?;
            print_json(&listed)
        }
        DebtCommand::Show { id } => print_json(&debtors.detail(&user.id, &id).await?),
        DebtCommand::UpdateContact(args) => {
            let update = ContactUpdate {
                customer_name: args.name,
                customer_phone: args.phone,
                customer_email: args.email,
            };
            let debtor = debtors.update_contact(&user.id, &args.id, &update).await?;
            print_json(&debtor)
        }
        DebtCommand::Delete { id } => {
            debtors.delete(&user.id, &id).await?;
            print_json(&json!({ "deleted": id }))
        }
        DebtCommand::Reconcile { id } => {
            let report = debtors.reconcile(&user.id, &id).await?;
            if !report.is_consistent() {
                tracing::warn!(debtor_id = %id, "Debtor totals disagree with items or payments");
            }
            print_json(&json!({ "consistent": report.is_consistent(), "report": report }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("Rice 5kg:2:50.00").unwrap();
        assert_eq!(item.item_name, "Rice 5kg");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.selling_price, Money::from_cents(5000));

        let item = parse_item("Cable 2:1 adapter:1:3.5").unwrap();
        assert_eq!(item.item_name, "Cable 2:1 adapter");
        assert_eq!(item.selling_price, Money::from_cents(350));
    }

    #[test]
    fn test_parse_item_errors() {
        assert!(parse_item("Rice").is_err());
        assert!(parse_item("Rice:two:5.00").is_err());
        assert!(parse_item("Rice:2:five").is_err());
    }
}
