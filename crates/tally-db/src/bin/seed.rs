//! # Seed Data Generator
//!
//! Populates a database with a demo account for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db with three months of history (default)
//! cargo run -p tally-db --bin seed
//!
//! # More history
//! cargo run -p tally-db --bin seed -- --months 12
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - Account `demo@example.com` / `demo-password`
//! - A small grocery inventory
//! - A few sales per day, some of them at a loss
//! - Monthly rent plus transport and utility expenses
//! - Debtors in every state: untouched, part-paid, settled

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use std::env;
use tally_core::{Money, NewDebtItem, NewDebtor, NewExpense, NewSale, NewStockItem};
use tally_db::{Database, DbConfig};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo-password";

/// (name, opening quantity, cost cents, usual selling price cents)
const STOCK: &[(&str, i64, i64, i64)] = &[
    ("Rice 5kg", 400, 4_200, 5_000),
    ("Beans 1kg", 300, 900, 1_200),
    ("Vegetable Oil 1L", 250, 1_500, 1_850),
    ("Sugar 1kg", 300, 800, 1_000),
    ("Powdered Milk 400g", 200, 2_100, 2_600),
    ("Tomato Paste", 500, 250, 350),
    ("Spaghetti 500g", 400, 450, 600),
    ("Bottled Water", 900, 60, 100),
    ("Soap Bar", 350, 180, 250),
    ("Matches", 600, 20, 50),
];

/// (customer, phone, email, items as (name, qty, price cents), deposit, payments)
type DebtorSeed = (
    &'static str,
    Option<&'static str>,
    Option<&'static str>,
    &'static [(&'static str, i64, i64)],
    Option<i64>,
    &'static [i64],
);

const DEBTORS: &[DebtorSeed] = &[
    (
        "Ada Obi",
        Some("+234 801 234 5678"),
        Some("ada@example.com"),
        &[("Rice 5kg", 2, 5_000), ("Sugar 1kg", 3, 1_000)],
        None,
        &[4_000],
    ),
    (
        "Bola Johnson",
        Some("+234 802 555 0101"),
        None,
        &[("Powdered Milk 400g", 4, 2_600)],
        Some(2_000),
        &[4_000, 4_400],
    ),
    (
        "Chidi Eze",
        None,
        Some("chidi@example.com"),
        &[("Vegetable Oil 1L", 1, 1_850), ("Soap Bar", 6, 250)],
        None,
        &[],
    ),
];

/// (category, description, amount cents, day of month)
const MONTHLY_EXPENSES: &[(&str, &str, i64, u32)] = &[
    ("Rent", "Shop rent", 60_000, 1),
    ("Utilities", "Electricity", 7_500, 10),
    ("Transport", "Market run", 2_500, 8),
    ("Transport", "Market run", 2_500, 22),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut months: u32 = 3;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(3).clamp(1, 36);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --months <N>   Months of sales history (default: 3, max: 36)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("History:  {} months", months);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().get_by_email(DEMO_EMAIL).await?.is_some() {
        println!("⚠ {} already exists", DEMO_EMAIL);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let user = db.users().register(DEMO_EMAIL, DEMO_PASSWORD).await?;
    println!("✓ Created {} / {}", DEMO_EMAIL, DEMO_PASSWORD);

    // Stock
    for (name, quantity, cost, _) in STOCK {
        db.stock()
            .create(
                &user.id,
                &NewStockItem {
                    product_name: name.to_string(),
                    quantity: *quantity,
                    cost_price: Money::from_cents(*cost),
                },
            )
            .await?;
    }
    println!("✓ Stocked {} products", STOCK.len());

    // Sales: a few per day, walking back from today
    let today = Utc::now().date_naive();
    let first_day = months_back(today, months);
    let start = std::time::Instant::now();

    let mut recorded = 0;
    let mut rejected = 0;
    let mut day = first_day;
    let mut seed: usize = 0;
    while day <= today {
        let sales_today = 2 + seed % 4;
        for n in 0..sales_today {
            seed += 1;
            let (name, _, cost, price) = STOCK[(seed * 7 + n) % STOCK.len()];
            let quantity = 1 + (seed % 3) as i64;

            // Every 17th sale is a clearance below cost
            let selling_price = if seed % 17 == 0 { cost * 9 / 10 } else { price };
            let sold_at = day
                .and_hms_opt(9 + (n as u32 % 9), ((seed * 13) % 60) as u32, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));

            let sale = NewSale {
                product_name: name.to_string(),
                quantity,
                selling_price: Money::from_cents(selling_price),
                cost_price: None,
                sold_at,
            };

            match db.sales().record(&user.id, &sale).await {
                Ok(_) => recorded += 1,
                Err(e) => {
                    eprintln!("Skipped sale of {}: {}", name, e);
                    rejected += 1;
                }
            }
        }

        if recorded > 0 && recorded % 100 == 0 {
            println!("  Recorded {} sales...", recorded);
        }
        day += Duration::days(1);
    }

    let elapsed = start.elapsed();
    println!(
        "✓ Recorded {} sales in {:?} ({} rejected)",
        recorded, elapsed, rejected
    );

    // Expenses
    let mut expense_count = 0;
    let mut month_start = first_day.with_day(1).unwrap_or(first_day);
    while month_start <= today {
        for (category, description, amount, dom) in MONTHLY_EXPENSES {
            let Some(date) = month_start.with_day(*dom) else {
                continue;
            };
            if date < first_day || date > today {
                continue;
            }
            db.expenses()
                .create(
                    &user.id,
                    &NewExpense {
                        expense_date: date,
                        category: category.to_string(),
                        description: description.to_string(),
                        amount: Money::from_cents(*amount),
                    },
                )
                .await?;
            expense_count += 1;
        }
        month_start = months_back(month_start, 0)
            .checked_add_months(chrono::Months::new(1))
            .unwrap_or(today + Duration::days(1));
    }
    println!("✓ Recorded {} expenses", expense_count);

    // Debtors
    for (customer, phone, email, items, deposit, payments) in DEBTORS {
        let new = NewDebtor {
            customer_name: customer.to_string(),
            customer_phone: phone.map(str::to_string),
            customer_email: email.map(str::to_string),
            items: items
                .iter()
                .map(|(name, quantity, price)| NewDebtItem {
                    item_name: name.to_string(),
                    quantity: *quantity,
                    selling_price: Money::from_cents(*price),
                })
                .collect(),
            deposit: deposit.map(Money::from_cents),
        };
        let detail = db.debtors().create(&user.id, &new).await?;

        let mut last = detail.debtor;
        for amount in *payments {
            last = db
                .debtors()
                .record_payment(&user.id, &last.id, Money::from_cents(*amount), None)
                .await?
                .debtor;
        }
        println!(
            "  {} owes {} ({})",
            last.customer_name,
            last.current_balance(),
            last.status
        );
    }
    println!("✓ Created {} debtors", DEBTORS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// First day of the month `months` months before `date`.
fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_sub_months(chrono::Months::new(months))
        .unwrap_or(first)
}
