//! # CSV Export
//!
//! Spreadsheet-friendly exports of sales, stock, expenses and debtors.
//!
//! ## Format
//! ```text
//! id,sold_at,product_name,quantity,cost_price,selling_price,...
//! 5f0c…,2024-03-10T12:00:00Z,"Rice, 5kg",2,4.00,5.00,...
//! ```
//! - RFC 4180 quoting via the `csv` crate (commas, quotes, newlines)
//! - Money as plain decimals (`12.34`), never with a currency symbol
//! - The header row is always written, even for an empty export
//!
//! Every `write_*` has a `parse_*` counterpart reading the same format back
//! into the row type, so exports can be checked and re-imported.

use std::io;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DebtStatus, Debtor, Expense, Sale, StockItem};

/// Money as a decimal string column.
mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::money::Money;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_decimal_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Money::parse_decimal(&raw, "amount").map_err(de::Error::custom)
    }
}

/// A record type with a fixed CSV header.
pub trait CsvRow: Serialize + DeserializeOwned {
    /// Column names, in field order.
    const HEADERS: &'static [&'static str];
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRow {
    pub id: String,
    pub sold_at: DateTime<Utc>,
    pub product_name: String,
    pub quantity: i64,
    #[serde(with = "decimal")]
    pub cost_price: Money,
    #[serde(with = "decimal")]
    pub selling_price: Money,
    #[serde(with = "decimal")]
    pub total_cost: Money,
    #[serde(with = "decimal")]
    pub revenue: Money,
    #[serde(with = "decimal")]
    pub profit_loss: Money,
}

impl CsvRow for SaleRow {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "sold_at",
        "product_name",
        "quantity",
        "cost_price",
        "selling_price",
        "total_cost",
        "revenue",
        "profit_loss",
    ];
}

impl From<&Sale> for SaleRow {
    fn from(sale: &Sale) -> Self {
        SaleRow {
            id: sale.id.clone(),
            sold_at: sale.sold_at,
            product_name: sale.product_name.clone(),
            quantity: sale.quantity,
            cost_price: Money::from_cents(sale.cost_price_cents),
            selling_price: Money::from_cents(sale.selling_price_cents),
            total_cost: sale.total_cost(),
            revenue: sale.revenue(),
            profit_loss: sale.profit_loss(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub id: String,
    pub product_name: String,
    pub quantity: i64,
    #[serde(with = "decimal")]
    pub cost_price: Money,
    pub total_sold: i64,
    /// quantity × cost_price
    #[serde(with = "decimal")]
    pub stock_value: Money,
}

impl CsvRow for StockRow {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "product_name",
        "quantity",
        "cost_price",
        "total_sold",
        "stock_value",
    ];
}

impl From<&StockItem> for StockRow {
    fn from(item: &StockItem) -> Self {
        StockRow {
            id: item.id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            cost_price: item.cost_price(),
            total_sold: item.total_sold,
            stock_value: item.stock_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: String,
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    #[serde(with = "decimal")]
    pub amount: Money,
}

impl CsvRow for ExpenseRow {
    const HEADERS: &'static [&'static str] =
        &["id", "expense_date", "category", "description", "amount"];
}

impl From<&Expense> for ExpenseRow {
    fn from(expense: &Expense) -> Self {
        ExpenseRow {
            id: expense.id.clone(),
            expense_date: expense.expense_date,
            category: expense.category.clone(),
            description: expense.description.clone(),
            amount: expense.amount(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorRow {
    pub id: String,
    pub customer_name: String,
    /// Empty column when unknown.
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    #[serde(with = "decimal")]
    pub grand_total: Money,
    #[serde(with = "decimal")]
    pub total_paid: Money,
    #[serde(with = "decimal")]
    pub current_balance: Money,
    pub status: DebtStatus,
}

impl CsvRow for DebtorRow {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "customer_name",
        "customer_phone",
        "customer_email",
        "grand_total",
        "total_paid",
        "current_balance",
        "status",
    ];
}

impl From<&Debtor> for DebtorRow {
    fn from(debtor: &Debtor) -> Self {
        DebtorRow {
            id: debtor.id.clone(),
            customer_name: debtor.customer_name.clone(),
            customer_phone: debtor.customer_phone.clone(),
            customer_email: debtor.customer_email.clone(),
            grand_total: debtor.grand_total(),
            total_paid: debtor.total_paid(),
            current_balance: debtor.current_balance(),
            status: debtor.status,
        }
    }
}

// =============================================================================
// Generic Writer / Reader
// =============================================================================

/// Writes a header row followed by one row per record.
pub fn write_rows<W, T, I>(writer: W, rows: I) -> CoreResult<()>
where
    W: io::Write,
    T: CsvRow,
    I: IntoIterator<Item = T>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(T::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer
        .flush()
        .map_err(|e| CoreError::Csv(e.to_string()))?;
    Ok(())
}

/// Reads rows written by [`write_rows`].
pub fn read_rows<R, T>(reader: R) -> CoreResult<Vec<T>>
where
    R: io::Read,
    T: CsvRow,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let rows = csv_reader
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn rows_to_string<T: CsvRow>(rows: Vec<T>) -> CoreResult<String> {
    let mut buffer = Vec::new();
    write_rows(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|e| CoreError::Csv(e.to_string()))
}

// =============================================================================
// Per-Record Entry Points
// =============================================================================

pub fn write_sales<W: io::Write>(writer: W, sales: &[Sale]) -> CoreResult<()> {
    write_rows(writer, sales.iter().map(SaleRow::from))
}

pub fn write_stock<W: io::Write>(writer: W, items: &[StockItem]) -> CoreResult<()> {
    write_rows(writer, items.iter().map(StockRow::from))
}

pub fn write_expenses<W: io::Write>(writer: W, expenses: &[Expense]) -> CoreResult<()> {
    write_rows(writer, expenses.iter().map(ExpenseRow::from))
}

pub fn write_debtors<W: io::Write>(writer: W, debtors: &[Debtor]) -> CoreResult<()> {
    write_rows(writer, debtors.iter().map(DebtorRow::from))
}

/// Sales as a CSV string.
///
/// ## Example
/// ```rust
/// use tally_core::export::sales_csv;
///
/// let csv = sales_csv(&[]).unwrap();
/// assert!(csv.starts_with("id,sold_at,product_name"));
/// ```
pub fn sales_csv(sales: &[Sale]) -> CoreResult<String> {
    rows_to_string(sales.iter().map(SaleRow::from).collect())
}

pub fn stock_csv(items: &[StockItem]) -> CoreResult<String> {
    rows_to_string(items.iter().map(StockRow::from).collect())
}

pub fn expenses_csv(expenses: &[Expense]) -> CoreResult<String> {
    rows_to_string(expenses.iter().map(ExpenseRow::from).collect())
}

pub fn debtors_csv(debtors: &[Debtor]) -> CoreResult<String> {
    rows_to_string(debtors.iter().map(DebtorRow::from).collect())
}

pub fn parse_sales<R: io::Read>(reader: R) -> CoreResult<Vec<SaleRow>> {
    read_rows(reader)
}

pub fn parse_stock<R: io::Read>(reader: R) -> CoreResult<Vec<StockRow>> {
    read_rows(reader)
}

pub fn parse_expenses<R: io::Read>(reader: R) -> CoreResult<Vec<ExpenseRow>> {
    read_rows(reader)
}

pub fn parse_debtors<R: io::Read>(reader: R) -> CoreResult<Vec<DebtorRow>> {
    read_rows(reader)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn awkward_sale() -> Sale {
        let sold_at = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();
        Sale {
            id: "s1".into(),
            user_id: "u1".into(),
            stock_item_id: Some("st1".into()),
            product_name: "Rice, \"Premium\"\n5kg".into(),
            quantity: 2,
            cost_price_cents: 450,
            selling_price_cents: 400,
            total_cost_cents: 900,
            revenue_cents: 800,
            profit_loss_cents: -100,
            sold_at,
            created_at: sold_at,
        }
    }

    #[test]
    fn test_header_written_for_empty_export() {
        assert_eq!(
            expenses_csv(&[]).unwrap(),
            "id,expense_date,category,description,amount\n"
        );
        assert!(parse_expenses(expenses_csv(&[]).unwrap().as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_sales_round_trip_with_awkward_text() {
        let sale = awkward_sale();
        let csv = sales_csv(std::slice::from_ref(&sale)).unwrap();

        assert!(csv.contains("\"Rice, \"\"Premium\"\"\n5kg\""));
        assert!(csv.contains(",9.00,8.00,-1.00"));

        let rows = parse_sales(csv.as_bytes()).unwrap();
        assert_eq!(rows, vec![SaleRow::from(&sale)]);
    }

    #[test]
    fn test_debtors_round_trip() {
        let now = Utc::now();
        let debtor = Debtor {
            id: "d1".into(),
            user_id: "u1".into(),
            customer_name: "Okafor, Ada".into(),
            customer_phone: Some("+234 801 234 5678".into()),
            customer_email: None,
            grand_total_cents: 1000,
            total_paid_cents: 1050,
            current_balance_cents: -50,
            status: DebtStatus::Paid,
            created_at: now,
            updated_at: now,
        };

        let csv = debtors_csv(std::slice::from_ref(&debtor)).unwrap();
        assert!(csv.contains(",-0.50,paid"));

        let rows = parse_debtors(csv.as_bytes()).unwrap();
        assert_eq!(rows, vec![DebtorRow::from(&debtor)]);
        assert_eq!(rows[0].customer_email, None);
    }

    #[test]
    fn test_stock_and_expense_round_trip() {
        let now = Utc::now();
        let item = StockItem {
            id: "st1".into(),
            user_id: "u1".into(),
            product_name: "Soap".into(),
            quantity: 12,
            cost_price_cents: 125,
            total_sold: 3,
            created_at: now,
            updated_at: now,
        };
        let rows = parse_stock(stock_csv(std::slice::from_ref(&item)).unwrap().as_bytes()).unwrap();
        assert_eq!(rows[0].stock_value.cents(), 1500);
        assert_eq!(rows[0], StockRow::from(&item));

        let expense = Expense {
            id: "e1".into(),
            user_id: "u1".into(),
            expense_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            category: "Utilities".into(),
            description: "Power bill\r\nFebruary".into(),
            amount_cents: 7_505,
            created_at: now,
            updated_at: now,
        };
        let mut out = Vec::new();
        write_expenses(&mut out, std::slice::from_ref(&expense)).unwrap();
        let rows = parse_expenses(out.as_slice()).unwrap();
        assert_eq!(rows, vec![ExpenseRow::from(&expense)]);
    }

    #[test]
    fn test_bad_money_column_is_rejected() {
        let csv = "id,expense_date,category,description,amount\ne1,2024-01-01,Rent,Shop,12.345\n";
        assert!(matches!(
            parse_expenses(csv.as_bytes()),
            Err(CoreError::Csv(_))
        ));
    }
}
