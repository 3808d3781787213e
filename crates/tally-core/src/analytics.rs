//! # Analytics
//!
//! Report building over rows the database has already filtered by date.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Analytics View                                  │
//! │                                                                         │
//! │  DateRange ──► tally-db list(range) ──► &[Sale], &[Expense], &[Debtor]  │
//! │                                              │                          │
//! │              ┌───────────────┬───────────────┼───────────────┐          │
//! │              ▼               ▼               ▼               ▼          │
//! │          summarize   monthly_comparison  top_customers  top_products    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │      margin_alert(goal_bps) ──► Some(MarginAlert) when below goal       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: same rows in, same report out.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DebtStatus, Debtor, Expense, Sale};

// =============================================================================
// Date Ranges
// =============================================================================

/// An inclusive range of calendar days. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// No bounds at all.
    pub fn all_time() -> Self {
        DateRange::default()
    }

    /// Explicit range; `from` must not be after `to`.
    pub fn between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> CoreResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ValidationError::InvalidFormat {
                    field: "date range".to_string(),
                    reason: format!("{} is after {}", from, to),
                }
                .into());
            }
        }
        Ok(DateRange { from, to })
    }

    /// First day of `today`'s month through `today`.
    pub fn this_month(today: NaiveDate) -> Self {
        DateRange {
            from: Some(first_of_month(today)),
            to: Some(today),
        }
    }

    /// The whole calendar month before `today`'s month.
    pub fn last_month(today: NaiveDate) -> Self {
        let this_start = first_of_month(today);
        let start = this_start
            .checked_sub_months(Months::new(1))
            .unwrap_or(this_start);
        let end = this_start.pred_opt().unwrap_or(this_start);
        DateRange {
            from: Some(start),
            to: Some(end),
        }
    }

    /// January 1st of `today`'s year through `today`.
    pub fn year_to_date(today: NaiveDate) -> Self {
        DateRange {
            from: NaiveDate::from_ymd_opt(today.year(), 1, 1),
            to: Some(today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Named ranges offered by the analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    ThisMonth,
    LastMonth,
    YearToDate,
    AllTime,
}

impl RangePreset {
    pub fn resolve(self, today: NaiveDate) -> DateRange {
        match self {
            RangePreset::ThisMonth => DateRange::this_month(today),
            RangePreset::LastMonth => DateRange::last_month(today),
            RangePreset::YearToDate => DateRange::year_to_date(today),
            RangePreset::AllTime => DateRange::all_time(),
        }
    }
}

impl FromStr for RangePreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "this-month" => Ok(RangePreset::ThisMonth),
            "last-month" => Ok(RangePreset::LastMonth),
            "ytd" | "year-to-date" => Ok(RangePreset::YearToDate),
            "all" | "all-time" => Ok(RangePreset::AllTime),
            _ => Err(ValidationError::NotAllowed {
                field: "range".to_string(),
                allowed: vec![
                    "this-month".into(),
                    "last-month".into(),
                    "ytd".into(),
                    "all".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Headline figures for a period.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub revenue: Money,
    pub total_cost: Money,
    /// revenue − total_cost
    pub gross_profit: Money,
    pub expenses: Money,
    /// gross_profit − expenses
    pub net_profit: Money,
    pub units_sold: i64,
    pub sale_count: usize,
    /// gross_profit / revenue in bps; `None` without revenue.
    pub margin_bps: Option<i64>,
    /// Σ positive balances of pending debtors.
    pub outstanding_debt: Money,
}

/// Profit margin fell below the user's goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarginAlert {
    pub margin_bps: i64,
    pub goal_bps: i64,
    pub shortfall_bps: i64,
}

impl fmt::Display for MarginAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Profit margin {} is below the {} goal",
            format_bps(self.margin_bps),
            format_bps(self.goal_bps)
        )
    }
}

/// Renders basis points as a percentage: 1875 → "18.75%".
pub fn format_bps(bps: i64) -> String {
    let sign = if bps < 0 { "-" } else { "" };
    let abs = bps.unsigned_abs();
    format!("{}{}.{:02}%", sign, abs / 100, abs % 100)
}

/// Totals sales, expenses and outstanding debt.
///
/// ## Example
/// ```rust
/// use tally_core::analytics::summarize;
///
/// let summary = summarize(&[], &[], &[]);
/// assert!(summary.revenue.is_zero());
/// assert_eq!(summary.margin_bps, None);
/// ```
pub fn summarize(sales: &[Sale], expenses: &[Expense], debtors: &[Debtor]) -> Summary {
    let revenue: Money = sales.iter().map(Sale::revenue).sum();
    let total_cost: Money = sales.iter().map(Sale::total_cost).sum();
    let gross_profit: Money = sales.iter().map(Sale::profit_loss).sum();
    let expense_total: Money = expenses.iter().map(Expense::amount).sum();

    let outstanding_debt = debtors
        .iter()
        .filter(|d| d.status == DebtStatus::Pending)
        .map(Debtor::current_balance)
        .filter(Money::is_positive)
        .sum();

    Summary {
        revenue,
        total_cost,
        gross_profit,
        expenses: expense_total,
        net_profit: gross_profit - expense_total,
        units_sold: sales.iter().map(|s| s.quantity).sum(),
        sale_count: sales.len(),
        margin_bps: Money::ratio_bps(gross_profit, revenue),
        outstanding_debt,
    }
}

impl Summary {
    /// Returns an alert when the margin is below `goal_bps`.
    ///
    /// A period without revenue has no margin and raises nothing.
    pub fn margin_alert(&self, goal_bps: i64) -> Option<MarginAlert> {
        let margin_bps = self.margin_bps?;
        (margin_bps < goal_bps).then_some(MarginAlert {
            margin_bps,
            goal_bps,
            shortfall_bps: goal_bps - margin_bps,
        })
    }
}

// =============================================================================
// Monthly Comparison
// =============================================================================

/// Figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyFigures {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: Money,
    pub gross_profit: Money,
    pub expenses: Money,
    pub net_profit: Money,
    pub units_sold: i64,
    pub sale_count: usize,
    /// Revenue change against the previous calendar month, when that month
    /// has revenue.
    pub revenue_change_bps: Option<i64>,
}

#[derive(Default)]
struct MonthAccumulator {
    revenue: Money,
    gross_profit: Money,
    expenses: Money,
    units_sold: i64,
    sale_count: usize,
}

/// Groups sales and expenses by calendar month, oldest first.
pub fn monthly_comparison(sales: &[Sale], expenses: &[Expense]) -> Vec<MonthlyFigures> {
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();

    for sale in sales {
        let day = sale.sold_at.date_naive();
        let acc = months.entry((day.year(), day.month())).or_default();
        acc.revenue += sale.revenue();
        acc.gross_profit += sale.profit_loss();
        acc.units_sold += sale.quantity;
        acc.sale_count += 1;
    }

    for expense in expenses {
        let day = expense.expense_date;
        months
            .entry((day.year(), day.month()))
            .or_default()
            .expenses += expense.amount();
    }

    let revenue_by_month: HashMap<(i32, u32), Money> =
        months.iter().map(|(key, acc)| (*key, acc.revenue)).collect();

    months
        .into_iter()
        .map(|((year, month), acc)| {
            let previous = if month == 1 {
                (year - 1, 12)
            } else {
                (year, month - 1)
            };
            let revenue_change_bps = revenue_by_month
                .get(&previous)
                .and_then(|prev| Money::ratio_bps(acc.revenue - *prev, *prev));

            MonthlyFigures {
                month: format!("{:04}-{:02}", year, month),
                revenue: acc.revenue,
                gross_profit: acc.gross_profit,
                expenses: acc.expenses,
                net_profit: acc.gross_profit - acc.expenses,
                units_sold: acc.units_sold,
                sale_count: acc.sale_count,
                revenue_change_bps,
            }
        })
        .collect()
}

// =============================================================================
// Rankings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRank {
    pub debtor_id: String,
    pub customer_name: String,
    pub grand_total: Money,
    pub total_paid: Money,
    pub current_balance: Money,
    pub status: DebtStatus,
}

/// The `n` debtors with the largest grand total; ties go alphabetically.
pub fn top_customers(debtors: &[Debtor], n: usize) -> Vec<CustomerRank> {
    let mut ranked: Vec<&Debtor> = debtors.iter().collect();
    ranked.sort_by(|a, b| {
        b.grand_total_cents
            .cmp(&a.grand_total_cents)
            .then_with(|| a.customer_name.cmp(&b.customer_name))
    });

    ranked
        .into_iter()
        .take(n)
        .map(|d| CustomerRank {
            debtor_id: d.id.clone(),
            customer_name: d.customer_name.clone(),
            grand_total: d.grand_total(),
            total_paid: d.total_paid(),
            current_balance: d.current_balance(),
            status: d.status,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRank {
    pub product_name: String,
    pub units_sold: i64,
    pub revenue: Money,
    pub profit: Money,
    pub sale_count: usize,
}

/// The `n` best-selling products by revenue.
///
/// Sales are grouped by product name ignoring case; the first spelling seen
/// is reported.
pub fn top_products(sales: &[Sale], n: usize) -> Vec<ProductRank> {
    let mut by_product: HashMap<String, ProductRank> = HashMap::new();

    for sale in sales {
        let rank = by_product
            .entry(sale.product_name.to_lowercase())
            .or_insert_with(|| ProductRank {
                product_name: sale.product_name.clone(),
                units_sold: 0,
                revenue: Money::zero(),
                profit: Money::zero(),
                sale_count: 0,
            });
        rank.units_sold += sale.quantity;
        rank.revenue += sale.revenue();
        rank.profit += sale.profit_loss();
        rank.sale_count += 1;
    }

    let mut ranked: Vec<ProductRank> = by_product.into_values().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    pub count: usize,
    /// Share of all expenses in bps.
    pub share_bps: Option<i64>,
}

/// Expense totals per category, largest first.
pub fn expense_breakdown(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let grand_total: Money = expenses.iter().map(Expense::amount).sum();
    let mut by_category: BTreeMap<&str, (Money, usize)> = BTreeMap::new();

    for expense in expenses {
        let entry = by_category
            .entry(expense.category.as_str())
            .or_insert((Money::zero(), 0));
        entry.0 += expense.amount();
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
            share_bps: Money::ratio_bps(total, grand_total),
        })
        .collect();
    // BTreeMap order makes the stable sort break ties by category name
    totals.sort_by_key(|c| Reverse(c.total));
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================
