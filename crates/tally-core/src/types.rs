//! # Domain Types
//!
//! Records and input types used throughout Tally.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │      Sale       │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_name   │◄──│  product_name   │   │  expense_date   │       │
//! │  │  quantity       │   │  quantity       │   │  category       │       │
//! │  │  cost_price     │   │  total_cost     │   │  amount         │       │
//! │  │  total_sold     │   │  revenue/profit │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Debtor      │──►│    DebtItem     │   │  UserSettings   │       │
//! │  │  ─────────────  │   │  qty × price    │   │  ─────────────  │       │
//! │  │  grand_total    │   └─────────────────┘   │  theme          │       │
//! │  │  total_paid     │   ┌─────────────────┐   │  currency       │       │
//! │  │  balance/status │──►│   DebtPayment   │   │  margin goal    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stored record carries `user_id`: rows belong to exactly one user
//! and every query is scoped to that owner.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;
use crate::DEFAULT_MARGIN_GOAL_BPS;

// =============================================================================
// User
// =============================================================================

/// A local account. Only the argon2 hash of the password is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock
// =============================================================================

/// Inventory record tracking quantity on hand and cumulative units sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner of this record.
    pub user_id: String,

    /// Product name, unique per user (case-insensitive).
    pub product_name: String,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Cost of one unit in cents.
    pub cost_price_cents: i64,

    /// Cumulative units sold through recorded sales.
    pub total_sold: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Value of the units on hand at cost.
    pub fn stock_value(&self) -> Money {
        self.cost_price().multiply_quantity(self.quantity)
    }
}

/// Input for creating a stock item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockItem {
    pub product_name: String,
    pub quantity: i64,
    pub cost_price: Money,
}

impl NewStockItem {
    /// Validates the input fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("product_name", &self.product_name)?;
        validation::validate_stock_quantity(self.quantity)?;
        validation::validate_price("cost_price", self.cost_price)?;
        Ok(())
    }
}

/// Partial update of a stock item. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub cost_price: Option<Money>,
}

impl StockUpdate {
    /// Validates the fields that are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.product_name {
            validation::validate_name("product_name", name)?;
        }
        if let Some(quantity) = self.quantity {
            validation::validate_stock_quantity(quantity)?;
        }
        if let Some(cost) = self.cost_price {
            validation::validate_price("cost_price", cost)?;
        }
        Ok(())
    }

    /// Applies the update to a copy of `item`.
    pub fn apply_to(&self, item: &StockItem) -> StockItem {
        let mut updated = item.clone();
        if let Some(name) = &self.product_name {
            updated.product_name = name.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(cost) = self.cost_price {
            updated.cost_price_cents = cost.cents();
        }
        updated
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A point-of-sale transaction.
///
/// Totals are computed once at insert time by
/// [`SaleTotals::compute`](crate::bookkeeping::SaleTotals::compute) and stored
/// denormalized; the database re-checks them with CHECK constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    /// Stock item the units came from; NULL once that item is deleted.
    pub stock_item_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// quantity × cost_price
    pub total_cost_cents: i64,
    /// quantity × selling_price
    pub revenue_cents: i64,
    /// revenue − total_cost (negative for a loss)
    pub profit_loss_cents: i64,
    pub sold_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }

    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.total_cost_cents)
    }

    #[inline]
    pub fn profit_loss(&self) -> Money {
        Money::from_cents(self.profit_loss_cents)
    }
}

/// Input for recording a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    /// Name of the stock item being sold.
    pub product_name: String,
    pub quantity: i64,
    pub selling_price: Money,
    /// Defaults to the stock item's cost price when `None`.
    pub cost_price: Option<Money>,
    /// Defaults to now when `None`.
    pub sold_at: Option<DateTime<Utc>>,
}

impl NewSale {
    /// Validates the input fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("product_name", &self.product_name)?;
        validation::validate_quantity(self.quantity)?;
        validation::validate_price("selling_price", self.selling_price)?;
        if let Some(cost) = self.cost_price {
            validation::validate_price("cost_price", cost)?;
        }
        Ok(())
    }
}

// =============================================================================
// Debt Status
// =============================================================================

/// Settlement status of a debtor.
///
/// Derived, never set directly: `Paid` exactly when the current balance is
/// zero or below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    /// Money is still owed.
    #[default]
    Pending,
    /// Fully settled (or in credit).
    Paid,
}

impl DebtStatus {
    /// Status implied by a balance.
    pub fn for_balance(balance: Money) -> Self {
        if balance.cents() <= 0 {
            DebtStatus::Paid
        } else {
            DebtStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Pending => "pending",
            DebtStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebtStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DebtStatus::Pending),
            "paid" => Ok(DebtStatus::Paid),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["pending".to_string(), "paid".to_string()],
            }),
        }
    }
}

// =============================================================================
// Debtor
// =============================================================================

/// A customer with an outstanding or settled credit balance.
///
/// ## Balance Identity
/// ```text
/// current_balance = grand_total − total_paid
/// status          = paid  ⇔  current_balance ≤ 0
/// total_paid      = Σ payments
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Debtor {
    pub id: String,
    pub user_id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    /// Σ debt item totals.
    pub grand_total_cents: i64,
    /// Σ payment amounts.
    pub total_paid_cents: i64,
    /// grand_total − total_paid.
    pub current_balance_cents: i64,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Debtor {
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    #[inline]
    pub fn total_paid(&self) -> Money {
        Money::from_cents(self.total_paid_cents)
    }

    #[inline]
    pub fn current_balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }
}

/// A line item purchased on credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DebtItem {
    pub id: String,
    pub debtor_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub selling_price_cents: i64,
    /// quantity × selling_price
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl DebtItem {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A payment (installment) towards a debtor's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DebtPayment {
    pub id: String,
    pub debtor_id: String,
    pub amount_cents: i64,
    pub note: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl DebtPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Input for a debt line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDebtItem {
    pub item_name: String,
    pub quantity: i64,
    pub selling_price: Money,
}

impl NewDebtItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("item_name", &self.item_name)?;
        validation::validate_quantity(self.quantity)?;
        validation::validate_price("selling_price", self.selling_price)?;
        Ok(())
    }
}

/// Input for opening a debtor account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDebtor {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<NewDebtItem>,
    /// Optional amount paid up front, recorded as the first payment.
    pub deposit: Option<Money>,
}

impl NewDebtor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("customer_name", &self.customer_name)?;
        if let Some(phone) = &self.customer_phone {
            validation::validate_phone(phone)?;
        }
        if let Some(email) = &self.customer_email {
            validation::validate_email(email)?;
        }
        for item in &self.items {
            item.validate()?;
        }
        if let Some(deposit) = self.deposit {
            validation::validate_positive_amount("deposit", deposit)?;
        }
        Ok(())
    }
}

/// Contact details change for a debtor. `None` leaves the field unchanged;
/// `Some("")` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl ContactUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.customer_name {
            validation::validate_name("customer_name", name)?;
        }
        if let Some(phone) = self.customer_phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validation::validate_phone(phone)?;
        }
        if let Some(email) = self.customer_email.as_deref().filter(|e| !e.trim().is_empty()) {
            validation::validate_email(email)?;
        }
        Ok(())
    }

    /// Applies the update to a copy of `debtor`.
    pub fn apply_to(&self, debtor: &Debtor) -> Debtor {
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        let mut updated = debtor.clone();
        if let Some(name) = &self.customer_name {
            updated.customer_name = name.trim().to_string();
        }
        if let Some(phone) = &self.customer_phone {
            updated.customer_phone = optional(phone);
        }
        if let Some(email) = &self.customer_email {
            updated.customer_email = optional(email);
        }
        updated
    }
}

// =============================================================================
// Expense
// =============================================================================

/// An operating expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Input for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Money,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_category(&self.category)?;
        validation::validate_name("description", &self.description)?;
        validation::validate_positive_amount("amount", self.amount)?;
        Ok(())
    }
}

/// Partial update of an expense.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub expense_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(category) = &self.category {
            validation::validate_category(category)?;
        }
        if let Some(description) = &self.description {
            validation::validate_name("description", description)?;
        }
        if let Some(amount) = self.amount {
            validation::validate_positive_amount("amount", amount)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, expense: &Expense) -> Expense {
        let mut updated = expense.clone();
        if let Some(date) = self.expense_date {
            updated.expense_date = date;
        }
        if let Some(category) = &self.category {
            updated.category = category.trim().to_string();
        }
        if let Some(description) = &self.description {
            updated.description = description.trim().to_string();
        }
        if let Some(amount) = self.amount {
            updated.amount_cents = amount.cents();
        }
        updated
    }
}

// =============================================================================
// Settings
// =============================================================================

/// UI theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(ValidationError::NotAllowed {
                field: "theme".to_string(),
                allowed: vec!["light".into(), "dark".into(), "system".into()],
            }),
        }
    }
}

/// Per-user preferences. One row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserSettings {
    pub user_id: String,
    pub theme: Theme,
    /// ISO 4217 code, e.g. "USD", "NGN".
    pub currency_code: String,
    /// Display symbol, e.g. "$", "₦".
    pub currency_symbol: String,
    /// Profit margin below which analytics raises an alert, in bps.
    pub profit_margin_goal_bps: i64,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Settings used until the user saves their own.
    pub fn defaults(user_id: &str) -> Self {
        UserSettings {
            user_id: user_id.to_string(),
            theme: Theme::System,
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            profit_margin_goal_bps: DEFAULT_MARGIN_GOAL_BPS,
            updated_at: Utc::now(),
        }
    }

    /// Formats an amount in the user's currency.
    pub fn format(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.currency_symbol)
    }
}

/// Partial settings change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub profit_margin_goal_bps: Option<i64>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(code) = &self.currency_code {
            validation::validate_currency_code(code)?;
        }
        if let Some(symbol) = &self.currency_symbol {
            if symbol.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "currency_symbol".to_string(),
                });
            }
            if symbol.chars().count() > 5 {
                return Err(ValidationError::TooLong {
                    field: "currency_symbol".to_string(),
                    max: 5,
                });
            }
        }
        if let Some(goal) = self.profit_margin_goal_bps {
            validation::validate_margin_goal_bps(goal)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, settings: &UserSettings) -> UserSettings {
        let mut updated = settings.clone();
        if let Some(theme) = self.theme {
            updated.theme = theme;
        }
        if let Some(code) = &self.currency_code {
            updated.currency_code = code.trim().to_ascii_uppercase();
        }
        if let Some(symbol) = &self.currency_symbol {
            updated.currency_symbol = symbol.trim().to_string();
        }
        if let Some(goal) = self.profit_margin_goal_bps {
            updated.profit_margin_goal_bps = goal;
        }
        updated.updated_at = Utc::now();
        updated
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debt_status_for_balance() {
        assert_eq!(DebtStatus::for_balance(Money::from_cents(1)), DebtStatus::Pending);
        assert_eq!(DebtStatus::for_balance(Money::zero()), DebtStatus::Paid);
        assert_eq!(DebtStatus::for_balance(Money::from_cents(-100)), DebtStatus::Paid);
    }

    #[test]
    fn test_debt_status_parse() {
        assert_eq!("Pending".parse::<DebtStatus>().unwrap(), DebtStatus::Pending);
        assert_eq!("paid".parse::<DebtStatus>().unwrap(), DebtStatus::Paid);
        assert!("settled".parse::<DebtStatus>().is_err());
        assert_eq!(DebtStatus::Paid.to_string(), "paid");
    }

    #[test]
    fn test_settings_defaults_and_update() {
        let defaults = UserSettings::defaults("u1");
        assert_eq!(defaults.theme, Theme::System);
        assert_eq!(defaults.profit_margin_goal_bps, DEFAULT_MARGIN_GOAL_BPS);

        let update = SettingsUpdate {
            theme: Some(Theme::Dark),
            currency_code: Some("ngn".to_string()),
            currency_symbol: Some("₦".to_string()),
            profit_margin_goal_bps: None,
        };
        update.validate().unwrap();
        let updated = update.apply_to(&defaults);
        assert_eq!(updated.theme, Theme::Dark);
        assert_eq!(updated.currency_code, "NGN");
        assert_eq!(updated.format(Money::from_cents(150)), "₦1.50");
        assert_eq!(updated.profit_margin_goal_bps, DEFAULT_MARGIN_GOAL_BPS);
    }

    #[test]
    fn test_contact_update_clears_optional_fields() {
        let now = Utc::now();
        let debtor = Debtor {
            id: "d1".into(),
            user_id: "u1".into(),
            customer_name: "Ada".into(),
            customer_phone: Some("+2348012345678".into()),
            customer_email: None,
            grand_total_cents: 0,
            total_paid_cents: 0,
            current_balance_cents: 0,
            status: DebtStatus::Paid,
            created_at: now,
            updated_at: now,
        };

        let update = ContactUpdate {
            customer_phone: Some(String::new()),
            customer_email: Some("ada@example.com".into()),
            ..Default::default()
        };
        update.validate().unwrap();
        let updated = update.apply_to(&debtor);
        assert_eq!(updated.customer_phone, None);
        assert_eq!(updated.customer_email.as_deref(), Some("ada@example.com"));
        assert_eq!(updated.customer_name, "Ada");
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("neon".parse::<Theme>().is_err());
    }
}
