//! # Repository Module
//!
//! One repository per bookkeeping domain. Every method takes the owning
//! `user_id` and every query filters on it, so another user's row is
//! indistinguishable from a missing one.
//!
//! ## Write Patterns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Multi-row Writes                                     │
//! │                                                                         │
//! │  SaleRepository::record                                                 │
//! │    BEGIN                                                                │
//! │    ├── SELECT stock item by name                                        │
//! │    ├── SaleTotals::compute / check_sale        (tally-core)             │
//! │    ├── UPDATE stock_items SET quantity = quantity - q                   │
//! │    │        WHERE ... AND quantity >= q        (0 rows → rejected)      │
//! │    ├── INSERT INTO sales                                                │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  DebtorRepository::record_payment                                       │
//! │    BEGIN                                                                │
//! │    ├── SELECT debtor                                                    │
//! │    ├── Debtor::apply_payment                   (tally-core)             │
//! │    ├── UPDATE debtors SET ... WHERE total_paid = <value read>           │
//! │    │                                           (0 rows → Conflict)      │
//! │    ├── INSERT INTO debt_payments                                        │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  Any error drops the transaction, which rolls everything back.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Local accounts (argon2)
//! - [`stock::StockRepository`] - Inventory
//! - [`sale::SaleRepository`] - Sales with stock deduction
//! - [`debtor::DebtorRepository`] - Customer credit, items and payments
//! - [`expense::ExpenseRepository`] - Operating expenses
//! - [`settings::SettingsRepository`] - Per-user preferences

pub mod debtor;
pub mod expense;
pub mod sale;
pub mod settings;
pub mod stock;
pub mod user;

use uuid::Uuid;

/// Generates a new row ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a `LIKE` pattern matching `query` anywhere, with `%`, `_` and `\`
/// escaped. Use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::pool::{Database, DbConfig};

    /// Fresh in-memory database with one registered user.
    pub async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .register("owner@example.com", "correct horse battery")
            .await
            .unwrap();
        (db, user.id)
    }

    /// A second user, for ownership checks.
    pub async fn other_user(db: &Database) -> String {
        db.users()
            .register("other@example.com", "another password")
            .await
            .unwrap()
            .id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rice"), "%rice%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
