//! # Expense Repository
//!
//! Operating expenses (rent, transport, utilities ...), filtered by date
//! range and category.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use tally_core::analytics::DateRange;
use tally_core::{Expense, ExpenseUpdate, NewExpense};

const EXPENSE_COLUMNS: &str =
    "id, user_id, expense_date, category, description, amount_cents, created_at, updated_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    pub async fn create(&self, user_id: &str, new: &NewExpense) -> DbResult<Expense> {
        new.validate()?;

        let now = Utc::now();
        let expense = Expense {
            id: generate_id(),
            user_id: user_id.to_string(),
            expense_date: new.expense_date,
            category: new.category.trim().to_string(),
            description: new.description.trim().to_string(),
            amount_cents: new.amount.cents(),
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %expense.id,
            category = %expense.category,
            amount = expense.amount_cents,
            "Recording expense"
        );

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, user_id, expense_date, category, description, amount_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.user_id)
        .bind(expense.expense_date)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Gets an expense by ID.
    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<Expense> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE id = ?1 AND user_id = ?2",
            EXPENSE_COLUMNS
        );
        sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))
    }

    /// Lists expenses in a date range, newest first.
    ///
    /// `category` matches exactly, ignoring case.
    pub async fn list(
        &self,
        user_id: &str,
        range: &DateRange,
        category: Option<&str>,
    ) -> DbResult<Vec<Expense>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());

        let sql = format!(
            r#"
            SELECT {} FROM expenses
            WHERE user_id = ?1
              AND (?2 IS NULL OR expense_date >= ?2)
              AND (?3 IS NULL OR expense_date <= ?3)
              AND (?4 IS NULL OR category = ?4 COLLATE NOCASE)
            ORDER BY expense_date DESC, created_at DESC
            "#,
            EXPENSE_COLUMNS
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(user_id)
            .bind(range.from)
            .bind(range.to)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    /// Updates an expense.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: &ExpenseUpdate,
    ) -> DbResult<Expense> {
        update.validate()?;

        let current = self.get(user_id, id).await?;
        let mut updated = update.apply_to(&current);
        updated.updated_at = Utc::now();

        debug!(id = %id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET
                expense_date = ?1,
                category = ?2,
                description = ?3,
                amount_cents = ?4,
                updated_at = ?5
            WHERE id = ?6 AND user_id = ?7
            "#,
        )
        .bind(updated.expense_date)
        .bind(&updated.category)
        .bind(&updated.description)
        .bind(updated.amount_cents)
        .bind(updated.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(updated)
    }

    /// Deletes an expense.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }

    /// Distinct categories the user has used, sorted.
    pub async fn categories(&self, user_id: &str) -> DbResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT category FROM expenses
            WHERE user_id = ?1
            GROUP BY category COLLATE NOCASE
            ORDER BY category COLLATE NOCASE
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
