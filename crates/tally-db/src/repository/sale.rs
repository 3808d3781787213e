//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD (one transaction)                                           │
//! │     ├── stock item looked up by product name                           │
//! │     ├── totals computed by SaleTotals::compute                         │
//! │     ├── stock: StockItem::apply_sale, guarded write (see stock.rs)     │
//! │     └── sale row inserted with the frozen product name and prices      │
//! │                                                                         │
//! │  2. LIST / GET                                                         │
//! │     └── filtered by calendar day of sold_at (UTC)                      │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE (one transaction)                                │
//! │     ├── stock: StockItem::reverse_sale    (if the item still exists)   │
//! │     └── sale row removed                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::repository::stock::{fetch_stock, write_stock, STOCK_COLUMNS};
use tally_core::analytics::DateRange;
use tally_core::bookkeeping::SaleTotals;
use tally_core::{CoreError, NewSale, Sale, StockItem};

const SALE_COLUMNS: &str = "id, user_id, stock_item_id, product_name, quantity, cost_price_cents, \
     selling_price_cents, total_cost_cents, revenue_cents, profit_loss_cents, sold_at, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale and deducts its units from stock, atomically.
    ///
    /// ## Errors
    /// - `NotFound` when no stock item has this product name
    /// - `Domain(InsufficientStock)` when fewer than `quantity` units are on
    ///   hand; nothing is written
    /// - `Domain(Validation)` for bad input
    ///
    /// The cost price defaults to the stock item's current cost.
    pub async fn record(&self, user_id: &str, new: &NewSale) -> DbResult<Sale> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM stock_items WHERE user_id = ?1 AND product_name = ?2 COLLATE NOCASE",
            STOCK_COLUMNS
        );
        let item: StockItem = sqlx::query_as::<_, StockItem>(&sql)
            .bind(user_id)
            .bind(new.product_name.trim())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", new.product_name.trim()))?;

        let cost_price = new.cost_price.unwrap_or_else(|| item.cost_price());
        let totals = SaleTotals::compute(new.quantity, cost_price, new.selling_price)?;

        let now = Utc::now();
        let mut sold = item.clone();
        sold.apply_sale(new.quantity)?;
        sold.updated_at = now;

        // A concurrent sale that moved the stock after our read makes the
        // guarded write match zero rows instead of overwriting it.
        match write_stock(&mut tx, &item, &sold).await {
            Err(DbError::Conflict { .. }) => {
                warn!(stock_item_id = %item.id, "Stock changed during sale, rejecting");
                return Err(CoreError::InsufficientStock {
                    product: item.product_name.clone(),
                    available: item.quantity,
                    requested: new.quantity,
                }
                .into());
            }
            other => other?,
        }

        let sale = Sale {
            id: generate_id(),
            user_id: user_id.to_string(),
            stock_item_id: Some(item.id.clone()),
            product_name: item.product_name.clone(),
            quantity: totals.quantity,
            cost_price_cents: totals.cost_price.cents(),
            selling_price_cents: totals.selling_price.cents(),
            total_cost_cents: totals.total_cost.cents(),
            revenue_cents: totals.revenue.cents(),
            profit_loss_cents: totals.profit_loss.cents(),
            sold_at: new.sold_at.unwrap_or(now),
            created_at: now,
        };

        debug!(
            id = %sale.id,
            product = %sale.product_name,
            quantity = sale.quantity,
            revenue = sale.revenue_cents,
            "Recording sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, user_id, stock_item_id, product_name, quantity,
                cost_price_cents, selling_price_cents,
                total_cost_cents, revenue_cents, profit_loss_cents,
                sold_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.stock_item_id)
        .bind(&sale.product_name)
        .bind(sale.quantity)
        .bind(sale.cost_price_cents)
        .bind(sale.selling_price_cents)
        .bind(sale.total_cost_cents)
        .bind(sale.revenue_cents)
        .bind(sale.profit_loss_cents)
        .bind(sale.sold_at)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(sale)
    }

    /// Gets a sale by ID.
    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<Sale> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ?1 AND user_id = ?2",
            SALE_COLUMNS
        );
        sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Lists sales in a date range, newest first.
    pub async fn list(&self, user_id: &str, range: &DateRange) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {} FROM sales
            WHERE user_id = ?1
              AND (?2 IS NULL OR date(sold_at) >= ?2)
              AND (?3 IS NULL OR date(sold_at) <= ?3)
            ORDER BY sold_at DESC, created_at DESC
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(user_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Deletes a sale and puts its units back on the shelf, atomically.
    ///
    /// If the stock item was deleted in the meantime only the sale goes.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM sales WHERE id = ?1 AND user_id = ?2",
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        if let Some(stock_item_id) = &sale.stock_item_id {
            if let Some(item) = fetch_stock(&mut tx, user_id, stock_item_id).await? {
                let mut restored = item.clone();
                restored.reverse_sale(sale.quantity)?;
                restored.updated_at = Utc::now();
                write_stock(&mut tx, &item, &restored).await?;
            }
        }

        debug!(id = %id, restored = sale.quantity, "Deleting sale");

        sqlx::query("DELETE FROM sales WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(sale)
    }

    /// Counts the user's sales.
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{other_user, setup};
    use chrono::{NaiveDate, TimeZone};
    use tally_core::{Money, NewStockItem};

    async fn stocked(db: &crate::Database, user: &str, quantity: i64) -> StockItem {
        db.stock()
            .create(
                user,
                &NewStockItem {
                    product_name: "Rice 5kg".to_string(),
                    quantity,
                    cost_price: Money::from_cents(400),
                },
            )
            .await
            .unwrap()
    }

    fn sale_of(quantity: i64, price: i64) -> NewSale {
        NewSale {
            product_name: "rice 5kg".to_string(),
            quantity,
            selling_price: Money::from_cents(price),
            cost_price: None,
            sold_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_sale_deducts_stock() {
        let (db, user) = setup().await;
        let item = stocked(&db, &user, 10).await;

        let sale = db.sales().record(&user, &sale_of(3, 650)).await.unwrap();
        assert_eq!(sale.product_name, "Rice 5kg");
        assert_eq!(sale.cost_price_cents, 400);
        assert_eq!(sale.total_cost_cents, 1200);
        assert_eq!(sale.revenue_cents, 1950);
        assert_eq!(sale.profit_loss_cents, 750);
        assert_eq!(sale.stock_item_id.as_deref(), Some(item.id.as_str()));

        let after = db.stock().get(&user, &item.id).await.unwrap();
        assert_eq!(after.quantity, 7);
        assert_eq!(after.total_sold, 3);

        assert_eq!(db.sales().get(&user, &sale.id).await.unwrap(), sale);
    }

    #[tokio::test]
    async fn test_sale_of_entire_stock_then_one_more() {
        let (db, user) = setup().await;
        let item = stocked(&db, &user, 2).await;

        db.sales().record(&user, &sale_of(2, 500)).await.unwrap();

        let err = db.sales().record(&user, &sale_of(1, 500)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 0,
                requested: 1,
                ..
            })
        ));

        let after = db.stock().get(&user, &item.id).await.unwrap();
        assert_eq!(after.quantity, 0);
        assert_eq!(after.total_sold, 2);
        assert_eq!(db.sales().count(&user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejected_sale_leaves_no_trace() {
        let (db, user) = setup().await;
        let item = stocked(&db, &user, 3).await;

        assert!(db.sales().record(&user, &sale_of(5, 500)).await.is_err());
        assert!(db.sales().record(&user, &sale_of(0, 500)).await.is_err());

        let after = db.stock().get(&user, &item.id).await.unwrap();
        assert_eq!(after.quantity, 3);
        assert_eq!(after.total_sold, 0);
        assert_eq!(db.sales().count(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sale_needs_existing_stock_item() {
        let (db, user) = setup().await;
        let other = other_user(&db).await;
        stocked(&db, &other, 10).await;

        // The other user's "Rice 5kg" is invisible
        assert!(matches!(
            db.sales().record(&user, &sale_of(1, 500)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_explicit_cost_and_loss() {
        let (db, user) = setup().await;
        stocked(&db, &user, 10).await;

        let mut new = sale_of(2, 300);
        new.cost_price = Some(Money::from_cents(350));
        let sale = db.sales().record(&user, &new).await.unwrap();
        assert_eq!(sale.profit_loss_cents, -100);
    }

    #[tokio::test]
    async fn test_list_by_date_range() {
        let (db, user) = setup().await;
        stocked(&db, &user, 10).await;

        for (month, day) in [(1, 31), (2, 1), (2, 29), (3, 1)] {
            let mut new = sale_of(1, 500);
            new.sold_at = Some(Utc.with_ymd_and_hms(2024, month, day, 23, 30, 0).unwrap());
            db.sales().record(&user, &new).await.unwrap();
        }

        let feb = DateRange::between(
            NaiveDate::from_ymd_opt(2024, 2, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29),
        )
        .unwrap();
        let sales = db.sales().list(&user, &feb).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert!(sales[0].sold_at > sales[1].sold_at);

        let all = db.sales().list(&user, &DateRange::all_time()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let (db, user) = setup().await;
        let item = stocked(&db, &user, 10).await;
        let sale = db.sales().record(&user, &sale_of(4, 500)).await.unwrap();

        db.sales().delete(&user, &sale.id).await.unwrap();

        let after = db.stock().get(&user, &item.id).await.unwrap();
        assert_eq!(after.quantity, 10);
        assert_eq!(after.total_sold, 0);
        assert!(db.sales().get(&user, &sale.id).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_stock_keeps_sale_history() {
        let (db, user) = setup().await;
        let item = stocked(&db, &user, 10).await;
        let sale = db.sales().record(&user, &sale_of(1, 500)).await.unwrap();

        db.stock().delete(&user, &item.id).await.unwrap();

        let kept = db.sales().get(&user, &sale.id).await.unwrap();
        assert_eq!(kept.stock_item_id, None);
        assert_eq!(kept.revenue_cents, 500);

        db.sales().delete(&user, &sale.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_inconsistent_totals_blocked_by_schema() {
        let (db, user) = setup().await;
        stocked(&db, &user, 10).await;
        let sale = db.sales().record(&user, &sale_of(1, 500)).await.unwrap();

        let err = sqlx::query("UPDATE sales SET profit_loss_cents = 0 WHERE id = ?1")
            .bind(&sale.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
