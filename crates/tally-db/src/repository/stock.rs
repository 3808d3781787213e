//! # Stock Repository
//!
//! Database operations for inventory.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  Every change (edit, restock, sale, sale deletion) runs as:         │
//! │     BEGIN                                                           │
//! │     SELECT the row                                                  │
//! │     apply the StockItem rule in memory                              │
//! │     UPDATE ... WHERE quantity = <read> AND total_sold = <read>      │
//! │     COMMIT                                                          │
//! │                                                                     │
//! │  Zero rows on the guarded UPDATE means another writer moved the     │
//! │  stock in between; the caller gets `Conflict` and nothing is lost.  │
//! │                                                                     │
//! │  quantity >= 0 is a CHECK constraint: no path can go negative.      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{contains_pattern, generate_id};
use tally_core::validation;
use tally_core::{NewStockItem, StockItem, StockUpdate};

pub(crate) const STOCK_COLUMNS: &str = "id, user_id, product_name, quantity, cost_price_cents, \
     total_sold, created_at, updated_at";

/// Repository for stock item database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Adds a product to the inventory.
    ///
    /// Product names are unique per user, ignoring case.
    pub async fn create(&self, user_id: &str, new: &NewStockItem) -> DbResult<StockItem> {
        new.validate()?;

        let now = Utc::now();
        let item = StockItem {
            id: generate_id(),
            user_id: user_id.to_string(),
            product_name: new.product_name.trim().to_string(),
            quantity: new.quantity,
            cost_price_cents: new.cost_price.cents(),
            total_sold: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, product = %item.product_name, "Creating stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, user_id, product_name, quantity,
                cost_price_cents, total_sold, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.user_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.cost_price_cents)
        .bind(item.total_sold)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate("product_name", &item.product_name))?;

        Ok(item)
    }

    /// Gets a stock item by ID.
    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<StockItem> {
        let sql = format!(
            "SELECT {} FROM stock_items WHERE id = ?1 AND user_id = ?2",
            STOCK_COLUMNS
        );
        sqlx::query_as::<_, StockItem>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", id))
    }

    /// Finds a stock item by product name, ignoring case.
    pub async fn find_by_name(&self, user_id: &str, name: &str) -> DbResult<Option<StockItem>> {
        let sql = format!(
            "SELECT {} FROM stock_items WHERE user_id = ?1 AND product_name = ?2 COLLATE NOCASE",
            STOCK_COLUMNS
        );
        let item = sqlx::query_as::<_, StockItem>(&sql)
            .bind(user_id)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists stock items in name order, optionally filtered by a substring
    /// of the product name.
    pub async fn list(&self, user_id: &str, search: Option<&str>) -> DbResult<Vec<StockItem>> {
        let pattern = match search {
            Some(query) => {
                let query = validation::validate_search_query(query)?;
                (!query.is_empty()).then(|| contains_pattern(&query))
            }
            None => None,
        };

        let sql = format!(
            r#"
            SELECT {} FROM stock_items
            WHERE user_id = ?1
              AND (?2 IS NULL OR product_name LIKE ?2 ESCAPE '\')
            ORDER BY product_name COLLATE NOCASE
            "#,
            STOCK_COLUMNS
        );
        let items = sqlx::query_as::<_, StockItem>(&sql)
            .bind(user_id)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Edits name, cost price or quantity.
    ///
    /// Setting `quantity` is a stock count and replaces the level. Edits
    /// that leave it `None` keep whatever sales have done to it.
    pub async fn update(&self, user_id: &str, id: &str, update: &StockUpdate) -> DbResult<StockItem> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;

        let current = fetch_stock(&mut tx, user_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", id))?;
        let mut updated = update.apply_to(&current);
        updated.updated_at = Utc::now();

        debug!(id = %id, "Updating stock item");

        write_stock(&mut tx, &current, &updated)
            .await
            .map_err(|e| e.with_duplicate("product_name", &updated.product_name))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(updated)
    }

    /// Adds purchased units.
    ///
    /// The new level is bounded like any other stock quantity.
    pub async fn restock(&self, user_id: &str, id: &str, quantity: i64) -> DbResult<StockItem> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_stock(&mut tx, user_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", id))?;
        let mut restocked = current.clone();
        restocked.restock(quantity)?;
        restocked.updated_at = Utc::now();

        debug!(id = %id, quantity = quantity, level = restocked.quantity, "Restocking");

        write_stock(&mut tx, &current, &restocked).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(restocked)
    }

    /// Deletes a stock item. Past sales keep their figures and lose the link.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting stock item");

        let result = sqlx::query("DELETE FROM stock_items WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        Ok(())
    }

    /// Items with `quantity <= threshold`, emptiest first.
    pub async fn low_stock(&self, user_id: &str, threshold: i64) -> DbResult<Vec<StockItem>> {
        let sql = format!(
            r#"
            SELECT {} FROM stock_items
            WHERE user_id = ?1 AND quantity <= ?2
            ORDER BY quantity, product_name COLLATE NOCASE
            "#,
            STOCK_COLUMNS
        );
        let items = sqlx::query_as::<_, StockItem>(&sql)
            .bind(user_id)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Counts the user's stock items.
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Reads a stock item inside a transaction.
pub(crate) async fn fetch_stock(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    id: &str,
) -> DbResult<Option<StockItem>> {
    let sql = format!(
        "SELECT {} FROM stock_items WHERE id = ?1 AND user_id = ?2",
        STOCK_COLUMNS
    );
    let item = sqlx::query_as::<_, StockItem>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(item)
}

/// Writes `after` over `before`, provided the stored quantity and
/// total_sold are still the ones in `before`.
///
/// ## Errors
/// - `Conflict` when another writer changed the stock level since `before`
///   was read
pub(crate) async fn write_stock(
    tx: &mut Transaction<'_, Sqlite>,
    before: &StockItem,
    after: &StockItem,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_items
        SET
            product_name = ?1,
            quantity = ?2,
            cost_price_cents = ?3,
            total_sold = ?4,
            updated_at = ?5
        WHERE id = ?6 AND user_id = ?7
          AND quantity = ?8
          AND total_sold = ?9
        "#,
    )
    .bind(&after.product_name)
    .bind(after.quantity)
    .bind(after.cost_price_cents)
    .bind(after.total_sold)
    .bind(after.updated_at)
    .bind(&before.id)
    .bind(&before.user_id)
    .bind(before.quantity)
    .bind(before.total_sold)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict("Stock item", &before.id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{other_user, setup};
    use tally_core::{Money, MAX_QUANTITY};

    fn new_item(name: &str, quantity: i64, cost: i64) -> NewStockItem {
        NewStockItem {
            product_name: name.to_string(),
            quantity,
            cost_price: Money::from_cents(cost),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_find() {
        let (db, user) = setup().await;
        let stock = db.stock();

        let item = stock.create(&user, &new_item(" Rice 5kg ", 10, 2500)).await.unwrap();
        assert_eq!(item.product_name, "Rice 5kg");
        assert_eq!(item.total_sold, 0);

        let fetched = stock.get(&user, &item.id).await.unwrap();
        assert_eq!(fetched.quantity, 10);
        assert_eq!(fetched.cost_price_cents, 2500);

        let found = stock.find_by_name(&user, "rice 5KG").await.unwrap().unwrap();
        assert_eq!(found.id, item.id);
        assert!(stock.find_by_name(&user, "Beans").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_case_insensitively() {
        let (db, user) = setup().await;
        let stock = db.stock();

        stock.create(&user, &new_item("Soap", 1, 100)).await.unwrap();
        let err = stock.create(&user, &new_item("SOAP", 1, 100)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Another user may use the same name
        let other = other_user(&db).await;
        stock.create(&other, &new_item("Soap", 1, 100)).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_search_and_low_stock() {
        let (db, user) = setup().await;
        let stock = db.stock();

        stock.create(&user, &new_item("Rice", 20, 100)).await.unwrap();
        stock.create(&user, &new_item("brown rice", 2, 100)).await.unwrap();
        stock.create(&user, &new_item("Beans", 0, 100)).await.unwrap();
        stock.create(&user, &new_item("100% Juice", 3, 100)).await.unwrap();

        let all = stock.list(&user, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|i| i.product_name.as_str()).collect();
        assert_eq!(names, vec!["100% Juice", "Beans", "brown rice", "Rice"]);

        assert_eq!(stock.list(&user, Some("RICE")).await.unwrap().len(), 2);
        assert_eq!(stock.list(&user, Some("%")).await.unwrap().len(), 1);
        assert_eq!(stock.list(&user, Some("  ")).await.unwrap().len(), 4);

        let low = stock.low_stock(&user, 3).await.unwrap();
        let names: Vec<&str> = low.iter().map(|i| i.product_name.as_str()).collect();
        assert_eq!(names, vec!["Beans", "brown rice", "100% Juice"]);
    }

    #[tokio::test]
    async fn test_update_and_restock() {
        let (db, user) = setup().await;
        let stock = db.stock();
        let item = stock.create(&user, &new_item("Rice", 5, 100)).await.unwrap();

        let update = StockUpdate {
            product_name: Some("Rice 10kg".to_string()),
            cost_price: Some(Money::from_cents(180)),
            ..Default::default()
        };
        let updated = stock.update(&user, &item.id, &update).await.unwrap();
        assert_eq!(updated.product_name, "Rice 10kg");
        assert_eq!(updated.quantity, 5);

        let restocked = stock.restock(&user, &item.id, 7).await.unwrap();
        assert_eq!(restocked.quantity, 12);
        assert_eq!(restocked.cost_price_cents, 180);

        assert!(stock.restock(&user, &item.id, 0).await.is_err());
        let bad = StockUpdate {
            quantity: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            stock.update(&user, &item.id, &bad).await,
            Err(DbError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_other_users_rows_are_not_found() {
        let (db, user) = setup().await;
        let other = other_user(&db).await;
        let stock = db.stock();
        let item = stock.create(&user, &new_item("Rice", 5, 100)).await.unwrap();

        assert!(matches!(
            stock.get(&other, &item.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(stock.restock(&other, &item.id, 1).await.is_err());
        assert!(stock.delete(&other, &item.id).await.is_err());
        assert!(stock.list(&other, None).await.unwrap().is_empty());

        stock.delete(&user, &item.id).await.unwrap();
        assert_eq!(stock.count(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_keeps_concurrent_sale() {
        let (db, user) = setup().await;
        let stock = db.stock();
        let item = stock.create(&user, &new_item("Rice", 10, 100)).await.unwrap();

        // An edit that read the item before this sale committed
        let stale = stock.get(&user, &item.id).await.unwrap();
        db.sales()
            .record(
                &user,
                &tally_core::NewSale {
                    product_name: "Rice".to_string(),
                    quantity: 4,
                    selling_price: Money::from_cents(150),
                    cost_price: None,
                    sold_at: None,
                },
            )
            .await
            .unwrap();

        let rename = StockUpdate {
            product_name: Some("Rice 5kg".to_string()),
            ..Default::default()
        };
        let mut tx = db.pool().begin().await.unwrap();
        let renamed = rename.apply_to(&stale);
        let err = write_stock(&mut tx, &stale, &renamed).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        drop(tx);

        let stored = stock.get(&user, &item.id).await.unwrap();
        assert_eq!(stored.product_name, "Rice");
        assert_eq!(stored.quantity, 6);
        assert_eq!(stored.total_sold, 4);

        let updated = stock.update(&user, &item.id, &rename).await.unwrap();
        assert_eq!(updated.product_name, "Rice 5kg");
        assert_eq!(updated.quantity, 6);
        assert_eq!(updated.total_sold, 4);
        assert_eq!(stock.get(&user, &item.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_restock_bounded_by_max_quantity() {
        let (db, user) = setup().await;
        let stock = db.stock();
        let item = stock
            .create(&user, &new_item("Rice", MAX_QUANTITY - 5, 100))
            .await
            .unwrap();

        assert_eq!(
            stock.restock(&user, &item.id, 5).await.unwrap().quantity,
            MAX_QUANTITY
        );
        assert!(matches!(
            stock.restock(&user, &item.id, 1).await,
            Err(DbError::Domain(_))
        ));
        assert_eq!(
            stock.get(&user, &item.id).await.unwrap().quantity,
            MAX_QUANTITY
        );
    }

    #[tokio::test]
    async fn test_negative_quantity_blocked_by_schema() {
        let (db, user) = setup().await;
        let item = db.stock().create(&user, &new_item("Rice", 1, 100)).await.unwrap();

        let err = sqlx::query("UPDATE stock_items SET quantity = -1 WHERE id = ?1")
            .bind(&item.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
