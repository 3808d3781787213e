//! # Debtor Repository
//!
//! Customer credit: debtors, the items they bought on credit and the
//! installments they paid.
//!
//! ## Balance Maintenance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Debtor Balance Writes                                │
//! │                                                                         │
//! │  create          INSERT debtor + items (+ deposit payment)   1 tx      │
//! │  add_item        INSERT item,    UPDATE debtor totals         1 tx      │
//! │  record_payment  INSERT payment, UPDATE debtor totals         1 tx      │
//! │                                                                         │
//! │  Every UPDATE of a debtor's totals carries the totals it read:         │
//! │                                                                         │
//! │     UPDATE debtors SET ... WHERE id = ?                                 │
//! │        AND grand_total_cents = <read> AND total_paid_cents = <read>     │
//! │                                                                         │
//! │  A concurrent payment in between makes it match 0 rows → Conflict,     │
//! │  and the whole transaction rolls back. No payment is ever lost.        │
//! │                                                                         │
//! │  SQLite additionally CHECKs balance = grand_total − total_paid and     │
//! │  status = 'paid' ⇔ balance ≤ 0.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{contains_pattern, generate_id};
use tally_core::bookkeeping::{self, Reconciliation};
use tally_core::validation;
use tally_core::{
    ContactUpdate, DebtItem, DebtPayment, DebtStatus, Debtor, Money, NewDebtItem, NewDebtor,
};

const DEBTOR_COLUMNS: &str = "id, user_id, customer_name, customer_phone, customer_email, \
     grand_total_cents, total_paid_cents, current_balance_cents, status, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, debtor_id, item_name, quantity, selling_price_cents, total_cents, created_at";

const PAYMENT_COLUMNS: &str = "id, debtor_id, amount_cents, note, paid_at";

/// A debtor with everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtorDetail {
    pub debtor: Debtor,
    pub items: Vec<DebtItem>,
    pub payments: Vec<DebtPayment>,
}

/// Outcome of a recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub debtor: Debtor,
    pub payment: DebtPayment,
}

/// Repository for debtor database operations.
#[derive(Debug, Clone)]
pub struct DebtorRepository {
    pool: SqlitePool,
}

impl DebtorRepository {
    /// Creates a new DebtorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtorRepository { pool }
    }

    /// Opens a debtor account with its first items and an optional deposit.
    pub async fn create(&self, user_id: &str, new: &NewDebtor) -> DbResult<DebtorDetail> {
        let opening = bookkeeping::open_debt(new)?;
        let now = Utc::now();

        let debtor = Debtor {
            id: generate_id(),
            user_id: user_id.to_string(),
            customer_name: new.customer_name.trim().to_string(),
            customer_phone: trimmed(new.customer_phone.as_deref()),
            customer_email: trimmed(new.customer_email.as_deref()),
            grand_total_cents: opening.grand_total.cents(),
            total_paid_cents: opening.total_paid.cents(),
            current_balance_cents: opening.current_balance.cents(),
            status: opening.status,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %debtor.id,
            items = new.items.len(),
            grand_total = debtor.grand_total_cents,
            "Opening debtor"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO debtors (
                id, user_id, customer_name, customer_phone, customer_email,
                grand_total_cents, total_paid_cents, current_balance_cents, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&debtor.id)
        .bind(&debtor.user_id)
        .bind(&debtor.customer_name)
        .bind(&debtor.customer_phone)
        .bind(&debtor.customer_email)
        .bind(debtor.grand_total_cents)
        .bind(debtor.total_paid_cents)
        .bind(debtor.current_balance_cents)
        .bind(debtor.status)
        .bind(debtor.created_at)
        .bind(debtor.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for (input, total) in new.items.iter().zip(opening.item_totals.iter()) {
            let item = DebtItem {
                id: generate_id(),
                debtor_id: debtor.id.clone(),
                item_name: input.item_name.trim().to_string(),
                quantity: input.quantity,
                selling_price_cents: input.selling_price.cents(),
                total_cents: total.cents(),
                created_at: now,
            };
            insert_item(&mut tx, &item).await?;
            items.push(item);
        }

        let mut payments = Vec::new();
        if let Some(deposit) = new.deposit {
            let payment = DebtPayment {
                id: generate_id(),
                debtor_id: debtor.id.clone(),
                amount_cents: deposit.cents(),
                note: Some("Deposit".to_string()),
                paid_at: now,
            };
            insert_payment(&mut tx, &payment).await?;
            payments.push(payment);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(DebtorDetail {
            debtor,
            items,
            payments,
        })
    }

    /// Adds an item bought on credit and raises the debtor's totals.
    pub async fn add_item(
        &self,
        user_id: &str,
        debtor_id: &str,
        new: &NewDebtItem,
    ) -> DbResult<(Debtor, DebtItem)> {
        let total = bookkeeping::debt_item_total(new)?;

        let mut tx = self.pool.begin().await?;
        let before = fetch_debtor(&mut tx, user_id, debtor_id).await?;

        let mut debtor = before.clone();
        debtor.add_charge(total)?;
        debtor.updated_at = Utc::now();

        let item = DebtItem {
            id: generate_id(),
            debtor_id: debtor.id.clone(),
            item_name: new.item_name.trim().to_string(),
            quantity: new.quantity,
            selling_price_cents: new.selling_price.cents(),
            total_cents: total.cents(),
            created_at: debtor.updated_at,
        };

        debug!(debtor_id = %debtor_id, total = total.cents(), "Adding debt item");

        insert_item(&mut tx, &item).await?;
        update_totals(&mut tx, &before, &debtor).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok((debtor, item))
    }

    /// Records an installment payment.
    ///
    /// Overpaying is allowed: the balance goes negative (customer credit)
    /// and the status is `paid`.
    pub async fn record_payment(
        &self,
        user_id: &str,
        debtor_id: &str,
        amount: Money,
        note: Option<&str>,
    ) -> DbResult<PaymentReceipt> {
        let mut tx = self.pool.begin().await?;
        let before = fetch_debtor(&mut tx, user_id, debtor_id).await?;

        let mut debtor = before.clone();
        debtor.apply_payment(amount)?;
        debtor.updated_at = Utc::now();

        let payment = DebtPayment {
            id: generate_id(),
            debtor_id: debtor.id.clone(),
            amount_cents: amount.cents(),
            note: trimmed(note),
            paid_at: debtor.updated_at,
        };

        debug!(
            debtor_id = %debtor_id,
            amount = amount.cents(),
            balance = debtor.current_balance_cents,
            status = %debtor.status,
            "Recording payment"
        );

        update_totals(&mut tx, &before, &debtor).await?;
        insert_payment(&mut tx, &payment).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(PaymentReceipt { debtor, payment })
    }

    /// Gets a debtor by ID.
    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<Debtor> {
        let sql = format!(
            "SELECT {} FROM debtors WHERE id = ?1 AND user_id = ?2",
            DEBTOR_COLUMNS
        );
        sqlx::query_as::<_, Debtor>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Debtor", id))
    }

    /// Gets a debtor with items and payments.
    pub async fn detail(&self, user_id: &str, id: &str) -> DbResult<DebtorDetail> {
        let debtor = self.get(user_id, id).await?;
        let items = self.items(user_id, id).await?;
        let payments = self.payments(user_id, id).await?;

        Ok(DebtorDetail {
            debtor,
            items,
            payments,
        })
    }

    /// Lists debtors, largest balance first.
    ///
    /// `search` matches a substring of the customer name, phone or email.
    pub async fn list(
        &self,
        user_id: &str,
        status: Option<DebtStatus>,
        search: Option<&str>,
    ) -> DbResult<Vec<Debtor>> {
        let pattern = match search {
            Some(query) => {
                let query = validation::validate_search_query(query)?;
                (!query.is_empty()).then(|| contains_pattern(&query))
            }
            None => None,
        };

        let sql = format!(
            r#"
            SELECT {} FROM debtors
            WHERE user_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL
                   OR customer_name LIKE ?3 ESCAPE '\'
                   OR customer_phone LIKE ?3 ESCAPE '\'
                   OR customer_email LIKE ?3 ESCAPE '\')
            ORDER BY current_balance_cents DESC, customer_name COLLATE NOCASE
            "#,
            DEBTOR_COLUMNS
        );
        let debtors = sqlx::query_as::<_, Debtor>(&sql)
            .bind(user_id)
            .bind(status)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(debtors)
    }

    /// Items of a debtor, oldest first.
    pub async fn items(&self, user_id: &str, debtor_id: &str) -> DbResult<Vec<DebtItem>> {
        let sql = format!(
            r#"
            SELECT {} FROM debt_items
            WHERE debtor_id = ?1
              AND EXISTS (SELECT 1 FROM debtors WHERE id = ?1 AND user_id = ?2)
            ORDER BY created_at, id
            "#,
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, DebtItem>(&sql)
            .bind(debtor_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Payments of a debtor, oldest first.
    pub async fn payments(&self, user_id: &str, debtor_id: &str) -> DbResult<Vec<DebtPayment>> {
        let sql = format!(
            r#"
            SELECT {} FROM debt_payments
            WHERE debtor_id = ?1
              AND EXISTS (SELECT 1 FROM debtors WHERE id = ?1 AND user_id = ?2)
            ORDER BY paid_at, id
            "#,
            PAYMENT_COLUMNS
        );
        let payments = sqlx::query_as::<_, DebtPayment>(&sql)
            .bind(debtor_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Changes name, phone or email. Totals are untouched.
    pub async fn update_contact(
        &self,
        user_id: &str,
        id: &str,
        update: &ContactUpdate,
    ) -> DbResult<Debtor> {
        update.validate()?;

        let current = self.get(user_id, id).await?;
        let mut updated = update.apply_to(&current);
        updated.updated_at = Utc::now();

        debug!(id = %id, "Updating debtor contact");

        let result = sqlx::query(
            r#"
            UPDATE debtors
            SET
                customer_name = ?1,
                customer_phone = ?2,
                customer_email = ?3,
                updated_at = ?4
            WHERE id = ?5 AND user_id = ?6
            "#,
        )
        .bind(&updated.customer_name)
        .bind(&updated.customer_phone)
        .bind(&updated.customer_email)
        .bind(updated.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Debtor", id));
        }

        Ok(updated)
    }

    /// Deletes a debtor together with its items and payments.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting debtor");

        let result = sqlx::query("DELETE FROM debtors WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Debtor", id));
        }

        Ok(())
    }

    /// Checks the stored totals of a debtor against its items and payments.
    pub async fn reconcile(&self, user_id: &str, id: &str) -> DbResult<Reconciliation> {
        let detail = self.detail(user_id, id).await?;
        Ok(bookkeeping::reconcile(
            &detail.debtor,
            &detail.items,
            &detail.payments,
        ))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn fetch_debtor(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    id: &str,
) -> DbResult<Debtor> {
    let sql = format!(
        "SELECT {} FROM debtors WHERE id = ?1 AND user_id = ?2",
        DEBTOR_COLUMNS
    );
    sqlx::query_as::<_, Debtor>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| DbError::not_found("Debtor", id))
}

/// Writes new totals, guarded by the totals `before` was read with.
async fn update_totals(
    tx: &mut Transaction<'_, Sqlite>,
    before: &Debtor,
    after: &Debtor,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE debtors
        SET
            grand_total_cents = ?1,
            total_paid_cents = ?2,
            current_balance_cents = ?3,
            status = ?4,
            updated_at = ?5
        WHERE id = ?6 AND user_id = ?7
          AND grand_total_cents = ?8
          AND total_paid_cents = ?9
        "#,
    )
    .bind(after.grand_total_cents)
    .bind(after.total_paid_cents)
    .bind(after.current_balance_cents)
    .bind(after.status)
    .bind(after.updated_at)
    .bind(&before.id)
    .bind(&before.user_id)
    .bind(before.grand_total_cents)
    .bind(before.total_paid_cents)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict("Debtor", &before.id));
    }

    Ok(())
}

async fn insert_item(tx: &mut Transaction<'_, Sqlite>, item: &DebtItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO debt_items (
            id, debtor_id, item_name, quantity, selling_price_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.debtor_id)
    .bind(&item.item_name)
    .bind(item.quantity)
    .bind(item.selling_price_cents)
    .bind(item.total_cents)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_payment(tx: &mut Transaction<'_, Sqlite>, payment: &DebtPayment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO debt_payments (id, debtor_id, amount_cents, note, paid_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.debtor_id)
    .bind(payment.amount_cents)
    .bind(&payment.note)
    .bind(payment.paid_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{other_user, setup};
    use tally_core::CoreError;

    fn item(name: &str, quantity: i64, price: i64) -> NewDebtItem {
        NewDebtItem {
            item_name: name.to_string(),
            quantity,
            selling_price: Money::from_cents(price),
        }
    }

    fn new_debtor(name: &str, items: Vec<NewDebtItem>, deposit: Option<i64>) -> NewDebtor {
        NewDebtor {
            customer_name: name.to_string(),
            customer_phone: Some("+234 801 234 5678".to_string()),
            customer_email: None,
            items,
            deposit: deposit.map(Money::from_cents),
        }
    }

    #[tokio::test]
    async fn test_payment_example() {
        let (db, user) = setup().await;
        let debtors = db.debtors();
        let opened = debtors
            .create(&user, &new_debtor("Ada", vec![item("Rice", 2, 500)], None))
            .await
            .unwrap();
        let id = opened.debtor.id.clone();
        assert_eq!(opened.debtor.grand_total_cents, 1000);
        assert_eq!(opened.debtor.status, DebtStatus::Pending);

        let receipt = debtors
            .record_payment(&user, &id, Money::from_cents(400), None)
            .await
            .unwrap();
        assert_eq!(receipt.debtor.total_paid_cents, 400);
        assert_eq!(receipt.debtor.current_balance_cents, 600);
        assert_eq!(receipt.debtor.status, DebtStatus::Pending);

        let receipt = debtors
            .record_payment(&user, &id, Money::from_cents(600), Some("cash"))
            .await
            .unwrap();
        assert_eq!(receipt.debtor.total_paid_cents, 1000);
        assert_eq!(receipt.debtor.current_balance_cents, 0);
        assert_eq!(receipt.debtor.status, DebtStatus::Paid);
        assert_eq!(receipt.payment.note.as_deref(), Some("cash"));

        let stored = debtors.get(&user, &id).await.unwrap();
        assert_eq!(stored, receipt.debtor);
        assert!(debtors.reconcile(&user, &id).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_create_with_deposit() {
        let (db, user) = setup().await;
        let detail = db
            .debtors()
            .create(
                &user,
                &new_debtor(
                    "Bola",
                    vec![item("Sugar", 2, 350), item("Milk", 1, 1200)],
                    Some(500),
                ),
            )
            .await
            .unwrap();

        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.debtor.grand_total_cents, 1900);
        assert_eq!(detail.debtor.current_balance_cents, 1400);

        let loaded = db.debtors().detail(&user, &detail.debtor.id).await.unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.payments[0].amount_cents, 500);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_rolls_back() {
        let (db, user) = setup().await;
        let debtors = db.debtors();

        assert!(matches!(
            debtors.create(&user, &new_debtor("Ada", vec![], None)).await,
            Err(DbError::Domain(CoreError::EmptyDebt { .. }))
        ));
        assert!(debtors.list(&user, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_item_reopens_paid_debtor() {
        let (db, user) = setup().await;
        let debtors = db.debtors();
        let opened = debtors
            .create(&user, &new_debtor("Ada", vec![item("Rice", 1, 500)], Some(500)))
            .await
            .unwrap();
        assert_eq!(opened.debtor.status, DebtStatus::Paid);

        let (debtor, added) = debtors
            .add_item(&user, &opened.debtor.id, &item("Oil", 2, 150))
            .await
            .unwrap();
        assert_eq!(added.total_cents, 300);
        assert_eq!(debtor.grand_total_cents, 800);
        assert_eq!(debtor.current_balance_cents, 300);
        assert_eq!(debtor.status, DebtStatus::Pending);
        assert!(debtors
            .reconcile(&user, &debtor.id)
            .await
            .unwrap()
            .is_consistent());
    }

    #[tokio::test]
    async fn test_overpayment_and_invalid_amounts() {
        let (db, user) = setup().await;
        let debtors = db.debtors();
        let id = debtors
            .create(&user, &new_debtor("Ada", vec![item("Rice", 1, 500)], None))
            .await
            .unwrap()
            .debtor
            .id;

        assert!(matches!(
            debtors.record_payment(&user, &id, Money::zero(), None).await,
            Err(DbError::Domain(CoreError::InvalidPaymentAmount { .. }))
        ));
        assert!(debtors.payments(&user, &id).await.unwrap().is_empty());

        let receipt = debtors
            .record_payment(&user, &id, Money::from_cents(700), None)
            .await
            .unwrap();
        assert_eq!(receipt.debtor.current_balance_cents, -200);
        assert_eq!(receipt.debtor.status, DebtStatus::Paid);
    }

    #[tokio::test]
    async fn test_stale_totals_conflict() {
        let (db, user) = setup().await;
        let debtors = db.debtors();
        let opened = debtors
            .create(&user, &new_debtor("Ada", vec![item("Rice", 2, 500)], None))
            .await
            .unwrap();

        // A writer that read the debtor before this payment landed
        let stale = opened.debtor.clone();
        debtors
            .record_payment(&user, &stale.id, Money::from_cents(100), None)
            .await
            .unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let mut after = stale.clone();
        after.apply_payment(Money::from_cents(300)).unwrap();
        let err = update_totals(&mut tx, &stale, &after).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        drop(tx);

        let stored = debtors.get(&user, &stale.id).await.unwrap();
        assert_eq!(stored.total_paid_cents, 100);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, user) = setup().await;
        let debtors = db.debtors();
        debtors
            .create(&user, &new_debtor("Ada Obi", vec![item("Rice", 1, 900)], None))
            .await
            .unwrap();
        debtors
            .create(&user, &new_debtor("Bola", vec![item("Rice", 1, 300)], Some(300)))
            .await
            .unwrap();
        let mut chidi = new_debtor("Chidi", vec![item("Rice", 1, 1500)], None);
        chidi.customer_email = Some("chidi@example.com".to_string());
        debtors.create(&user, &chidi).await.unwrap();

        let all = debtors.list(&user, None, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|d| d.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Chidi", "Ada Obi", "Bola"]);

        let pending = debtors
            .list(&user, Some(DebtStatus::Pending), None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let found = debtors.list(&user, None, Some("EXAMPLE.com")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_name, "Chidi");
    }

    #[tokio::test]
    async fn test_update_contact_and_delete_cascades() {
        let (db, user) = setup().await;
        let debtors = db.debtors();
        let id = debtors
            .create(&user, &new_debtor("Ada", vec![item("Rice", 1, 500)], Some(100)))
            .await
            .unwrap()
            .debtor
            .id;

        let update = ContactUpdate {
            customer_phone: Some(String::new()),
            customer_email: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        let updated = debtors.update_contact(&user, &id, &update).await.unwrap();
        assert_eq!(updated.customer_phone, None);
        assert_eq!(updated.current_balance_cents, 400);

        debtors.delete(&user, &id).await.unwrap();
        let orphans: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM debt_items) + (SELECT COUNT(*) FROM debt_payments)",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_other_users_debtors_are_hidden() {
        let (db, user) = setup().await;
        let other = other_user(&db).await;
        let debtors = db.debtors();
        let id = debtors
            .create(&user, &new_debtor("Ada", vec![item("Rice", 1, 500)], None))
            .await
            .unwrap()
            .debtor
            .id;

        assert!(matches!(
            debtors
                .record_payment(&other, &id, Money::from_cents(100), None)
                .await,
            Err(DbError::NotFound { .. })
        ));
        assert!(debtors.items(&other, &id).await.unwrap().is_empty());
        assert!(debtors.delete(&other, &id).await.is_err());
        assert_eq!(debtors.get(&user, &id).await.unwrap().total_paid_cents, 0);
    }
}
