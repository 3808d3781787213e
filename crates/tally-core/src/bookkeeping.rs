//! # Bookkeeping Rules
//!
//! The arithmetic behind every derived field Tally stores.
//!
//! ## Where Each Rule Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bookkeeping Rules                                  │
//! │                                                                         │
//! │  record sale ──► SaleTotals::compute ──► StockItem::apply_sale          │
//! │                  cost = q × cost_price    s ≥ q ? s − q : reject        │
//! │                  revenue = q × price      total_sold + q                │
//! │                  profit = revenue − cost                                │
//! │                                                                         │
//! │  open debt ────► open_debt ──────────────► Debtor row + items + deposit │
//! │                  grand_total = Σ q × price                              │
//! │                                                                         │
//! │  pay ──────────► Debtor::apply_payment                                  │
//! │                  total_paid += amount                                   │
//! │                  balance = grand_total − total_paid                     │
//! │                  status = balance ≤ 0 ? paid : pending                  │
//! │                                                                         │
//! │  tally-db runs each of these inside ONE transaction together with the   │
//! │  row writes, so the stored numbers never disagree with each other.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DebtItem, DebtPayment, DebtStatus, Debtor, NewDebtItem, NewDebtor, StockItem};
use crate::validation;

fn overflow(what: &str) -> CoreError {
    CoreError::Overflow {
        what: what.to_string(),
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Derived totals of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleTotals {
    pub quantity: i64,
    pub cost_price: Money,
    pub selling_price: Money,
    pub total_cost: Money,
    pub revenue: Money,
    pub profit_loss: Money,
}

impl SaleTotals {
    /// Computes total cost, revenue and profit/loss for a sale.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::bookkeeping::SaleTotals;
    /// use tally_core::money::Money;
    ///
    /// // Selling below cost is allowed and shows up as a loss
    /// let t = SaleTotals::compute(2, Money::from_cents(500), Money::from_cents(450)).unwrap();
    /// assert_eq!(t.profit_loss.cents(), -100);
    /// ```
    pub fn compute(quantity: i64, cost_price: Money, selling_price: Money) -> CoreResult<Self> {
        validation::validate_quantity(quantity)?;
        validation::validate_price("cost_price", cost_price)?;
        validation::validate_price("selling_price", selling_price)?;

        let total_cost = cost_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| overflow("total cost"))?;
        let revenue = selling_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| overflow("revenue"))?;
        let profit_loss = revenue
            .checked_sub(total_cost)
            .ok_or_else(|| overflow("profit"))?;

        Ok(SaleTotals {
            quantity,
            cost_price,
            selling_price,
            total_cost,
            revenue,
            profit_loss,
        })
    }
}

// =============================================================================
// Stock
// =============================================================================

impl StockItem {
    /// Checks that `quantity` units can be sold from this item.
    ///
    /// Succeeds only if `0 < quantity ≤ self.quantity`.
    pub fn check_sale(&self, quantity: i64) -> CoreResult<()> {
        validation::validate_quantity(quantity)?;

        if quantity > self.quantity {
            return Err(CoreError::InsufficientStock {
                product: self.product_name.clone(),
                available: self.quantity,
                requested: quantity,
            });
        }

        Ok(())
    }

    /// Deducts a sale: quantity `s → s − q`, total_sold `t → t + q`.
    ///
    /// On error the item is unchanged.
    pub fn apply_sale(&mut self, quantity: i64) -> CoreResult<()> {
        self.check_sale(quantity)?;
        let total_sold = self
            .total_sold
            .checked_add(quantity)
            .ok_or_else(|| overflow("total sold"))?;

        self.quantity -= quantity;
        self.total_sold = total_sold;
        Ok(())
    }

    /// Puts the units of a deleted sale back on the shelf.
    pub fn reverse_sale(&mut self, quantity: i64) -> CoreResult<()> {
        validation::validate_quantity(quantity)?;
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| overflow("stock quantity"))?;
        self.total_sold = (self.total_sold - quantity).max(0);
        Ok(())
    }

    /// Adds newly purchased units.
    pub fn restock(&mut self, quantity: i64) -> CoreResult<()> {
        validation::validate_quantity(quantity)?;
        let new_quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| overflow("stock quantity"))?;
        validation::validate_stock_quantity(new_quantity)?;
        self.quantity = new_quantity;
        Ok(())
    }
}

// =============================================================================
// Debt
// =============================================================================

/// Total of a debt line: quantity × selling price.
pub fn debt_item_total(item: &NewDebtItem) -> CoreResult<Money> {
    item.validate()?;
    item.selling_price
        .checked_multiply_quantity(item.quantity)
        .ok_or_else(|| overflow("debt item total"))
}

/// The opening figures of a new debtor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtOpening {
    /// Totals of `NewDebtor::items`, same order.
    pub item_totals: Vec<Money>,
    pub grand_total: Money,
    pub total_paid: Money,
    pub current_balance: Money,
    pub status: DebtStatus,
}

/// Computes the opening balance of a new debtor.
///
/// grand_total = Σ item totals; an optional deposit counts as the first
/// payment.
pub fn open_debt(new: &NewDebtor) -> CoreResult<DebtOpening> {
    new.validate()?;

    if new.items.is_empty() {
        return Err(CoreError::EmptyDebt {
            customer: new.customer_name.trim().to_string(),
        });
    }

    let item_totals = new
        .items
        .iter()
        .map(debt_item_total)
        .collect::<CoreResult<Vec<_>>>()?;

    let grand_total = item_totals
        .iter()
        .try_fold(Money::zero(), |acc, total| acc.checked_add(*total))
        .ok_or_else(|| overflow("grand total"))?;

    let total_paid = new.deposit.unwrap_or_default();
    let current_balance = grand_total
        .checked_sub(total_paid)
        .ok_or_else(|| overflow("balance"))?;

    Ok(DebtOpening {
        item_totals,
        grand_total,
        total_paid,
        current_balance,
        status: DebtStatus::for_balance(current_balance),
    })
}

impl Debtor {
    /// Applies an installment payment.
    ///
    /// total_paid += amount, current_balance = grand_total − total_paid and
    /// status becomes `Paid` exactly when the balance is ≤ 0. Paying more
    /// than the balance is accepted and leaves the customer in credit.
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::Utc;
    /// # use tally_core::{Debtor, DebtStatus, Money};
    /// # let now = Utc::now();
    /// # let mut debtor = Debtor {
    /// #     id: "d".into(), user_id: "u".into(), customer_name: "Ada".into(),
    /// #     customer_phone: None, customer_email: None,
    /// #     grand_total_cents: 1000, total_paid_cents: 0, current_balance_cents: 1000,
    /// #     status: DebtStatus::Pending, created_at: now, updated_at: now,
    /// # };
    /// debtor.apply_payment(Money::from_cents(400)).unwrap();
    /// assert_eq!(debtor.current_balance_cents, 600);
    /// assert_eq!(debtor.status, DebtStatus::Pending);
    ///
    /// debtor.apply_payment(Money::from_cents(600)).unwrap();
    /// assert_eq!(debtor.total_paid_cents, 1000);
    /// assert_eq!(debtor.status, DebtStatus::Paid);
    /// ```
    pub fn apply_payment(&mut self, amount: Money) -> CoreResult<()> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("{} is not a positive amount", amount),
            });
        }

        let total_paid = self
            .total_paid()
            .checked_add(amount)
            .ok_or_else(|| overflow("total paid"))?;
        self.set_totals(self.grand_total(), total_paid)
    }

    /// Extends more credit: a new debt item raises grand_total and balance.
    ///
    /// A settled debtor becomes pending again when the new charge leaves a
    /// positive balance.
    pub fn add_charge(&mut self, total: Money) -> CoreResult<()> {
        validation::validate_price("debt item total", total)?;

        let grand_total = self
            .grand_total()
            .checked_add(total)
            .ok_or_else(|| overflow("grand total"))?;
        self.set_totals(grand_total, self.total_paid())
    }

    fn set_totals(&mut self, grand_total: Money, total_paid: Money) -> CoreResult<()> {
        let balance = grand_total
            .checked_sub(total_paid)
            .ok_or_else(|| overflow("balance"))?;

        self.grand_total_cents = grand_total.cents();
        self.total_paid_cents = total_paid.cents();
        self.current_balance_cents = balance.cents();
        self.status = DebtStatus::for_balance(balance);
        Ok(())
    }
}

/// Result of checking a debtor row against its items and payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub debtor_id: String,
    pub recorded_grand_total: Money,
    pub items_total: Money,
    pub recorded_total_paid: Money,
    pub payments_total: Money,
    /// recorded_total_paid − payments_total
    pub payment_drift: Money,
    /// recorded_grand_total − items_total
    pub item_drift: Money,
    /// current_balance == grand_total − total_paid
    pub balance_identity_holds: bool,
    /// status agrees with the balance
    pub status_consistent: bool,
}

impl Reconciliation {
    /// True when every stored figure agrees with its sources.
    pub fn is_consistent(&self) -> bool {
        self.payment_drift.is_zero()
            && self.item_drift.is_zero()
            && self.balance_identity_holds
            && self.status_consistent
    }
}

/// Compares a debtor's stored totals with the sum of its items and payments.
pub fn reconcile(debtor: &Debtor, items: &[DebtItem], payments: &[DebtPayment]) -> Reconciliation {
    let items_total: Money = items.iter().map(DebtItem::total).sum();
    let payments_total: Money = payments.iter().map(DebtPayment::amount).sum();

    let balance_identity_holds =
        debtor.current_balance() == debtor.grand_total() - debtor.total_paid();
    let status_consistent = debtor.status == DebtStatus::for_balance(debtor.current_balance());

    Reconciliation {
        debtor_id: debtor.id.clone(),
        recorded_grand_total: debtor.grand_total(),
        items_total,
        recorded_total_paid: debtor.total_paid(),
        payments_total,
        payment_drift: debtor.total_paid() - payments_total,
        item_drift: debtor.grand_total() - items_total,
        balance_identity_holds,
        status_consistent,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stock(quantity: i64) -> StockItem {
        let now = Utc::now();
        StockItem {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            product_name: "Rice 5kg".to_string(),
            quantity,
            cost_price_cents: 2500,
            total_sold: 4,
            created_at: now,
            updated_at: now,
        }
    }

    fn debtor(grand_total: i64) -> Debtor {
        let now = Utc::now();
        Debtor {
            id: "d1".to_string(),
            user_id: "u1".to_string(),
            customer_name: "Ada".to_string(),
            customer_phone: None,
            customer_email: None,
            grand_total_cents: grand_total,
            total_paid_cents: 0,
            current_balance_cents: grand_total,
            status: DebtStatus::for_balance(Money::from_cents(grand_total)),
            created_at: now,
            updated_at: now,
        }
    }

    fn item(name: &str, quantity: i64, price: i64) -> NewDebtItem {
        NewDebtItem {
            item_name: name.to_string(),
            quantity,
            selling_price: Money::from_cents(price),
        }
    }

    #[test]
    fn test_sale_totals() {
        let t = SaleTotals::compute(3, Money::from_cents(250), Money::from_cents(400)).unwrap();
        assert_eq!(t.total_cost.cents(), 750);
        assert_eq!(t.revenue.cents(), 1200);
        assert_eq!(t.profit_loss.cents(), 450);
        assert_eq!(t.profit_loss, t.revenue - t.total_cost);
    }

    #[test]
    fn test_sale_totals_rejects_bad_input() {
        assert!(SaleTotals::compute(0, Money::zero(), Money::zero()).is_err());
        assert!(SaleTotals::compute(1, Money::from_cents(-1), Money::zero()).is_err());
        assert!(matches!(
            SaleTotals::compute(2, Money::zero(), Money::from_cents(i64::MAX)),
            Err(CoreError::Overflow { .. })
        ));
    }

    #[test]
    fn test_sale_within_stock() {
        let mut item = stock(10);
        item.apply_sale(10).unwrap();
        assert_eq!(item.quantity, 0);
        assert_eq!(item.total_sold, 14);
    }

    #[test]
    fn test_sale_exceeding_stock_leaves_item_unchanged() {
        let mut item = stock(3);
        let before = item.clone();

        let err = item.apply_sale(5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }
        ));
        assert_eq!(item, before);
    }

    #[test]
    fn test_reverse_sale_and_restock() {
        let mut item = stock(2);
        item.reverse_sale(3).unwrap();
        assert_eq!(item.quantity, 5);
        assert_eq!(item.total_sold, 1);

        item.reverse_sale(10).unwrap();
        assert_eq!(item.total_sold, 0);

        item.restock(5).unwrap();
        assert_eq!(item.quantity, 20);
        assert!(item.restock(0).is_err());
    }

    #[test]
    fn test_payment_example() {
        let mut d = debtor(1000);

        d.apply_payment(Money::from_cents(400)).unwrap();
        assert_eq!(d.total_paid_cents, 400);
        assert_eq!(d.current_balance_cents, 600);
        assert_eq!(d.status, DebtStatus::Pending);

        d.apply_payment(Money::from_cents(600)).unwrap();
        assert_eq!(d.total_paid_cents, 1000);
        assert_eq!(d.current_balance_cents, 0);
        assert_eq!(d.status, DebtStatus::Paid);
    }

    #[test]
    fn test_payments_preserve_balance_identity() {
        let amounts = [125, 1, 999, 300, 75, 2000];
        let mut d = debtor(3000);
        let mut paid = 0;

        for amount in amounts {
            d.apply_payment(Money::from_cents(amount)).unwrap();
            paid += amount;

            assert_eq!(d.total_paid_cents, paid);
            assert_eq!(d.current_balance_cents, d.grand_total_cents - paid);
            assert_eq!(d.status == DebtStatus::Paid, d.current_balance_cents <= 0);
        }

        // Overpaid: in credit, still "paid"
        assert_eq!(d.current_balance_cents, -500);
        assert_eq!(d.status, DebtStatus::Paid);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut d = debtor(1000);
        assert!(matches!(
            d.apply_payment(Money::zero()),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
        assert!(d.apply_payment(Money::from_cents(-10)).is_err());
        assert_eq!(d.total_paid_cents, 0);
    }

    #[test]
    fn test_new_charge_reopens_settled_debtor() {
        let mut d = debtor(500);
        d.apply_payment(Money::from_cents(500)).unwrap();
        assert_eq!(d.status, DebtStatus::Paid);

        d.add_charge(Money::from_cents(200)).unwrap();
        assert_eq!(d.grand_total_cents, 700);
        assert_eq!(d.current_balance_cents, 200);
        assert_eq!(d.status, DebtStatus::Pending);
    }

    #[test]
    fn test_open_debt() {
        let new = NewDebtor {
            customer_name: "Ada".to_string(),
            customer_phone: Some("08012345678".to_string()),
            customer_email: None,
            items: vec![item("Sugar", 2, 350), item("Milk", 1, 1200)],
            deposit: Some(Money::from_cents(500)),
        };

        let opening = open_debt(&new).unwrap();
        assert_eq!(
            opening.item_totals,
            vec![Money::from_cents(700), Money::from_cents(1200)]
        );
        assert_eq!(opening.grand_total.cents(), 1900);
        assert_eq!(opening.total_paid.cents(), 500);
        assert_eq!(opening.current_balance.cents(), 1400);
        assert_eq!(opening.status, DebtStatus::Pending);
    }

    #[test]
    fn test_open_debt_requires_items() {
        let new = NewDebtor {
            customer_name: "Ada".to_string(),
            customer_phone: None,
            customer_email: None,
            items: vec![],
            deposit: None,
        };
        assert!(matches!(open_debt(&new), Err(CoreError::EmptyDebt { .. })));
    }

    #[test]
    fn test_reconcile_detects_drift() {
        let now = Utc::now();
        let mut d = debtor(1000);
        d.apply_payment(Money::from_cents(400)).unwrap();

        let items = vec![DebtItem {
            id: "i1".into(),
            debtor_id: "d1".into(),
            item_name: "Sugar".into(),
            quantity: 2,
            selling_price_cents: 500,
            total_cents: 1000,
            created_at: now,
        }];
        let payment = |amount| DebtPayment {
            id: "p".into(),
            debtor_id: "d1".into(),
            amount_cents: amount,
            note: None,
            paid_at: now,
        };

        let ok = reconcile(&d, &items, &[payment(150), payment(250)]);
        assert!(ok.is_consistent());

        let drift = reconcile(&d, &items, &[payment(150)]);
        assert!(!drift.is_consistent());
        assert_eq!(drift.payment_drift.cents(), 250);
    }
}
