//! # tally-core: Pure Bookkeeping Logic for Tally
//!
//! This crate is the **heart** of Tally. Every derived number the
//! application shows (sale profit, stock on hand, debtor balance, profit
//! margin) is computed here by pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    `tally` CLI (apps/cli)                       │   │
//! │  │    stock, sale, debt, expense, settings, analytics, export      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌─────────────┐ ┌───────────┐ ┌────────────┐   │   │
//! │  │   │   money   │ │ bookkeeping │ │ analytics │ │ validation │   │   │
//! │  │   └───────────┘ └─────────────┘ └───────────┘ └────────────┘   │   │
//! │  │   ┌───────────┐ ┌─────────────┐                                 │   │
//! │  │   │  export   │ │  reminder   │   NO DATABASE • NO NETWORK      │   │
//! │  │   └───────────┘ └─────────────┘                                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │         SQLite, migrations, atomic bookkeeping writes           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (StockItem, Sale, Debtor, Expense, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`bookkeeping`] - Sale totals, stock deduction, debtor balances
//! - [`analytics`] - Summary, monthly comparison, top customers/products
//! - [`export`] - CSV serialization and parsing
//! - [`reminder`] - Email and WhatsApp payment reminders
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::bookkeeping::SaleTotals;
//! use tally_core::money::Money;
//!
//! let totals = SaleTotals::compute(3, Money::from_cents(250), Money::from_cents(400)).unwrap();
//! assert_eq!(totals.total_cost.cents(), 750);
//! assert_eq!(totals.revenue.cents(), 1200);
//! assert_eq!(totals.profit_loss.cents(), 450);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod bookkeeping;
pub mod error;
pub mod export;
pub mod money;
pub mod reminder;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted on a single sale, stock adjustment or debt item.
///
/// ## Business Reason
/// Catches typos like 10000 instead of 100 before they corrupt stock.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Default profit-margin goal for new users: 20%.
pub const DEFAULT_MARGIN_GOAL_BPS: i64 = 2000;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;
