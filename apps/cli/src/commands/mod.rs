//! # Commands
//!
//! One module per bookkeeping domain. Each exposes a clap subcommand enum
//! and a `run` function that calls into `tally-db` / `tally-core` and
//! prints the result as JSON.
//!
//! ## Command Categories
//!
//! - [`user`] - Register, whoami
//! - [`stock`] - Inventory
//! - [`sale`] - Record and review sales
//! - [`debt`] - Customer credit and installment payments
//! - [`expense`] - Operating expenses
//! - [`settings`] - Theme, currency, margin goal
//! - [`analytics`] - Summary, monthly comparison, rankings
//! - [`export`] - CSV export
//! - [`remind`] - Render payment reminders

pub mod analytics;
pub mod debt;
pub mod expense;
pub mod export;
pub mod remind;
pub mod sale;
pub mod settings;
pub mod stock;
pub mod user;

use chrono::{NaiveDate, Utc};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::config::CliConfig;
use crate::error::ApiError;
use tally_core::analytics::{DateRange, RangePreset};
use tally_core::{Money, User};
use tally_db::{Database, DbConfig};

/// What every command needs: the open database and the configuration.
pub struct Context {
    pub db: Database,
    pub config: CliConfig,
}

impl Context {
    /// Opens (and migrates) the configured database.
    pub async fn open(config: CliConfig) -> Result<Self, ApiError> {
        debug!(path = %config.db_path.display(), "Opening database");

        let db = Database::new(
            DbConfig::new(&config.db_path).max_connections(config.max_connections),
        )
        .await?;

        Ok(Context { db, config })
    }

    /// Authenticates the configured user.
    pub async fn user(&self) -> Result<User, ApiError> {
        let (email, password) = self.config.credentials()?;
        let user = self.db.users().authenticate(email, password).await?;
        debug!(user_id = %user.id, "Authenticated");
        Ok(user)
    }

    /// Today's date, in UTC like every stored timestamp.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ApiError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// clap value parser for decimal money arguments (`12.50`).
pub fn parse_money(input: &str) -> Result<Money, String> {
    Money::parse_decimal(input, "amount").map_err(|e| e.to_string())
}

/// Date range selection shared by listing and analytics commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// this-month, last-month, ytd or all
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub range: Option<RangePreset>,

    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    /// Resolves to a concrete range; nothing given means all time.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, ApiError> {
        match self.range {
            Some(preset) => Ok(preset.resolve(today)),
            None => Ok(DateRange::between(self.from, self.to)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("12.50").unwrap(), Money::from_cents(1250));
        assert!(parse_money("twelve").is_err());
    }

    #[test]
    fn test_range_args() {
        let today = date(2024, 3, 15);

        let preset = RangeArgs {
            range: Some(RangePreset::LastMonth),
            ..Default::default()
        };
        let range = preset.resolve(today).unwrap();
        assert_eq!(range.from, Some(date(2024, 2, 1)));
        assert_eq!(range.to, Some(date(2024, 2, 29)));

        assert_eq!(RangeArgs::default().resolve(today).unwrap(), DateRange::all_time());

        let backwards = RangeArgs {
            from: Some(date(2024, 3, 2)),
            to: Some(date(2024, 3, 1)),
            ..Default::default()
        };
        assert!(backwards.resolve(today).is_err());
    }
}
