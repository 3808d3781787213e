//! # Settings Repository
//!
//! One row of preferences per user. A user who never saved settings reads
//! the defaults; the row is created on first save.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tally_core::{SettingsUpdate, UserSettings};

const SETTINGS_COLUMNS: &str =
    "user_id, theme, currency_code, currency_symbol, profit_margin_goal_bps, updated_at";

/// Repository for per-user settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets the user's settings, or the defaults if none were saved.
    pub async fn get(&self, user_id: &str) -> DbResult<UserSettings> {
        let sql = format!(
            "SELECT {} FROM user_settings WHERE user_id = ?1",
            SETTINGS_COLUMNS
        );
        let settings = sqlx::query_as::<_, UserSettings>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(settings.unwrap_or_else(|| UserSettings::defaults(user_id)))
    }

    /// Applies a partial update and saves the result.
    pub async fn upsert(&self, user_id: &str, update: &SettingsUpdate) -> DbResult<UserSettings> {
        update.validate()?;

        let current = self.get(user_id).await?;
        let updated = update.apply_to(&current);

        debug!(user_id = %user_id, "Saving settings");

        sqlx::query(
            r#"
            INSERT INTO user_settings (
                user_id, theme, currency_code, currency_symbol, profit_margin_goal_bps, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id) DO UPDATE SET
                theme = excluded.theme,
                currency_code = excluded.currency_code,
                currency_symbol = excluded.currency_symbol,
                profit_margin_goal_bps = excluded.profit_margin_goal_bps,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&updated.user_id)
        .bind(updated.theme)
        .bind(&updated.currency_code)
        .bind(&updated.currency_symbol)
        .bind(updated.profit_margin_goal_bps)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(updated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{other_user, setup};
    use tally_core::{Theme, DEFAULT_MARGIN_GOAL_BPS};

    #[tokio::test]
    async fn test_defaults_until_saved() {
        let (db, user) = setup().await;
        let settings = db.settings().get(&user).await.unwrap();

        assert_eq!(settings.theme, Theme::System);
        assert_eq!(settings.currency_code, "USD");
        assert_eq!(settings.profit_margin_goal_bps, DEFAULT_MARGIN_GOAL_BPS);
    }

    #[tokio::test]
    async fn test_partial_updates_accumulate() {
        let (db, user) = setup().await;
        let settings = db.settings();

        settings
            .upsert(
                &user,
                &SettingsUpdate {
                    theme: Some(Theme::Dark),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let saved = settings
            .upsert(
                &user,
                &SettingsUpdate {
                    currency_code: Some("ngn".to_string()),
                    currency_symbol: Some("₦".to_string()),
                    profit_margin_goal_bps: Some(3500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.theme, Theme::Dark);
        assert_eq!(saved.currency_code, "NGN");

        let loaded = settings.get(&user).await.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.format(tally_core::Money::from_cents(150_050)), "₦1500.50");
    }

    #[tokio::test]
    async fn test_invalid_goal_and_isolation() {
        let (db, user) = setup().await;
        let other = other_user(&db).await;
        let settings = db.settings();

        let result = settings
            .upsert(
                &user,
                &SettingsUpdate {
                    profit_margin_goal_bps: Some(12_000),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DbError::Domain(_))));

        settings
            .upsert(
                &user,
                &SettingsUpdate {
                    theme: Some(Theme::Light),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(settings.get(&other).await.unwrap().theme, Theme::System);
    }
}
