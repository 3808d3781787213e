//! # CLI Configuration
//!
//! Loaded from environment variables with fallback to defaults. Command
//! line flags override whatever the environment says.
//!
//! ## Environment Variables
//! | Variable                    | Default                        |
//! |-----------------------------|--------------------------------|
//! | `TALLY_DB_PATH`             | `<data dir>/tally/tally.db`    |
//! | `TALLY_USER`                | none                           |
//! | `TALLY_PASSWORD`            | none                           |
//! | `TALLY_MAX_CONNECTIONS`     | 5                              |
//! | `TALLY_LOW_STOCK_THRESHOLD` | 5                              |
//! | `TALLY_BUSINESS_NAME`       | "Our store"                    |

use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

/// Resolved configuration for one `tally` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Email of the account to act as
    pub user: Option<String>,

    /// Password for `user`
    pub password: Option<String>,

    /// Pool size
    pub max_connections: u32,

    /// `stock low` lists items at or below this quantity
    pub low_stock_threshold: i64,

    /// Shown in payment reminders
    pub business_name: String,
}

/// Command line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl CliConfig {
    /// Loads configuration from the process environment.
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    /// Loads configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F, overrides: Overrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = match overrides.db_path.or_else(|| var("TALLY_DB_PATH").map(PathBuf::from)) {
            Some(path) => path,
            None => default_db_path()?,
        };

        let max_connections: u32 = parse_or(var("TALLY_MAX_CONNECTIONS"), "TALLY_MAX_CONNECTIONS", 5)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_MAX_CONNECTIONS".to_string()));
        }

        let low_stock_threshold: i64 =
            parse_or(var("TALLY_LOW_STOCK_THRESHOLD"), "TALLY_LOW_STOCK_THRESHOLD", 5)?;
        if low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue(
                "TALLY_LOW_STOCK_THRESHOLD".to_string(),
            ));
        }

        Ok(CliConfig {
            db_path,
            user: overrides.user.or_else(|| var("TALLY_USER")),
            password: overrides.password.or_else(|| lookup("TALLY_PASSWORD")),
            max_connections,
            low_stock_threshold,
            business_name: var("TALLY_BUSINESS_NAME")
                .map(|name| name.trim().to_string())
                .unwrap_or_else(|| "Our store".to_string()),
        })
    }

    /// The account email and password, or an error naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired("--user or TALLY_USER".to_string()))?;
        let password = self.password.as_deref().ok_or_else(|| {
            ConfigError::MissingRequired("--password or TALLY_PASSWORD".to_string())
        })?;
        Ok((user, password))
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Platform data directory.
///
/// - **Linux**: `~/.local/share/tally/tally.db`
/// - **macOS**: `~/Library/Application Support/com.tally.tally/tally.db`
/// - **Windows**: `%APPDATA%\tally\tally\data\tally.db`
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "tally", "tally").ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().join("tally.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Could not determine a data directory; set TALLY_DB_PATH")]
    NoDataDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::from_lookup(
            lookup(&[("TALLY_DB_PATH", "/tmp/t.db")]),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.business_name, "Our store");
        assert!(config.user.is_none());
    }

    #[test]
    fn test_flags_override_environment() {
        let config = CliConfig::from_lookup(
            lookup(&[
                ("TALLY_DB_PATH", "/tmp/env.db"),
                ("TALLY_USER", "env@example.com"),
                ("TALLY_PASSWORD", "from env"),
                ("TALLY_BUSINESS_NAME", "  Mama Put  "),
            ]),
            Overrides {
                db_path: Some(PathBuf::from("/tmp/flag.db")),
                user: Some("flag@example.com".to_string()),
                password: None,
            },
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/flag.db"));
        assert_eq!(
            config.credentials().unwrap(),
            ("flag@example.com", "from env")
        );
        assert_eq!(config.business_name, "Mama Put");
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        for (key, value) in [
            ("TALLY_MAX_CONNECTIONS", "many"),
            ("TALLY_MAX_CONNECTIONS", "0"),
            ("TALLY_LOW_STOCK_THRESHOLD", "-1"),
        ] {
            let err = CliConfig::from_lookup(
                lookup(&[("TALLY_DB_PATH", "/tmp/t.db"), (key, value)]),
                Overrides::default(),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == key));
        }
    }

    #[test]
    fn test_missing_credentials() {
        let config = CliConfig::from_lookup(
            lookup(&[("TALLY_DB_PATH", "/tmp/t.db"), ("TALLY_USER", "a@example.com")]),
            Overrides::default(),
        )
        .unwrap();
        assert!(matches!(
            config.credentials(),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
