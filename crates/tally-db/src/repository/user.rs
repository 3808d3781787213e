//! # User Repository
//!
//! Local accounts. Passwords are stored only as argon2 PHC strings.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use tally_core::validation;
use tally_core::{User, ValidationError};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

const USER_COLUMNS: &str = "id, email, password_hash, created_at";

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account.
    ///
    /// The email is trimmed and lowercased; uniqueness ignores case.
    pub async fn register(&self, email: &str, password: &str) -> DbResult<User> {
        validation::validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::InvalidFormat {
                field: "password".to_string(),
                reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
            }
            .into());
        }

        let user = User {
            id: generate_id(),
            email: email.trim().to_lowercase(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate("email", &user.email))?;

        info!(id = %user.id, "Registered user");
        Ok(user)
    }

    /// Checks an email/password pair and returns the account.
    ///
    /// Unknown email and wrong password both give `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<User> {
        let user = self
            .get_by_email(email)
            .await?
            .ok_or(DbError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            debug!(id = %user.id, "Password mismatch");
            return Err(DbError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Looks up an account by email, ignoring case.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets an account by ID.
    pub async fn get(&self, id: &str) -> DbResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }
}

/// Hashes a password into a PHC string.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let user = users
            .register("  Ada@Example.com ", "correct horse")
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.password_hash.starts_with("$argon2"));

        let again = users
            .authenticate("ADA@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(users.get(&user.id).await.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();
        users.register("ada@example.com", "correct horse").await.unwrap();

        assert!(matches!(
            users.authenticate("ada@example.com", "wrong horse").await,
            Err(DbError::InvalidCredentials)
        ));
        assert!(matches!(
            users.authenticate("bob@example.com", "correct horse").await,
            Err(DbError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();
        users.register("ada@example.com", "correct horse").await.unwrap();

        let err = users
            .register("ADA@example.com", "another horse")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        assert!(matches!(
            users.register("not-an-email", "correct horse").await,
            Err(DbError::Domain(_))
        ));
        assert!(matches!(
            users.register("ada@example.com", "short").await,
            Err(DbError::Domain(_))
        ));
    }
}
