//! # User Repository
//!
//! Shop owner accounts: profile, verification state and password hash.

use async_trait::async_trait;
use billdesk_core::{User, UserPatch};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{UserRecord, UserStore};

const USER_COLUMNS: &str = "uid, email, name, is_email_verified, created_at, \
                            shop_name, shop_address, password_hash, verification_token, \
                            reset_token";

/// Raw `users` row.
#[derive(Debug, FromRow)]
struct UserRow {
    uid: String,
    email: String,
    name: String,
    is_email_verified: bool,
    created_at: DateTime<Utc>,
    shop_name: String,
    shop_address: String,
    password_hash: String,
    verification_token: Option<String>,
    reset_token: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                uid: row.uid,
                email: row.email,
                name: row.name,
                is_email_verified: row.is_email_verified,
                created_at: row.created_at,
                shop_name: row.shop_name,
                shop_address: row.shop_address,
            },
            password_hash: row.password_hash,
            verification_token: row.verification_token,
            reset_token: row.reset_token,
        }
    }
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct SqliteUsers {
    pool: SqlitePool,
}

impl SqliteUsers {
    /// Creates a new SqliteUsers.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteUsers { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl UserStore for SqliteUsers {
    async fn save(&self, record: &UserRecord) -> StoreResult<()> {
        let user = &record.user;
        debug!(uid = %user.uid, "Saving user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (uid, email, name, is_email_verified, created_at,
                               shop_name, shop_address, password_hash, verification_token,
                               reset_token)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&user.uid)
        .bind(user.email.to_lowercase())
        .bind(&user.name)
        .bind(user.is_email_verified)
        .bind(user.created_at)
        .bind(&user.shop_name)
        .bind(&user.shop_address)
        .bind(&record.password_hash)
        .bind(&record.verification_token)
        .bind(&record.reset_token)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match StoreError::from(err) {
                StoreError::UniqueViolation { field, .. } if field.ends_with("email") => {
                    Err(StoreError::duplicate("email", &user.email))
                }
                other => Err(other),
            },
        }
    }

    async fn get_by_id(&self, uid: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_by("uid", uid).await
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_by("email", &email.trim().to_lowercase()).await
    }

    async fn get_by_verification_token(&self, token: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_by("verification_token", token).await
    }

    async fn set_email_verified(&self, uid: &str, verified: bool) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET is_email_verified = ?2 WHERE uid = ?1")
            .bind(uid)
            .bind(verified)
            .execute(&self.pool)
            .await?;

        debug!(uid = %uid, verified, "Updated email verification");
        Ok(result.rows_affected() > 0)
    }

    async fn set_verification_token(&self, uid: &str, token: Option<&str>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET verification_token = ?2 WHERE uid = ?1")
            .bind(uid)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_reset_token(&self, token: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_by("reset_token", token).await
    }

    async fn set_reset_token(&self, uid: &str, token: Option<&str>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET reset_token = ?2 WHERE uid = ?1")
            .bind(uid)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password_hash(&self, uid: &str, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE uid = ?1")
            .bind(uid)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        debug!(uid = %uid, "Replaced password hash");
        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(&self, uid: &str, patch: &UserPatch) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?2, name),
                shop_name = COALESCE(?3, shop_name),
                shop_address = COALESCE(?4, shop_address)
            WHERE uid = ?1
            "#,
        )
        .bind(uid)
        .bind(&patch.name)
        .bind(&patch.shop_name)
        .bind(&patch.shop_address)
        .execute(&self.pool)
        .await?;

        debug!(uid = %uid, rows = result.rows_affected(), "Updated profile");
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn users() -> SqliteUsers {
        Database::new(DbConfig::in_memory()).await.unwrap().users()
    }

    fn record(uid: &str, email: &str) -> UserRecord {
        UserRecord {
            user: User {
                uid: uid.to_string(),
                email: email.to_string(),
                name: "Asha".to_string(),
                is_email_verified: false,
                created_at: Utc::now(),
                shop_name: "Asha Medico".to_string(),
                shop_address: "MG Road".to_string(),
            },
            password_hash: "hash".to_string(),
            verification_token: Some(format!("token-{}", uid)),
            reset_token: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_lookup() {
        let users = users().await;
        users.save(&record("u1", "Asha@Example.com")).await.unwrap();

        let by_email = users.get_by_email("asha@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.user.uid, "u1");
        assert_eq!(by_email.user.shop_name, "Asha Medico");

        let by_token = users.get_by_verification_token("token-u1").await.unwrap().unwrap();
        assert_eq!(by_token.user.uid, "u1");

        assert!(users.get_by_id("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let users = users().await;
        users.save(&record("u1", "asha@example.com")).await.unwrap();
        let err = users.save(&record("u2", "asha@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_verification_and_profile_updates() {
        let users = users().await;
        users.save(&record("u1", "asha@example.com")).await.unwrap();

        assert!(users.set_email_verified("u1", true).await.unwrap());
        assert!(users.set_verification_token("u1", None).await.unwrap());
        assert!(!users.set_email_verified("ghost", true).await.unwrap());

        let patch = UserPatch {
            shop_address: Some("Station Road".to_string()),
            ..UserPatch::default()
        };
        assert!(users.update_profile("u1", &patch).await.unwrap());

        let stored = users.get_by_id("u1").await.unwrap().unwrap();
        assert!(stored.user.is_email_verified);
        assert!(stored.verification_token.is_none());
        assert_eq!(stored.user.shop_address, "Station Road");
        assert_eq!(stored.user.shop_name, "Asha Medico");
    }

    #[tokio::test]
    async fn test_reset_token_and_password_hash() {
        let users = users().await;
        users.save(&record("u1", "asha@example.com")).await.unwrap();

        assert!(users.set_reset_token("u1", Some("reset-1")).await.unwrap());
        let by_reset = users.get_by_reset_token("reset-1").await.unwrap().unwrap();
        assert_eq!(by_reset.user.uid, "u1");
        assert!(users.get_by_verification_token("reset-1").await.unwrap().is_none());

        assert!(users.set_password_hash("u1", "new-hash").await.unwrap());
        assert!(users.set_reset_token("u1", None).await.unwrap());
        assert!(!users.set_password_hash("ghost", "x").await.unwrap());

        let stored = users.get_by_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert!(stored.reset_token.is_none());
        assert!(users.get_by_reset_token("reset-1").await.unwrap().is_none());
    }
}
