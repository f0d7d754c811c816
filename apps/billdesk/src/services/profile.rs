//! # Profile Service
//!
//! Shop owner profile reads and edits. The shop details feed the receipt
//! header.

use std::sync::Arc;
use std::time::Duration;

use billdesk_core::{ShopDetails, User, UserPatch, ValidationError};
use billdesk_db::{StoreResult, UserStore};
use tracing::{info, warn};

use super::with_timeout;
use crate::error::AppResult;

pub struct ProfileService {
    users: Arc<dyn UserStore>,
    timeout: Duration,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserStore>, timeout: Duration) -> Self {
        ProfileService { users, timeout }
    }

    pub async fn get(&self, uid: &str) -> StoreResult<Option<User>> {
        let record = with_timeout("users.get_by_id", self.timeout, self.users.get_by_id(uid)).await?;
        Ok(record.map(|r| r.user))
    }

    /// Shop header for receipts. Empty details when the user is missing.
    pub async fn shop_details(&self, uid: &str) -> StoreResult<ShopDetails> {
        Ok(match self.get(uid).await? {
            Some(user) => user.shop_details(),
            None => {
                warn!(uid = %uid, "No profile for user, printing blank shop header");
                ShopDetails::default()
            }
        })
    }

    /// Applies a profile patch. Returns `false` when the user is missing.
    pub async fn update(&self, uid: &str, patch: &UserPatch) -> AppResult<bool> {
        if patch.is_empty() {
            return Err(ValidationError::NoUpdateFields.into());
        }
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }

        let updated = with_timeout(
            "users.update_profile",
            self.timeout,
            self.users.update_profile(uid, patch),
        )
        .await?;
        info!(uid = %uid, updated, "Profile update");
        Ok(updated)
    }

    pub async fn set_email_verified(&self, uid: &str, verified: bool) -> StoreResult<bool> {
        with_timeout(
            "users.set_email_verified",
            self.timeout,
            self.users.set_email_verified(uid, verified),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_db::{MemoryUsers, UserRecord};
    use chrono::Utc;

    use crate::error::ErrorCode;

    async fn service() -> ProfileService {
        let users = Arc::new(MemoryUsers::new());
        users
            .save(&UserRecord {
                user: User {
                    uid: "u1".to_string(),
                    email: "asha@shop.in".to_string(),
                    name: "Asha".to_string(),
                    is_email_verified: true,
                    created_at: Utc::now(),
                    shop_name: "Asha Stores".to_string(),
                    shop_address: "12 Market Road".to_string(),
                },
                password_hash: String::new(),
                verification_token: None,
                reset_token: None,
            })
            .await
            .unwrap();
        ProfileService::new(users, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_shop_details() {
        let service = service().await;
        let details = service.shop_details("u1").await.unwrap();
        assert_eq!(details.shop_name, "Asha Stores");
        assert_eq!(details.email, "asha@shop.in");

        assert_eq!(service.shop_details("missing").await.unwrap(), ShopDetails::default());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = service().await;
        let patch = UserPatch {
            shop_address: Some("14 Market Road".to_string()),
            ..UserPatch::default()
        };
        assert!(service.update("u1", &patch).await.unwrap());
        assert!(!service.update("missing", &patch).await.unwrap());

        let user = service.get("u1").await.unwrap().unwrap();
        assert_eq!(user.shop_address, "14 Market Road");
        assert_eq!(user.shop_name, "Asha Stores");

        let err = service.update("u1", &UserPatch::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_set_email_verified() {
        let service = service().await;
        assert!(service.set_email_verified("u1", false).await.unwrap());
        assert!(!service.get("u1").await.unwrap().unwrap().is_email_verified);
    }
}
