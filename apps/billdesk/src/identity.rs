//! # Identity
//!
//! Shop owner accounts, email verification, and the signed-in session.
//!
//! ## Account Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sign_up ──► UserRecord { verified: false, token: Some(t) }             │
//! │                  │                                                      │
//! │                  │  sign_in ──► Err(EmailNotVerified) ──► resend        │
//! │                  │                                         (new token)  │
//! │                  ▼                                                      │
//! │  confirm_email(t) ──► { verified: true, token: None }                   │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  sign_in ──► Session holds User ──► require_verified_user() ──► billing │
//! │                                                                         │
//! │  request_password_reset ──► { reset_token: Some(r) }                    │
//! │  reset_password(r, new) ──► { password_hash: new, reset_token: None }   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passwords are stored as argon2 PHC strings. Verification and reset
//! tokens are random UUIDs and single-use: redeeming clears the token.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use billdesk_core::validation::{validate_email, validate_password};
use billdesk_core::{User, ValidationError};
use billdesk_db::{StoreError, UserRecord, UserStore};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::with_timeout;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("An account already exists for {0}")]
    EmailTaken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists and the password matched, but the address has not
    /// been confirmed. Callers offer `resend_verification`.
    #[error("Email {email} is not verified yet")]
    EmailNotVerified { email: String },

    #[error("Token is invalid or already used")]
    InvalidToken,

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

// =============================================================================
// Provider
// =============================================================================

/// Sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
    pub shop_name: String,
    pub shop_address: String,
}

/// A pending email confirmation.
///
/// There is no mail transport; whoever runs the sign-up receives the token
/// and passes it to `confirm_email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub uid: String,
    pub email: String,
    pub token: String,
}

/// A pending password reset. Delivered like [`Verification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub uid: String,
    pub email: String,
    pub token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an unverified account and returns its verification token.
    async fn sign_up(&self, form: &SignUp) -> IdentityResult<Verification>;

    /// Checks credentials. Fails with `EmailNotVerified` for an unconfirmed
    /// account with a correct password.
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<User>;

    /// Marks the token's account verified and retires the token.
    async fn confirm_email(&self, token: &str) -> IdentityResult<User>;

    /// Issues a new token. `None` when the account is already verified.
    async fn resend_verification(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<Option<Verification>>;

    async fn is_email_verified(&self, uid: &str) -> IdentityResult<bool>;

    /// Issues a reset token for the account. `None` when no account uses
    /// the email. A newer request replaces an older token.
    async fn request_password_reset(&self, email: &str) -> IdentityResult<Option<PasswordReset>>;

    /// Replaces the password of the token's account and retires the token.
    async fn reset_password(&self, token: &str, new_password: &str) -> IdentityResult<User>;
}

// =============================================================================
// Local Identity
// =============================================================================

/// Identity provider backed by a `UserStore`.
pub struct LocalIdentity {
    users: Arc<dyn UserStore>,
    timeout: Duration,
}

impl LocalIdentity {
    pub fn new(users: Arc<dyn UserStore>, timeout: Duration) -> Self {
        LocalIdentity { users, timeout }
    }

    /// Looks up an account and checks its password.
    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<UserRecord> {
        let email = normalize_email(email);
        let record = with_timeout(
            "users.get_by_email",
            self.timeout,
            self.users.get_by_email(&email),
        )
        .await?;

        match record {
            Some(record) if verify_password(password, &record.password_hash) => Ok(record),
            Some(_) => {
                warn!(email = %email, "Sign-in with wrong password");
                Err(IdentityError::InvalidCredentials)
            }
            None => {
                debug!(email = %email, "Sign-in for unknown account");
                Err(IdentityError::InvalidCredentials)
            }
        }
    }

    async fn issue_token(&self, user: &User) -> IdentityResult<Verification> {
        let token = Uuid::new_v4().simple().to_string();
        with_timeout(
            "users.set_verification_token",
            self.timeout,
            self.users.set_verification_token(&user.uid, Some(&token)),
        )
        .await?;

        Ok(Verification {
            uid: user.uid.clone(),
            email: user.email.clone(),
            token,
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_up(&self, form: &SignUp) -> IdentityResult<Verification> {
        validate_email(&form.email)?;
        validate_password(&form.password)?;
        if form.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }

        let email = normalize_email(&form.email);
        let user = User {
            uid: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: form.name.trim().to_string(),
            is_email_verified: false,
            created_at: Utc::now(),
            shop_name: form.shop_name.trim().to_string(),
            shop_address: form.shop_address.trim().to_string(),
        };
        let token = Uuid::new_v4().simple().to_string();
        let record = UserRecord {
            user,
            password_hash: hash_password(&form.password)?,
            verification_token: Some(token.clone()),
            reset_token: None,
        };

        match with_timeout("users.save", self.timeout, self.users.save(&record)).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation { .. }) => {
                return Err(IdentityError::EmailTaken(email));
            }
            Err(e) => return Err(e.into()),
        }

        info!(uid = %record.user.uid, email = %email, "Account created");
        Ok(Verification {
            uid: record.user.uid,
            email,
            token,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<User> {
        let record = self.authenticate(email, password).await?;

        if !record.user.is_email_verified {
            return Err(IdentityError::EmailNotVerified {
                email: record.user.email,
            });
        }

        info!(uid = %record.user.uid, "Signed in");
        Ok(record.user)
    }

    async fn confirm_email(&self, token: &str) -> IdentityResult<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }

        let record = with_timeout(
            "users.get_by_verification_token",
            self.timeout,
            self.users.get_by_verification_token(token),
        )
        .await?
        .ok_or(IdentityError::InvalidToken)?;

        let uid = record.user.uid.as_str();
        with_timeout(
            "users.set_email_verified",
            self.timeout,
            self.users.set_email_verified(uid, true),
        )
        .await?;
        with_timeout(
            "users.set_verification_token",
            self.timeout,
            self.users.set_verification_token(uid, None),
        )
        .await?;

        info!(uid = %uid, "Email verified");
        let mut user = record.user;
        user.is_email_verified = true;
        Ok(user)
    }

    async fn resend_verification(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<Option<Verification>> {
        let record = self.authenticate(email, password).await?;
        if record.user.is_email_verified {
            return Ok(None);
        }

        let verification = self.issue_token(&record.user).await?;
        info!(uid = %verification.uid, "Verification token reissued");
        Ok(Some(verification))
    }

    async fn is_email_verified(&self, uid: &str) -> IdentityResult<bool> {
        let record = with_timeout("users.get_by_id", self.timeout, self.users.get_by_id(uid))
            .await?
            .ok_or(IdentityError::NotSignedIn)?;
        Ok(record.user.is_email_verified)
    }

    async fn request_password_reset(&self, email: &str) -> IdentityResult<Option<PasswordReset>> {
        validate_email(email)?;
        let email = normalize_email(email);

        let Some(record) = with_timeout(
            "users.get_by_email",
            self.timeout,
            self.users.get_by_email(&email),
        )
        .await?
        else {
            debug!(email = %email, "Password reset for unknown account");
            return Ok(None);
        };

        let token = Uuid::new_v4().simple().to_string();
        with_timeout(
            "users.set_reset_token",
            self.timeout,
            self.users.set_reset_token(&record.user.uid, Some(&token)),
        )
        .await?;

        info!(uid = %record.user.uid, "Password reset requested");
        Ok(Some(PasswordReset {
            uid: record.user.uid,
            email: record.user.email,
            token,
        }))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> IdentityResult<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }
        validate_password(new_password)?;

        let record = with_timeout(
            "users.get_by_reset_token",
            self.timeout,
            self.users.get_by_reset_token(token),
        )
        .await?
        .ok_or(IdentityError::InvalidToken)?;

        let uid = record.user.uid.as_str();
        let password_hash = hash_password(new_password)?;
        with_timeout(
            "users.set_password_hash",
            self.timeout,
            self.users.set_password_hash(uid, &password_hash),
        )
        .await?;
        with_timeout(
            "users.set_reset_token",
            self.timeout,
            self.users.set_reset_token(uid, None),
        )
        .await?;

        info!(uid = %uid, "Password reset");
        Ok(record.user)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> IdentityResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

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
// Session
// =============================================================================

/// The signed-in user for this process.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    current: RwLock<Option<User>>,
}

impl Session {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Session {
            provider,
            current: RwLock::new(None),
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<User> {
        let user = self.provider.sign_in(email, password).await?;
        *self.current.write().await = Some(user.clone());
        Ok(user)
    }

    pub async fn sign_out(&self) {
        if let Some(user) = self.current.write().await.take() {
            info!(uid = %user.uid, "Signed out");
        }
    }

    /// Re-reads the verification flag of the signed-in user.
    pub async fn refresh_verification(&self) -> IdentityResult<bool> {
        let uid = self
            .current_user()
            .await
            .map(|u| u.uid)
            .ok_or(IdentityError::NotSignedIn)?;

        let verified = self.provider.is_email_verified(&uid).await?;
        if let Some(user) = self.current.write().await.as_mut() {
            user.is_email_verified = verified;
        }
        Ok(verified)
    }

    /// The gate in front of every billing command.
    pub async fn require_verified_user(&self) -> IdentityResult<User> {
        let user = self.current_user().await.ok_or(IdentityError::NotSignedIn)?;
        if !user.is_email_verified {
            return Err(IdentityError::EmailNotVerified { email: user.email });
        }
        Ok(user)
    }
}
