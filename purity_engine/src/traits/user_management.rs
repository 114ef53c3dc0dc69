use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{IdentityClaims, NewUser, TokenPurpose, User};

#[derive(Debug, Clone, Error)]
pub enum UserStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("An account for {0} already exists")]
    EmailExists(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for UserStoreError {
    fn from(e: sqlx::Error) -> Self {
        UserStoreError::DatabaseError(e.to_string())
    }
}

/// Customer accounts and their single-use tokens.
///
/// Email addresses are compared case-insensitively. Callers are expected to pass lower-cased addresses, and the
/// backend folds case again on lookup.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new, unverified, account. Fails with [`UserStoreError::EmailExists`] when the address is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, UserStoreError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserStoreError>;

    /// Creates, or links, the account for an identity vouched for by an external provider. Such accounts are
    /// always marked as verified.
    async fn upsert_external_identity(&self, claims: &IdentityClaims) -> Result<User, UserStoreError>;

    async fn mark_email_verified(&self, user_id: i64) -> Result<(), UserStoreError>;

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), UserStoreError>;

    async fn insert_account_token(
        &self,
        user_id: i64,
        purpose: TokenPurpose,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError>;

    /// Marks the token as used and returns the id of the user it was issued to. Unknown, used and expired tokens all
    /// yield `None`. A token can be consumed exactly once.
    async fn consume_account_token(&self, purpose: TokenPurpose, token: &str) -> Result<Option<i64>, UserStoreError>;
}
