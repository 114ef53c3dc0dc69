use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    api::errors::AuthApiError,
    db_types::{IdentityClaims, NewUser, TokenPurpose, User},
    helpers::{hash_password, new_account_token, verify_password, PasswordError},
    traits::UserManagement,
};

/// How long an email verification link stays valid, in seconds.
pub const VERIFY_TOKEN_LIFETIME: i64 = 24 * 60 * 60;
/// How long a password reset link stays valid, in seconds.
pub const RESET_TOKEN_LIFETIME: i64 = 30 * 60;

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone: String,
    pub city: String,
    pub address: String,
}

/// `AuthApi` manages customer accounts: registration, password and external-identity logins, email verification
/// and password resets.
///
/// Issuing session tokens is left to the caller.
pub struct AuthApi<B> {
    db: B,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Creates an unverified account and returns it, with the email verification token.
    pub async fn register(&self, registration: Registration) -> Result<(User, String), AuthApiError> {
        let email = normalize_email(&registration.email);
        if email.is_empty() || registration.password.is_empty() {
            return Err(AuthApiError::MissingFields("email/password"));
        }
        let password_hash = hash_in_background(registration.password).await?;
        let new_user = NewUser {
            email,
            name: registration.name.trim().to_string(),
            password_hash: Some(password_hash),
            phone: registration.phone,
            city: registration.city,
            address: registration.address,
        };
        let user = self.db.create_user(new_user).await?;
        let token = self.issue_token(user.id, TokenPurpose::VerifyEmail, VERIFY_TOKEN_LIFETIME).await?;
        info!("🔐️ User #{} registered. Awaiting email verification.", user.id);
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthApiError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthApiError::MissingFields("email/password"));
        }
        let user = self.db.fetch_user_by_email(&email).await?.ok_or(AuthApiError::InvalidCredentials)?;
        let hash = user.password_hash.clone().ok_or(AuthApiError::InvalidCredentials)?;
        if !verify_in_background(password.to_string(), hash).await? {
            debug!("🔐️ Wrong password for user #{}", user.id);
            return Err(AuthApiError::InvalidCredentials);
        }
        if !user.email_verified {
            return Err(AuthApiError::EmailNotVerified);
        }
        debug!("🔐️ User #{} logged in", user.id);
        Ok(user)
    }

    /// Logs in with an identity that an external provider has already vouched for. The account is created on first
    /// use, and merged by email with an existing account otherwise.
    pub async fn login_with_identity(&self, claims: IdentityClaims) -> Result<User, AuthApiError> {
        let claims = IdentityClaims { email: normalize_email(&claims.email), ..claims };
        if claims.email.is_empty() {
            return Err(AuthApiError::MissingFields("email"));
        }
        let user = self.db.upsert_external_identity(&claims).await?;
        debug!("🔐️ User #{} logged in with an external identity", user.id);
        Ok(user)
    }

    /// Issues a reset token for accounts that have a password. Returns `None` for unknown addresses and for accounts
    /// that only sign in externally, so callers can respond identically in every case.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthApiError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthApiError::MissingFields("email"));
        }
        let user = match self.db.fetch_user_by_email(&email).await? {
            Some(user) if user.password_hash.is_some() => user,
            _ => {
                debug!("🔐️ Password reset requested for an address without a password account");
                return Ok(None);
            },
        };
        let token = self.issue_token(user.id, TokenPurpose::ResetPassword, RESET_TOKEN_LIFETIME).await?;
        info!("🔐️ Password reset token issued for user #{}", user.id);
        Ok(Some(token))
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthApiError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(AuthApiError::MissingFields("token/password"));
        }
        let user_id = self
            .db
            .consume_account_token(TokenPurpose::ResetPassword, token)
            .await?
            .ok_or(AuthApiError::InvalidToken)?;
        let hash = hash_in_background(new_password.to_string()).await?;
        self.db.update_password_hash(user_id, &hash).await?;
        info!("🔐️ Password changed for user #{user_id}");
        Ok(())
    }

    /// Consumes a verification token and marks the account as verified.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthApiError> {
        if token.is_empty() {
            return Err(AuthApiError::MissingFields("token"));
        }
        let user_id = self
            .db
            .consume_account_token(TokenPurpose::VerifyEmail, token)
            .await?
            .ok_or(AuthApiError::InvalidToken)?;
        self.db.mark_email_verified(user_id).await?;
        let user = self.db.fetch_user_by_id(user_id).await?.ok_or(AuthApiError::InvalidToken)?;
        info!("🔐️ User #{user_id} verified their email address");
        Ok(user)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, AuthApiError> {
        Ok(self.db.fetch_user_by_id(id).await?)
    }

    async fn issue_token(&self, user_id: i64, purpose: TokenPurpose, lifetime: i64) -> Result<String, AuthApiError> {
        let token = new_account_token();
        let expires_at = Utc::now() + Duration::seconds(lifetime);
        self.db.insert_account_token(user_id, purpose, &token, expires_at).await?;
        Ok(token)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_in_background(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::from(e.to_string()))?
}

async fn verify_in_background(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::from(e.to_string()))
}
