//! Verifies the ID tokens that Google sign-in hands to the browser.
//!
//! The token is passed to Google's `tokeninfo` endpoint, which checks the signature and expiry. We then check that
//! the token was minted for our client id by Google itself, and that it carries an email address.
use std::time::Duration;

use log::*;
use purity_engine::db_types::IdentityClaims;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::errors::ServerError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Could not reach the identity provider. {0}")]
    Unreachable(String),
    #[error("The identity provider rejected the token. {0}")]
    Rejected(String),
    #[error("The token was issued for another audience")]
    WrongAudience,
    #[error("The token was not issued by Google ({0})")]
    WrongIssuer(String),
    #[error("The token does not carry an email address")]
    MissingEmail,
}

/// Anything that can turn an identity token into verified claims.
#[allow(async_fn_in_trait)]
pub trait IdentityVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<IdentityClaims, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    iss: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Clone)]
pub struct GoogleVerifier {
    client_id: String,
    endpoint: String,
    client: Client,
}

impl GoogleVerifier {
    pub fn new<S: Into<String>>(client_id: S) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the Google client. {e}")))?;
        Ok(Self { client_id: client_id.into(), endpoint: TOKENINFO_URL.to_string(), client })
    }

    fn check(&self, info: TokenInfo) -> Result<IdentityClaims, IdentityError> {
        if info.aud != self.client_id {
            return Err(IdentityError::WrongAudience);
        }
        if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
            return Err(IdentityError::WrongIssuer(info.iss));
        }
        let email = info.email.filter(|e| !e.trim().is_empty()).ok_or(IdentityError::MissingEmail)?;
        Ok(IdentityClaims { email, name: info.name.unwrap_or_default(), subject: info.sub })
    }
}

impl IdentityVerifier for GoogleVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<IdentityClaims, IdentityError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(format!("{status}: {message}")));
        }
        let info = response.json::<TokenInfo>().await.map_err(|e| IdentityError::Rejected(e.to_string()))?;
        let claims = self.check(info)?;
        debug!("🔐️ Google vouches for {}", claims.email);
        Ok(claims)
    }
}
