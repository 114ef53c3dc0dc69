//! Session tokens.
//!
//! Customers receive an HS256-signed JWT after logging in. Protected routes take a [`JwtClaims`] argument, which
//! reads the token from the `Authorization: Bearer ...` header and rejects the request with a 401 if the token is
//! missing, malformed, forged or expired.
use std::time::Duration;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::*;
use purity_engine::db_types::{User, UserProfile};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub uid: i64,
    pub email: String,
    pub name: String,
}

impl From<&User> for JwtClaims {
    fn from(user: &User) -> Self {
        Self { uid: user.id, email: user.email.clone(), name: user.name.clone() }
    }
}

impl From<UserProfile> for JwtClaims {
    fn from(profile: UserProfile) -> Self {
        Self { uid: profile.id, email: profile.email, name: profile.name }
    }
}

pub struct TokenIssuer {
    key: Hs256Key,
    duration: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, duration: config.jwt_expiry }
    }

    /// Issue a new access token for the given user.
    /// This method does not check that the user is allowed to log in. That must be done prior to calling
    /// `issue_token`.
    pub fn issue_token(&self, claims: JwtClaims) -> Result<String, AuthError> {
        let duration = chrono::Duration::from_std(self.duration)
            .map_err(|e| AuthError::CouldNotIssueToken(format!("Invalid token lifetime. {e}")))?;
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), duration);
        let token = Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token.claims().validate_expiration(&TimeOptions::default()).map_err(|e| {
            trace!("🔐️ Rejected an expired access token. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(token.claims().custom.clone())
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req.app_data::<web::Data<TokenIssuer>>().ok_or_else(|| {
        error!("🔐️ No token issuer has been registered with the app. Protected routes cannot work.");
        ServerError::Unspecified("Token issuer is not configured".to_string())
    })?;
    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate(token).map_err(|e| {
        debug!("🔐️ Access token rejected for {}. {e:?}", req.path());
        e
    })?;
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}
