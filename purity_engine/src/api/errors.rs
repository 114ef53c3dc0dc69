use thiserror::Error;

use crate::{
    db_types::ValidationError,
    helpers::PasswordError,
    traits::{GatewayError, OrderStoreError, UserStoreError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Order store error: {0}")]
    Store(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("The payment gateway is not configured")]
    GatewayUnavailable,
    #[error("Missing fields")]
    MissingIdentifiers,
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("Order store error: {0}")]
    Store(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Missing {0}")]
    MissingFields(&'static str),
    #[error("Email already exists")]
    EmailExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Please verify your email first")]
    EmailNotVerified,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("User store error: {0}")]
    Store(UserStoreError),
    #[error("{0}")]
    Password(#[from] PasswordError),
}

impl From<UserStoreError> for AuthApiError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::EmailExists(_) => AuthApiError::EmailExists,
            e => AuthApiError::Store(e),
        }
    }
}
