use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::*;
use purity_engine::{
    db_types::ValidationError,
    traits::{GatewayError, OrderStoreError, UserStoreError},
    AuthApiError,
    OrderFlowError,
    PaymentFlowError,
};
use serde_json::json;
use thiserror::Error;

use crate::integrations::google::IdentityError;

/// The body that every 5xx error returns. Details are logged, never sent.
const GENERIC_ERROR: &str = "Server error";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Please verify your email first")]
    EmailNotVerified,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("Razorpay not configured")]
    GatewayUnavailable,
    #[error("Razorpay order create failed")]
    GatewayError(GatewayError),
    #[error("Google sign-in is not configured")]
    IdentityProviderUnavailable,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::IdentityRejected(_) => StatusCode::UNAUTHORIZED,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::EmailNotVerified => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::IdentityProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            Self::GatewayError(e) => json!({
                "ok": false,
                "error": self.to_string(),
                "code": e.code,
                "status": e.status,
                "desc": e.description,
            }),
            _ if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE => {
                json!({ "ok": false, "error": GENERIC_ERROR })
            },
            _ => json!({ "ok": false, "error": self.to_string() }),
        };
        HttpResponse::build(status).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    MissingToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    ValidationError(String),
    #[error("Invalid token")]
    PoorlyFormattedToken(String),
    #[error("Invalid Google token")]
    IdentityRejected(String),
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        Self::InvalidRequestBody(e.to_string())
    }
}

impl From<OrderStoreError> for ServerError {
    fn from(e: OrderStoreError) -> Self {
        error!("💻️ Order store error. {e}");
        Self::BackendError(e.to_string())
    }
}

impl From<UserStoreError> for ServerError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::EmailExists(_) => Self::Conflict("Email already exists".to_string()),
            e => {
                error!("💻️ User store error. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(e) => e.into(),
            OrderFlowError::Store(e) => e.into(),
        }
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::GatewayUnavailable => Self::GatewayUnavailable,
            PaymentFlowError::MissingIdentifiers => Self::InvalidRequestBody(e.to_string()),
            PaymentFlowError::Validation(e) => e.into(),
            PaymentFlowError::Gateway(e) => Self::GatewayError(e),
            PaymentFlowError::Store(e) => e.into(),
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::MissingFields(_) => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::InvalidToken => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::EmailExists => Self::Conflict(e.to_string()),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::EmailNotVerified => Self::EmailNotVerified,
            AuthApiError::Store(e) => e.into(),
            AuthApiError::Password(e) => {
                error!("💻️🔐️ Password hashing failed. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<IdentityError> for ServerError {
    fn from(e: IdentityError) -> Self {
        warn!("💻️🔐️ Google sign-in was rejected. {e}");
        Self::AuthenticationError(AuthError::IdentityRejected(e.to_string()))
    }
}
