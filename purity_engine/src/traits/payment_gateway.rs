use std::collections::BTreeMap;

use purity_common::{Paise, Secret, INR_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::ValidationError;

/// A failed remote call, carrying whatever the gateway told us about it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Gateway error {code} (status {status:?}): {description}")]
pub struct GatewayError {
    pub code: String,
    pub description: String,
    pub status: Option<u16>,
}

impl GatewayError {
    pub fn new<C: Into<String>, D: Into<String>>(code: C, description: D, status: Option<u16>) -> Self {
        Self { code: code.into(), description: description.into(), status }
    }
}

#[derive(Clone)]
pub struct GatewayCredentials {
    pub key_id: String,
    pub key_secret: Secret<String>,
}

impl GatewayCredentials {
    pub fn new<K: Into<String>, S: Into<String>>(key_id: K, key_secret: S) -> Self {
        Self { key_id: key_id.into(), key_secret: Secret::new(key_secret.into()) }
    }
}

/// A validated request to open a remote payment order.
///
/// The only way to build one is [`RemoteOrderRequest::new`], which enforces the minimum amount and the currency, so
/// an invalid request can never reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteOrderRequest {
    amount: Paise,
    currency: String,
    receipt: String,
    notes: BTreeMap<String, String>,
}

impl RemoteOrderRequest {
    pub fn new(
        amount: i64,
        currency: &str,
        receipt: String,
        notes: BTreeMap<String, String>,
        min_amount: i64,
    ) -> Result<Self, ValidationError> {
        if amount < min_amount || amount <= 0 {
            return Err(ValidationError::InvalidAmount(min_amount));
        }
        if currency != INR_CURRENCY_CODE {
            return Err(ValidationError::InvalidCurrency(currency.to_string()));
        }
        Ok(Self { amount: Paise::from(amount), currency: currency.to_string(), receipt, notes })
    }

    pub fn amount(&self) -> Paise {
        self.amount
    }

    pub fn currency(&self) -> &str {
        self.currency.as_str()
    }

    pub fn receipt(&self) -> &str {
        self.receipt.as_str()
    }

    pub fn notes(&self) -> &BTreeMap<String, String> {
        &self.notes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub amount: Paise,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A payment gateway that opens remote orders and holds the secret its payment signatures are keyed with.
///
/// Implementations are expected to enforce their own request timeout. Failed calls are not retried.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    fn credentials(&self) -> &GatewayCredentials;

    async fn create_remote_order(&self, request: RemoteOrderRequest) -> Result<RemoteOrder, GatewayError>;
}
