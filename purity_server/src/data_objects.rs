//! Request and response bodies of the HTTP API.
//!
//! Request bodies are deliberately lenient. The storefront's pages post numbers as strings and vice versa, so
//! numeric fields accept both, and blank values read as missing. Conversion into engine types happens here, and
//! the engine takes care of validation.
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use purity_common::{Rupees, INR_CURRENCY_CODE};
use purity_engine::{
    db_types::{DeliveryDetails, PaymentMode, UserProfile},
    order_objects::{GatewayOrderRequest, OrderDetails, PaymentCallback},
    PaymentFlowError,
    Registration,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::ServerError,
    helpers::{value_as_integer, value_as_strict_integer, value_as_text},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonResponse {
    pub fn success() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { ok: false, error: Some(message.to_string()) }
    }
}

//--------------------------------------------   Orders   ------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryParams {
    pub name: Option<Value>,
    pub phone: Option<Value>,
    pub address: Option<Value>,
    pub city: Option<Value>,
    pub pincode: Option<Value>,
}

impl DeliveryParams {
    pub fn to_delivery_details(&self) -> DeliveryDetails {
        DeliveryDetails {
            name: value_as_text(&self.name),
            phone: value_as_text(&self.phone),
            address: value_as_text(&self.address),
            city: value_as_text(&self.city),
            pincode: value_as_text(&self.pincode),
        }
    }
}

/// The body of `POST /api/order`. Any `status` the client sends is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrderParams {
    pub model: Option<Value>,
    pub variant: Option<Value>,
    pub price: Option<Value>,
    pub qty: Option<Value>,
    pub total: Option<Value>,
    pub payment_mode: Option<String>,
    #[serde(flatten)]
    pub delivery: DeliveryParams,
}

impl NewOrderParams {
    /// Unreadable numbers become zero, which fails validation as a missing field.
    pub fn into_order_details(self) -> Result<(OrderDetails, PaymentMode), ServerError> {
        let mode = match self.payment_mode.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => PaymentMode::Cod,
            Some(s) => match PaymentMode::from_str(s) {
                Ok(mode) if !mode.is_gateway() => mode,
                _ => return Err(ServerError::InvalidRequestBody(format!("Invalid payment mode: {s}"))),
            },
        };
        let details = OrderDetails {
            model: value_as_text(&self.model),
            variant: value_as_text(&self.variant),
            unit_price: Rupees::from(value_as_integer(&self.price).unwrap_or_default()),
            qty: value_as_integer(&self.qty).unwrap_or_default(),
            total: Rupees::from(value_as_integer(&self.total).unwrap_or_default()),
            delivery: self.delivery.to_delivery_details(),
        };
        Ok((details, mode))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderResponse {
    pub ok: bool,
    pub id: i64,
    pub order_no: String,
}

/// The body of `POST /api/create-order`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderParams {
    /// In paise. Must be a JSON integer.
    pub amount: Option<Value>,
    pub currency: Option<String>,
    pub product_id: Option<String>,
    pub notes: Option<BTreeMap<String, Value>>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub price: Option<Value>,
    pub qty: Option<Value>,
    pub total: Option<Value>,
    #[serde(flatten)]
    pub delivery: DeliveryParams,
}

impl CreateOrderParams {
    pub fn into_gateway_order_request(self) -> GatewayOrderRequest {
        let notes = self
            .notes
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    v => v.to_string(),
                };
                (k, v)
            })
            .collect();
        let product_id =
            self.product_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).unwrap_or_else(|| "tp".to_string());
        GatewayOrderRequest {
            // A non-integer amount is as good as no amount. It fails the minimum-amount check.
            amount: value_as_strict_integer(&self.amount).unwrap_or_default(),
            currency: self.currency.unwrap_or_else(|| INR_CURRENCY_CODE.to_string()),
            product_id,
            notes,
            model: self.model,
            variant: self.variant,
            unit_price: value_as_integer(&self.price).map(Rupees::from),
            qty: value_as_integer(&self.qty),
            total: value_as_integer(&self.total).map(Rupees::from),
            delivery: self.delivery.to_delivery_details(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse<T> {
    pub ok: bool,
    pub orders: Vec<T>,
}

//--------------------------------------------   Payments   ----------------------------------------------------------

/// The three values the gateway's checkout hands back, named the way the gateway names them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentParams {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

impl PaymentParams {
    /// Values present in `overrides` win.
    pub fn merge(self, overrides: PaymentParams) -> Self {
        let pick = |base: Option<String>, over: Option<String>| over.filter(|s| !s.trim().is_empty()).or(base);
        Self {
            razorpay_order_id: pick(self.razorpay_order_id, overrides.razorpay_order_id),
            razorpay_payment_id: pick(self.razorpay_payment_id, overrides.razorpay_payment_id),
            razorpay_signature: pick(self.razorpay_signature, overrides.razorpay_signature),
        }
    }

    pub fn into_callback(self) -> Result<PaymentCallback, PaymentFlowError> {
        PaymentCallback::from_parts(self.razorpay_order_id, self.razorpay_payment_id, self.razorpay_signature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub ok: bool,
    pub redirect: Option<String>,
}

//--------------------------------------------   Accounts   ----------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterParams {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<Value>,
    pub city: Option<String>,
    pub address: Option<String>,
}

impl From<RegisterParams> for Registration {
    fn from(p: RegisterParams) -> Self {
        Registration {
            email: p.email.unwrap_or_default(),
            name: p.name.unwrap_or_default(),
            password: p.password.unwrap_or_default(),
            phone: value_as_text(&p.phone),
            city: p.city.unwrap_or_default(),
            address: p.address.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginParams {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleLoginParams {
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordParams {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordParams {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub ok: bool,
    pub verify_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub google_client_id: Option<String>,
    pub has_razorpay: bool,
}
