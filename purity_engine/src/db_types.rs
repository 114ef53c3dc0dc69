use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use purity_common::{Rupees, INR_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// Lifecycle state of an order.
///
/// ```text
/// created --(verified callback)--> paid
/// created --(failed callback)----> failed
/// created | cod --(owner cancels)--> cancelled
/// ```
/// `paid`, `failed` and `cancelled` never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// A gateway order has been opened and is awaiting a payment callback.
    Created,
    /// Cash on delivery.
    Cod,
    /// UPI intent payment, settled outside the gateway.
    Upi,
    /// The gateway callback carried a valid signature.
    Paid,
    /// The gateway callback carried an invalid signature.
    Failed,
    /// The owner cancelled the order.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Created | Self::Cod)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "created"),
            OrderStatusType::Cod => write!(f, "cod"),
            OrderStatusType::Upi => write!(f, "upi"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Failed => write!(f, "failed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "cod" => Ok(Self::Cod),
            "upi" => Ok(Self::Upi),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMode       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Cod,
    Upi,
    Razorpay,
}

impl PaymentMode {
    /// The status a freshly inserted order starts in.
    pub fn initial_status(&self) -> OrderStatusType {
        match self {
            PaymentMode::Cod => OrderStatusType::Cod,
            PaymentMode::Upi => OrderStatusType::Upi,
            PaymentMode::Razorpay => OrderStatusType::Created,
        }
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Razorpay)
    }
}

impl Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Cod => write!(f, "cod"),
            PaymentMode::Upi => write!(f, "upi"),
            PaymentMode::Razorpay => write!(f, "razorpay"),
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "upi" => Ok(Self::Upi),
            "razorpay" => Ok(Self::Razorpay),
            s => Err(ConversionError(format!("Invalid payment mode: {s}"))),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Display label derived from the creation time. Not guaranteed to be unique.
    pub order_no: String,
    pub user_id: Option<i64>,
    pub model: String,
    pub variant: String,
    pub unit_price: Rupees,
    pub qty: i64,
    pub total: Rupees,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub payment_mode: PaymentMode,
    pub status: OrderStatusType,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    DeliveryDetails    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// An order that has not been stored yet. Build one with [`NewOrder::new`], then call [`NewOrder::validate`] before
/// handing it to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_no: String,
    pub user_id: i64,
    pub model: String,
    pub variant: String,
    pub unit_price: Rupees,
    pub qty: i64,
    pub total: Rupees,
    pub delivery: DeliveryDetails,
    pub payment_mode: PaymentMode,
    pub gateway_order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Gateway orders must carry a gateway order reference")]
    MissingGatewayReference,
    #[error("Invalid amount (paise >= {0})")]
    InvalidAmount(i64),
    #[error("Invalid currency ({} only)", INR_CURRENCY_CODE)]
    InvalidCurrency(String),
    #[error("Order amount is out of range")]
    AmountOutOfRange,
}

impl NewOrder {
    pub fn new(order_no: String, user_id: i64, model: &str, variant: &str, unit_price: Rupees, qty: i64) -> Self {
        Self {
            order_no,
            user_id,
            model: model.to_string(),
            variant: variant.to_string(),
            unit_price,
            qty,
            total: unit_price.checked_mul(qty).unwrap_or_default(),
            delivery: DeliveryDetails::default(),
            payment_mode: PaymentMode::Cod,
            gateway_order_id: None,
        }
    }

    pub fn with_total(mut self, total: Rupees) -> Self {
        self.total = total;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryDetails) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_payment_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = mode;
        self
    }

    pub fn with_gateway_order_id<S: Into<String>>(mut self, id: S) -> Self {
        self.gateway_order_id = Some(id.into());
        self
    }

    pub fn initial_status(&self) -> OrderStatusType {
        self.payment_mode.initial_status()
    }

    /// Checks that the order is complete and, for gateway orders, carries its gateway reference.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_details()?;
        let has_reference = self.gateway_order_id.as_ref().map(|s| !s.is_empty()).unwrap_or(false);
        if self.payment_mode.is_gateway() && !has_reference {
            return Err(ValidationError::MissingGatewayReference);
        }
        Ok(())
    }

    /// Checks that every required field is present. Blank strings and non-positive numbers count as absent.
    pub fn validate_details(&self) -> Result<(), ValidationError> {
        let text_fields = [
            ("model", &self.model),
            ("variant", &self.variant),
            ("name", &self.delivery.name),
            ("phone", &self.delivery.phone),
            ("address", &self.delivery.address),
            ("city", &self.delivery.city),
            ("pincode", &self.delivery.pincode),
        ];
        let mut missing = text_fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect::<Vec<&'static str>>();
        if !self.unit_price.is_positive() {
            missing.push("price");
        }
        if self.qty <= 0 {
            missing.push("qty");
        }
        if !self.total.is_positive() {
            missing.push("total");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if self.unit_price.checked_mul(self.qty).is_none() {
            return Err(ValidationError::AmountOutOfRange);
        }
        Ok(())
    }
}

//--------------------------------------     PaymentResult     ---------------------------------------------------------
/// The outcome of a gateway callback, ready to be written against the order holding `gateway_order_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    pub status: OrderStatusType,
}

/// What happened when a [`PaymentResult`] was applied to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentApplication {
    /// The order was in `created` and has moved to the result's status.
    Updated(Order),
    /// The order had already left `created`. It is returned unchanged.
    AlreadyReconciled(Order),
    /// No order carries this gateway reference.
    NoMatchingOrder,
}

impl PaymentApplication {
    pub fn order(&self) -> Option<&Order> {
        match self {
            PaymentApplication::Updated(o) | PaymentApplication::AlreadyReconciled(o) => Some(o),
            PaymentApplication::NoMatchingOrder => None,
        }
    }

    pub fn into_order(self) -> Option<Order> {
        match self {
            PaymentApplication::Updated(o) | PaymentApplication::AlreadyReconciled(o) => Some(o),
            PaymentApplication::NoMatchingOrder => None,
        }
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub google_sub: Option<String>,
    pub phone: String,
    pub city: String,
    pub address: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile { id: self.id, email: self.email.clone(), name: self.name.clone() }
    }
}

/// The public face of a user, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Case-folded before it reaches the store.
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub phone: String,
    pub city: String,
    pub address: String,
}

/// What an external identity provider vouches for after verifying an ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub email: String,
    pub name: String,
    pub subject: String,
}

//--------------------------------------     TokenPurpose      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(rename_all = "snake_case")]
pub enum TokenPurpose {
    VerifyEmail,
    ResetPassword,
}

impl Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPurpose::VerifyEmail => write!(f, "verify_email"),
            TokenPurpose::ResetPassword => write!(f, "reset_password"),
        }
    }
}
