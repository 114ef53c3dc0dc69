use std::collections::BTreeMap;

use purity_common::{Paise, Rupees, INR_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::{
    api::errors::PaymentFlowError,
    db_types::{DeliveryDetails, NewOrder, Order, OrderStatusType, PaymentApplication},
};

/// What a customer is buying and where it should go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDetails {
    pub model: String,
    pub variant: String,
    pub unit_price: Rupees,
    pub qty: i64,
    pub total: Rupees,
    pub delivery: DeliveryDetails,
}

impl OrderDetails {
    pub(crate) fn into_new_order(self, order_no: String, user_id: i64) -> NewOrder {
        NewOrder::new(order_no, user_id, &self.model, &self.variant, self.unit_price, self.qty)
            .with_total(self.total)
            .with_delivery(self.delivery)
    }
}

/// A request to open a gateway order. Product fields that are left out are derived from the amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrderRequest {
    /// In paise.
    pub amount: i64,
    pub currency: String,
    pub product_id: String,
    pub notes: BTreeMap<String, String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub unit_price: Option<Rupees>,
    pub qty: Option<i64>,
    pub total: Option<Rupees>,
    pub delivery: DeliveryDetails,
}

impl Default for GatewayOrderRequest {
    fn default() -> Self {
        Self {
            amount: 0,
            currency: INR_CURRENCY_CODE.to_string(),
            product_id: "tp".to_string(),
            notes: BTreeMap::new(),
            model: None,
            variant: None,
            unit_price: None,
            qty: None,
            total: None,
            delivery: DeliveryDetails::default(),
        }
    }
}

impl GatewayOrderRequest {
    pub fn receipt(&self, timestamp_millis: i64) -> String {
        format!("tp_{}_{timestamp_millis}", self.product_id)
    }

    /// Fills in the product defaults: the product id as model, `N/A` as variant, one unit, and the amount rounded to
    /// whole rupees as both price and total.
    pub fn order_details(&self) -> OrderDetails {
        let rupees = Paise::from(self.amount).to_rupees_rounded();
        let non_blank = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        OrderDetails {
            model: non_blank(&self.model).unwrap_or_else(|| self.product_id.clone()),
            variant: non_blank(&self.variant).unwrap_or_else(|| "N/A".to_string()),
            unit_price: self.unit_price.unwrap_or(rupees),
            qty: self.qty.unwrap_or(1),
            total: self.total.unwrap_or(rupees),
            delivery: self.delivery.clone(),
        }
    }
}

/// Everything the browser needs to open the gateway's checkout for a freshly created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCheckout {
    pub gateway_order_id: String,
    pub key_id: String,
    pub currency: String,
    pub amount: Paise,
    /// The local order id.
    pub id: i64,
}

/// The three values the gateway hands back after a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

impl PaymentCallback {
    /// Fails with [`PaymentFlowError::MissingIdentifiers`] if any of the values is absent or blank.
    pub fn from_parts(
        gateway_order_id: Option<String>,
        gateway_payment_id: Option<String>,
        signature: Option<String>,
    ) -> Result<Self, PaymentFlowError> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (present(gateway_order_id), present(gateway_payment_id), present(signature)) {
            (Some(gateway_order_id), Some(gateway_payment_id), Some(signature)) => {
                Ok(Self { gateway_order_id, gateway_payment_id, signature })
            },
            _ => Err(PaymentFlowError::MissingIdentifiers),
        }
    }
}

/// The outcome of reconciling one callback against the order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Whether the callback signature was valid.
    pub verified: bool,
    pub application: PaymentApplication,
}

impl Reconciliation {
    pub fn order(&self) -> Option<&Order> {
        self.application.order()
    }

    pub fn order_id(&self) -> Option<i64> {
        self.order().map(|o| o.id)
    }

    /// True when the gateway confirmed a payment for an order that had already been failed or cancelled. The
    /// customer has paid for an order we don't consider paid.
    pub fn needs_manual_review(&self) -> bool {
        match &self.application {
            PaymentApplication::AlreadyReconciled(order) => self.verified && order.status != OrderStatusType::Paid,
            _ => false,
        }
    }
}
