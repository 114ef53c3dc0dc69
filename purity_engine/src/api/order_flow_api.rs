use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::{errors::OrderFlowError, order_objects::OrderDetails},
    db_types::{Order, PaymentMode},
    helpers::new_order_number,
    traits::{OrderManagement, OrderStoreError},
};

/// `OrderFlowApi` covers the order lifecycle that does not involve the payment gateway: capturing cash and UPI
/// orders, cancelling them, and reading them back.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Validates and stores a new order for `user_id`. The initial status equals the payment mode.
    ///
    /// Gateway orders cannot be created here, since they need a remote order first. Use
    /// [`PaymentFlowApi::open_gateway_order`](crate::PaymentFlowApi::open_gateway_order) for those.
    pub async fn create_order(
        &self,
        user_id: i64,
        details: OrderDetails,
        mode: PaymentMode,
    ) -> Result<Order, OrderFlowError> {
        let order = details.into_new_order(new_order_number(Utc::now()), user_id).with_payment_mode(mode);
        order.validate()?;
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order #{} ({}) captured for user #{user_id} as {}", order.id, order.order_no, order.status);
        Ok(order)
    }

    /// Returns `false` if the order does not exist, belongs to someone else, or has moved past `created`/`cod`.
    pub async fn cancel_order(&self, id: i64, user_id: i64) -> Result<bool, OrderStoreError> {
        let cancelled = self.db.cancel_order(id, user_id).await?;
        if cancelled {
            info!("🔄️📦️ Order #{id} cancelled by user #{user_id}");
        } else {
            debug!("🔄️📦️ User #{user_id} could not cancel order #{id}");
        }
        Ok(cancelled)
    }

    pub async fn order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError> {
        self.db.fetch_order_by_id(id).await
    }

    pub async fn order_by_gateway_ref(&self, gateway_order_id: &str) -> Result<Option<Order>, OrderStoreError> {
        self.db.fetch_order_by_gateway_ref(gateway_order_id).await
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderStoreError> {
        self.db.fetch_orders_for_user(user_id).await
    }
}
