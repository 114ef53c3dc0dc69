use thiserror::Error;

use crate::db_types::{NewOrder, Order, PaymentApplication, PaymentResult};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("An order with gateway reference {0} already exists")]
    DuplicateGatewayReference(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the persistent order store.
///
/// Implementations must make [`apply_payment_result`](OrderManagement::apply_payment_result) a single atomic
/// conditional update, since the browser callback and the server-side callback for the same payment may arrive
/// concurrently.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order, in the status implied by its payment mode, and returns the stored record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches the order created for the given gateway-side order reference.
    async fn fetch_order_by_gateway_ref(&self, gateway_order_id: &str) -> Result<Option<Order>, OrderStoreError>;

    /// All orders owned by the user, newest (highest id) first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderStoreError>;

    /// Cancels the order if it belongs to `user_id` and is still in `created` or `cod`.
    ///
    /// Returns `false` when nothing was changed, without saying why.
    async fn cancel_order(&self, id: i64, user_id: i64) -> Result<bool, OrderStoreError>;

    /// Records the gateway payment id, the signature and the new status against the order holding
    /// `result.gateway_order_id`, provided that order is still in `created`. Orders that have already been reconciled
    /// are returned untouched.
    async fn apply_payment_result(&self, result: PaymentResult) -> Result<PaymentApplication, OrderStoreError>;
}
