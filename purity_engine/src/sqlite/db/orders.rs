use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, PaymentApplication, PaymentResult},
    traits::OrderStoreError,
};

/// Inserts a new order using the given connection. The order status is derived from the payment mode.
///
/// This is not atomic on its own. Embed the call in a transaction and pass `&mut *tx` if you need that.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let now = Utc::now();
    let status = order.initial_status();
    let gateway_ref = order.gateway_order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_no,
                user_id,
                model,
                variant,
                unit_price,
                qty,
                total,
                name,
                phone,
                address,
                city,
                pincode,
                payment_mode,
                status,
                gateway_order_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            RETURNING *;
        "#,
    )
    .bind(order.order_no)
    .bind(order.user_id)
    .bind(order.model)
    .bind(order.variant)
    .bind(order.unit_price)
    .bind(order.qty)
    .bind(order.total)
    .bind(order.delivery.name)
    .bind(order.delivery.phone)
    .bind(order.delivery.address)
    .bind(order.delivery.city)
    .bind(order.delivery.pincode)
    .bind(order.payment_mode)
    .bind(status)
    .bind(order.gateway_order_id)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderStoreError::DuplicateGatewayReference(gateway_ref.unwrap_or_default()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_gateway_ref(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY id DESC").bind(user_id).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} orders for user #{user_id}", orders.len());
    Ok(orders)
}

/// Moves the order to `cancelled`, as long as it is owned by `user_id` and is still in `created` or `cod`.
/// Returns `true` if a row was changed.
pub async fn cancel_order(id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET status = $1, updated_at = $2
        WHERE id = $3 AND user_id = $4 AND status IN ($5, $6)
        "#,
    )
    .bind(OrderStatusType::Cancelled)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .bind(OrderStatusType::Created)
    .bind(OrderStatusType::Cod)
    .execute(conn)
    .await?;
    let cancelled = result.rows_affected() > 0;
    debug!("🗃️ Cancel request for order #{id} by user #{user_id}. Cancelled: {cancelled}");
    Ok(cancelled)
}

/// Writes the payment result against the order with the matching gateway reference, but only while that order is in
/// `created`. The conditional `UPDATE` is the only write, so of two racing callbacks for the same payment at most one
/// changes the row. The other sees `AlreadyReconciled`.
pub async fn apply_payment_result(
    result: PaymentResult,
    conn: &mut SqliteConnection,
) -> Result<PaymentApplication, OrderStoreError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET
            status = $1,
            gateway_payment_id = $2,
            gateway_signature = $3,
            updated_at = $4
        WHERE gateway_order_id = $5 AND status = $6
        RETURNING *;
        "#,
    )
    .bind(result.status)
    .bind(&result.gateway_payment_id)
    .bind(&result.signature)
    .bind(Utc::now())
    .bind(&result.gateway_order_id)
    .bind(OrderStatusType::Created)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = updated {
        debug!("🗃️ Order #{} [{}] is now {}", order.id, result.gateway_order_id, order.status);
        return Ok(PaymentApplication::Updated(order));
    }
    let application = match fetch_order_by_gateway_ref(&result.gateway_order_id, conn).await? {
        Some(order) => {
            debug!(
                "🗃️ Order #{} [{}] was already reconciled as {}. Ignoring the {} result.",
                order.id, result.gateway_order_id, order.status, result.status
            );
            PaymentApplication::AlreadyReconciled(order)
        },
        None => {
            debug!("🗃️ No order matches gateway reference {}", result.gateway_order_id);
            PaymentApplication::NoMatchingOrder
        },
    };
    Ok(application)
}
