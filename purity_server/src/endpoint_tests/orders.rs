use actix_web::{http::StatusCode, web, web::ServiceConfig};
use purity_common::Rupees;
use purity_engine::{
    db_types::{DeliveryDetails, NewOrder, OrderStatusType, PaymentMode},
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{customer_token, get_request, post_request, stored},
    mocks::MockOrderManager,
};
use crate::routes::{health, CancelOrderRoute, MyOrdersRoute, NewOrderRoute, OrderByGatewayRefRoute, OrderByIdRoute};

fn configure(store: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(store)))
            .service(NewOrderRoute::<MockOrderManager>::new())
            .service(MyOrdersRoute::<MockOrderManager>::new())
            .service(CancelOrderRoute::<MockOrderManager>::new())
            .service(OrderByGatewayRefRoute::<MockOrderManager>::new())
            .service(OrderByIdRoute::<MockOrderManager>::new());
    }
}

fn elite_order() -> serde_json::Value {
    json!({
        "model": "TP-Elite", "variant": "Elite Black", "price": 14394, "qty": 1, "total": 14394,
        "name": "A", "phone": "999", "address": "X", "city": "Y", "pincode": "1"
    })
}

fn existing_order(id: i64, user_id: i64) -> purity_engine::db_types::Order {
    let delivery = DeliveryDetails {
        name: "A".into(),
        phone: "999".into(),
        address: "X".into(),
        city: "Y".into(),
        pincode: "1".into(),
    };
    let order = NewOrder::new(format!("TP2024090112000{id}"), user_id, "TP-Elite", "Elite Black", Rupees::from(14394), 1)
        .with_delivery(delivery);
    stored(order, id)
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let res = get_request("", "/health", |cfg: &mut ServiceConfig| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "👍️\n");
}

#[actix_web::test]
async fn new_order_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_insert_order().never();
    let res = post_request("", "/order", elite_order(), configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Unauthorized");
}

#[actix_web::test]
async fn new_order_with_missing_fields_never_reaches_the_store() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_insert_order().never();
    let body = json!({ "model": "TP-Elite", "variant": "Elite Black", "price": 14394, "qty": 1, "total": 14394 });
    let res = post_request(&customer_token(3), "/order", body, configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Missing fields: name, phone, address, city, pincode");
}

#[actix_web::test]
async fn new_order_with_an_oversized_quantity() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_insert_order().never();
    let mut body = elite_order();
    body["price"] = json!(10_i64.pow(13));
    body["qty"] = json!(10_i64.pow(13));
    let res = post_request(&customer_token(3), "/order", body, configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Order amount is out of range");
}

#[actix_web::test]
async fn new_order_defaults_to_cash_on_delivery() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store
        .expect_insert_order()
        .withf(|order| {
            order.user_id == 3 &&
                order.payment_mode == PaymentMode::Cod &&
                order.initial_status() == OrderStatusType::Cod &&
                order.gateway_order_id.is_none() &&
                order.total == Rupees::from(14394)
        })
        .times(1)
        .returning(|order| Ok(stored(order, 41)));
    let mut body = elite_order();
    body["status"] = json!("paid");
    let res = post_request(&customer_token(3), "/order", body, configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["id"], 41);
    let order_no = body["order_no"].as_str().unwrap();
    assert!(order_no.starts_with("TP"), "order_no was {order_no}");
}

#[actix_web::test]
async fn new_upi_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store
        .expect_insert_order()
        .withf(|order| order.payment_mode == PaymentMode::Upi)
        .times(1)
        .returning(|order| Ok(stored(order, 42)));
    let mut body = elite_order();
    body["payment_mode"] = json!("upi");
    let res = post_request(&customer_token(3), "/order", body, configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["id"], 42);
}

#[actix_web::test]
async fn my_orders_rejects_forged_tokens() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_fetch_orders_for_user().never();
    let mut token = customer_token(3);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let res = get_request(&token, "/my-orders", configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Invalid token");
}

#[actix_web::test]
async fn my_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store
        .expect_fetch_orders_for_user()
        .withf(|uid| *uid == 3)
        .times(1)
        .returning(|uid| Ok(vec![existing_order(2, uid), existing_order(1, uid)]));
    let res = get_request(&customer_token(3), "/my-orders", configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["ok"], true);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], 2);
    assert_eq!(orders[0]["status"], "cod");
    assert_eq!(orders[0]["unit_price"], 14394);
}

#[actix_web::test]
async fn cancel_order_that_cannot_be_cancelled() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_cancel_order().withf(|id, uid| *id == 9 && *uid == 3).times(1).returning(|_, _| Ok(false));
    let res = post_request(&customer_token(3), "/orders/9/cancel", json!({}), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({ "ok": false, "error": "Cannot cancel this order" }));
}

#[actix_web::test]
async fn cancel_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_cancel_order().times(1).returning(|_, _| Ok(true));
    let res = post_request(&customer_token(3), "/orders/9/cancel", json!({}), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "ok": true }));
}

#[actix_web::test]
async fn order_by_id_not_found() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_fetch_order_by_id().times(1).returning(|_| Ok(None));
    let res = get_request("", "/orders/404", configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_by_id_needs_no_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store.expect_fetch_order_by_id().withf(|id| *id == 5).times(1).returning(|id| Ok(Some(existing_order(id, 3))));
    let res = get_request("", "/orders/5", configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["model"], "TP-Elite");
}

#[actix_web::test]
async fn order_by_gateway_ref() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderManager::new();
    store
        .expect_fetch_order_by_gateway_ref()
        .withf(|r| r == "order_Nx1")
        .times(1)
        .returning(|_| Ok(Some(existing_order(5, 3))));
    store.expect_fetch_order_by_id().never();
    let res = get_request("", "/orders/by-rp/order_Nx1", configure(store)).await.expect("Request failed");
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["id"], 5);
}
