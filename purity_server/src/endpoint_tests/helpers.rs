use std::time::Duration;

use actix_web::{
    body::MessageBody,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Utc;
use log::debug;
use purity_engine::{
    db_types::{NewOrder, Order, User},
    traits::GatewayCredentials,
};

use super::mocks::MockGateway;
use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::{AuthConfig, ServerOptions},
    routes::json_error_handler,
};

pub const FRONTEND: &str = "https://shop.test";
pub const KEY_ID: &str = "rzp_test_endpoint";
pub const KEY_SECRET: &str = "rzp_endpoint_secret";

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("0f6c1e3f0a0c4b3b9d5e7f21a8c4d6e2", Duration::from_secs(3600))
}

pub fn options() -> ServerOptions {
    ServerOptions { frontend_base: FRONTEND.into(), google_client_id: None, gateway_enabled: true }
}

pub fn issue_token(claims: JwtClaims) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(claims).expect("Failed to sign token")
}

pub fn customer_token(uid: i64) -> String {
    issue_token(JwtClaims { uid, email: format!("customer{uid}@example.com"), name: "Customer".into() })
}

/// A gateway mock that only knows its credentials. Any remote call fails the test.
pub fn credentials_only_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_credentials().return_const(GatewayCredentials::new(KEY_ID, KEY_SECRET));
    gateway.expect_create_remote_order().never();
    gateway
}

/// What the store would hand back for `order`.
pub fn stored(order: NewOrder, id: i64) -> Order {
    let now = Utc::now();
    Order {
        id,
        order_no: order.order_no.clone(),
        user_id: Some(order.user_id),
        status: order.initial_status(),
        model: order.model,
        variant: order.variant,
        unit_price: order.unit_price,
        qty: order.qty,
        total: order.total,
        name: order.delivery.name,
        phone: order.delivery.phone,
        address: order.delivery.address,
        city: order.delivery.city,
        pincode: order.delivery.pincode,
        payment_mode: order.payment_mode,
        gateway_order_id: order.gateway_order_id,
        gateway_payment_id: None,
        gateway_signature: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn user(id: i64, email: &str, password_hash: Option<String>, verified: bool) -> User {
    User {
        id,
        email: email.into(),
        name: "Asha".into(),
        password_hash,
        google_sub: None,
        phone: String::new(),
        city: String::new(),
        address: String::new(),
        email_verified: verified,
        created_at: Utc::now(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response was not JSON")
    }
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> Result<TestResponse, String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .app_data(web::Data::new(options()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok(TestResponse { status, location, body })
}

pub async fn get_request<F>(auth_token: &str, path: &str, configure: F) -> Result<TestResponse, String>
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::get().uri(path);
    if !auth_token.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {auth_token}")));
    }
    send_request(req, configure).await
}

pub async fn post_request<F>(auth_token: &str, path: &str, body: serde_json::Value, configure: F) -> Result<TestResponse, String>
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !auth_token.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {auth_token}")));
    }
    send_request(req, configure).await
}
