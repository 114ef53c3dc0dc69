//! Request handler definitions
//!
//! Define each route and its handler here. Everything below is mounted under `/api`, apart from [`health`].
//! Handlers that are more than a line or two should delegate to the engine APIs. Keep this module neat and tidy 🙏
//!
//! Any long, non-cpu-bound operation (database calls, the gateway's REST API) is expressed as a future, so a slow call
//! never blocks a worker thread. Password hashing is CPU-bound and runs on tokio's blocking pool inside the engine.
use actix_web::{get, http::header, web, HttpResponse, Responder};
use log::*;
use purity_engine::{
    traits::{OrderManagement, PaymentGateway, UserManagement},
    AuthApi,
    OrderFlowApi,
    PaymentFlowApi,
};
use serde_json::json;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{
        CreateOrderParams,
        ForgotPasswordParams,
        ForgotPasswordResponse,
        GoogleLoginParams,
        JsonResponse,
        LoginParams,
        LoginResponse,
        NewOrderParams,
        NewOrderResponse,
        OrderListResponse,
        PaymentParams,
        PublicConfig,
        RegisterParams,
        RegisterResponse,
        ResetPasswordParams,
        TokenParams,
        VerifyPaymentResponse,
    },
    errors::ServerError,
    integrations::google::IdentityVerifier,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => Any $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Listed by `/api/ping`.
pub const ROUTES: [&str; 19] = [
    "POST /api/auth/register",
    "POST /api/auth/login",
    "POST /api/auth/google",
    "POST /api/auth/forgot",
    "POST /api/auth/reset",
    "POST /api/auth/verify",
    "GET  /api/auth/verify",
    "GET  /api/auth/me",
    "GET  /api/auth/config",
    "GET  /api/my-orders",
    "POST /api/orders/:id/cancel",
    "POST /api/order",
    "POST /api/create-order",
    "POST /api/verify-payment",
    "ALL  /api/verify-return",
    "GET  /api/orders/:id",
    "GET  /api/orders/by-rp/:ref",
    "GET  /api/ping",
    "GET  /health",
];

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[get("/ping")]
pub async fn ping(options: web::Data<ServerOptions>) -> impl Responder {
    trace!("💻️ Received ping");
    HttpResponse::Ok().json(json!({ "ok": true, "frontend": options.frontend_base, "routes": ROUTES }))
}

//----------------------------------------------   Auth  ----------------------------------------------------
#[get("/auth/config")]
pub async fn auth_config(options: web::Data<ServerOptions>) -> impl Responder {
    HttpResponse::Ok().json(PublicConfig {
        google_client_id: options.google_client_id.clone(),
        has_razorpay: options.gateway_enabled,
    })
}

route!(register => Post "/auth/register" impl UserManagement);
/// Creates an unverified account. The verification link is returned in the response, since email delivery is
/// handled elsewhere.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterParams>,
    api: web::Data<AuthApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let (user, token) = api.register(body.into_inner().into()).await?;
    debug!("💻️ Registered user #{}", user.id);
    Ok(HttpResponse::Ok().json(RegisterResponse { ok: true, verify_url: options.verify_email_page(&token) }))
}

route!(login => Post "/auth/login" impl UserManagement);
pub async fn login<B: UserManagement>(
    body: web::Json<LoginParams>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginParams { email, password } = body.into_inner();
    let user = api.login(&email.unwrap_or_default(), &password.unwrap_or_default()).await?;
    let token = signer.issue_token(JwtClaims::from(&user))?;
    debug!("💻️ Issued access token for user #{}", user.id);
    Ok(HttpResponse::Ok().json(LoginResponse { ok: true, token, user: user.profile() }))
}

route!(google_login => Post "/auth/google" impl UserManagement, IdentityVerifier);
/// Signs in with a Google ID token. Returns a 503 if Google sign-in has not been configured.
pub async fn google_login<B: UserManagement, V: IdentityVerifier>(
    body: web::Json<GoogleLoginParams>,
    api: web::Data<AuthApi<B>>,
    verifier: Option<web::Data<V>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let verifier = verifier.ok_or(ServerError::IdentityProviderUnavailable)?;
    let id_token = body
        .into_inner()
        .id_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ServerError::InvalidRequestBody("Missing id_token".to_string()))?;
    let claims = verifier.verify_id_token(&id_token).await?;
    let user = api.login_with_identity(claims).await?;
    let token = signer.issue_token(JwtClaims::from(&user))?;
    debug!("💻️ User #{} signed in with Google", user.id);
    Ok(HttpResponse::Ok().json(LoginResponse { ok: true, token, user: user.profile() }))
}

#[get("/auth/me")]
pub async fn me(claims: JwtClaims) -> impl Responder {
    HttpResponse::Ok().json(json!({ "ok": true, "user": claims }))
}

route!(forgot_password => Post "/auth/forgot" impl UserManagement);
/// Always answers `ok`, so the response does not reveal whether the address has an account.
pub async fn forgot_password<B: UserManagement>(
    body: web::Json<ForgotPasswordParams>,
    api: web::Data<AuthApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let email = body.into_inner().email.unwrap_or_default();
    let token = api.request_password_reset(&email).await?;
    let reset_url = token.map(|t| options.reset_password_page(&t));
    Ok(HttpResponse::Ok().json(ForgotPasswordResponse { ok: true, reset_url }))
}

route!(reset_password => Post "/auth/reset" impl UserManagement);
pub async fn reset_password<B: UserManagement>(
    body: web::Json<ResetPasswordParams>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ResetPasswordParams { token, password } = body.into_inner();
    api.reset_password(&token.unwrap_or_default(), &password.unwrap_or_default()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success()))
}

route!(verify_email => Post "/auth/verify" impl UserManagement);
/// Consumes the verification token and logs the user straight in.
pub async fn verify_email<B: UserManagement>(
    body: web::Json<TokenParams>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let token = body.into_inner().token.unwrap_or_default();
    let user = api.verify_email(token.trim()).await?;
    let token = signer.issue_token(JwtClaims::from(&user))?;
    Ok(HttpResponse::Ok().json(LoginResponse { ok: true, token, user: user.profile() }))
}

route!(verify_email_link => Get "/auth/verify" impl UserManagement);
/// The same as [`verify_email`], for links that are opened directly. No access token is issued.
pub async fn verify_email_link<B: UserManagement>(
    query: web::Query<TokenParams>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let token = query.into_inner().token.unwrap_or_default();
    let user = api.verify_email(token.trim()).await?;
    debug!("💻️ User #{} verified their email from a link", user.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success()))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(new_order => Post "/order" impl OrderManagement);
/// Captures a cash-on-delivery or UPI order for the logged-in customer.
pub async fn new_order<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new order for user #{}", claims.uid);
    let (details, mode) = body.into_inner().into_order_details()?;
    let order = api.create_order(claims.uid, details, mode).await?;
    Ok(HttpResponse::Ok().json(NewOrderResponse { ok: true, id: order.id, order_no: order.order_no }))
}

route!(my_orders => Get "/my-orders" impl OrderManagement);
/// The logged-in customer's orders, newest first.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user #{}", claims.uid);
    let orders = api.orders_for_user(claims.uid).await?;
    Ok(HttpResponse::Ok().json(OrderListResponse { ok: true, orders }))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl OrderManagement);
/// Only the owner can cancel, and only while the order is still `created` or `cod`.
pub async fn cancel_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST cancel order #{id} for user #{}", claims.uid);
    if api.cancel_order(id, claims.uid).await? {
        Ok(HttpResponse::Ok().json(JsonResponse::success()))
    } else {
        Ok(HttpResponse::BadRequest().json(JsonResponse::failure("Cannot cancel this order")))
    }
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
/// Anyone holding the order id may read the order. The review page relies on this.
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET order #{id}");
    let order = api.order_by_id(id).await?.ok_or_else(|| ServerError::NoRecordFound("Not found".to_string()))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_by_gateway_ref => Get "/orders/by-rp/{gateway_order_id}" impl OrderManagement);
/// Lets the checkout page poll for the outcome of a UPI payment using the gateway's order reference.
pub async fn order_by_gateway_ref<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let gateway_order_id = path.into_inner();
    trace!("💻️ GET order for gateway reference {gateway_order_id}");
    let order = api
        .order_by_gateway_ref(&gateway_order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Not found".to_string()))?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_order => Post "/create-order" impl OrderManagement, PaymentGateway);
/// Opens a gateway order and stores the matching local order, awaiting payment.
///
/// The response carries what the browser needs to open the gateway's checkout:
/// `{gatewayOrderId, keyId, currency, amount, id}`.
pub async fn create_order<B: OrderManagement, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<CreateOrderParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create-order for user #{}", claims.uid);
    let request = body.into_inner().into_gateway_order_request();
    let checkout = api.open_gateway_order(claims.uid, request).await?;
    Ok(HttpResponse::Ok().json(checkout))
}

route!(verify_payment => Post "/verify-payment" impl OrderManagement, PaymentGateway);
/// Called by the checkout page once the gateway reports a payment.
///
/// A bad signature is a normal outcome: the order is marked `failed` and the response is `{ok: false}`. `redirect`
/// points at the review page whenever we hold an order for the gateway reference.
pub async fn verify_payment<B: OrderManagement, G: PaymentGateway>(
    body: web::Json<PaymentParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let callback = body.into_inner().into_callback()?;
    debug!("💻️ POST verify-payment for gateway order {}", callback.gateway_order_id);
    let reconciliation = api.reconcile(callback).await?;
    let redirect = reconciliation.order_id().map(|id| options.review_page(id));
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse { ok: reconciliation.verified, redirect }))
}

route!(verify_return => Any "/verify-return" impl OrderManagement, PaymentGateway);
/// The gateway's redirect channel. Identifiers may arrive in the query string, in a form body, or both, and body
/// values win. This endpoint always answers with a redirect, never with an error.
pub async fn verify_return<B: OrderManagement, G: PaymentGateway>(
    query: Option<web::Query<PaymentParams>>,
    form: Option<web::Form<PaymentParams>>,
    api: web::Data<PaymentFlowApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    let query = query.map(|q| q.into_inner()).unwrap_or_default();
    let form = form.map(|f| f.into_inner()).unwrap_or_default();
    let destination = match query.merge(form).into_callback() {
        Err(e) => {
            debug!("💻️ verify-return without payment identifiers. {e}");
            options.failed_page()
        },
        Ok(callback) => {
            debug!("💻️ verify-return for gateway order {}", callback.gateway_order_id);
            match api.reconcile(callback).await {
                Ok(r) if !r.verified => options.failed_page(),
                Ok(r) => match r.order_id() {
                    Some(id) => options.review_page(id),
                    None => options.unknown_page(),
                },
                Err(e) => {
                    error!("💻️ Could not reconcile a verify-return callback. {e}");
                    options.failed_page()
                },
            }
        },
    };
    HttpResponse::Found().insert_header((header::LOCATION, destination)).finish()
}

/// Used by the JSON extractor, so malformed bodies get the same error shape as every other failure.
pub fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not read JSON body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}
