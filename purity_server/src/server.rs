use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use purity_engine::{payment_flow_api::DEFAULT_MIN_GATEWAY_AMOUNT, AuthApi, OrderFlowApi, PaymentFlowApi, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::{google::GoogleVerifier, razorpay::RazorpayGateway},
    routes::{
        auth_config,
        health,
        json_error_handler,
        me,
        ping,
        CancelOrderRoute,
        CreateOrderRoute,
        ForgotPasswordRoute,
        GoogleLoginRoute,
        LoginRoute,
        MyOrdersRoute,
        NewOrderRoute,
        OrderByGatewayRefRoute,
        OrderByIdRoute,
        RegisterRoute,
        ResetPasswordRoute,
        VerifyEmailLinkRoute,
        VerifyEmailRoute,
        VerifyPaymentRoute,
        VerifyReturnRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let gateway = config.razorpay.as_ref().map(RazorpayGateway::new).transpose()?;
    let min_amount = config.razorpay.as_ref().map(|r| r.min_amount).unwrap_or(DEFAULT_MIN_GATEWAY_AMOUNT);
    let verifier = config.google_client_id.as_deref().map(GoogleVerifier::new).transpose()?;
    let options = config.options();
    let host = config.host.clone();
    let port = config.port;
    info!(
        "🚀️ Payments via Razorpay: {}. Google sign-in: {}. Redirects go to {}",
        if gateway.is_some() { "enabled" } else { "disabled" },
        if verifier.is_some() { "enabled" } else { "disabled" },
        options.frontend_base
    );
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let payments_api = PaymentFlowApi::new(db.clone(), gateway.clone()).with_min_amount(min_amount);
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let mut app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tp::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options.clone()));
        if let Some(verifier) = verifier.clone() {
            app = app.app_data(web::Data::new(verifier));
        }
        let api_scope = web::scope("/api")
            .service(ping)
            .service(auth_config)
            .service(me)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(GoogleLoginRoute::<SqliteDatabase, GoogleVerifier>::new())
            .service(ForgotPasswordRoute::<SqliteDatabase>::new())
            .service(ResetPasswordRoute::<SqliteDatabase>::new())
            .service(VerifyEmailRoute::<SqliteDatabase>::new())
            .service(VerifyEmailLinkRoute::<SqliteDatabase>::new())
            .service(NewOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(OrderByGatewayRefRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyReturnRoute::<SqliteDatabase, RazorpayGateway>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// SQLite creates the database file on demand, but not the directory it lives in.
fn ensure_database_dir(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🚀️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
