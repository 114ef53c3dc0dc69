use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use purity_engine::{
    db_types::{IdentityClaims, TokenPurpose},
    helpers::hash_password,
    traits::UserStoreError,
    AuthApi,
};
use serde_json::json;

use super::{
    helpers::{customer_token, get_request, post_request, send_request, user, FRONTEND},
    mocks::MockUserManager,
};
use crate::{
    auth::{JwtClaims, TokenIssuer},
    integrations::google::{IdentityError, IdentityVerifier},
    routes::{
        auth_config,
        me as me_route,
        ping,
        ForgotPasswordRoute,
        GoogleLoginRoute,
        LoginRoute,
        RegisterRoute,
        ResetPasswordRoute,
        VerifyEmailLinkRoute,
        VerifyEmailRoute,
    },
};

/// Vouches for one token only.
struct FakeVerifier;

impl IdentityVerifier for FakeVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<IdentityClaims, IdentityError> {
        match id_token {
            "good-token" => Ok(IdentityClaims {
                email: "Asha@Example.com".into(),
                name: "Asha".into(),
                subject: "g-1098".into(),
            }),
            _ => Err(IdentityError::Rejected("400: invalid_token".into())),
        }
    }
}

fn configure(store: MockUserManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AuthApi::new(store)))
            .service(ping)
            .service(auth_config)
            .service(me_route)
            .service(RegisterRoute::<MockUserManager>::new())
            .service(LoginRoute::<MockUserManager>::new())
            .service(GoogleLoginRoute::<MockUserManager, FakeVerifier>::new())
            .service(ForgotPasswordRoute::<MockUserManager>::new())
            .service(ResetPasswordRoute::<MockUserManager>::new())
            .service(VerifyEmailRoute::<MockUserManager>::new())
            .service(VerifyEmailLinkRoute::<MockUserManager>::new());
    }
}

fn configure_with_google(store: MockUserManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(FakeVerifier));
        configure(store)(cfg);
    }
}

#[actix_web::test]
async fn login_with_missing_fields() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_fetch_user_by_email().never();
    let res = post_request("", "/auth/login", json!({ "email": "a@b.c" }), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Missing email/password");
}

#[actix_web::test]
async fn login_for_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_fetch_user_by_email().withf(|e| e == "nobody@example.com").times(1).returning(|_| Ok(None));
    let body = json!({ "email": "Nobody@Example.com", "password": "hunter22" });
    let res = post_request("", "/auth/login", body, configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Invalid credentials");
}

#[actix_web::test]
async fn login_before_verifying_email() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("hunter22").unwrap();
    let mut store = MockUserManager::new();
    store
        .expect_fetch_user_by_email()
        .times(1)
        .returning(move |email| Ok(Some(user(4, email, Some(hash.clone()), false))));
    let body = json!({ "email": "asha@example.com", "password": "hunter22" });
    let res = post_request("", "/auth/login", body, configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json()["error"], "Please verify your email first");
}

#[actix_web::test]
async fn login() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("hunter22").unwrap();
    let mut store = MockUserManager::new();
    store
        .expect_fetch_user_by_email()
        .times(1)
        .returning(move |email| Ok(Some(user(4, email, Some(hash.clone()), true))));
    let body = json!({ "email": "asha@example.com", "password": "hunter22" });
    let res = post_request("", "/auth/login", body, configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["user"], json!({ "id": 4, "email": "asha@example.com", "name": "Asha" }));
    let issuer = TokenIssuer::new(&super::helpers::get_auth_config());
    let claims = issuer.validate(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims, JwtClaims { uid: 4, email: "asha@example.com".into(), name: "Asha".into() });
}

#[actix_web::test]
async fn register_with_an_existing_email() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_create_user().times(1).returning(|u| Err(UserStoreError::EmailExists(u.email)));
    store.expect_insert_account_token().never();
    let body = json!({ "email": "asha@example.com", "password": "hunter22" });
    let res = post_request("", "/auth/register", body, configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()["error"], "Email already exists");
}

#[actix_web::test]
async fn register() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store
        .expect_create_user()
        .withf(|u| u.email == "asha@example.com" && u.password_hash.is_some() && u.phone == "9876543210")
        .times(1)
        .returning(|u| Ok(user(4, &u.email, u.password_hash, false)));
    store
        .expect_insert_account_token()
        .withf(|uid, purpose, token, _| *uid == 4 && *purpose == TokenPurpose::VerifyEmail && token.len() == 48)
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    let body = json!({ "email": " Asha@Example.com ", "password": "hunter22", "name": "Asha", "phone": 9876543210u64 });
    let res = post_request("", "/auth/register", body, configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["ok"], true);
    let url = body["verify_url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{FRONTEND}/verify.html?token=")), "was {url}");
}

#[actix_web::test]
async fn google_sign_in_when_not_configured() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_upsert_external_identity().never();
    let res = post_request("", "/auth/google", json!({ "id_token": "good-token" }), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn google_sign_in_with_a_rejected_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_upsert_external_identity().never();
    let res = post_request("", "/auth/google", json!({ "id_token": "forged" }), configure_with_google(store))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Invalid Google token");

    let store = MockUserManager::new();
    let res = post_request("", "/auth/google", json!({}), configure_with_google(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn google_sign_in() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store
        .expect_upsert_external_identity()
        .withf(|c| c.email == "asha@example.com" && c.subject == "g-1098")
        .times(1)
        .returning(|c| Ok(user(9, &c.email, None, true)));
    let res = post_request("", "/auth/google", json!({ "id_token": "good-token" }), configure_with_google(store))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["user"]["id"], 9);
}

#[actix_web::test]
async fn forgot_password_does_not_reveal_accounts() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_fetch_user_by_email().times(1).returning(|_| Ok(None));
    store.expect_insert_account_token().never();
    let res = post_request("", "/auth/forgot", json!({ "email": "who@example.com" }), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "ok": true }));
}

#[actix_web::test]
async fn forgot_password() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_fetch_user_by_email().times(1).returning(|e| Ok(Some(user(4, e, Some("$argon2id$x".into()), true))));
    store
        .expect_insert_account_token()
        .withf(|uid, purpose, _, _| *uid == 4 && *purpose == TokenPurpose::ResetPassword)
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    let res = post_request("", "/auth/forgot", json!({ "email": "asha@example.com" }), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    let url = res.json()["reset_url"].as_str().unwrap().to_string();
    assert!(url.starts_with(&format!("{FRONTEND}/reset.html?token=")), "was {url}");
}

#[actix_web::test]
async fn reset_password_with_a_used_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_consume_account_token().times(1).returning(|_, _| Ok(None));
    store.expect_update_password_hash().never();
    let body = json!({ "token": "abc", "password": "new-password" });
    let res = post_request("", "/auth/reset", body, configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid or expired token");
}

#[actix_web::test]
async fn verify_email_logs_the_user_in() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store
        .expect_consume_account_token()
        .withf(|purpose, token| *purpose == TokenPurpose::VerifyEmail && token == "tok")
        .times(1)
        .returning(|_, _| Ok(Some(4)));
    store.expect_mark_email_verified().times(1).returning(|_| Ok(()));
    store.expect_fetch_user_by_id().times(1).returning(|id| Ok(Some(user(id, "asha@example.com", None, true))));
    let res = post_request("", "/auth/verify", json!({ "token": "tok" }), configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["ok"], true);
    assert!(body["token"].is_string());
}

#[actix_web::test]
async fn verify_email_link() {
    let _ = env_logger::try_init().ok();
    let mut store = MockUserManager::new();
    store.expect_consume_account_token().times(1).returning(|_, _| Ok(Some(4)));
    store.expect_mark_email_verified().times(1).returning(|_| Ok(()));
    store.expect_fetch_user_by_id().times(1).returning(|id| Ok(Some(user(id, "asha@example.com", None, true))));
    let res = get_request("", "/auth/verify?token=tok", configure(store)).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "ok": true }));
}

#[actix_web::test]
async fn me() {
    let _ = env_logger::try_init().ok();
    let res = get_request(&customer_token(5), "/auth/me", configure(MockUserManager::new())).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["user"]["uid"], 5);

    let res = get_request("", "/auth/me", configure(MockUserManager::new())).await.unwrap();
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn public_config_and_ping() {
    let _ = env_logger::try_init().ok();
    let res = get_request("", "/auth/config", configure(MockUserManager::new())).await.unwrap();
    assert_eq!(res.json(), json!({ "googleClientId": null, "hasRazorpay": true }));

    let res = send_request(TestRequest::get().uri("/ping"), configure(MockUserManager::new())).await.unwrap();
    let body = res.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["frontend"], FRONTEND);
    assert!(body["routes"].as_array().unwrap().iter().any(|r| r == "ALL  /api/verify-return"));
}
