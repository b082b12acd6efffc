mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use tenantflow_api::auth::{generate_jwt, Claims};
use tenantflow_api::database::models::UserRole;

#[tokio::test]
async fn whoami_requires_a_token() {
    let (status, body) = common::call(Method::GET, "/api/auth/whoami", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let (status, body) = common::call_with_authorization(Method::GET, "/api/auth/whoami", "Basic dXNlcjpwYXNz").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap_or_default().contains("Bearer"));
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let (status, _) = common::call(Method::GET, "/api/auth/whoami", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let mut claims = Claims::new(Uuid::new_v4(), "owner@example.com".into(), UserRole::Owner);
    claims.iat = Utc::now().timestamp() - 7200;
    claims.exp = Utc::now().timestamp() - 3600;
    let token = generate_jwt(&claims).expect("token");

    let (status, _) = common::call(Method::GET, "/api/auth/whoami", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let claims = Claims::new(Uuid::new_v4(), "owner@example.com".into(), UserRole::Owner);
    let mut token = generate_jwt(&claims).expect("token");
    token.push('x');

    let (status, _) = common::call(Method::GET, "/api/tenants", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_validates_before_touching_the_database() {
    let payload = json!({ "email": "not-an-email", "password": "short", "fullName": "" });
    let (status, body) = common::call(Method::POST, "/auth/register", None, Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["password"].is_string());
    assert!(body["field_errors"]["fullName"].is_string());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (status, body) = common::call_raw(Method::POST, "/auth/login", "{\"email\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn login_with_unknown_account_fails() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": "nobody@example.com", "password": "does-not-matter" }))
        .send()
        .await?;

    // 401 with a database, 503 without one
    assert!(
        res.status() == reqwest::StatusCode::UNAUTHORIZED || res.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], true, "body: {}", body);
    assert!(body["message"].is_string());
    Ok(())
}
