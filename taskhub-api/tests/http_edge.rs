/// HTTP edge tests
///
/// Drive the assembled router directly as a tower service. These cover the
/// layers that run before any database access: request authentication,
/// input validation, and the security header stack.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use taskhub_shared::auth::jwt::TokenType;
use tower::Service as _;

use common::{mint_token, test_app};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn protected_route_without_credentials_is_401() {
    let mut app = test_app();

    let response = app.call(get("/api/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_401() {
    let mut app = test_app();

    let request = Request::builder()
        .uri("/api/teams")
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_rejected_as_access_credential() {
    let mut app = test_app();

    // A validly signed refresh token must not authenticate API requests
    let refresh = mint_token(TokenType::Refresh);
    let request = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cookie_credential_reaches_the_authenticator() {
    let mut app = test_app();

    // A malformed token in the cookie is still a credential: the request
    // gets past MissingCredentials and fails token verification instead.
    let request = Request::builder()
        .uri("/api/me")
        .header(header::COOKIE, "token=not.a.token")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_route_without_credentials_is_401() {
    let mut app = test_app();

    let response = app.call(get("/api/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.call(get("/api/logs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_invalid_email_before_storage() {
    let mut app = test_app();

    let response = app
        .call(post_json(
            "/api/register",
            r#"{"username": "alice", "email": "not-an-email", "password": "MyPassw0rd"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let mut app = test_app();

    let response = app
        .call(post_json(
            "/api/register",
            r#"{"username": "alice", "email": "alice@example.com", "password": "alllowercase1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_with_access_token_is_401() {
    let mut app = test_app();

    let access = mint_token(TokenType::Access);
    let body = format!(r#"{{"refresh_token": "{}"}}"#, access);

    let response = app.call(post_json("/api/refresh", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn security_headers_are_present_on_error_responses() {
    let mut app = test_app();

    let response = app.call(get("/api/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    // Development config: no HSTS
    assert!(headers.get("Strict-Transport-Security").is_none());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let mut app = test_app();

    let response = app.call(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
