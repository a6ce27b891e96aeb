//! The bearer-token gate in front of every protected route.

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use secrecy::SecretString;

use store_rating_core::{Email, Role, UserId};
use store_rating_integration_tests::{TEST_SECRET, TestServer};
use store_rating_server::services::TokenService;

const PROTECTED: [(Method, &str); 10] = [
    (Method::PATCH, "/api/auth/update-password"),
    (Method::GET, "/api/admin/dashboard"),
    (Method::GET, "/api/admin/users"),
    (Method::POST, "/api/admin/users"),
    (Method::GET, "/api/admin/users/1"),
    (Method::GET, "/api/admin/stores"),
    (Method::GET, "/api/user/stores"),
    (Method::POST, "/api/user/ratings"),
    (Method::PATCH, "/api/user/ratings/1"),
    (Method::GET, "/api/owner/dashboard"),
];

#[tokio::test]
async fn test_every_protected_route_needs_a_token() {
    let server = TestServer::spawn().await;

    for (method, path) in PROTECTED {
        let (status, body) = server.send(method.clone(), path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(body["error"], "Access token required", "{method} {path}");
    }
}

#[tokio::test]
async fn test_bad_tokens_are_403() {
    let server = TestServer::spawn().await;
    let email = Email::parse("admin@example.com").unwrap();

    let expired = TokenService::new(
        &SecretString::from(TEST_SECRET),
        chrono::Duration::seconds(-5),
    )
    .issue(UserId::new(1), &email, Role::Admin)
    .unwrap();
    let foreign = TokenService::new(
        &SecretString::from("zZ9!yY8@xX7#wW6$vV5%uU4^tT3&sS2"),
        chrono::Duration::hours(1),
    )
    .issue(UserId::new(1), &email, Role::Admin)
    .unwrap();

    for token in ["garbage", "a.b.c", expired.as_str(), foreign.as_str()] {
        let (status, body) = server.get("/api/admin/dashboard", token).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{token}");
        assert_eq!(body["error"], "Invalid token");
    }
}

#[tokio::test]
async fn test_role_matrix() {
    let server = TestServer::spawn().await;
    let admin = server
        .account("Platform Administrator Name", "admin@example.com", Role::Admin)
        .await;
    let user = server
        .account("Regular User Name Long Enough", "user@example.com", Role::User)
        .await;
    let owner = server
        .account("Store Owner Name Long Enough", "owner@example.com", Role::Owner)
        .await;

    let cases = [
        ("/api/admin/dashboard", &admin, StatusCode::OK),
        ("/api/admin/dashboard", &user, StatusCode::FORBIDDEN),
        ("/api/admin/dashboard", &owner, StatusCode::FORBIDDEN),
        ("/api/user/stores", &user, StatusCode::OK),
        ("/api/user/stores", &admin, StatusCode::FORBIDDEN),
        ("/api/user/stores", &owner, StatusCode::FORBIDDEN),
        ("/api/owner/dashboard", &owner, StatusCode::NOT_FOUND),
        ("/api/owner/dashboard", &admin, StatusCode::FORBIDDEN),
        ("/api/owner/dashboard", &user, StatusCode::FORBIDDEN),
    ];

    for (path, token, expected) in cases {
        let (status, body) = server.get(path, token).await;
        assert_eq!(status, expected, "{path}: {body}");
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let server = TestServer::spawn().await;
    let (status, body) = server.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = server.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
