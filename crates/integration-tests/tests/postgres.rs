//! The same flows against `PostgreSQL`.
//!
//! Ignored by default; run with `TEST_DATABASE_URL` set and
//! `cargo test -p store-rating-integration-tests -- --ignored`. The database
//! is truncated first, and servers take turns on it.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use store_rating_core::Role;
use store_rating_integration_tests::TestServer;

async fn server() -> TestServer {
    TestServer::spawn_postgres()
        .await
        .expect("TEST_DATABASE_URL must be set for ignored tests")
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_rating_flow() {
    let server = server().await;
    let admin = server
        .account("Platform Administrator Name", "admin@example.com", Role::Admin)
        .await;
    let user = server
        .account("Regular User Name Long Enough", "user@example.com", Role::User)
        .await;

    let (status, body) = server
        .post(
            "/api/admin/stores",
            Some(&admin),
            json!({ "name": "Fashion Boutique Shopping Center", "email": "fashion@store.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let store_id = body["store"]["id"].as_i64().unwrap();

    for rating in [5, 4] {
        let (status, body) = server
            .post(
                "/api/user/ratings",
                Some(&user),
                json!({ "store_id": store_id, "rating": rating }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (_, stores) = server.get("/api/user/stores", &user).await;
    assert_eq!(stores[0]["average_rating"], 4.0);
    assert_eq!(stores[0]["rating_count"], 1);
    assert_eq!(stores[0]["user_rating"], 4);

    let (_, counts) = server.get("/api/admin/dashboard", &admin).await;
    assert_eq!(
        counts,
        json!({ "usersCount": 2, "storesCount": 1, "ratingsCount": 1 })
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_concurrent_submissions_keep_one_row() {
    let server = std::sync::Arc::new(server().await);
    let admin = server
        .account("Platform Administrator Name", "admin@example.com", Role::Admin)
        .await;
    let user = server
        .account("Regular User Name Long Enough", "user@example.com", Role::User)
        .await;
    let (_, body) = server
        .post(
            "/api/admin/stores",
            Some(&admin),
            json!({ "name": "Book World Library Store Name", "email": "books@store.com" }),
        )
        .await;
    let store_id = body["store"]["id"].as_i64().unwrap();

    let mut handles = Vec::new();
    for rating in 1..=5 {
        let server = server.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            server
                .post(
                    "/api/user/ratings",
                    Some(&user),
                    json!({ "store_id": store_id, "rating": rating }),
                )
                .await
                .0
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, counts) = server.get("/api/admin/dashboard", &admin).await;
    assert_eq!(counts["ratingsCount"], 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_duplicate_emails() {
    let server = server().await;
    let admin = server
        .account("Platform Administrator Name", "admin@example.com", Role::Admin)
        .await;

    let store = json!({ "name": "Book World Library Store Name", "email": "books@store.com" });
    server.post("/api/admin/stores", Some(&admin), store.clone()).await;
    let (status, body) = server.post("/api/admin/stores", Some(&admin), store).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Store email already exists");

    let (status, body) = server
        .post(
            "/api/auth/signup",
            None,
            json!({
                "name": "Platform Administrator Name",
                "email": "admin@example.com",
                "password": "Another#Pass1",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_servers_take_turns() {
    let first = server().await;
    first
        .account("Platform Administrator Name", "admin@example.com", Role::Admin)
        .await;

    let waiting = tokio::time::timeout(Duration::from_millis(200), server()).await;
    assert!(waiting.is_err(), "second server started while the first was alive");

    drop(first);
    let second = server().await;
    second
        .account("Platform Administrator Name", "admin@example.com", Role::Admin)
        .await;
}
