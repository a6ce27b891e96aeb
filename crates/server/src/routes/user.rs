//! Regular user views: browse stores and rate them.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use store_rating_core::StoreId;

use super::{ApiJson, ApiPath, ApiQuery, identifier, integer, non_empty};
use crate::error::{Result, ValidationErrors, add_breadcrumb};
use crate::middleware::AuthUser;
use crate::models::{Rating, StoreFilter, ViewerStoreListing};
use crate::services::{DirectoryService, RatingService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StoreSearchQuery {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Rating submission. Numbers may arrive as JSON numbers or numeric strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRatingRequest {
    pub store_id: Option<Value>,
    pub rating: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRatingRequest {
    pub rating: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub message: &'static str,
    pub rating: Rating,
}

/// Stores by name, each with the caller's own rating.
pub async fn list_stores(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<StoreSearchQuery>,
) -> Result<Json<Vec<ViewerStoreListing>>> {
    let filter = StoreFilter {
        name: non_empty(query.name),
        email: None,
        address: non_empty(query.address),
    };

    let stores = DirectoryService::new(state.repo())
        .list_stores_for_viewer(&filter, user.id)
        .await?;
    Ok(Json(stores))
}

/// Submit a rating, replacing the caller's earlier rating for the store.
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn submit_rating(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<SubmitRatingRequest>,
) -> Result<Json<RatingResponse>> {
    let mut errors = ValidationErrors::default();
    let store_id = errors.require(
        "store_id",
        identifier(body.store_id.as_ref()),
        "store_id must be an integer",
    );
    let value = errors.require(
        "rating",
        integer(body.rating.as_ref()),
        "rating must be an integer between 1 and 5",
    );
    let (Some(store_id), Some(value)) = (store_id, value) else {
        return Err(errors.into());
    };

    let rating = RatingService::new(state.repo())
        .submit(user.id, StoreId::new(store_id), value)
        .await?;

    let store_label = store_id.to_string();
    add_breadcrumb(
        "rating",
        "Rating submitted",
        Some(&[("store_id", store_label.as_str())]),
    );

    Ok(Json(RatingResponse {
        message: "Rating submitted successfully",
        rating,
    }))
}

/// Change the caller's existing rating for a store.
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_rating(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(store_id): ApiPath<i32>,
    ApiJson(body): ApiJson<UpdateRatingRequest>,
) -> Result<Json<RatingResponse>> {
    let mut errors = ValidationErrors::default();
    let value = errors.require(
        "rating",
        integer(body.rating.as_ref()),
        "rating must be an integer between 1 and 5",
    );
    let Some(value) = value else {
        return Err(errors.into());
    };

    let rating = RatingService::new(state.repo())
        .update(user.id, StoreId::new(store_id), value)
        .await?;

    Ok(Json(RatingResponse {
        message: "Rating updated successfully",
        rating,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use store_rating_core::Role;

    use super::*;
    use crate::routes::tests::TestApp;

    struct Fixture {
        app: TestApp,
        admin: String,
        alice: String,
        bob: String,
    }

    /// An admin, two users and two stores (ids 1 and 2).
    async fn fixture() -> Fixture {
        let app = TestApp::new();
        let admin = app
            .account("Platform Administrator Name", "admin@example.com", Role::Admin)
            .await;
        let alice = app
            .account("Alice Account Holder Name", "alice@example.com", Role::User)
            .await;
        let bob = app
            .account("Bob Account Holder Name Here", "bob@example.com", Role::User)
            .await;
        for (name, email, address) in [
            ("Zebra Crossing Hardware Store", "zebra@store.com", "1 North Road"),
            ("Middle Market Grocery Store", "middle@store.com", "2 South Road"),
        ] {
            let (status, _) = app
                .request(
                    Method::POST,
                    "/api/admin/stores",
                    Some(&admin),
                    Some(json!({ "name": name, "email": email, "address": address })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        Fixture {
            app,
            admin,
            alice,
            bob,
        }
    }

    async fn rate(f: &Fixture, token: &str, store: i32, rating: i64) -> (StatusCode, Value) {
        f.app
            .request(
                Method::POST,
                "/api/user/ratings",
                Some(token),
                Some(json!({ "store_id": store, "rating": rating })),
            )
            .await
    }

    async fn stores(f: &Fixture, token: &str) -> Value {
        let (status, body) = f
            .app
            .request(Method::GET, "/api/user/stores", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn test_listing_is_by_name_with_own_rating() {
        let f = fixture().await;
        rate(&f, &f.alice, 1, 5).await;
        rate(&f, &f.bob, 1, 1).await;

        let body = stores(&f, &f.alice).await;
        assert_eq!(body[0]["name"], "Middle Market Grocery Store");
        assert_eq!(body[0]["user_rating"], Value::Null);
        assert_eq!(body[1]["name"], "Zebra Crossing Hardware Store");
        assert_eq!(body[1]["user_rating"], 5);
        assert_eq!(body[1]["average_rating"], 3.0);
        assert_eq!(body[1]["rating_count"], 2);

        let body = stores(&f, &f.bob).await;
        assert_eq!(body[1]["user_rating"], 1);
    }

    #[tokio::test]
    async fn test_listing_filters() {
        let f = fixture().await;
        let (_, body) = f
            .app
            .request(Method::GET, "/api/user/stores?address=north", Some(&f.alice), None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Zebra Crossing Hardware Store");

        let (_, body) = f
            .app
            .request(Method::GET, "/api/user/stores?name=MARKET", Some(&f.alice), None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Middle Market Grocery Store");
    }

    #[tokio::test]
    async fn test_resubmission_replaces_rating() {
        let f = fixture().await;

        let (status, body) = rate(&f, &f.alice, 1, 5).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating submitted successfully");
        assert_eq!(body["rating"]["rating"], 5);

        rate(&f, &f.alice, 1, 3).await;
        let body = stores(&f, &f.alice).await;
        assert_eq!(body[1]["average_rating"], 3.0);
        assert_eq!(body[1]["rating_count"], 1);
    }

    #[tokio::test]
    async fn test_rating_bounds() {
        let f = fixture().await;
        for bad in [0, 6] {
            let (status, body) = rate(&f, &f.alice, 1, bad).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["errors"][0]["field"], "rating");
        }
        for good in [1, 5] {
            let (status, _) = rate(&f, &f.alice, 1, good).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let f = fixture().await;
        let (status, body) = f
            .app
            .request(
                Method::POST,
                "/api/user/ratings",
                Some(&f.alice),
                Some(json!({ "store_id": "one", "rating": 4.5 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "store_id");
        assert_eq!(body["errors"][1]["field"], "rating");

        let (status, _) = f
            .app
            .request(
                Method::POST,
                "/api/user/ratings",
                Some(&f.alice),
                Some(json!({ "store_id": "2", "rating": "4" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_submit_unknown_store() {
        let f = fixture().await;
        let (status, body) = rate(&f, &f.alice, 99, 4).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Store not found");
    }

    #[tokio::test]
    async fn test_update_rating() {
        let f = fixture().await;

        let (status, body) = f
            .app
            .request(
                Method::PATCH,
                "/api/user/ratings/1",
                Some(&f.alice),
                Some(json!({ "rating": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Rating not found");

        rate(&f, &f.alice, 1, 5).await;
        let (status, body) = f
            .app
            .request(
                Method::PATCH,
                "/api/user/ratings/1",
                Some(&f.alice),
                Some(json!({ "rating": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating updated successfully");
        assert_eq!(body["rating"]["rating"], 2);

        let body = stores(&f, &f.alice).await;
        assert_eq!(body[1]["average_rating"], 2.0);
        assert_eq!(body[1]["rating_count"], 1);
    }

    #[tokio::test]
    async fn test_admin_cannot_rate() {
        let f = fixture().await;
        let (status, _) = rate(&f, &f.admin, 1, 4).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
