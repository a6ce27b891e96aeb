//! Admin views: platform totals, user management and store management.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use store_rating_core::{Address, Email, PersonName, PlainPassword, Role, SortSpec, UserId};

use super::{ApiJson, ApiPath, ApiQuery, identifier, non_empty};
use crate::error::{AppError, Result, ValidationErrors};
use crate::models::{
    DashboardCounts, NewStore, Store, StoreFilter, StoreListing, User, UserDetail, UserFilter,
};
use crate::services::{AuthService, DirectoryService, NewAccount};
use crate::state::AppState;

/// Query parameters for the user listing.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// `field:direction`, e.g. `name:asc`.
    pub sort: Option<String>,
}

/// Query parameters for the admin store listing.
#[derive(Debug, Default, Deserialize)]
pub struct StoreListQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub sort: Option<String>,
}

/// Form data for creating a user with any role.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub address: Option<String>,
}

/// Form data for creating a store.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub owner_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct UserCreated {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct StoreCreated {
    pub message: &'static str,
    pub store: Store,
}

/// Total users, stores and ratings.
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardCounts>> {
    let counts = DirectoryService::new(state.repo()).dashboard_counts().await?;
    Ok(Json(counts))
}

/// Create a user account with an explicit role.
#[tracing::instrument(skip(state, body), fields(email = %body.email, role = %body.role))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserCreated>)> {
    let mut errors = ValidationErrors::default();
    let name = errors.check("name", PersonName::parse(&body.name));
    let email = errors.check("email", Email::parse(&body.email));
    let password = errors.check("password", PlainPassword::parse(&body.password));
    let role = errors.check("role", body.role.parse::<Role>());
    let address = errors.check("address", Address::parse_optional(body.address.as_deref()));

    let (Some(name), Some(email), Some(password), Some(role), Some(address)) =
        (name, email, password, role, address)
    else {
        return Err(errors.into());
    };

    let user = AuthService::new(state.repo())
        .register(NewAccount {
            name,
            email,
            password,
            address,
            role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            message: "User created successfully",
            user,
        }),
    ))
}

/// List users, optionally filtered and sorted.
///
/// An unrecognised `sort` is ignored; an unrecognised `role` is rejected.
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Vec<User>>> {
    let role = match non_empty(query.role) {
        Some(role) => {
            let mut errors = ValidationErrors::default();
            let parsed = errors.check("role", role.parse::<Role>());
            errors.finish()?;
            parsed
        }
        None => None,
    };

    let filter = UserFilter {
        name: non_empty(query.name),
        email: non_empty(query.email),
        role,
    };
    let sort = non_empty(query.sort).and_then(|s| SortSpec::parse(&s));

    let users = DirectoryService::new(state.repo())
        .list_users(&filter, sort)
        .await?;
    Ok(Json(users))
}

/// A single user, with a store summary for owners.
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserDetail>> {
    let detail = DirectoryService::new(state.repo())
        .user_detail(UserId::new(id))
        .await?;
    Ok(Json(detail))
}

/// List all stores with owner name and rating aggregate.
pub async fn list_stores(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StoreListQuery>,
) -> Result<Json<Vec<StoreListing>>> {
    let filter = StoreFilter {
        name: non_empty(query.name),
        email: non_empty(query.email),
        address: None,
    };
    let sort = non_empty(query.sort).and_then(|s| SortSpec::parse(&s));

    let stores = DirectoryService::new(state.repo())
        .list_stores(&filter, sort)
        .await?;
    Ok(Json(stores))
}

/// Create a store, optionally assigned to an owner.
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub async fn create_store(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreCreated>)> {
    let mut errors = ValidationErrors::default();
    let name = errors.check("name", PersonName::parse(&body.name));
    let email = errors.check("email", Email::parse(&body.email));
    let address = errors.check("address", Address::parse_optional(body.address.as_deref()));
    let owner_id = match body.owner_id.as_ref() {
        None | Some(Value::Null) => Some(None),
        Some(value) => {
            let id = identifier(Some(value)).map(UserId::new);
            if id.is_none() {
                errors.push("owner_id", "owner_id must be an integer");
            }
            id.map(Some)
        }
    };

    let (Some(name), Some(email), Some(address), Some(owner_id)) = (name, email, address, owner_id)
    else {
        return Err(AppError::from(errors));
    };

    let store = DirectoryService::new(state.repo())
        .create_store(NewStore {
            name,
            email,
            address,
            owner_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StoreCreated {
            message: "Store created successfully",
            store,
        }),
    ))
}
