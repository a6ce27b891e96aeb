//! Signup, login and password change.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use store_rating_core::{Address, Email, PersonName, PlainPassword, Role};

use super::ApiJson;
use crate::error::{Result, ValidationErrors, add_breadcrumb};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::services::{AuthService, NewAccount};
use crate::state::AppState;

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
}

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Response for a successful signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: User,
}

/// Response carrying only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Register a regular user account and log it in.
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let mut errors = ValidationErrors::default();
    let name = errors.check("name", PersonName::parse(&body.name));
    let email = errors.check("email", Email::parse(&body.email));
    let password = errors.check("password", PlainPassword::parse(&body.password));
    let address = errors.check("address", Address::parse_optional(body.address.as_deref()));

    let (Some(name), Some(email), Some(password), Some(address)) = (name, email, password, address)
    else {
        return Err(errors.into());
    };

    let user = AuthService::new(state.repo())
        .register(NewAccount {
            name,
            email,
            password,
            address,
            role: Role::User,
        })
        .await?;
    let token = state.tokens().issue(user.id, &user.email, user.role)?;

    add_breadcrumb("auth", "User signed up", None);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            token,
            user,
        }),
    ))
}

/// Exchange email and password for a token.
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let mut errors = ValidationErrors::default();
    let email = errors.check("email", Email::parse(&body.email));
    if body.password.is_empty() {
        errors.push("password", "password is required");
    }
    let Some(email) = email else {
        return Err(errors.into());
    };
    errors.finish()?;

    let user = AuthService::new(state.repo())
        .login(&email, &body.password)
        .await
        .inspect_err(|_| tracing::info!("Login failed"))?;
    let token = state.tokens().issue(user.id, &user.email, user.role)?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user,
    }))
}

/// Change the caller's password.
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let mut errors = ValidationErrors::default();
    if body.old_password.is_empty() {
        errors.push("oldPassword", "old password is required");
    }
    let new_password = errors.check("newPassword", PlainPassword::parse(&body.new_password));
    let Some(new_password) = new_password else {
        return Err(errors.into());
    };
    errors.finish()?;

    AuthService::new(state.repo())
        .change_password(user.id, &body.old_password, &new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Method;
    use serde_json::json;

    use super::*;
    use crate::routes::tests::TestApp;

    fn signup_body(email: &str) -> serde_json::Value {
        json!({
            "name": "Regular User Name Long Enough",
            "email": email,
            "password": "UserPass123!",
            "address": "12 High Street",
        })
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let app = TestApp::new();

        let (status, body) = app
            .request(Method::POST, "/api/auth/signup", None, Some(signup_body("user@example.com")))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("password_hash").is_none());

        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "user@example.com", "password": "UserPass123!" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");

        let claims = app
            .state
            .tokens()
            .verify(body["token"].as_str().unwrap())
            .unwrap();
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.email.as_str(), "user@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_signup() {
        let app = TestApp::new();
        app.request(Method::POST, "/api/auth/signup", None, Some(signup_body("dup@example.com")))
            .await;

        let (status, body) = app
            .request(Method::POST, "/api/auth/signup", None, Some(signup_body("dup@example.com")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "User already exists");
    }

    #[tokio::test]
    async fn test_signup_validation_lists_every_field() {
        let app = TestApp::new();
        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({ "name": "Short", "email": "nope", "password": "weak" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = TestApp::new();
        let (status, body) = app
            .request(Method::POST, "/api/auth/login", None, Some(json!([1, 2, 3])))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let app = TestApp::new();
        app.request(Method::POST, "/api/auth/signup", None, Some(signup_body("user@example.com")))
            .await;

        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "user@example.com", "password": "WrongPass1!" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, unknown) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "ghost@example.com", "password": "UserPass123!" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, body);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "user@example.com", "password": "" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_password() {
        let app = TestApp::new();
        let (_, body) = app
            .request(Method::POST, "/api/auth/signup", None, Some(signup_body("user@example.com")))
            .await;
        let token = body["token"].as_str().unwrap().to_owned();

        let (status, body) = app
            .request(
                Method::PATCH,
                "/api/auth/update-password",
                Some(&token),
                Some(json!({ "oldPassword": "NotIt123!", "newPassword": "NewPass456#" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid old password");

        let (status, body) = app
            .request(
                Method::PATCH,
                "/api/auth/update-password",
                Some(&token),
                Some(json!({ "oldPassword": "UserPass123!", "newPassword": "nouppercase1!" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "newPassword");

        let (status, body) = app
            .request(
                Method::PATCH,
                "/api/auth/update-password",
                Some(&token),
                Some(json!({ "oldPassword": "UserPass123!", "newPassword": "NewPass456#" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password updated successfully");

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "user@example.com", "password": "NewPass456#" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_password_requires_token() {
        let app = TestApp::new();
        let (status, _) = app
            .request(
                Method::PATCH,
                "/api/auth/update-password",
                None,
                Some(json!({ "oldPassword": "UserPass123!", "newPassword": "NewPass456#" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
