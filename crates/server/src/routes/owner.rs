//! Store owner dashboard.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::OwnerDashboard;
use crate::services::DirectoryService;
use crate::state::AppState;

/// The caller's store, its aggregate and everyone who rated it.
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<OwnerDashboard>> {
    let dashboard = DirectoryService::new(state.repo())
        .owner_dashboard(user.id)
        .await?;
    Ok(Json(dashboard))
}
