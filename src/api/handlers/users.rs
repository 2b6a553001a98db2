use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::errors::StoreError;
use crate::domain::repositories::Transaction;
use crate::domain::user::User;
use crate::domain::user_full::UserFull;
use crate::domain::versioning::StatusChange;

/// Request body for updating a user's profile
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    /// Version the client last read
    pub version: i64,
}

/// Onboard a user with address, contact and categories
///
/// POST /api/users/full
pub async fn create_full<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Json(req): Json<UserFull>,
) -> Result<(StatusCode, Json<UserFull>), ApiError> {
    let full = state.onboarding.create_full(req).await?;
    Ok((StatusCode::CREATED, Json(full)))
}

/// Get a user by ID
///
/// GET /api/users/:id
pub async fn get_user<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or(StoreError::NotFound { entity: "user", id })?;

    Ok(Json(user))
}

/// Update a user's username and email
///
/// PUT /api/users/:id
pub async fn update_user<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let mut user = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or(StoreError::NotFound { entity: "user", id })?;

    user.username = req.username;
    user.email = req.email;
    user.version = req.version;

    let updated = state.repos.users.update(&user).await?;
    Ok(Json(updated))
}

/// PATCH /api/users/:id/disable
pub async fn disable_user<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.repos.users.disable(id).await?))
}

/// PATCH /api/users/:id/enable
pub async fn enable_user<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.repos.users.enable(id).await?))
}
