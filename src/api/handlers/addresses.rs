use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::address::Address;
use crate::domain::errors::StoreError;
use crate::domain::owner::OwnerRef;
use crate::domain::repositories::Transaction;
use crate::domain::versioning::StatusChange;

/// Request body for updating an address
///
/// A missing `owner` keeps the current one.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    pub street: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub version: i64,
}

/// GET /api/addresses/:id
pub async fn get_address<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<Address>, ApiError> {
    let address = state
        .repos
        .addresses
        .find_by_id(id)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "address",
            id,
        })?;

    Ok(Json(address))
}

/// PUT /api/addresses/:id
pub async fn update_address<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAddressRequest>,
) -> Result<Json<Address>, ApiError> {
    let current = state
        .repos
        .addresses
        .find_by_id(id)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "address",
            id,
        })?;

    let address = Address {
        owner: req.owner.or(current.owner),
        street: req.street,
        number: req.number,
        complement: req.complement,
        district: req.district,
        city: req.city,
        state: req.state,
        country: req.country,
        postal_code: req.postal_code,
        version: req.version,
        ..current
    };

    Ok(Json(state.repos.addresses.update(&address).await?))
}

/// PATCH /api/addresses/:id/disable
pub async fn disable_address<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.repos.addresses.disable(id).await?))
}

/// PATCH /api/addresses/:id/enable
pub async fn enable_address<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.repos.addresses.enable(id).await?))
}
